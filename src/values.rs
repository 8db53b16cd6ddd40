//! Property bags for query, form and cookie data.
//!
//! [`Values`] is an ordered, case-sensitive string multimap. The embedding
//! transport supplies these before dispatch; request headers use
//! [`HeaderMap`](crate::header::HeaderMap) instead, which is
//! case-insensitive.

use std::slice;

/// An ordered multimap of string keys and values.
///
/// Keys compare case-sensitively. Insertion order is preserved and
/// duplicate keys are allowed; [`get`](Values::get) returns the first
/// value, [`all`](Values::all) every value for a key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Values {
    pairs: Vec<(String, String)>,
}

impl Values {
    /// Creates an empty `Values`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a `application/x-www-form-urlencoded` string, such as a query
    /// string or form body.
    ///
    /// # Example
    ///
    /// ```
    /// use trellis::Values;
    ///
    /// let values = Values::from_urlencoded("a=1&b=hello%20world").unwrap();
    /// assert_eq!(values.get("b"), Some("hello world"));
    /// ```
    pub fn from_urlencoded(data: &str) -> Result<Self, serde_urlencoded::de::Error> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(data)?;
        Ok(Self { pairs })
    }

    /// The first value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Every value for `key`, in insertion order.
    pub fn all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> {
        self.pairs
            .iter()
            .filter(move |(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Appends a key-value pair.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// The number of key-value pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether there are no pairs at all.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterates over all pairs in insertion order.
    pub fn iter(&self) -> slice::Iter<'_, (String, String)> {
        self.pairs.iter()
    }
}

impl FromIterator<(String, String)> for Values {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Values {
    type Item = &'a (String, String);
    type IntoIter = slice::Iter<'a, (String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}
