//! HTTP header types.
//!
//! Request and response headers are case-insensitive multi-value maps;
//! this module re-exports the [`http`] crate's container and the names the
//! dispatch pipeline touches itself.

pub use http::header::{
    HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, COOKIE, HOST, LOCATION,
    SET_COOKIE,
};
