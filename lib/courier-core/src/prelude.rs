//! Prelude module for convenient imports.
//!
//! Re-exports the most commonly used types for glob importing:
//!
//! ```ignore
//! use courier_core::prelude::*;
//! ```

pub use crate::{
    Adapter, Body, CancelToken, ContentType, Error, Headers, Method, RequestConfig,
    ResponseConfig, ResponseData, ResponseParser, ResponseType, Result, RetryPolicy,
    SearchParams, StatusCode, Transport, from_json, to_form, to_json,
};
