//! Prelude module for convenient imports.
//!
//! ```ignore
//! use courier::prelude::*;
//! ```

pub use crate::{
    Adapter, Body, CancelToken, Client, ContentType, Error, Headers, Method, RequestConfig,
    RequestInterceptor, ResponseConfig, ResponseData, ResponseInterceptor, ResponseType, Result,
    RetryPolicy, SearchParams, StatusCode,
};
