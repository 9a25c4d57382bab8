//! Backend API access.
//!
//! `ApiClient` knows every endpoint and the error policy. The wire itself
//! sits behind the `Transport` trait so flows can be driven by a scripted
//! transport in tests and by `HttpTransport` in the binary.

mod client;
pub mod error;
mod http;
pub mod validation;

pub use client::ApiClient;
pub use error::{detail_message, ApiError, ApiResponse, ApiResult, FieldErrors, GENERIC_ERROR};
pub use http::HttpTransport;
pub use reqwest::Method;

use async_trait::async_trait;

/// One backend request, relative to the configured base URL
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
    /// Bearer credential, when the endpoint requires one
    pub bearer: Option<String>,
}

/// Status and raw body of an answered request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Carries requests to the backend.
///
/// Implementations return `ApiError::Transport` only when no response was
/// received at all; every answered request is a `RawResponse`, whatever
/// its status.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> ApiResult<RawResponse>;
}
