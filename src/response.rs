//! Standard response envelope helpers.

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Content type stamped on every JSON body, including cache replays.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf8";

#[derive(Serialize, Debug)]
pub struct ErrorDetail {
    pub message: String,
}

/// `{count, returned, data, error}`: one shape for every outcome.
#[derive(Serialize, Debug)]
pub struct Envelope<T> {
    /// Total matching rows before limiting.
    pub count: u64,
    pub returned: u64,
    pub data: Option<Vec<T>>,
    pub error: Option<ErrorDetail>,
}

impl<T: Serialize> Envelope<T> {
    pub fn rows(count: u64, data: Vec<T>) -> Self {
        let returned = data.len() as u64;
        Envelope {
            count,
            returned,
            data: Some(data),
            error: None,
        }
    }

    /// Envelope where the payload is the complete set (count == returned).
    pub fn all(data: Vec<T>) -> Self {
        let count = data.len() as u64;
        Self::rows(count, data)
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Envelope {
            count: 0,
            returned: 0,
            data: None,
            error: Some(ErrorDetail {
                message: message.into(),
            }),
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        json_response(StatusCode::OK, &self)
    }
}

/// Serialize `body` with the gateway's JSON content type. Serialization failure is a 500.
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => json_bytes(status, bytes),
        Err(e) => {
            tracing::error!(error = %e, "response serialization failed");
            json_bytes(
                StatusCode::INTERNAL_SERVER_ERROR,
                br#"{"count":0,"returned":0,"data":null,"error":{"message":"server error"}}"#.to_vec(),
            )
        }
    }
}

/// Raw JSON bytes (e.g. a cached payload) as a response.
pub fn json_bytes(status: StatusCode, bytes: impl Into<Body>) -> Response {
    let mut response = Response::new(bytes.into());
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(JSON_CONTENT_TYPE),
    );
    response
}
