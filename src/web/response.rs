use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

use super::Body;

const JSON: &str = "application/json";
const TEXT: &str = "text/plain; charset=utf-8";

/// Renders a rejection into a response.
///
/// `error` is `None` for denials that never reached a policy decision; those
/// must produce a status-only response.
pub trait ResponseWriter: Send + Sync {
    /// Builds the rejection response.
    fn write(
        &self,
        status: StatusCode,
        error: Option<&ValidationError>,
        request_headers: &HeaderMap,
    ) -> Response<Body>;
}

/// JSON shape of a 401 body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// The primary error message.
    pub message: String,
    /// Secondary messages from an aggregate error, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl From<&ValidationError> for ErrorBody {
    fn from(err: &ValidationError) -> Self {
        Self {
            message: err.primary_message(),
            errors: err.secondary().iter().map(|c| c.message().to_string()).collect(),
        }
    }
}

/// Default writer: JSON when the request accepts it, plain text otherwise.
///
/// The plain-text body is the primary message followed by one line per
/// secondary message.
///
/// # Examples
///
/// ```
/// use http::{HeaderMap, StatusCode};
/// use scheme_gate::ValidationError;
/// use scheme_gate::web::{NegotiatingWriter, ResponseWriter};
///
/// let err = ValidationError::new("expired");
/// let response = NegotiatingWriter.write(StatusCode::UNAUTHORIZED, Some(&err), &HeaderMap::new());
///
/// assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
/// assert_eq!(response.body(), b"expired");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NegotiatingWriter;

impl NegotiatingWriter {
    fn wants_json(headers: &HeaderMap) -> bool {
        headers
            .get_all(ACCEPT)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|v| v.contains(JSON))
    }

    fn text(err: &ValidationError) -> Body {
        let mut lines = vec![err.primary_message()];
        lines.extend(err.secondary().iter().map(|c| c.message().to_string()));
        lines.join("\n").into_bytes()
    }
}

impl ResponseWriter for NegotiatingWriter {
    fn write(
        &self,
        status: StatusCode,
        error: Option<&ValidationError>,
        request_headers: &HeaderMap,
    ) -> Response<Body> {
        let Some(err) = error else {
            let mut response = Response::new(Body::new());
            *response.status_mut() = status;
            return response;
        };

        let json = if Self::wants_json(request_headers) {
            match serde_json::to_vec(&ErrorBody::from(err)) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to encode error body, using text");
                    None
                }
            }
        } else {
            None
        };

        let (body, content_type) = match json {
            Some(bytes) => (bytes, JSON),
            None => (Self::text(err), TEXT),
        };

        let mut response = Response::new(body);
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        response
    }
}
