//! Request and response envelopes exchanged with storage nodes.
//!
//! Signing never looks at a concrete request type. It reads the fields it
//! binds through [`RequestView`], so any transport's request type can be
//! signed and verified as long as it exposes them.

use serde::{Deserialize, Serialize};

use crate::operations::Status;

/// Content type of every canonical-encoded operation body.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// The request fields bound by a signature.
pub trait RequestView {
    /// Target host, e.g. `node-1.local:8080`.
    fn host(&self) -> &str;

    /// Request method, e.g. `POST`.
    fn method(&self) -> &str;

    /// Path including any query string.
    fn path_and_query(&self) -> &str;

    /// Content type, if the request has one.
    fn content_type(&self) -> Option<&str>;

    /// Body bytes, if the request has a body.
    fn body(&self) -> Option<&[u8]>;
}

/// An owned request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Request {
    /// Target host
    pub host: String,
    /// Request method
    pub method: String,
    /// Path and query
    pub path_and_query: String,
    /// Content type
    pub content_type: Option<String>,
    /// Body
    pub body: Option<Vec<u8>>,
    /// Authorization header value (token string)
    pub authorization: Option<String>,
}

impl Request {
    /// Creates a request without content type, body or authorization.
    pub fn new(
        method: impl Into<String>,
        host: impl Into<String>,
        path_and_query: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            method: method.into(),
            path_and_query: path_and_query.into(),
            content_type: None,
            body: None,
            authorization: None,
        }
    }

    /// Sets the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Sets the body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets an octet-stream body.
    pub fn with_binary_body(self, body: impl Into<Vec<u8>>) -> Self {
        self.with_content_type(OCTET_STREAM).with_body(body)
    }

    /// Sets the authorization header value.
    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    /// Body bytes, or an empty slice if absent.
    pub fn body_bytes(&self) -> &[u8] {
        self.body.as_deref().unwrap_or_default()
    }

    /// Operation name addressed by the path, without leading `/` or query.
    pub fn operation_name(&self) -> &str {
        let path = self
            .path_and_query
            .split_once('?')
            .map_or(self.path_and_query.as_str(), |(path, _)| path);
        path.trim_start_matches('/')
    }
}

impl RequestView for Request {
    fn host(&self) -> &str {
        &self.host
    }

    fn method(&self) -> &str {
        &self.method
    }

    fn path_and_query(&self) -> &str {
        &self.path_and_query
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

/// Response to a [`Request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Outcome
    pub status: Status,
    /// Encoded result on success, UTF-8 message otherwise
    pub body: Vec<u8>,
}

impl Response {
    /// Successful response carrying an encoded result.
    pub fn ok(body: Vec<u8>) -> Self {
        Self {
            status: Status::Ok,
            body,
        }
    }

    /// Failed response with a short message.
    pub fn error(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            body: message.into().into_bytes(),
        }
    }

    /// Returns true for [`Status::Ok`].
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Body as text, for error messages.
    pub fn message(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_view() {
        let request = Request::new("POST", "node-1", "/slice.put?pool=a")
            .with_binary_body(vec![1, 2, 3])
            .with_authorization("token");

        assert_eq!(RequestView::host(&request), "node-1");
        assert_eq!(RequestView::method(&request), "POST");
        assert_eq!(RequestView::path_and_query(&request), "/slice.put?pool=a");
        assert_eq!(RequestView::content_type(&request), Some(OCTET_STREAM));
        assert_eq!(RequestView::body(&request), Some(&[1u8, 2, 3][..]));
        assert_eq!(request.authorization.as_deref(), Some("token"));
    }

    #[test]
    fn test_operation_name() {
        assert_eq!(Request::new("GET", "h", "/manifest.get").operation_name(), "manifest.get");
        assert_eq!(Request::new("GET", "h", "/manifest.list?x=1").operation_name(), "manifest.list");
        assert_eq!(Request::new("GET", "h", "").operation_name(), "");
    }

    #[test]
    fn test_absent_body() {
        let request = Request::new("GET", "h", "/");
        assert_eq!(RequestView::body(&request), None);
        assert!(request.body_bytes().is_empty());
    }

    #[test]
    fn test_response_helpers() {
        assert!(Response::ok(vec![1]).is_ok());
        let err = Response::error(Status::NotFound, "no such slice");
        assert!(!err.is_ok());
        assert_eq!(err.message(), "no such slice");
    }
}
