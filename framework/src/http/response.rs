use crate::error::FrameworkError;
use bytes::Bytes;
use http_body_util::Full;
use serde::Serialize;
use tracing::error;

/// HTTP response: status, raw body bytes and headers
///
/// The dispatcher never looks inside the body; it only applies header
/// policy (default content type, CORS) before the server writes it.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: u16,
    body: Bytes,
    headers: Vec<(String, String)>,
}

/// Response type alias - allows using `?` operator for early returns
pub type Response = Result<HttpResponse, HttpResponse>;

#[derive(Serialize)]
struct MessageBody<'a> {
    message: &'a str,
}

impl HttpResponse {
    pub fn new() -> Self {
        Self {
            status: 200,
            body: Bytes::new(),
            headers: Vec::new(),
        }
    }

    /// Create a plain-text response
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: Bytes::from(body.into()),
            headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
        }
    }

    /// Create a response from raw bytes without any content type
    pub fn bytes(body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            headers: Vec::new(),
        }
    }

    /// Serialize a value as the JSON body
    ///
    /// No content type is set here; JSON routes declare it as their default
    /// and the dispatcher fills it in.
    pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<Self, FrameworkError> {
        Ok(Self::bytes(serde_json::to_vec(value)?))
    }

    /// Create a `{"message": ...}` body
    pub fn message(message: impl AsRef<str>) -> Self {
        let body = MessageBody {
            message: message.as_ref(),
        };
        // A struct holding one string always serializes
        Self::bytes(serde_json::to_vec(&body).unwrap_or_default())
    }

    /// Log a server-side failure and answer with a client-safe message
    ///
    /// The error detail stays in the logs; only `message` reaches the client.
    pub fn failure(err: FrameworkError, message: &str) -> Self {
        if err.is_server_error() {
            error!(error = %err, "{}", message);
        }
        Self::message(message).status(err.status_code())
    }

    /// Set the HTTP status code
    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Wrap this response in Ok() for use as Response type
    pub fn ok(self) -> Response {
        Ok(self)
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Look up a header, ignoring the case of its name
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Set a header, replacing any value already present under that name
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
    }

    /// Set a header only if the handler did not set one itself
    pub fn set_default_header(&mut self, name: &str, value: &str) {
        if self.header_value(name).is_none() {
            self.headers.push((name.to_string(), value.to_string()));
        }
    }

    /// Convert to hyper response
    pub fn into_hyper(self) -> hyper::Response<Full<Bytes>> {
        let mut builder = hyper::Response::builder().status(self.status);

        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        match builder.body(Full::new(self.body)) {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, status = self.status, "invalid response head");
                let mut response = hyper::Response::new(Full::new(Bytes::from_static(
                    b"Internal Server Error",
                )));
                *response.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
                response
            }
        }
    }
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Auto-convert FrameworkError to HttpResponse
///
/// Client errors keep their message. Server errors are logged and replaced
/// by a generic message so no SQL or internal detail crosses the boundary.
impl From<FrameworkError> for HttpResponse {
    fn from(err: FrameworkError) -> HttpResponse {
        if err.is_server_error() {
            return HttpResponse::failure(err, "Internal server error");
        }
        let status = err.status_code();
        HttpResponse::message(err.to_string()).status(status)
    }
}
