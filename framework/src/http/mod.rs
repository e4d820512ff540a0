mod body;
mod form;
mod request;
mod response;

pub use body::{collect_body, parse_form};
pub use form::parse_bool;
pub use request::Request;
pub use response::{HttpResponse, Response};

pub use http::Method;

/// Content type of every JSON route in the service
pub const JSON_CONTENT_TYPE: &str = "application/json";
