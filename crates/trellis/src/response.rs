use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;

pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

// ============================================================================
// IntoHtml trait: bridges Maud Markup, String, and &str
// ============================================================================

pub trait IntoHtml {
    fn into_html(self) -> String;
}

impl IntoHtml for maud::Markup {
    fn into_html(self) -> String { self.into_string() }
}

impl IntoHtml for String {
    fn into_html(self) -> String { self }
}

impl IntoHtml for &str {
    fn into_html(self) -> String { self.to_string() }
}

fn insert_header(headers: &mut HeaderMap, key: &str, value: &str) {
    if let (Ok(name), Ok(val)) = (
        HeaderName::from_bytes(key.as_bytes()),
        HeaderValue::from_str(value),
    ) {
        headers.insert(name, val);
    }
}

// ============================================================================
// Response
// ============================================================================

/// Fully materialized response produced by the dispatcher.
///
/// Handlers return one through `Outcome::Response` to bypass rendering;
/// the dispatcher builds one for rendered pages, 404s and 405s.
///
/// ```ignore
/// Response::html(maud::html! { h1 { "Hello" } }).header("x-trace", "1")
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl Response {
    /// Empty response with the given status
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: String::new(),
        }
    }

    /// `200` with an HTML body. Accepts Maud Markup, String, or &str.
    pub fn html(content: impl IntoHtml) -> Self {
        Self::new(StatusCode::OK)
            .header(header::CONTENT_TYPE.as_str(), HTML_CONTENT_TYPE)
            .body(content.into_html())
    }

    /// `200` with a plain-text body
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(StatusCode::OK)
            .header(header::CONTENT_TYPE.as_str(), "text/plain; charset=utf-8")
            .body(content)
    }

    /// `200` with a JSON body
    pub fn json(value: &serde_json::Value) -> Self {
        Self::new(StatusCode::OK)
            .header(header::CONTENT_TYPE.as_str(), "application/json")
            .body(value.to_string())
    }

    /// Redirect to `location` (303 See Other)
    pub fn redirect(location: &str) -> Self {
        Self::new(StatusCode::SEE_OTHER).header(header::LOCATION.as_str(), location)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
            .header(header::CONTENT_TYPE.as_str(), "text/plain; charset=utf-8")
            .body("Not Found")
    }

    /// `405` listing the methods the route does accept
    pub fn method_not_allowed(allowed: &[Method]) -> Self {
        let allow = allowed
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        Self::new(StatusCode::METHOD_NOT_ALLOWED)
            .header(header::ALLOW.as_str(), &allow)
            .header(header::CONTENT_TYPE.as_str(), "text/plain; charset=utf-8")
            .body("Method Not Allowed")
    }

    /// Set the HTTP status code.
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Add a response header. Invalid names or values are ignored.
    pub fn header(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        insert_header(&mut self.headers, key.as_ref(), value.as_ref());
        self
    }

    /// Replace the body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers.get(key)?.to_str().ok()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header_value(header::CONTENT_TYPE.as_str())
    }
}

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.headers, self.body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_response() {
        let response = Response::html(maud::html! { p { "hi" } });
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.content_type(), Some(HTML_CONTENT_TYPE));
        assert_eq!(response.body, "<p>hi</p>");
    }

    #[test]
    fn test_method_not_allowed_lists_methods() {
        let response = Response::method_not_allowed(&[Method::GET, Method::POST]);
        assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.header_value("allow"), Some("GET, POST"));
    }

    #[test]
    fn test_invalid_header_is_ignored() {
        let response = Response::new(StatusCode::OK).header("bad header", "x");
        assert!(response.headers.is_empty());
    }

    #[test]
    fn test_into_axum_response() {
        let response = Response::json(&serde_json::json!({ "ok": true }))
            .status(StatusCode::CREATED)
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
    }
}
