// File: src/request_context.rs
// Purpose: Incoming request and the per-request context threaded through the pipeline

use axum::body::Bytes;
use axum::http::{request::Parts, HeaderMap, Method};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use trellis_router::Params;

/// Transport-neutral request handed to the dispatcher
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Path plus optional query string, e.g. `/users/1?tab=posts`
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Request {
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Build from axum request parts and a collected body
    pub fn from_parts(parts: &Parts, body: Bytes) -> Self {
        let uri = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        Self {
            method: parts.method.clone(),
            uri,
            headers: parts.headers.clone(),
            body,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn path(&self) -> &str {
        self.uri.split_once('?').map_or(self.uri.as_str(), |(path, _)| path)
    }

    pub fn query_string(&self) -> Option<&str> {
        self.uri.split_once('?').map(|(_, query)| query)
    }
}

/// Request context passed to middleware, handlers and components
///
/// Owned by a single in-flight request and borrowed mutably down the chain.
pub struct RequestContext {
    /// HTTP method (GET, POST, PUT, DELETE, etc.)
    pub method: Method,

    /// Path plus query string as received
    pub url: String,

    /// Request path without the query string
    pub path: String,

    /// Query parameters from URL (?key=value)
    pub query: QueryParams,

    /// Request headers
    pub headers: HeaderMap,

    /// Raw request body
    pub body: Bytes,

    /// Parameters captured by the matched route
    pub params: Params,

    /// Values shared between middleware, handler and layouts
    pub state: State,

    /// Failure being handled, set while an error boundary renders
    pub error: Option<anyhow::Error>,

    /// Data returned by the handler for rendering
    pub data: Option<JsonValue>,

    /// Display form of the matched route pattern (`/users/:id`)
    pub route: String,
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("route", &self.route)
            .field("has_error", &self.error.is_some())
            .finish()
    }
}

impl RequestContext {
    /// Create a context for a matched request
    pub fn new(request: Request, params: Params, route: impl Into<String>) -> Self {
        let path = request.path().to_string();
        let query = request
            .query_string()
            .map(QueryParams::parse)
            .unwrap_or_default();

        Self {
            method: request.method,
            url: request.uri,
            path,
            query,
            headers: request.headers,
            body: request.body,
            params,
            state: State::default(),
            error: None,
            data: None,
            route: route.into(),
        }
    }

    /// Single-segment route parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Get a header value
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Check if request accepts JSON
    pub fn accepts_json(&self) -> bool {
        self.get_header("accept")
            .is_some_and(|accept| accept.contains("json"))
    }

    /// Body as UTF-8 text (lossy)
    pub fn body_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Deserialize a JSON body
    pub fn json<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Message of the failure being handled, if any
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|error| error.to_string())
    }
}

/// Query parameters from URL
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    params: HashMap<String, String>,
}

impl QueryParams {
    /// Create from HashMap
    pub fn new(params: HashMap<String, String>) -> Self {
        Self { params }
    }

    /// Parse a raw query string (`a=1&b=two%20words`)
    pub fn parse(query: &str) -> Self {
        let params = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (decode_component(key), decode_component(value))
            })
            .collect();

        Self { params }
    }

    /// Get a query parameter value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Get a query parameter as a specific type
    pub fn get_as<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.params.get(key)?.parse().ok()
    }

    /// Check if a parameter exists
    pub fn has(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Get as HashMap
    pub fn as_map(&self) -> &HashMap<String, String> {
        &self.params
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .unwrap_or(spaced)
}

/// Mutable key/value bag shared along one request's pipeline
#[derive(Debug, Clone, Default)]
pub struct State {
    values: HashMap<String, JsonValue>,
}

impl State {
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.values.get(key)
    }

    /// Convenience for string values
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key)?.as_str()
    }

    /// Deserialize a stored value into `T`
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        serde_json::from_value(self.values.get(key)?.clone()).ok()
    }

    pub fn remove(&mut self, key: &str) -> Option<JsonValue> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
