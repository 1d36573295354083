//! Request view consumed by the matcher
//!
//! The core never parses HTTP itself; the embedding proxy hands it this
//! narrow view of an already-parsed request.

use std::collections::HashMap;

/// The slice of an HTTP request the routing core needs
///
/// Header names are case-insensitive. Query parameters are extracted from
/// the request URI when one is set via [`RouteRequest::with_uri`]; explicit
/// [`RouteRequest::with_query_param`] entries take precedence.
#[derive(Debug, Clone, Default)]
pub struct RouteRequest {
    host: String,
    method: String,
    authority: String,
    scheme: String,
    uri: String,
    port: i32,
    source_ip: Option<String>,
    headers: HashMap<String, String>,
    query_params: HashMap<String, String>,
}

impl RouteRequest {
    /// Create a request view for the given host
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    /// Set the HTTP method (builder pattern)
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Set the `:authority` value (builder pattern)
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = authority.into();
        self
    }

    /// Set the URL scheme (builder pattern)
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Set the request URI and extract its query parameters (builder pattern)
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        if let Some((_, query)) = self.uri.split_once('?') {
            for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
                // First occurrence wins, matching URL query getters.
                self.query_params
                    .entry(name.into_owned())
                    .or_insert_with(|| value.into_owned());
            }
        }
        self
    }

    /// Set the request port (builder pattern)
    pub fn with_port(mut self, port: i32) -> Self {
        self.port = port;
        self
    }

    /// Set the client source IP (builder pattern)
    pub fn with_source_ip(mut self, ip: impl Into<String>) -> Self {
        self.source_ip = Some(ip.into());
        self
    }

    /// Add a request header (builder pattern)
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Add or override a query parameter (builder pattern)
    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(name.into(), value.into());
        self
    }

    /// Request host used for service lookup
    pub fn host(&self) -> &str {
        &self.host
    }

    /// HTTP method
    pub fn method(&self) -> &str {
        &self.method
    }

    /// `:authority` value
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// URL scheme
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Request URI as received (path plus optional query)
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Request port; 0 when unknown
    pub fn port(&self) -> i32 {
        self.port
    }

    /// Client source IP, when known
    pub fn source_ip(&self) -> Option<&str> {
        self.source_ip.as_deref()
    }

    /// Header value by case-insensitive name; "" when absent
    pub fn header(&self, name: &str) -> &str {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Query parameter value by name; "" when absent
    pub fn query_param(&self, name: &str) -> &str {
        self.query_params
            .get(name)
            .map(String::as_str)
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params_extracted_from_uri() {
        let request = RouteRequest::new("api.local").with_uri("/search?q=beta&page=2&q=gamma");
        assert_eq!(request.uri(), "/search?q=beta&page=2&q=gamma");
        assert_eq!(request.query_param("q"), "beta");
        assert_eq!(request.query_param("page"), "2");
        assert_eq!(request.query_param("missing"), "");
    }

    #[test]
    fn test_explicit_query_param_overrides_uri() {
        let request = RouteRequest::new("api.local")
            .with_uri("/search?q=beta")
            .with_query_param("q", "override");
        assert_eq!(request.query_param("q"), "override");
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let request = RouteRequest::new("api.local").with_header("X-Version", "v2");
        assert_eq!(request.header("x-version"), "v2");
        assert_eq!(request.header("X-VERSION"), "v2");
        assert_eq!(request.header("x-other"), "");
    }
}
