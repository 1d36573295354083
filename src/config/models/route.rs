//! Routing rule and match-predicate document types

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A named, ordered group of HTTP routes
///
/// Rule order across a service encodes priority: the first route whose match
/// clauses accept the request wins.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRule {
    /// Rule name, informational
    #[serde(default)]
    pub name: String,
    /// Target service; only meaningful for rules declared at the top level
    /// of the document, which are appended to that service's rule list
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service_name: String,
    /// Routes evaluated in order
    #[serde(default)]
    pub http: Vec<HttpRoute>,
}

/// One HTTP route: match clauses plus the action taken on a match
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRoute {
    /// Route name, informational
    #[serde(default)]
    pub name: String,
    /// OR-joined match clauses; a route with no clauses never matches
    #[serde(default, rename = "match")]
    pub matches: Vec<HttpMatchRequest>,
    /// Weighted destination clusters
    #[serde(default)]
    pub route: Vec<HttpRouteDestination>,
    /// Redirect directive, carried for the enclosing proxy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<HttpRedirect>,
    /// Rewrite directive, carried for the enclosing proxy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<HttpRewrite>,
    /// Request timeout hint in milliseconds, enforced by the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

/// A destination cluster with its traffic share
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HttpRouteDestination {
    /// Destination cluster reference
    #[serde(default)]
    pub destination: Destination,
    /// Relative weight; entries with weight <= 0 are dropped at build time
    #[serde(default)]
    pub weight: i32,
}

/// Reference to a cluster by name
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Destination {
    /// Cluster name within the enclosing service
    #[serde(default)]
    pub cluster: String,
}

/// Redirect directive for the enclosing proxy
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRedirect {
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub authority: String,
    #[serde(default)]
    pub port: i32,
    #[serde(default)]
    pub scheme: String,
    #[serde(default)]
    pub redirect_code: String,
}

/// Rewrite directive for the enclosing proxy
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HttpRewrite {
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub authority: String,
}

/// One match clause
///
/// Predicates within a clause are AND-joined; an unspecified predicate never
/// constrains. Clauses within a route are OR-joined: the first clause fully
/// satisfied by the request selects the route.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpMatchRequest {
    /// Clause name, informational
    #[serde(default)]
    pub name: String,
    /// Match against the request URI
    #[serde(default)]
    pub uri: StringMatch,
    /// Match against the URL scheme
    #[serde(default)]
    pub scheme: StringMatch,
    /// Match against the HTTP method
    #[serde(default)]
    pub method: StringMatch,
    /// Match against the `:authority` / Host value
    #[serde(default)]
    pub authority: StringMatch,
    /// Every listed header must match; a missing header compares against ""
    #[serde(default)]
    pub headers: HashMap<String, StringMatch>,
    /// Negative predicates: the clause fails if any listed header matches
    #[serde(default)]
    pub without_headers: HashMap<String, StringMatch>,
    /// Every listed query parameter must match
    #[serde(default)]
    pub query_params: HashMap<String, StringMatch>,
    /// Match against the request port; 0 matches any port
    #[serde(default)]
    pub port: i32,
    /// Source workload labels; accepted in configuration but not evaluated
    /// (no source-workload metadata is available at this layer)
    #[serde(default)]
    pub source_labels: HashMap<String, String>,
    /// Lowercase both sides of the URI predicate before comparing
    #[serde(default)]
    pub ignore_uri_case: bool,
}

/// A string predicate: exact, prefix or regular-expression match
///
/// All three fields empty means "unspecified": the predicate does not
/// constrain. When several fields are set the first non-empty of
/// exact, prefix, regex wins.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StringMatch {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub exact: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prefix: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub regex: String,
}

impl StringMatch {
    /// An exact-equality predicate
    pub fn exact(value: impl Into<String>) -> Self {
        Self {
            exact: value.into(),
            ..Default::default()
        }
    }

    /// A has-prefix predicate
    pub fn prefix(value: impl Into<String>) -> Self {
        Self {
            prefix: value.into(),
            ..Default::default()
        }
    }

    /// A whole-string regular-expression predicate
    pub fn regex(value: impl Into<String>) -> Self {
        Self {
            regex: value.into(),
            ..Default::default()
        }
    }

    /// True when no variant is specified
    pub fn is_unspecified(&self) -> bool {
        self.exact.is_empty() && self.prefix.is_empty() && self.regex.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_clause_yaml_shape() {
        let yaml = r#"
match:
  - uri: { prefix: "/api/" }
    ignoreUriCase: true
    withoutHeaders:
      x-debug: { exact: "1" }
route:
  - destination: { cluster: v1 }
    weight: 1
"#;
        let route: HttpRoute = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(route.matches.len(), 1);
        assert_eq!(route.matches[0].uri.prefix, "/api/");
        assert!(route.matches[0].ignore_uri_case);
        assert!(route.matches[0].without_headers.contains_key("x-debug"));
        assert_eq!(route.route[0].destination.cluster, "v1");
        assert_eq!(route.route[0].weight, 1);
    }

    #[test]
    fn test_string_match_unspecified() {
        assert!(StringMatch::default().is_unspecified());
        assert!(!StringMatch::exact("GET").is_unspecified());
        assert!(!StringMatch::prefix("/a").is_unspecified());
        assert!(!StringMatch::regex(".*").is_unspecified());
    }
}
