use std::time::Duration;

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName};
use serde_json::Value;

use crate::ClientError;
use crate::config::header_value;

/// What a call stub wants sent: method, path and optional request fields.
///
/// `url` is relative to the effective base URL unless it is absolute.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestDescription {
    pub method: Method,
    pub url: String,
    pub base_url: Option<String>,
    pub headers: Option<HeaderMap>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub timeout: Option<Duration>,
}

impl RequestDescription {
    /// A request for `method` and `url` with every optional field unset.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            base_url: None,
            headers: None,
            query: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    /// Shorthand for a `GET` request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Appends one query pair.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Appends every pair from `pairs`.
    #[must_use]
    pub fn query_pairs(mut self, pairs: &[(&str, &str)]) -> Self {
        self.query.extend(
            pairs
                .iter()
                .map(|(key, value)| ((*key).to_owned(), (*value).to_owned())),
        );
        self
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sends this request to `base_url` instead of the handle's base URL.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets a per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Adds one request header on top of the handle's defaults.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, ClientError> {
        insert_header(self.headers.get_or_insert_with(HeaderMap::new), name, value)?;
        Ok(self)
    }

    /// Applies `overrides` field by field.
    ///
    /// A present override replaces the whole base field. Headers and query
    /// pairs are replaced as a unit, never merged key by key.
    #[must_use]
    pub fn merge(self, overrides: RequestOverrides) -> Self {
        Self {
            method: overrides.method.unwrap_or(self.method),
            url: overrides.url.unwrap_or(self.url),
            base_url: overrides.base_url.or(self.base_url),
            headers: overrides.headers.or(self.headers),
            query: overrides.query.unwrap_or(self.query),
            body: overrides.body.or(self.body),
            timeout: overrides.timeout.or(self.timeout),
        }
    }
}

/// Per-call partial request; every present field wins over the stub's value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestOverrides {
    pub method: Option<Method>,
    pub url: Option<String>,
    pub base_url: Option<String>,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(String, String)>>,
    pub body: Option<Value>,
    pub timeout: Option<Duration>,
}

impl RequestOverrides {
    /// Overrides the base URL; an empty string still counts as set.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Overrides the timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replaces the stub's query pairs.
    #[must_use]
    pub fn query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query = Some(pairs);
        self
    }

    /// Replaces the stub's JSON body.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds one header to the override set, which then replaces the stub's
    /// headers entirely.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, ClientError> {
        insert_header(self.headers.get_or_insert_with(HeaderMap::new), name, value)?;
        Ok(self)
    }
}

/// Per-invocation options accepted by every call stub.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallOptions {
    /// Registered instance to dispatch through. Ignored by executors bound
    /// to a single handle.
    pub instance_name: Option<String>,
    pub overrides: Option<RequestOverrides>,
}

impl CallOptions {
    /// Options selecting the registered instance `name`.
    pub fn instance(name: impl Into<String>) -> Self {
        Self {
            instance_name: Some(name.into()),
            overrides: None,
        }
    }

    /// Attaches per-call overrides.
    #[must_use]
    pub fn with_overrides(mut self, overrides: RequestOverrides) -> Self {
        self.overrides = Some(overrides);
        self
    }
}

/// Fully resolved request handed to a [`crate::Transport`].
#[derive(Clone, Debug)]
pub struct PreparedRequest {
    pub method: Method,
    /// Effective base URL including the API family suffix.
    pub base_url: String,
    pub url: String,
    /// Handle defaults overlaid with the request's own headers.
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub timeout: Option<Duration>,
}

impl PreparedRequest {
    /// Joins `base_url` and `url` the way the request will be sent.
    ///
    /// An absolute `url` is used as-is. Otherwise the two are joined with a
    /// single `/`.
    pub fn full_url(&self) -> String {
        if is_absolute(&self.url) {
            return self.url.clone();
        }
        if self.url.is_empty() {
            return self.base_url.clone();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.url.trim_start_matches('/')
        )
    }
}

fn is_absolute(url: &str) -> bool {
    url.split_once("://").is_some_and(|(scheme, _)| {
        !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), ClientError> {
    let name = HeaderName::try_from(name).map_err(|e| ClientError::InvalidHeader(e.to_string()))?;
    headers.insert(name, header_value(value)?);
    Ok(())
}
