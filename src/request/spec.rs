//! Accumulated request configuration and body-encoding selection.

use bytes::Bytes;
use http::Method;
use std::time::Duration;

use crate::config::QueryStyle;
use crate::types::Values;

/// Builder state, consumed by a single dispatch.
#[derive(Debug, Clone, Default)]
pub struct RequestSpec {
    /// Base URL without the query string.
    pub url: String,
    /// Per-request headers; the last value of a name wins.
    pub headers: Values,
    /// Query parameters appended at dispatch time.
    pub query: Values,
    /// Raw body, highest precedence.
    pub raw: Option<Bytes>,
    /// JSON body, sent as `application/json`.
    pub json: Option<Bytes>,
    /// Form fields, URL-encoded or multipart.
    pub form: Values,
    /// Send `form` as `application/x-www-form-urlencoded`.
    pub url_encoded: bool,
    /// Upload file paths, in order.
    pub uploads: Vec<String>,
    /// Timeout; `None` or zero falls back to the configured default.
    pub timeout: Option<Duration>,
}

impl RequestSpec {
    /// Resolves the timeout, falling back to `default` when unset or zero.
    pub fn effective_timeout(&self, default: Duration) -> Duration {
        match self.timeout {
            Some(timeout) if !timeout.is_zero() => timeout,
            _ => default,
        }
    }

    /// Attaches the query parameters to the base URL.
    pub fn full_url(&self, style: QueryStyle) -> String {
        match style {
            QueryStyle::Literal => format!("{}{}", self.url, self.query.join_unescaped()),
            QueryStyle::Standard => {
                if self.query.is_empty() {
                    return self.url.clone();
                }
                // The query goes before any fragment.
                let (base, fragment) = match self.url.split_once('#') {
                    Some((base, fragment)) => (base, Some(fragment)),
                    None => (self.url.as_str(), None),
                };
                let separator = match base.find('?') {
                    None => "?",
                    Some(_) if base.ends_with('?') || base.ends_with('&') => "",
                    Some(_) => "&",
                };
                let mut url = format!("{}{}{}", base, separator, self.query.encode());
                if let Some(fragment) = fragment {
                    url.push('#');
                    url.push_str(fragment);
                }
                url
            }
        }
    }
}

/// The body representation chosen for a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    /// No body.
    None,
    /// Raw bytes, no content type forced.
    Raw,
    /// JSON bytes as `application/json`.
    Json,
    /// Form fields as `application/x-www-form-urlencoded`.
    UrlEncoded,
    /// Form fields and uploads as `multipart/form-data`.
    Multipart,
}

impl BodyEncoding {
    /// Picks the encoding by precedence: GET, raw, JSON, URL-encoded form,
    /// then multipart. The first match wins.
    pub fn select(method: &Method, spec: &RequestSpec) -> Self {
        if method == Method::GET {
            BodyEncoding::None
        } else if spec.raw.is_some() {
            BodyEncoding::Raw
        } else if spec.json.is_some() {
            BodyEncoding::Json
        } else if spec.url_encoded {
            BodyEncoding::UrlEncoded
        } else {
            BodyEncoding::Multipart
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_spec() -> RequestSpec {
        RequestSpec {
            url: "http://example.test".to_string(),
            raw: Some(Bytes::from_static(b"raw")),
            json: Some(Bytes::from_static(b"{}")),
            form: Values::from([("k", "v")]),
            url_encoded: true,
            uploads: vec!["/tmp/file".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_get_never_has_body() {
        assert_eq!(BodyEncoding::select(&Method::GET, &full_spec()), BodyEncoding::None);
        assert_eq!(
            BodyEncoding::select(&Method::GET, &RequestSpec::default()),
            BodyEncoding::None
        );
    }

    #[test]
    fn test_precedence_order() {
        let mut spec = full_spec();
        assert_eq!(BodyEncoding::select(&Method::POST, &spec), BodyEncoding::Raw);

        spec.raw = None;
        assert_eq!(BodyEncoding::select(&Method::POST, &spec), BodyEncoding::Json);

        spec.json = None;
        assert_eq!(BodyEncoding::select(&Method::PUT, &spec), BodyEncoding::UrlEncoded);

        spec.url_encoded = false;
        assert_eq!(BodyEncoding::select(&Method::PATCH, &spec), BodyEncoding::Multipart);
    }

    #[test]
    fn test_empty_spec_is_multipart() {
        assert_eq!(
            BodyEncoding::select(&Method::POST, &RequestSpec::default()),
            BodyEncoding::Multipart
        );
    }

    #[test]
    fn test_lowercase_get_is_not_get() {
        let method = Method::from_bytes(b"get").unwrap();
        assert_eq!(BodyEncoding::select(&method, &full_spec()), BodyEncoding::Raw);
    }

    #[test]
    fn test_effective_timeout() {
        let default = Duration::from_secs(10);
        let mut spec = RequestSpec::default();
        assert_eq!(spec.effective_timeout(default), default);

        spec.timeout = Some(Duration::ZERO);
        assert_eq!(spec.effective_timeout(default), default);

        spec.timeout = Some(Duration::from_secs(3));
        assert_eq!(spec.effective_timeout(default), Duration::from_secs(3));
    }

    #[test]
    fn test_full_url_standard() {
        let mut spec = RequestSpec {
            url: "http://example.test/search".to_string(),
            ..Default::default()
        };
        assert_eq!(spec.full_url(QueryStyle::Standard), "http://example.test/search");

        spec.query = Values::new().with("q", "a b").with("page", "2");
        assert_eq!(
            spec.full_url(QueryStyle::Standard),
            "http://example.test/search?page=2&q=a+b"
        );

        spec.url = "http://example.test/search?lang=en".to_string();
        assert_eq!(
            spec.full_url(QueryStyle::Standard),
            "http://example.test/search?lang=en&page=2&q=a+b"
        );

        spec.url = "http://example.test/search?".to_string();
        assert_eq!(
            spec.full_url(QueryStyle::Standard),
            "http://example.test/search?page=2&q=a+b"
        );
    }

    #[test]
    fn test_full_url_standard_keeps_fragment_last() {
        let mut spec = RequestSpec {
            url: "http://example.test/p#section".to_string(),
            query: Values::from([("q", "1")]),
            ..Default::default()
        };
        assert_eq!(
            spec.full_url(QueryStyle::Standard),
            "http://example.test/p?q=1#section"
        );

        spec.url = "http://example.test/p?lang=en#a?b".to_string();
        assert_eq!(
            spec.full_url(QueryStyle::Standard),
            "http://example.test/p?lang=en&q=1#a?b"
        );

        spec.url = "http://example.test/p#".to_string();
        assert_eq!(spec.full_url(QueryStyle::Standard), "http://example.test/p?q=1#");
    }

    #[test]
    fn test_full_url_literal() {
        let spec = RequestSpec {
            url: "http://example.test/search?".to_string(),
            query: Values::new().with("q", "a b").with("page", "2"),
            ..Default::default()
        };
        assert_eq!(
            spec.full_url(QueryStyle::Literal),
            "http://example.test/search?page=2&q=a b"
        );

        let bare = RequestSpec {
            url: "http://example.test/search".to_string(),
            query: Values::from([("x", "1")]),
            ..Default::default()
        };
        assert_eq!(bare.full_url(QueryStyle::Literal), "http://example.test/searchx=1");
    }
}
