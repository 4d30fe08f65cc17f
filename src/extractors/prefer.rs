//! Extract representation preferences from `Accept`, `Prefer` and `Range` headers.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

/// `Accept` marker selecting a single JSON object instead of an array.
pub const SINGLE_OBJECT_MARKER: &str = ".object";

/// `Prefer` token asking for the exact total in `Content-Range`.
pub const COUNT_EXACT: &str = "count=exact";

#[derive(Clone, Debug, Default)]
pub struct Preferences {
    pub single_object: bool,
    pub count_exact: bool,
    /// Raw `Range` header, parsed when the window is resolved.
    pub range: Option<String>,
}

impl Preferences {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let text = |name: header::HeaderName| {
            headers
                .get_all(name)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .collect::<Vec<_>>()
                .join(",")
        };
        let count_exact = text(header::HeaderName::from_static("prefer"))
            .split(',')
            .any(|token| token.trim() == COUNT_EXACT);
        let range = headers
            .get(header::RANGE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Preferences {
            single_object: text(header::ACCEPT).contains(SINGLE_OBJECT_MARKER),
            count_exact,
            range,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Preferences
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Preferences::from_headers(&parts.headers))
    }
}
