//! Utility functions and helpers.

pub mod http;
pub mod text;

use url::Url;

use crate::error::Result;

/// Resolve an absolute API path against a base origin.
///
/// Any path on the base is replaced, so `https://host/app` + `/api/v1/x`
/// yields `https://host/api/v1/x`.
pub fn endpoint(base: &str, path: &str) -> Result<Url> {
    Ok(Url::parse(base)?.join(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        assert_eq!(
            endpoint("https://example.com", "/api/v1/statuses")
                .unwrap()
                .as_str(),
            "https://example.com/api/v1/statuses"
        );
        assert_eq!(
            endpoint("http://127.0.0.1:8080/", "/api/v1/posts")
                .unwrap()
                .as_str(),
            "http://127.0.0.1:8080/api/v1/posts"
        );
        assert!(endpoint("not a url", "/x").is_err());
    }
}
