//! URL helpers for consistent endpoint construction.

/// Strip trailing slashes so endpoint joins never produce `//`.
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path with exactly one slash between.
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        normalize_base_url(base_url),
        endpoint.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_removed() {
        assert_eq!(
            normalize_base_url("https://example.com/v1beta/"),
            "https://example.com/v1beta"
        );
        assert_eq!(
            normalize_base_url("https://example.com/v1beta///"),
            "https://example.com/v1beta"
        );
        assert_eq!(
            normalize_base_url("https://example.com/v1beta"),
            "https://example.com/v1beta"
        );
    }

    #[test]
    fn joins_never_double_the_slash() {
        assert_eq!(
            construct_api_url("https://example.com/v1beta/", "/models/m:generateContent"),
            "https://example.com/v1beta/models/m:generateContent"
        );
        assert_eq!(
            construct_api_url("https://example.com/v1beta", "models/m:generateContent"),
            "https://example.com/v1beta/models/m:generateContent"
        );
    }
}
