//! Environment configuration: one base URL selects the API and hub host.

/// Development default, used when `MOTORBAY_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "http://localhost:5099";

/// Resolve the API base URL.
///
/// The value is baked in at build time for wasm; the native build also
/// consults the process environment so the test suite can retarget it.
pub fn api_base_url() -> String {
    if let Some(url) = option_env!("MOTORBAY_API_URL") {
        if !url.trim().is_empty() {
            return url.trim_end_matches('/').to_string();
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    if let Ok(url) = std::env::var("MOTORBAY_API_URL") {
        if !url.trim().is_empty() {
            return url.trim_end_matches('/').to_string();
        }
    }

    DEFAULT_API_URL.to_string()
}

/// Join a path onto a base URL.
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

/// Convert an HTTP/HTTPS URL to WS/WSS.
pub fn http_to_ws(url: &str) -> String {
    if url.starts_with("https://") {
        url.replacen("https://", "wss://", 1)
    } else if url.starts_with("http://") {
        url.replacen("http://", "ws://", 1)
    } else {
        url.to_string()
    }
}

/// Build a hub URL for `path` on `base`, carrying the access token as a
/// connection parameter. The transport is a bidirectional socket with
/// no per-frame headers, so the token travels in the query string.
pub fn hub_url(base: &str, path: &str, access_token: &str) -> String {
    format!(
        "{}?access_token={}",
        http_to_ws(&join_url(base, path)),
        urlencoding::encode(access_token)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_handles_slashes() {
        assert_eq!(join_url("http://h:1/", "/api/cars"), "http://h:1/api/cars");
        assert_eq!(join_url("http://h:1", "api/cars"), "http://h:1/api/cars");
    }

    #[test]
    fn hub_url_switches_scheme_and_encodes_token() {
        let url = hub_url("https://api.motorbay.test", "/hubs/chat", "a b+c");
        assert_eq!(
            url,
            "wss://api.motorbay.test/hubs/chat?access_token=a%20b%2Bc"
        );
    }
}
