//! API utilities for frontend-backend communication

/// Base URL for API requests: the origin the app was served from.
///
/// Empty string if window is not available, which leaves paths relative.
pub fn api_base() -> String {
    web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_default()
}

/// Build a full API URL from a path starting with "/api/"
pub fn api_url(path: &str) -> String {
    format!("{}{}", api_base(), path)
}
