//! URL utilities for building Ollama endpoints
//!
//! Servers are registered as a host URL plus a port. These helpers join the
//! two into a base URL and append API paths without doubling slashes.

/// Normalize a base URL by removing trailing slashes
///
/// # Examples
///
/// ```
/// use ollama_chat::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:11434"), "http://localhost:11434");
/// assert_eq!(normalize_base_url("http://localhost:11434/"), "http://localhost:11434");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Join a registered server's URL and port into the base address used for
/// every API call, e.g. `http://localhost` + `11434` → `http://localhost:11434`.
///
/// ```
/// use ollama_chat::utils::url::server_base_url;
///
/// assert_eq!(server_base_url("http://localhost", 11434), "http://localhost:11434");
/// assert_eq!(server_base_url("http://gpu-box/", 8080), "http://gpu-box:8080");
/// ```
pub fn server_base_url(url: &str, port: u16) -> String {
    format!("{}:{}", normalize_base_url(url), port)
}

/// Construct a complete API endpoint URL from a base URL and endpoint path
///
/// ```
/// use ollama_chat::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:11434", "api/tags"),
///     "http://localhost:11434/api/tags"
/// );
/// assert_eq!(
///     construct_api_url("http://localhost:11434/", "/api/chat"),
///     "http://localhost:11434/api/chat"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}
