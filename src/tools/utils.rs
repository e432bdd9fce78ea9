/// Schemes passed through untouched
const KNOWN_SCHEMES: &[&str] = &[
    "http://",
    "https://",
    "file://",
    "data:",
    "about:",
    "chrome://",
    "chrome-extension://",
];

/// Hosts that are almost always a local dev server speaking plain HTTP
const LOCAL_HOSTS: &[&str] = &["localhost", "127.0.0.1", "0.0.0.0", "[::1]"];

/// Complete a URL typed by hand: dev-server hosts get `http://`, anything
/// that looks like a domain gets `https://`, a bare word becomes
/// `https://www.<word>.com`. Relative paths are kept.
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();

    if KNOWN_SCHEMES.iter().any(|scheme| trimmed.starts_with(scheme)) {
        return trimmed.to_string();
    }

    if trimmed.starts_with('/') || trimmed.starts_with("./") || trimmed.starts_with("../") {
        return trimmed.to_string();
    }

    let host = trimmed
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host_name = host.rsplit_once(':').map_or(host, |(name, port)| {
        if port.chars().all(|c| c.is_ascii_digit()) { name } else { host }
    });
    if LOCAL_HOSTS.contains(&host_name) {
        return format!("http://{}", trimmed);
    }

    if trimmed.contains('.') {
        return format!("https://{}", trimmed);
    }

    format!("https://www.{}.com", trimmed)
}
