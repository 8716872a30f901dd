//! Server URL normalisation.

/// Route suffix users often paste along with the base URL.
const STORY_ROUTE: &str = "/generate_story";

/// Turn user input into a usable base URL, or `None` when it is blank.
///
/// * strips a leading `file://`
/// * prepends `https://` when no `http(s)://` scheme is present
/// * cuts everything from `/generate_story` onwards
/// * drops trailing slashes
///
/// ```
/// use story_frames::api::normalize_server_url;
///
/// assert_eq!(
///     normalize_server_url("1234-abcd.ngrok-free.app/generate_story").as_deref(),
///     Some("https://1234-abcd.ngrok-free.app"),
/// );
/// assert_eq!(normalize_server_url("   "), None);
/// ```
pub fn normalize_server_url(input: &str) -> Option<String> {
    let mut url = input.trim();
    if url.is_empty() {
        return None;
    }

    if let Some(rest) = url.strip_prefix("file://") {
        url = rest;
    }

    let mut owned = if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    };

    if let Some(idx) = owned.find(STORY_ROUTE) {
        owned.truncate(idx);
    }

    while owned.ends_with('/') {
        owned.pop();
    }

    Some(owned)
}

/// Join a base URL and an absolute route without doubling slashes.
pub fn join_route(base_url: &str, route: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        route.trim_start_matches('/')
    )
}
