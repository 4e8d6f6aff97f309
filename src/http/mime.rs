//! Content-Type lookup by file suffix.

/// Type used when no suffix matches.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Resolves a MIME type from the last `.suffix` of `path`.
///
/// ```
/// # use cookiejar::http::mime::content_type_for;
/// assert_eq!(content_type_for("cookies/index.html"), "text/html");
/// assert_eq!(content_type_for("cookies/42"), "text/plain");
/// ```
pub fn content_type_for(path: &str) -> &'static str {
    let Some(dot) = path.rfind('.') else {
        return DEFAULT_CONTENT_TYPE;
    };

    match &path[dot..] {
        ".csv" => "text/csv",
        ".gif" => "image/gif",
        ".htm" | ".html" => "text/html",
        ".ico" => "image/x-icon",
        ".jpeg" | ".jpg" => "image/jpeg",
        ".js" => "application/javascript",
        ".json" => "application/json",
        ".png" => "image/png",
        ".pdf" => "application/pdf",
        ".svg" => "image/svg+xml",
        ".txt" => "text/plain",
        _ => DEFAULT_CONTENT_TYPE,
    }
}
