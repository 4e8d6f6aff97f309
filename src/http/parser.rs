use crate::http::request::{Method, Request};
use crate::session::SessionId;
use std::collections::HashMap;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Header terminator not seen yet.
    Incomplete,
    /// Headers are complete but fewer than `content_length` body bytes arrived.
    PartialBody {
        header_len: usize,
        content_length: usize,
    },
    MalformedRequestLine,
    InvalidHeader,
    InvalidCookie,
    InvalidContentLength,
}

/// Parses one request from the start of `buf`.
///
/// Returns the request and the number of bytes it occupied. A request line
/// beginning with `GET /` is a read; anything else is a write whose body is
/// either the declared `Content-Length` bytes or, without that header,
/// everything received after the header block.
pub fn parse_http_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    // Look for header/body separator
    let headers_end = find_headers_end(buf).ok_or(ParseError::Incomplete)?;
    let header_len = headers_end + HEADER_TERMINATOR.len();
    let body_bytes = &buf[header_len..];

    let headers_str =
        std::str::from_utf8(&buf[..headers_end]).map_err(|_| ParseError::InvalidHeader)?;

    let mut lines = headers_str.split("\r\n");
    let request_line = lines.next().unwrap_or_default();

    let (method, path, version) = if let Some(rest) = request_line.strip_prefix("GET /") {
        let (path, version) = rest
            .split_once(' ')
            .ok_or(ParseError::MalformedRequestLine)?;
        (Method::GET, path, version.trim())
    } else {
        let mut parts = request_line.split_whitespace();
        let method = parts.next().ok_or(ParseError::MalformedRequestLine)?;
        let path = parts.next().unwrap_or_default();
        let version = parts.next().unwrap_or_default();
        // Only an exact `GET /` prefix reads; e.g. `GET x` still writes.
        (
            Method::Other(method.to_string()),
            path.trim_start_matches('/'),
            version,
        )
    };

    // Headers
    let mut headers = HashMap::new();
    let mut cookie = None;

    for line in lines {
        if line.is_empty() {
            continue;
        }

        let (key, value) = line.split_once(':').ok_or(ParseError::InvalidHeader)?;
        let (key, value) = (key.trim(), value.trim());

        if cookie.is_none() && key.eq_ignore_ascii_case("Cookie") {
            cookie = parse_cookie_id(value)?;
        }

        headers.insert(key.to_string(), value.to_string());
    }

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("Content-Length"))
        .map(|(_, v)| v.parse::<usize>().map_err(|_| ParseError::InvalidContentLength))
        .transpose()?;

    // Body
    let (body, consumed) = match content_length {
        Some(content_length) => {
            if body_bytes.len() < content_length {
                return Err(ParseError::PartialBody {
                    header_len,
                    content_length,
                });
            }
            (&body_bytes[..content_length], header_len + content_length)
        }
        None => (body_bytes, buf.len()),
    };

    let body = if method.is_write() {
        body.to_vec()
    } else {
        Vec::new()
    };

    let request = Request {
        method,
        path: path.to_string(),
        version: version.to_string(),
        headers,
        cookie,
        body,
    };

    Ok((request, consumed))
}

/// Position of the header terminator, if it has arrived.
pub fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
}

/// Extracts the session id from a `Cookie` header value.
///
/// Leading digits after `id=` form the identifier and trailing junk is
/// ignored. A value with no `id=` pair carries no session.
fn parse_cookie_id(value: &str) -> Result<Option<SessionId>, ParseError> {
    let Some(raw) = value
        .split(';')
        .find_map(|pair| pair.trim().strip_prefix("id="))
    else {
        return Ok(None);
    };

    let digits_end = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let digits = &raw[..digits_end];
    if digits.is_empty() {
        return Err(ParseError::InvalidCookie);
    }

    digits
        .parse::<u64>()
        .map(|id| Some(SessionId(id)))
        .map_err(|_| ParseError::InvalidCookie)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let req = b"GET /x HTTP/1.1\r\nHost: example.com\r\n\r\n";

        let (parsed, consumed) = parse_http_request(req).unwrap();

        assert_eq!(parsed.method, Method::GET);
        assert_eq!(parsed.path, "x");
        assert_eq!(parsed.headers.get("Host").unwrap(), "example.com");
        assert_eq!(parsed.cookie, None);
        assert_eq!(consumed, req.len());
    }

    #[test]
    fn cookie_tolerates_trailing_characters() {
        assert_eq!(parse_cookie_id("id=12abc"), Ok(Some(SessionId(12))));
        assert_eq!(parse_cookie_id("theme=dark; id=7"), Ok(Some(SessionId(7))));
        assert_eq!(parse_cookie_id("theme=dark"), Ok(None));
    }

    #[test]
    fn cookie_without_digits_is_rejected() {
        assert_eq!(parse_cookie_id("id=abc"), Err(ParseError::InvalidCookie));
        assert_eq!(parse_cookie_id("id="), Err(ParseError::InvalidCookie));
        assert_eq!(
            parse_cookie_id("id=99999999999999999999999"),
            Err(ParseError::InvalidCookie)
        );
    }
}
