use cookiejar::http::parser::parse_http_request;
use cookiejar::http::request::{Method, RequestBuilder};
use cookiejar::http::response::{Response, StatusCode};
use cookiejar::http::writer::{ResponseWriter, serialize_head};
use cookiejar::server::dispatch::{dispatch, serve_session};
use cookiejar::session::{SessionId, SessionStore};

fn store() -> (tempfile::TempDir, SessionStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::open(dir.path()).unwrap();
    (dir, store)
}

fn handle(store: &mut SessionStore, raw: &[u8]) -> Response {
    let (request, _) = parse_http_request(raw).unwrap();
    dispatch(&request, store)
}

/// Everything after the header block, as a client would receive it.
fn body_of(response: Response) -> Vec<u8> {
    let head_len = serialize_head(&response).len();
    let mut out = Vec::new();
    let mut writer = ResponseWriter::new(response);
    assert!(writer.write_to_stream(&mut out).unwrap());
    out.split_off(head_len)
}

fn stored(store: &SessionStore, id: SessionId) -> Option<Vec<u8>> {
    store
        .read(id)
        .unwrap()
        .map(|_| std::fs::read(store.path_of(id)).unwrap())
}

#[test]
fn test_get_without_cookie_mints_session() {
    let (_dir, mut store) = store();

    let first = handle(&mut store, b"GET /x HTTP/1.1\r\n\r\n");
    let second = handle(&mut store, b"GET /x HTTP/1.1\r\n\r\n");

    assert_eq!(first.status, StatusCode::Ok);
    assert_eq!(first.header("Set-Cookie"), Some("id=1"));
    assert_eq!(first.header("Content-Length"), Some("0"));
    assert_eq!(first.header("Content-Type"), Some("text/plain"));
    assert_eq!(first.body.len(), 0);
    assert_eq!(second.header("Set-Cookie"), Some("id=2"));
}

#[test]
fn test_cookie_session_scenario() {
    let (_dir, mut store) = store();

    let created = handle(&mut store, b"GET /x HTTP/1.1\r\n\r\n");
    assert_eq!(created.header("Set-Cookie"), Some("id=1"));

    let written = handle(
        &mut store,
        b"POST /x HTTP/1.1\r\nCookie: id=1\r\n\r\nhello",
    );
    assert_eq!(written.status, StatusCode::Ok);
    assert_eq!(written.header("Content-Length"), Some("5"));
    assert_eq!(body_of(written), b"hello".to_vec());

    let read = handle(&mut store, b"GET /x HTTP/1.1\r\nCookie: id=1\r\n\r\n");
    assert_eq!(read.status, StatusCode::Ok);
    assert_eq!(read.header("Set-Cookie"), Some("id=1"));
    assert_eq!(body_of(read), b"hello".to_vec());
}

#[test]
fn test_writes_append_to_previous_content() {
    let (_dir, mut store) = store();
    let id = store.create().unwrap();

    for chunk in ["one", "two", "three"] {
        let request = RequestBuilder::new()
            .method(Method::parse("PUT"))
            .cookie(id)
            .body(chunk)
            .build()
            .unwrap();
        dispatch(&request, &mut store);
    }

    let response = serve_session(&store, id);
    assert_eq!(body_of(response), b"onetwothree".to_vec());
}

#[test]
fn test_write_without_cookie_creates_session_with_body() {
    let (_dir, mut store) = store();

    let response = handle(&mut store, b"POST /x HTTP/1.1\r\nContent-Length: 4\r\n\r\ndata");

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.header("Set-Cookie"), Some("id=1"));
    assert_eq!(body_of(response), b"data".to_vec());
    assert_eq!(stored(&store, SessionId(1)), Some(b"data".to_vec()));
}

#[test]
fn test_get_unknown_cookie_is_not_found() {
    let (_dir, mut store) = store();

    let response = handle(&mut store, b"GET /x HTTP/1.1\r\nCookie: id=77\r\n\r\n");

    assert_eq!(response.status, StatusCode::NotFound);
    assert_eq!(body_of(response), b"Not Found".to_vec());
}

#[test]
fn test_write_to_never_issued_cookie_is_not_found() {
    let (_dir, mut store) = store();

    let response = handle(&mut store, b"POST /x HTTP/1.1\r\nCookie: id=5\r\n\r\nlate");

    assert_eq!(response.status, StatusCode::NotFound);
    assert_eq!(stored(&store, SessionId(5)), None);
    // The counter is untouched by the stray cookie.
    assert_eq!(store.create().unwrap(), SessionId(1));
}

#[test]
fn test_write_recreates_deleted_log_of_issued_session() {
    let (_dir, mut store) = store();
    let id = store.create().unwrap();
    std::fs::remove_file(store.path_of(id)).unwrap();

    let response = handle(&mut store, b"POST /x HTTP/1.1\r\nCookie: id=1\r\n\r\nback");

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.header("Set-Cookie"), Some("id=1"));
    assert_eq!(body_of(response), b"back".to_vec());
}

#[test]
fn test_maximal_cookie_write_keeps_numbering_monotonic() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut store = SessionStore::open(dir.path()).unwrap();
        let raw = format!("POST /x HTTP/1.1\r\nCookie: id={}\r\n\r\nhi", u64::MAX);

        let response = handle(&mut store, raw.as_bytes());

        assert_eq!(response.status, StatusCode::NotFound);
        assert!(!store.path_of(SessionId(u64::MAX)).exists());
    }

    let mut restarted = SessionStore::open(dir.path()).unwrap();
    let fresh = handle(&mut restarted, b"GET /x HTTP/1.1\r\n\r\n");
    assert_eq!(fresh.header("Set-Cookie"), Some("id=1"));
}

#[test]
fn test_rereading_is_stable() {
    let (_dir, mut store) = store();
    let id = store.create().unwrap();
    store.append(id, b"abc").unwrap();

    let first = serve_session(&store, id);
    let second = serve_session(&store, id);

    assert_eq!(first.header("Content-Length"), Some("3"));
    assert_eq!(body_of(first), body_of(second));
}
