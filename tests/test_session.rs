use cookiejar::session::{SessionId, SessionStore};
use std::io::Read;

/// Whole log contents, or `None` when the session has no log.
fn contents(store: &SessionStore, id: SessionId) -> Option<Vec<u8>> {
    let mut log = store.read(id).unwrap()?;
    let mut bytes = Vec::new();
    log.file.read_to_end(&mut bytes).unwrap();
    assert_eq!(bytes.len() as u64, log.len);
    Some(bytes)
}

#[test]
fn test_create_starts_at_one_and_increases() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = SessionStore::open(dir.path()).unwrap();

    let ids: Vec<SessionId> = (0..5).map(|_| store.create().unwrap()).collect();

    assert_eq!(ids, (1..=5).map(SessionId).collect::<Vec<_>>());
    for id in ids {
        assert_eq!(contents(&store, id), Some(Vec::new()));
    }
}

#[test]
fn test_open_creates_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("nested").join("cookies");

    let mut store = SessionStore::open(&root).unwrap();

    assert!(root.is_dir());
    assert_eq!(store.create().unwrap(), SessionId(1));
    assert_eq!(store.path_of(SessionId(1)), root.join("1"));
}

#[test]
fn test_numbering_resumes_after_existing_logs() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("3"), b"old").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

    let mut store = SessionStore::open(dir.path()).unwrap();

    assert_eq!(store.create().unwrap(), SessionId(4));
    assert_eq!(contents(&store, SessionId(3)), Some(b"old".to_vec()));
}

#[test]
fn test_create_skips_logs_that_appear_later() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = SessionStore::open(dir.path()).unwrap();
    std::fs::write(dir.path().join("1"), b"taken").unwrap();

    assert_eq!(store.create().unwrap(), SessionId(2));
    assert_eq!(contents(&store, SessionId(1)), Some(b"taken".to_vec()));
}

#[test]
fn test_append_accumulates() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = SessionStore::open(dir.path()).unwrap();
    let id = store.create().unwrap();

    store.append(id, b"hello").unwrap();
    store.append(id, b" world").unwrap();

    assert_eq!(contents(&store, id), Some(b"hello world".to_vec()));
    // Reading does not consume anything.
    assert_eq!(contents(&store, id), Some(b"hello world".to_vec()));
}

#[test]
fn test_append_recreates_missing_log_of_issued_session() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = SessionStore::open(dir.path()).unwrap();
    let id = store.create().unwrap();
    std::fs::remove_file(store.path_of(id)).unwrap();

    store.append(id, b"late").unwrap();

    assert_eq!(contents(&store, id), Some(b"late".to_vec()));
}

#[test]
fn test_append_refuses_identifiers_never_issued() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = SessionStore::open(dir.path()).unwrap();
    let issued = store.create().unwrap();

    assert!(store.is_issued(issued));
    for id in [SessionId(0), SessionId(2), SessionId(u64::MAX)] {
        assert!(!store.is_issued(id));
        assert!(store.append(id, b"x").is_err());
        assert!(!store.path_of(id).exists());
    }
}

#[test]
fn test_maximal_cookie_cannot_poison_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut store = SessionStore::open(dir.path()).unwrap();
        store.create().unwrap();
        assert!(store.append(SessionId(u64::MAX), b"hello").is_err());
    }

    let mut reopened = SessionStore::open(dir.path()).unwrap();
    assert_eq!(reopened.create().unwrap(), SessionId(2));
}

#[test]
fn test_exhausted_identifier_space_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(u64::MAX.to_string()), b"").unwrap();

    assert!(SessionStore::open(dir.path()).is_err());
}

#[test]
fn test_create_never_hands_out_the_last_identifier() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join((u64::MAX - 1).to_string()), b"").unwrap();
    let mut store = SessionStore::open(dir.path()).unwrap();

    assert!(store.create().is_err());
    assert!(!store.path_of(SessionId(u64::MAX)).exists());
}

#[test]
fn test_read_missing_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::open(dir.path()).unwrap();

    assert!(store.read(SessionId(1)).unwrap().is_none());
}

#[test]
fn test_session_id_display() {
    assert_eq!(SessionId(42).to_string(), "42");
    assert!(SessionId(1) < SessionId(2));
}
