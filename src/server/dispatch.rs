//! Request handling: cookie lookup, session writes, echoing the session log.

use crate::http::mime::content_type_for;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::session::{SessionId, SessionStore};

/// Produces the response for a complete request.
///
/// A request without a cookie gets a fresh session. Writes append their body
/// to the session before it is served back.
pub fn dispatch(req: &Request, store: &mut SessionStore) -> Response {
    let id = match req.cookie {
        Some(id) => id,
        None => match store.create() {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to create session");
                return Response::not_found();
            }
        },
    };

    if req.method.is_write() {
        if let Err(e) = store.append(id, &req.body) {
            tracing::warn!(session = %id, error = %e, "Failed to append to session");
        }
    }

    serve_session(store, id)
}

/// 200 streaming the session's log, or 404 when it cannot be opened.
pub fn serve_session(store: &SessionStore, id: SessionId) -> Response {
    match store.read(id) {
        Ok(Some(log)) => {
            let name = id.to_string();
            tracing::info!(session = %id, bytes = log.len, "Serving session");
            Response::session(id, content_type_for(&name), log)
        }
        Ok(None) => {
            tracing::debug!(session = %id, "Session not found");
            Response::not_found()
        }
        Err(e) => {
            tracing::warn!(session = %id, error = %e, "Failed to read session");
            Response::not_found()
        }
    }
}
