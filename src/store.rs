use crate::{FormTokens, SessionId, SessionIdRef};
use std::{collections::HashMap, sync::Mutex};
use triomphe::Arc;

/// Session-scoped persistence for the [`FormTokens`] tree.
///
/// The closure runs with exclusive access to the named session's tree:
/// the generate and validate read-modify-write sequences must not
/// interleave with other accesses to the same session (two tabs, a
/// double-submit race), and implementations provide that serialization —
/// a mutex here, a session lock or a transaction in a backed store.
pub trait SessionStore {
    fn with_tokens<F, T>(&self, session_id: &SessionIdRef, f: F) -> T
    where
        F: FnOnce(&mut FormTokens) -> T;
}

impl<S> SessionStore for &S
where
    S: SessionStore,
{
    fn with_tokens<F, T>(&self, session_id: &SessionIdRef, f: F) -> T
    where
        F: FnOnce(&mut FormTokens) -> T,
    {
        (**self).with_tokens(session_id, f)
    }
}

/// In-process [`SessionStore`] backend.
///
/// A cheap `Clone` handle over shared state; clones address the same
/// sessions. Per-session trees are created lazily and live until the
/// store is dropped — session expiry belongs to the host.
#[derive(Clone)]
pub struct InMemoryStore {
    inner: Arc<Mutex<HashMap<SessionId, FormTokens>>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl SessionStore for InMemoryStore {
    fn with_tokens<F, T>(&self, session_id: &SessionIdRef, f: F) -> T
    where
        F: FnOnce(&mut FormTokens) -> T,
    {
        let mut guard = self.inner.lock().unwrap();
        f(guard.entry(session_id.to_owned()).or_default())
    }
}
