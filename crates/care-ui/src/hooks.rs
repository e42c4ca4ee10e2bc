//! Bridges between the client crate and Leptos reactivity.

use std::future::Future;

use care_client::cache::{QueryResult, QueryState, QueryStatus, ReadOptions, Subscription};
use care_client::gate::{role_from_state, role_pending};
use care_client::session::{SessionState, SessionStore};
use care_client::{queries, DataClient, Query};
use care_types::{Role, Session};
use leptos::prelude::*;
use serde::de::DeserializeOwned;

/// Runs `task` in the browser. Server rendering never touches the backend.
pub fn spawn<F>(task: F)
where
    F: Future<Output = ()> + 'static,
{
    #[cfg(feature = "hydrate")]
    wasm_bindgen_futures::spawn_local(task);
    #[cfg(not(feature = "hydrate"))]
    drop(task);
}

pub fn use_data() -> DataClient {
    expect_context::<DataClient>()
}

pub fn use_session_store() -> SessionStore {
    expect_context::<SessionStore>()
}

pub fn use_session() -> ReadSignal<SessionState> {
    expect_context::<ReadSignal<SessionState>>()
}

/// Signed-in email, if any.
pub fn use_email() -> Signal<Option<String>> {
    let session = use_session();
    Signal::derive(move || session.with(|s| s.identity.as_ref().map(|i| i.email.clone())))
}

/// Live view of the cache entry named by `query`.
///
/// `query` is tracked: when it returns a different key the old subscription
/// is dropped and the new key is read. `None` disables the read. Stale
/// entries are refetched while the view is mounted.
pub fn use_query_state<Q>(query: Q) -> ReadSignal<Option<QueryState>>
where
    Q: Fn() -> Option<Query> + 'static,
{
    let data = use_data();
    let (state, setState) = signal(None::<QueryState>);
    // Dropped with the owner, which unsubscribes the listener.
    let subscription = StoredValue::new(None::<Subscription>);

    Effect::new(move |_| {
        subscription.set_value(None);
        let Some(current) = query() else {
            setState.set(None);
            return;
        };

        let cache = data.cache().clone();
        setState.set(Some(cache.snapshot(&current.key)));

        let refresh = data.clone();
        let watched = current.clone();
        let sub = cache.subscribe(&current.key, move |next| {
            let _ = setState.try_set(Some(next.clone()));
            if next.status == QueryStatus::Stale {
                let refresh = refresh.clone();
                let watched = watched.clone();
                spawn(async move {
                    refresh.read(&watched, ReadOptions::default()).await;
                });
            }
        });
        subscription.set_value(Some(sub));

        let data = data.clone();
        spawn(async move {
            data.read(&current, ReadOptions::default()).await;
        });
    });

    state
}

/// Typed [`use_query_state`].
pub fn use_query<T, Q>(query: Q) -> Signal<QueryResult<T>>
where
    T: DeserializeOwned + Send + Sync + 'static,
    Q: Fn() -> Option<Query> + 'static,
{
    let state = use_query_state(query);
    Signal::derive(move || {
        state.with(|s| match s {
            Some(s) => s.decode(),
            None => QueryResult::idle(),
        })
    })
}

#[derive(Clone, Copy)]
pub struct RoleSignals {
    pub role: Signal<Option<Role>>,
    /// True while an identity is known but its role has not settled.
    pub pending: Signal<bool>,
}

pub fn use_user_role() -> RoleSignals {
    let email = use_email();
    let state = use_query_state(move || email.get().map(|e| queries::user_role(&e)));

    // A state for a previous user's key counts as not yet loaded.
    let current = move || {
        let expected = email.get().map(|e| queries::user_role(&e).key);
        state.get().filter(|s| Some(&s.key) == expected.as_ref())
    };

    RoleSignals {
        role: Signal::derive(move || current().as_ref().and_then(role_from_state)),
        pending: Signal::derive(move || {
            let hasIdentity = email.with(Option::is_some);
            match current() {
                Some(s) => role_pending(hasIdentity, &s),
                None => hasIdentity,
            }
        }),
    }
}

/// Session with the role folded in, for views that branch on it.
pub fn use_current_session() -> Signal<Session> {
    let session = use_session();
    let role = use_user_role().role;
    Signal::derive(move || Session {
        identity: session.with(|s| s.identity.clone()),
        role: role.get(),
    })
}
