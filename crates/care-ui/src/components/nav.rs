use care_types::Role;
use leptos::prelude::*;

use crate::components::toast::use_toasts;
use crate::hooks::{spawn, use_session, use_session_store, use_user_role};

#[component]
pub fn Nav() -> impl IntoView {
    let session = use_session();
    let role = use_user_role().role;
    let store = use_session_store();
    let toasts = use_toasts();

    let signedIn = move || session.with(|s| s.identity.is_some());
    let userName = move || {
        session.with(|s| {
            s.identity
                .as_ref()
                .map(|i| i.name_or_handle())
                .unwrap_or_default()
        })
    };

    let signOut = move |_: leptos::ev::MouseEvent| {
        let store = store.clone();
        spawn(async move {
            store.sign_out().await;
            toasts.success("Signed out");
        });
    };

    view! {
        <nav class="nav-bar">
            <a href="/" class="nav-brand">
                <span class="brand-icon">"\u{1F30D}"</span>
                <span class="brand-text">"PlanetCare"</span>
            </a>
            <ul class="nav-links">
                <li><a href="/events">"Events"</a></li>
                <li><a href="/leaderboard">"Leaderboard"</a></li>
                <li><a href="/donors">"Donors"</a></li>
                <Show when=signedIn>
                    <li><a href="/donate">"Donate"</a></li>
                    <li><a href="/my-dashboard">"My Dashboard"</a></li>
                </Show>
                <Show when=move || role.get() == Some(Role::Admin)>
                    <li><a href="/dashboard">"Admin"</a></li>
                </Show>
            </ul>
            <div class="nav-session">
                <Show
                    when=signedIn
                    fallback=|| view! { <a href="/login" class="btn btn-primary btn-sm">"Log in"</a> }
                >
                    <span class="nav-user">
                        {userName}
                        {move || role.get().map(|r| view! { <span class="role-badge">{r.label()}</span> })}
                    </span>
                    <button class="btn btn-ghost btn-sm" on:click=signOut.clone()>
                        "Log out"
                    </button>
                </Show>
            </div>
        </nav>
    }
}
