use care_client::gate::{evaluate, GateDecision, RouteAccess};
use care_types::Session;
use leptos::prelude::*;
use leptos_router::components::Redirect;
use leptos_router::hooks::use_location;

use crate::hooks::{use_session, use_user_role};

/// Renders `children` only when the gate authorizes the current session.
#[component]
pub fn Protected(access: RouteAccess, children: ChildrenFn) -> impl IntoView {
    let session = use_session();
    let role = use_user_role();
    let pathname = use_location().pathname;

    let decision = Memo::new(move |_| {
        let state = session.get();
        let current = Session {
            identity: state.identity,
            role: role.role.get(),
        };
        evaluate(access, &current, state.loading, role.pending.get())
    });

    move || match decision.get() {
        GateDecision::CheckingSession => view! {
            <div class="loading">
                <div class="spinner"></div>
                "Checking your session..."
            </div>
        }
        .into_any(),
        GateDecision::Authorized => children().into_any(),
        redirect => {
            let target = redirect
                .redirect_path(&pathname.get_untracked())
                .unwrap_or_else(|| "/".to_string());
            view! { <Redirect path=target /> }.into_any()
        }
    }
}
