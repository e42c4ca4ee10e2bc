use care_client::ApiError;
use leptos::prelude::*;

#[component]
pub fn Loading(#[prop(into)] label: String) -> impl IntoView {
    view! {
        <div class="loading">
            <div class="spinner"></div>
            {label}
        </div>
    }
}

#[component]
pub fn ErrorNote(#[prop(into)] what: String, error: Option<ApiError>) -> impl IntoView {
    let detail = error.map(|e| e.user_message()).unwrap_or_default();
    view! {
        <div class="card">
            <p class="error">{format!("Could not load {what}. ")} {detail}</p>
        </div>
    }
}

/// What to show for a query with no data yet: its error, or a spinner.
pub fn unavailable(what: &'static str, error: Option<ApiError>) -> AnyView {
    match error {
        Some(error) => view! { <ErrorNote what=what error=Some(error) /> }.into_any(),
        None => view! { <Loading label=format!("Loading {what}...") /> }.into_any(),
    }
}
