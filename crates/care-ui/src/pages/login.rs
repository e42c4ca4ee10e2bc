use care_client::session::Provider;
use care_client::ApiResult;
use care_types::Identity;
use leptos::prelude::*;
use leptos_router::hooks::{use_navigate, use_query_map};
use leptos_router::NavigateOptions;

use crate::components::toast::use_toasts;
use crate::hooks::{spawn, use_session_store};

/// Only same-site paths are followed. `//host` is protocol-relative and
/// `/\host` is treated the same way by browsers.
fn local_destination(from: Option<String>) -> String {
    from.filter(|path| {
        path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\")
    })
    .unwrap_or_else(|| "/".to_string())
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let store = use_session_store();
    let toasts = use_toasts();
    let query = use_query_map();
    let navigate = use_navigate();

    let (email, setEmail) = signal(String::new());
    let (password, setPassword) = signal(String::new());
    let (errorMessage, setErrorMessage) = signal(None::<String>);
    let (pending, setPending) = signal(false);

    // Back to the page that sent us here, or home.
    let destination = move || local_destination(query.with_untracked(|q| q.get("from")));

    let finish = move |result: ApiResult<Identity>| {
        let _ = setPending.try_set(false);
        match result {
            Ok(identity) => {
                toasts.success(format!("Welcome, {}!", identity.name_or_handle()));
                navigate(&destination(), NavigateOptions::default());
            }
            Err(error) => {
                let _ = setErrorMessage.try_set(Some(error.user_message()));
            }
        }
    };

    let submit = {
        let store = store.clone();
        let finish = finish.clone();
        move |ev: leptos::ev::SubmitEvent| {
            ev.prevent_default();
            setPending.set(true);
            setErrorMessage.set(None);
            let store = store.clone();
            let finish = finish.clone();
            let (address, secret) = (email.get_untracked(), password.get_untracked());
            spawn(async move {
                finish(store.sign_in_with_password(&address, &secret).await);
            });
        }
    };

    let withGoogle = move |_: leptos::ev::MouseEvent| {
        setPending.set(true);
        setErrorMessage.set(None);
        let store = store.clone();
        let finish = finish.clone();
        spawn(async move {
            finish(store.sign_in_with_provider(Provider::Google).await);
        });
    };

    view! {
        <div class="login-page">
            <div class="login-card">
                <div class="login-header">
                    <div class="login-icon">"\u{1F30D}"</div>
                    <h1>"Welcome back"</h1>
                    <p>"Log in to volunteer, donate and track your impact"</p>
                </div>

                {move || errorMessage.get().map(|m| view! { <div class="login-error">{m}</div> })}

                <form on:submit=submit>
                    <div class="form-group">
                        <label for="email">"Email"</label>
                        <input
                            type="email"
                            id="email"
                            required
                            prop:value=email
                            on:input=move |ev| setEmail.set(event_target_value(&ev))
                        />
                    </div>
                    <div class="form-group">
                        <label for="password">"Password"</label>
                        <input
                            type="password"
                            id="password"
                            required
                            prop:value=password
                            on:input=move |ev| setPassword.set(event_target_value(&ev))
                        />
                    </div>
                    <button type="submit" class="btn btn-primary" disabled=move || pending.get()>
                        "Log in"
                    </button>
                </form>
                <div class="login-divider">"or"</div>
                <button class="btn btn-ghost" disabled=move || pending.get() on:click=withGoogle>
                    "Continue with Google"
                </button>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::local_destination;

    #[test]
    fn follows_only_local_paths() {
        assert_eq!(local_destination(Some("/my-dashboard".into())), "/my-dashboard");
        assert_eq!(local_destination(Some("/events/e1?tab=comments".into())), "/events/e1?tab=comments");
        assert_eq!(local_destination(None), "/");
        assert_eq!(local_destination(Some("https://evil.example".into())), "/");
        assert_eq!(local_destination(Some("//evil.example".into())), "/");
        assert_eq!(local_destination(Some("/\\evil.example".into())), "/");
    }
}
