use std::sync::Arc;

use care_client::gate::RouteAccess;
use care_client::session::{RestAuthenticator, SessionStore};
use care_client::{ApiClient, ApiConfig, DataClient, QueryClient};
use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::{
    components::{Route, Router, Routes},
    ParamSegment, StaticSegment,
};

use crate::components::guard::Protected;
use crate::components::nav::Nav;
use crate::components::toast::ToastProvider;
use crate::hooks::spawn;
use crate::pages::admin::AdminDashboardPage;
use crate::pages::donate::DonatePage;
use crate::pages::donors::DonorsPage;
use crate::pages::event_details::EventDetailsPage;
use crate::pages::events::EventsPage;
use crate::pages::home::HomePage;
use crate::pages::leaderboard::LeaderboardPage;
use crate::pages::login::LoginPage;
use crate::pages::my_dashboard::MyDashboardPage;
use crate::storage::BrowserTokens;

pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8" />
                <meta name="viewport" content="width=device-width, initial-scale=1" />
                <AutoReload options=options.clone() />
                <HydrationScripts options />
                <MetaTags />
            </head>
            <body>
                <App />
            </body>
        </html>
    }
}

#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    // The server passes its configured backend; the browser uses the build-time one.
    let config = use_context::<ApiConfig>().unwrap_or_else(ApiConfig::from_build_env);
    let api = ApiClient::new(&config);
    let data = DataClient::new(api.clone(), QueryClient::new());
    let store = SessionStore::new(Arc::new(RestAuthenticator::new(api)), data.clone())
        .with_tokens(Arc::new(BrowserTokens));

    let (sessionState, setSessionState) = signal(store.state());
    store.on_change(move |state| {
        let _ = setSessionState.try_set(state.clone());
    });

    provide_context(data);
    provide_context(store.clone());
    provide_context(sessionState);

    spawn(async move {
        store.restore().await;
    });

    view! {
        <Stylesheet id="leptos" href="/pkg/care-console.css" />
        <Title text="PlanetCare" />
        <ToastProvider>
            <Router>
                <Routes fallback=|| view! { <p>"Page not found."</p> }.into_any()>
                    <Route
                        path=StaticSegment("")
                        view=|| view! { <Layout><HomePage /></Layout> }
                    />
                    <Route
                        path=StaticSegment("login")
                        view=|| view! { <Layout><LoginPage /></Layout> }
                    />
                    <Route
                        path=StaticSegment("events")
                        view=|| view! { <Layout><EventsPage /></Layout> }
                    />
                    <Route
                        path=(StaticSegment("events"), ParamSegment("id"))
                        view=|| view! { <Layout><EventDetailsPage /></Layout> }
                    />
                    <Route
                        path=StaticSegment("leaderboard")
                        view=|| view! { <Layout><LeaderboardPage /></Layout> }
                    />
                    <Route
                        path=StaticSegment("donors")
                        view=|| view! { <Layout><DonorsPage /></Layout> }
                    />
                    <Route
                        path=StaticSegment("donate")
                        view=|| {
                            view! {
                                <Layout>
                                    <Protected access=RouteAccess::Authenticated>
                                        <DonatePage />
                                    </Protected>
                                </Layout>
                            }
                        }
                    />
                    <Route
                        path=StaticSegment("my-dashboard")
                        view=|| {
                            view! {
                                <Layout>
                                    <Protected access=RouteAccess::Authenticated>
                                        <MyDashboardPage />
                                    </Protected>
                                </Layout>
                            }
                        }
                    />
                    <Route
                        path=StaticSegment("dashboard")
                        view=|| {
                            view! {
                                <Layout>
                                    <Protected access=RouteAccess::Admin>
                                        <AdminDashboardPage />
                                    </Protected>
                                </Layout>
                            }
                        }
                    />
                </Routes>
            </Router>
        </ToastProvider>
    }
}

#[component]
fn Layout(children: Children) -> impl IntoView {
    view! {
        <div class="app-layout">
            <Nav />
            <main class="main-content">{children()}</main>
        </div>
    }
}
