#![allow(non_snake_case)]

#[cfg_attr(not(feature = "ssr"), allow(dead_code))]
mod config;

#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use axum::Router;
    use leptos::prelude::*;
    use leptos_axum::{generate_route_list, LeptosRoutes};
    use care_ui::{shell, App};
    use tower_http::trace::TraceLayer;
    use tracing_subscriber::{fmt, EnvFilter};

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let configPath = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|idx| args.get(idx + 1).cloned())
        .unwrap_or_else(|| "config.example.toml".into());

    let appConfig = config::load_or_default(&configPath);
    tracing::info!(
        config = %configPath,
        api = %appConfig.api.base_url,
        "loaded configuration"
    );

    let conf = get_configuration(None)?;
    let leptosOptions = conf.leptos_options;
    let routes = generate_route_list(App);

    let app = Router::new()
        .leptos_routes_with_context(
            &leptosOptions,
            routes,
            {
                let apiConfig = appConfig.api.clone();
                move || provide_context(apiConfig.clone())
            },
            {
                let leptosOptions = leptosOptions.clone();
                move || shell(leptosOptions.clone())
            },
        )
        .fallback(leptos_axum::file_and_error_handler(shell))
        .with_state(leptosOptions)
        .layer(TraceLayer::new_for_http());

    let addr = appConfig.server.address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("listening on {addr}");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

#[cfg(not(feature = "ssr"))]
fn main() {}
