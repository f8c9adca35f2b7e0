#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() {
    use ataraxia_backend::BackendClient;
    use ataraxia_server::{
        app::App,
        auth::{self, AppState},
        config::ServerConfig,
    };
    use axum::Router;
    use leptos::prelude::*;
    use leptos_axum::{LeptosRoutes, generate_route_list};
    use std::sync::Arc;
    use tower_http::services::ServeDir;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!(
        public_url = %config.public_url,
        callback = config.auth.callback_variant.path(),
        "Loaded configuration"
    );

    let backend = Arc::new(BackendClient::new(&config.backend).expect("failed to build backend client"));

    // Create application state
    let app_state = Arc::new(AppState::new(
        backend.clone(),
        backend,
        config.public_url,
        config.session,
        config.auth,
    ));

    let conf = get_configuration(None).expect("failed to get leptos configuration");
    let leptos_options = conf.leptos_options;
    let addr = leptos_options.site_addr;
    let routes = generate_route_list(App);

    // Create combined state for Leptos routes
    let combined_state = CombinedState {
        leptos_options: leptos_options.clone(),
        app_state: app_state.clone(),
    };

    let app = Router::new()
        .merge(auth::routes())
        .leptos_routes(&combined_state, routes, {
            let leptos_options = leptos_options.clone();
            move || shell(leptos_options.clone())
        })
        .fallback(leptos_axum::file_and_error_handler::<CombinedState, _>(
            shell,
        ))
        .nest_service("/pkg", ServeDir::new("target/site/pkg"))
        // Provide the application state to server functions
        .layer(axum::Extension(app_state.clone()));

    let app = auth::with_route_guard(app, app_state).with_state(combined_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .expect("server error");
}

/// Combined state for the application.
#[cfg(feature = "ssr")]
#[derive(Clone)]
struct CombinedState {
    leptos_options: leptos::prelude::LeptosOptions,
    app_state: std::sync::Arc<ataraxia_server::auth::AppState>,
}

#[cfg(feature = "ssr")]
impl axum::extract::FromRef<CombinedState> for leptos::prelude::LeptosOptions {
    fn from_ref(state: &CombinedState) -> Self {
        state.leptos_options.clone()
    }
}

#[cfg(feature = "ssr")]
impl axum::extract::FromRef<CombinedState> for std::sync::Arc<ataraxia_server::auth::AppState> {
    fn from_ref(state: &CombinedState) -> Self {
        state.app_state.clone()
    }
}

#[cfg(feature = "ssr")]
fn shell(options: leptos::prelude::LeptosOptions) -> impl leptos::prelude::IntoView {
    use ataraxia_server::app::App;
    use leptos::prelude::*;
    use leptos_meta::*;

    view! {
        <!DOCTYPE html>
        <html lang="id">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <link rel="stylesheet" href="/pkg/ataraxia.css"/>
                <AutoReload options=options.clone()/>
                <HydrationScripts options/>
                <MetaTags/>
            </head>
            <body>
                <App/>
            </body>
        </html>
    }
}

#[cfg(not(feature = "ssr"))]
fn main() {
    // This main function is only used for WASM builds
    // The actual hydration happens in lib.rs
}
