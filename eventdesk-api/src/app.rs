/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use eventdesk_api::{app::{build_router, AppState}, config::Config};
/// use eventdesk_docs::DisabledDocumentService;
/// use sqlx::PgPool;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config, Arc::new(DisabledDocumentService));
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use eventdesk_docs::DocumentService;
use eventdesk_shared::auth::middleware::authenticate;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,

    pub config: Arc<Config>,

    /// External document storage (Google Workspace, or a stand-in)
    pub documents: Arc<dyn DocumentService>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config, documents: Arc<dyn DocumentService>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            documents,
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete router
///
/// ```text
/// /health                                   GET      public
/// /token/                                   POST     public
/// /token/refresh/                           POST     public
/// /register/                                POST     public
///
/// /api/users/                               GET
/// /api/users/:user_id/                      GET
/// /api/users/:user_id/access_level/         PUT      Admin
/// /api/profile/:user_id/                    GET PUT  caller only
/// /api/profile_view/:user_id/               GET PUT  Admin
/// /api/events/                              GET POST
/// /api/event/:id/                           GET PUT DELETE
/// /api/tasks/                               GET POST
/// /api/task/:id/                            GET PUT DELETE
/// /projects/                                GET
/// /projects/create/                         POST
/// /projects/:id/                            GET PUT DELETE
/// /projects/:id/create_google_service/      POST
/// /project_file/:id/                        DELETE
/// ```
///
/// Everything below the public block requires a bearer access token.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/token/", post(routes::auth::obtain_token))
        .route("/token/refresh/", post(routes::auth::refresh_token))
        .route("/register/", post(routes::auth::register));

    let protected_routes = Router::new()
        .route("/api/users/", get(routes::users::list_users))
        .route("/api/users/:user_id/", get(routes::users::get_user))
        .route(
            "/api/users/:user_id/access_level/",
            put(routes::users::update_access_level),
        )
        .route(
            "/api/profile/:user_id/",
            get(routes::profiles::get_own_profile).put(routes::profiles::update_own_profile),
        )
        .route(
            "/api/profile_view/:user_id/",
            get(routes::profiles::view_profile).put(routes::profiles::admin_update_profile),
        )
        .route(
            "/api/events/",
            get(routes::events::list_events).post(routes::events::create_event),
        )
        .route(
            "/api/event/:id/",
            get(routes::events::get_event)
                .put(routes::events::update_event)
                .delete(routes::events::delete_event),
        )
        .route(
            "/api/tasks/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/api/task/:id/",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/projects/", get(routes::projects::list_root_projects))
        .route("/projects/create/", post(routes::projects::create_project))
        .route(
            "/projects/:id/",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/projects/:id/create_google_service/",
            post(routes::documents::attach_document),
        )
        .route("/project_file/:id/", delete(routes::documents::detach_document))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Validates the bearer access token and injects `AuthContext`
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let context = authenticate(req.headers(), state.jwt_secret())?;
    tracing::trace!(user_id = context.user_id, "Authenticated request");

    req.extensions_mut().insert(context);
    Ok(next.run(req).await)
}
