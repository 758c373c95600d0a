pub mod config;
pub mod domain;
pub mod global;
pub mod state;
pub mod utils;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

pub use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        domain::health::handler::health_check,
        domain::ai::handler::generate_prompt,
        domain::prompt::handler::save_prompt,
        domain::prompt::handler::list_prompts,
        domain::prompt::handler::delete_prompt,
        domain::auth::handler::signup,
        domain::auth::handler::login,
    ),
    components(
        schemas(
            domain::health::dto::HealthStatus,
            domain::health::dto::HealthState,
            domain::ai::dto::GeneratePromptRequest,
            domain::ai::dto::GeneratePromptResponse,
            domain::prompt::dto::SavePromptRequest,
            domain::prompt::dto::PromptRecord,
            domain::auth::dto::SignupRequest,
            domain::auth::dto::LoginRequest,
            domain::auth::dto::AuthResponse,
            domain::auth::dto::PublicUser,
            utils::response::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "서버 상태 API"),
        (name = "Prompt", description = "프롬프트 생성/저장 API"),
        (name = "Auth", description = "회원가입/로그인 API")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// API 라우트. `/api` 아래와 접두사 없는 경로 양쪽에 마운트된다.
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(domain::health::health_check))
        .route(
            "/generate-prompt",
            post(domain::ai::handler::generate_prompt),
        )
        .route(
            "/prompts",
            get(domain::prompt::handler::list_prompts).post(domain::prompt::handler::save_prompt),
        )
        .route("/prompts/:id", delete(domain::prompt::handler::delete_prompt))
        .route("/auth/signup", post(domain::auth::handler::signup))
        .route("/auth/login", post(domain::auth::handler::login))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_routes())
        .merge(api_routes())
        .layer(middleware::from_fn(global::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
