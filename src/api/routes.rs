use axum::routing::{get, post, put};
use axum::Router;

use super::handlers::*;

/// 创建 API 路由
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/apps", get(list_apps).post(create_app))
        .route(
            "/api/v1/apps/{app_id}",
            get(get_app).patch(update_app).delete(delete_app),
        )
        .route(
            "/api/v1/apps/{app_id}/config",
            get(get_config).patch(submit_patch),
        )
        .route(
            "/api/v1/apps/{app_id}/services/{service}",
            get(get_service_url),
        )
        .route(
            "/api/v1/apps/{app_id}/environment",
            post(create_environment_variable),
        )
        .route(
            "/api/v1/apps/{app_id}/environment/{name}",
            put(edit_environment_variable).delete(delete_environment_variable),
        )
        .route("/api/v1/apps/{app_id}/roles", post(create_role))
        .route(
            "/api/v1/apps/{app_id}/roles/{name}",
            put(edit_role).delete(delete_role),
        )
        .route(
            "/api/v1/apps/{app_id}/roles/{name}/default",
            put(set_default_role),
        )
        .route("/api/v1/apps/{app_id}/sign-up", put(set_sign_up))
        .route(
            "/api/v1/apps/{app_id}/oauth/{provider}",
            put(update_oauth_provider),
        )
        .route(
            "/api/v1/apps/{app_id}/oauth/{provider}/callback-url",
            get(get_oauth_callback_url),
        )
        .route(
            "/api/v1/apps/{app_id}/secrets",
            get(list_secrets).post(create_secret),
        )
        .route(
            "/api/v1/apps/{app_id}/secrets/{name}",
            put(update_secret).delete(delete_secret),
        )
        .with_state(state)
}
