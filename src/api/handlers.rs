use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::core::patch::ConfigPatch;
use crate::core::app::AppUpdate;
use crate::core::{env, roles, sign_in, Console};
use crate::error::ConsoleError;
use crate::models::{App, EnvironmentVariable, OAuthProvider, ServiceTarget};

/// 共享状态类型
pub type AppState = Arc<RwLock<Console>>;

// ---- 请求 / 响应结构体 ----

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AppSummary {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub subdomain: String,
    pub region: String,
    pub base_folder: String,
    pub created_at: u64,
    pub config_version: u64,
}

impl From<&App> for AppSummary {
    fn from(app: &App) -> Self {
        Self {
            id: app.id.clone(),
            name: app.name.clone(),
            slug: app.slug.clone(),
            subdomain: app.subdomain.clone(),
            region: app.region.clone(),
            base_folder: app.base_folder.clone(),
            created_at: app.created_at,
            config_version: app.config_version,
        }
    }
}

#[derive(Deserialize)]
pub struct CreateAppRequest {
    pub name: String,
    pub region: String,
}

#[derive(Deserialize)]
pub struct UpdateAppRequest {
    pub name: Option<String>,
    pub base_folder: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct ConfigResponse {
    pub config: Value,
    pub version: u64,
}

#[derive(Deserialize)]
pub struct SubmitPatchRequest {
    pub path: Vec<String>,
    pub value: Value,
    pub expected_version: Option<u64>,
}

#[derive(Serialize, Deserialize)]
pub struct VersionResponse {
    pub version: u64,
}

#[derive(Serialize, Deserialize)]
pub struct ServiceUrlResponse {
    pub service: ServiceTarget,
    pub url: String,
}

#[derive(Deserialize)]
pub struct RoleRequest {
    pub name: String,
}

#[derive(Deserialize)]
pub struct SecretRequest {
    pub name: String,
    pub value: String,
}

#[derive(Deserialize)]
pub struct SecretValueRequest {
    pub value: String,
}

#[derive(Serialize, Deserialize)]
pub struct CallbackUrlResponse {
    pub provider: OAuthProvider,
    pub callback_url: String,
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---- ConsoleError -> HTTP Response ----

impl IntoResponse for ConsoleError {
    fn into_response(self) -> Response {
        let status = match &self {
            ConsoleError::DuplicateKey(_) | ConsoleError::Validation(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ConsoleError::Remote(_) | ConsoleError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            ConsoleError::VersionConflict { .. } => StatusCode::CONFLICT,
            ConsoleError::AppNotFound(_) | ConsoleError::EntryNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// ---- 应用 ----

/// GET /api/v1/apps
pub async fn list_apps(State(console): State<AppState>) -> Json<Vec<AppSummary>> {
    let console = console.read().await;
    Json(console.list_apps().into_iter().map(AppSummary::from).collect())
}

/// POST /api/v1/apps
pub async fn create_app(
    State(console): State<AppState>,
    Json(req): Json<CreateAppRequest>,
) -> Result<(StatusCode, Json<AppSummary>), ConsoleError> {
    let mut console = console.write().await;
    let app = console.create_app(&req.name, &req.region)?;
    Ok((StatusCode::CREATED, Json(AppSummary::from(&app))))
}

/// GET /api/v1/apps/{app_id}
pub async fn get_app(
    State(console): State<AppState>,
    Path(app_id): Path<String>,
) -> Result<Json<AppSummary>, ConsoleError> {
    let console = console.read().await;
    Ok(Json(AppSummary::from(console.get_app(&app_id)?)))
}

/// PATCH /api/v1/apps/{app_id}
pub async fn update_app(
    State(console): State<AppState>,
    Path(app_id): Path<String>,
    Json(req): Json<UpdateAppRequest>,
) -> Result<Json<AppSummary>, ConsoleError> {
    let mut console = console.write().await;
    let app = console.update_app(
        &app_id,
        AppUpdate {
            name: req.name.as_deref(),
            base_folder: req.base_folder.as_deref(),
        },
    )?;
    Ok(Json(AppSummary::from(&app)))
}

/// DELETE /api/v1/apps/{app_id}
pub async fn delete_app(
    State(console): State<AppState>,
    Path(app_id): Path<String>,
) -> Result<StatusCode, ConsoleError> {
    let mut console = console.write().await;
    console.delete_app(&app_id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- 配置 ----

/// GET /api/v1/apps/{app_id}/config
pub async fn get_config(
    State(console): State<AppState>,
    Path(app_id): Path<String>,
) -> Result<Json<ConfigResponse>, ConsoleError> {
    let console = console.read().await;
    let (config, version) = console.config_snapshot(&app_id)?;
    Ok(Json(ConfigResponse { config, version }))
}

/// PATCH /api/v1/apps/{app_id}/config
pub async fn submit_patch(
    State(console): State<AppState>,
    Path(app_id): Path<String>,
    Json(req): Json<SubmitPatchRequest>,
) -> Result<Json<VersionResponse>, ConsoleError> {
    let patch = ConfigPatch {
        path: req.path,
        value: req.value,
    };
    let mut console = console.write().await;
    let version = console.submit_patch(&app_id, &patch, req.expected_version)?;
    Ok(Json(VersionResponse { version }))
}

/// GET /api/v1/apps/{app_id}/services/{service}
pub async fn get_service_url(
    State(console): State<AppState>,
    Path((app_id, service)): Path<(String, String)>,
) -> Result<Json<ServiceUrlResponse>, ConsoleError> {
    let service: ServiceTarget = service.parse().map_err(ConsoleError::Validation)?;
    let console = console.read().await;
    let url = console.service_url(&app_id, service)?;
    Ok(Json(ServiceUrlResponse { service, url }))
}

// ---- 环境变量 ----

/// POST /api/v1/apps/{app_id}/environment
pub async fn create_environment_variable(
    State(console): State<AppState>,
    Path(app_id): Path<String>,
    Json(variable): Json<EnvironmentVariable>,
) -> Result<(StatusCode, Json<VersionResponse>), ConsoleError> {
    let mut console = console.write().await;
    let version = console.update_config(&app_id, |tree| {
        env::create_environment_variable(tree, variable)
    })?;
    Ok((StatusCode::CREATED, Json(VersionResponse { version })))
}

/// PUT /api/v1/apps/{app_id}/environment/{name}
pub async fn edit_environment_variable(
    State(console): State<AppState>,
    Path((app_id, name)): Path<(String, String)>,
    Json(variable): Json<EnvironmentVariable>,
) -> Result<Json<VersionResponse>, ConsoleError> {
    let mut console = console.write().await;
    let version = console.update_config(&app_id, |tree| {
        env::edit_environment_variable(tree, &name, variable)
    })?;
    Ok(Json(VersionResponse { version }))
}

/// DELETE /api/v1/apps/{app_id}/environment/{name}
pub async fn delete_environment_variable(
    State(console): State<AppState>,
    Path((app_id, name)): Path<(String, String)>,
) -> Result<Json<VersionResponse>, ConsoleError> {
    let mut console = console.write().await;
    let version = console.update_config(&app_id, |tree| {
        env::delete_environment_variable(tree, &name)
    })?;
    Ok(Json(VersionResponse { version }))
}

// ---- 角色 ----

/// POST /api/v1/apps/{app_id}/roles
pub async fn create_role(
    State(console): State<AppState>,
    Path(app_id): Path<String>,
    Json(req): Json<RoleRequest>,
) -> Result<(StatusCode, Json<VersionResponse>), ConsoleError> {
    let mut console = console.write().await;
    let version = console.update_config(&app_id, |tree| roles::create_role(tree, &req.name))?;
    Ok((StatusCode::CREATED, Json(VersionResponse { version })))
}

/// PUT /api/v1/apps/{app_id}/roles/{name}
pub async fn edit_role(
    State(console): State<AppState>,
    Path((app_id, name)): Path<(String, String)>,
    Json(req): Json<RoleRequest>,
) -> Result<Json<VersionResponse>, ConsoleError> {
    let mut console = console.write().await;
    let version =
        console.update_config(&app_id, |tree| roles::edit_role(tree, &name, &req.name))?;
    Ok(Json(VersionResponse { version }))
}

/// DELETE /api/v1/apps/{app_id}/roles/{name}
pub async fn delete_role(
    State(console): State<AppState>,
    Path((app_id, name)): Path<(String, String)>,
) -> Result<Json<VersionResponse>, ConsoleError> {
    let mut console = console.write().await;
    let version = console.update_config(&app_id, |tree| roles::delete_role(tree, &name))?;
    Ok(Json(VersionResponse { version }))
}

/// PUT /api/v1/apps/{app_id}/roles/{name}/default
pub async fn set_default_role(
    State(console): State<AppState>,
    Path((app_id, name)): Path<(String, String)>,
) -> Result<Json<VersionResponse>, ConsoleError> {
    let mut console = console.write().await;
    let version = console.update_config(&app_id, |tree| roles::set_default_role(tree, &name))?;
    Ok(Json(VersionResponse { version }))
}

// ---- 登录方式 ----

/// PUT /api/v1/apps/{app_id}/oauth/{provider}
pub async fn update_oauth_provider(
    State(console): State<AppState>,
    Path((app_id, provider)): Path<(String, String)>,
    Json(form): Json<Map<String, Value>>,
) -> Result<Json<VersionResponse>, ConsoleError> {
    let provider: OAuthProvider = provider.parse().map_err(ConsoleError::Validation)?;
    let mut console = console.write().await;
    let version = console.update_config(&app_id, |tree| {
        sign_in::update_provider(tree, provider, &form)
    })?;
    Ok(Json(VersionResponse { version }))
}

#[derive(Deserialize)]
pub struct SignUpRequest {
    pub enabled: bool,
}

/// PUT /api/v1/apps/{app_id}/sign-up
pub async fn set_sign_up(
    State(console): State<AppState>,
    Path(app_id): Path<String>,
    Json(req): Json<SignUpRequest>,
) -> Result<Json<VersionResponse>, ConsoleError> {
    let mut console = console.write().await;
    let version = console.update_config(&app_id, |tree| {
        sign_in::set_sign_up_enabled(tree, req.enabled)
    })?;
    Ok(Json(VersionResponse { version }))
}

/// GET /api/v1/apps/{app_id}/oauth/{provider}/callback-url
pub async fn get_oauth_callback_url(
    State(console): State<AppState>,
    Path((app_id, provider)): Path<(String, String)>,
) -> Result<Json<CallbackUrlResponse>, ConsoleError> {
    let provider: OAuthProvider = provider.parse().map_err(ConsoleError::Validation)?;
    let console = console.read().await;
    let callback_url = console.oauth_callback_url(&app_id, provider)?;
    Ok(Json(CallbackUrlResponse {
        provider,
        callback_url,
    }))
}

// ---- 密钥 ----

/// GET /api/v1/apps/{app_id}/secrets
pub async fn list_secrets(
    State(console): State<AppState>,
    Path(app_id): Path<String>,
) -> Result<Json<Vec<String>>, ConsoleError> {
    let console = console.read().await;
    Ok(Json(console.list_secrets(&app_id)?))
}

/// POST /api/v1/apps/{app_id}/secrets
pub async fn create_secret(
    State(console): State<AppState>,
    Path(app_id): Path<String>,
    Json(req): Json<SecretRequest>,
) -> Result<StatusCode, ConsoleError> {
    let mut console = console.write().await;
    console.create_secret(&app_id, &req.name, &req.value)?;
    Ok(StatusCode::CREATED)
}

/// PUT /api/v1/apps/{app_id}/secrets/{name}
pub async fn update_secret(
    State(console): State<AppState>,
    Path((app_id, name)): Path<(String, String)>,
    Json(req): Json<SecretValueRequest>,
) -> Result<StatusCode, ConsoleError> {
    let mut console = console.write().await;
    console.update_secret(&app_id, &name, &req.value)?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/apps/{app_id}/secrets/{name}
pub async fn delete_secret(
    State(console): State<AppState>,
    Path((app_id, name)): Path<(String, String)>,
) -> Result<StatusCode, ConsoleError> {
    let mut console = console.write().await;
    console.delete_secret(&app_id, &name)?;
    Ok(StatusCode::NO_CONTENT)
}
