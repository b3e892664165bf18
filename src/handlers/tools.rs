// src/handlers/tools.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        extract::{ApiJson, ApiQuery},
        response::ApiResponse,
    },
    config::AppState,
    middleware::i18n::Locale,
    models::{
        item::ItemKey,
        tool::{
            LocationCounts, NewTool, StorageArea, ToolCategory, ToolChanges, ToolCondition, ToolFilter,
            ToolView,
        },
    },
    services::ToolService,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct ToolListParams {
    /// Busca em nome, categoria e estado
    pub search: Option<String>,
    pub location: Option<StorageArea>,
    pub category: Option<ToolCategory>,
    pub condition: Option<ToolCondition>,
}

// ---
// Handler: list_tools
// ---
#[utoipa::path(
    get,
    path = "/api/tools",
    tag = "Tools",
    params(ToolListParams),
    responses(
        (status = 200, description = "Ferramentas ordenadas por nome", body = [ToolView])
    )
)]
pub async fn list_tools(
    State(app_state): State<AppState>,
    locale: Locale,
    ApiQuery(params): ApiQuery<ToolListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = ToolFilter {
        search: params.search.filter(|term| !term.trim().is_empty()),
        location: params.location,
        category: params.category,
        condition: params.condition,
    };

    let tools = app_state
        .tool_service
        .list(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ApiResponse::data(tools))))
}

#[utoipa::path(
    get,
    path = "/api/tools/counts",
    tag = "Tools",
    responses(
        (status = 200, description = "Quantidade de ferramentas por local", body = LocationCounts)
    )
)]
pub async fn location_counts(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let counts = app_state
        .tool_service
        .location_counts()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ApiResponse::data(counts))))
}

#[utoipa::path(
    get,
    path = "/api/tools/maintenance-due",
    tag = "Tools",
    responses(
        (status = 200, description = "Ferramentas com manutenção vencida ou para hoje", body = [ToolView])
    )
)]
pub async fn maintenance_due(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let tools = app_state
        .tool_service
        .maintenance_due(ToolService::today())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ApiResponse::data(tools))))
}

#[utoipa::path(
    get,
    path = "/api/tools/{key}",
    tag = "Tools",
    params(("key" = String, Path, description = "UUID ou nome da ferramenta")),
    responses(
        (status = 200, description = "Ferramenta encontrada", body = ToolView),
        (status = 404, description = "Ferramenta não encontrada")
    )
)]
pub async fn get_tool(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let tool = app_state
        .tool_service
        .get(&ItemKey::parse(&key))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ApiResponse::data(tool))))
}

// ---
// Handler: create_tool
// ---
#[utoipa::path(
    post,
    path = "/api/tools",
    tag = "Tools",
    request_body = NewTool,
    responses(
        (status = 201, description = "Ferramenta criada (com movimento de criação)", body = ToolView),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Já existe uma ferramenta com este nome")
    )
)]
pub async fn create_tool(
    State(app_state): State<AppState>,
    locale: Locale,
    ApiJson(payload): ApiJson<NewTool>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let tool = app_state
        .tool_service
        .create(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.message(&locale, "tool.created");
    Ok((StatusCode::CREATED, Json(ApiResponse::with_message(message, tool))))
}

#[utoipa::path(
    put,
    path = "/api/tools/{key}",
    tag = "Tools",
    request_body = ToolChanges,
    params(("key" = String, Path, description = "UUID ou nome da ferramenta")),
    responses(
        (status = 200, description = "Ferramenta atualizada", body = ToolView),
        (status = 404, description = "Ferramenta não encontrada"),
        (status = 409, description = "Já existe uma ferramenta com este nome")
    )
)]
pub async fn update_tool(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(key): Path<String>,
    ApiJson(payload): ApiJson<ToolChanges>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let tool = app_state
        .tool_service
        .update(&ItemKey::parse(&key), payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.message(&locale, "tool.updated");
    Ok((StatusCode::OK, Json(ApiResponse::with_message(message, tool))))
}

#[utoipa::path(
    delete,
    path = "/api/tools/{key}",
    tag = "Tools",
    params(("key" = String, Path, description = "UUID ou nome da ferramenta")),
    responses(
        (status = 200, description = "Ferramenta excluída (o histórico é mantido)"),
        (status = 404, description = "Ferramenta não encontrada")
    )
)]
pub async fn delete_tool(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .tool_service
        .delete(&ItemKey::parse(&key))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.message(&locale, "tool.deleted");
    Ok((StatusCode::OK, Json(ApiResponse::message(message))))
}
