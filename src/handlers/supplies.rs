// src/handlers/supplies.rs

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
        supply::{NewSupply, SupplyCategory, SupplyChanges, SupplyFilter, SupplyView},
    },
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct SupplyListParams {
    /// Busca em nome, categoria e fornecedor
    pub search: Option<String>,
    pub category: Option<SupplyCategory>,
}

// ---
// Handler: list_supplies
// ---
#[utoipa::path(
    get,
    path = "/api/supplies",
    tag = "Supplies",
    params(SupplyListParams),
    responses(
        (status = 200, description = "Insumos ordenados por nome", body = [SupplyView])
    )
)]
pub async fn list_supplies(
    State(app_state): State<AppState>,
    locale: Locale,
    ApiQuery(params): ApiQuery<SupplyListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = SupplyFilter {
        search: params.search.filter(|term| !term.trim().is_empty()),
        category: params.category,
    };

    let supplies = app_state
        .supply_service
        .list(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ApiResponse::data(supplies))))
}

#[utoipa::path(
    get,
    path = "/api/supplies/low-stock",
    tag = "Supplies",
    responses(
        (status = 200, description = "Insumos com quantidade <= limite mínimo", body = [SupplyView])
    )
)]
pub async fn low_stock(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let supplies = app_state
        .supply_service
        .low_stock()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ApiResponse::data(supplies))))
}

#[utoipa::path(
    get,
    path = "/api/supplies/{key}",
    tag = "Supplies",
    params(("key" = String, Path, description = "UUID ou nome do insumo")),
    responses(
        (status = 200, description = "Insumo encontrado", body = SupplyView),
        (status = 404, description = "Insumo não encontrado")
    )
)]
pub async fn get_supply(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let supply = app_state
        .supply_service
        .get(&ItemKey::parse(&key))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ApiResponse::data(supply))))
}

// ---
// Handler: create_supply
// ---
#[utoipa::path(
    post,
    path = "/api/supplies",
    tag = "Supplies",
    request_body = NewSupply,
    responses(
        (status = 201, description = "Insumo criado (com movimento de criação)", body = SupplyView),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Já existe um insumo com este nome")
    )
)]
pub async fn create_supply(
    State(app_state): State<AppState>,
    locale: Locale,
    ApiJson(payload): ApiJson<NewSupply>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let supply = app_state
        .supply_service
        .create(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.message(&locale, "supply.created");
    Ok((StatusCode::CREATED, Json(ApiResponse::with_message(message, supply))))
}

#[utoipa::path(
    put,
    path = "/api/supplies/{key}",
    tag = "Supplies",
    request_body = SupplyChanges,
    params(("key" = String, Path, description = "UUID ou nome do insumo")),
    responses(
        (status = 200, description = "Insumo atualizado; nova quantidade vira ajuste no histórico", body = SupplyView),
        (status = 404, description = "Insumo não encontrado"),
        (status = 409, description = "Já existe um insumo com este nome")
    )
)]
pub async fn update_supply(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(key): Path<String>,
    ApiJson(payload): ApiJson<SupplyChanges>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let supply = app_state
        .supply_service
        .update(&ItemKey::parse(&key), payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.message(&locale, "supply.updated");
    Ok((StatusCode::OK, Json(ApiResponse::with_message(message, supply))))
}

#[utoipa::path(
    delete,
    path = "/api/supplies/{key}",
    tag = "Supplies",
    params(("key" = String, Path, description = "UUID ou nome do insumo")),
    responses(
        (status = 200, description = "Insumo excluído (o histórico é mantido)"),
        (status = 404, description = "Insumo não encontrado")
    )
)]
pub async fn delete_supply(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .supply_service
        .delete(&ItemKey::parse(&key))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.message(&locale, "supply.deleted");
    Ok((StatusCode::OK, Json(ApiResponse::message(message))))
}
