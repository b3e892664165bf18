// src/handlers/movements.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        extract::{ApiJson, ApiQuery},
        response::ApiResponse,
        time::parse_range,
        validation::validate_not_blank,
    },
    config::AppState,
    middleware::i18n::Locale,
    models::{
        item::{ItemKey, ItemKind, ItemReference},
        movement::{Movement, MovementKind, MovementStatistics},
    },
    services::{MovementQuery, MovementRequest},
};

// ---
// Payloads
// ---

/// Movimento apontando o item pelo id.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMovementPayload {
    pub item_kind: ItemKind,
    pub item_id: Uuid,
    pub kind: MovementKind,

    // Para `adjustment` é o novo saldo; para os demais, o delta
    #[schema(value_type = f64, example = 4)]
    pub quantity: Decimal,

    #[validate(length(max = 500, message = "The reason must have at most 500 characters."))]
    pub reason: String,

    #[validate(length(max = 100, message = "The actor must have at most 100 characters."))]
    pub actor: Option<String>,
}

/// Movimento apontando o item pelo nome (único dentro do tipo).
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NamedMovementPayload {
    #[validate(
        length(min = 1, max = 120, message = "The name must have between 1 and 120 characters."),
        custom(function = "validate_not_blank")
    )]
    #[schema(example = "Farinha de trigo")]
    pub name: String,

    pub kind: MovementKind,

    #[schema(value_type = f64, example = 4)]
    pub quantity: Decimal,

    #[validate(length(max = 500, message = "The reason must have at most 500 characters."))]
    pub reason: String,

    #[validate(length(max = 100, message = "The actor must have at most 100 characters."))]
    pub actor: Option<String>,
}

impl NamedMovementPayload {
    fn into_parts(self, kind: ItemKind) -> (ItemReference, MovementRequest) {
        let reference = ItemReference { kind, key: ItemKey::Name(self.name.trim().to_string()) };
        let request = MovementRequest {
            kind: self.kind,
            quantity: self.quantity,
            reason: self.reason,
            actor: self.actor,
        };
        (reference, request)
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct MovementListParams {
    pub item_kind: Option<ItemKind>,
    pub kind: Option<MovementKind>,
    pub item_id: Option<Uuid>,
    /// RFC 3339 ou YYYY-MM-DD
    pub from: Option<String>,
    /// RFC 3339 ou YYYY-MM-DD (uma data cobre o dia inteiro)
    pub to: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatisticsParams {
    pub from: Option<String>,
    pub to: Option<String>,
}

// ---
// Handler: list_movements
// ---
#[utoipa::path(
    get,
    path = "/api/movements",
    tag = "Movements",
    params(MovementListParams),
    responses(
        (status = 200, description = "Movimentos do mais recente para o mais antigo", body = [Movement]),
        (status = 400, description = "Filtro inválido")
    )
)]
pub async fn list_movements(
    State(app_state): State<AppState>,
    locale: Locale,
    ApiQuery(params): ApiQuery<MovementListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let range = parse_range(params.from.as_deref(), params.to.as_deref())
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let query = MovementQuery {
        item_kind: params.item_kind,
        kind: params.kind,
        item_id: params.item_id,
        range,
        limit: params.limit,
    };

    let movements = app_state
        .movement_service
        .history(query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ApiResponse::data(movements))))
}

// ---
// Handler: create_movement
// ---
#[utoipa::path(
    post,
    path = "/api/movements",
    tag = "Movements",
    request_body = CreateMovementPayload,
    responses(
        (status = 201, description = "Movimento aplicado e registrado", body = Movement),
        (status = 400, description = "Quantidade inválida ou estoque insuficiente"),
        (status = 404, description = "Item não encontrado")
    )
)]
pub async fn create_movement(
    State(app_state): State<AppState>,
    locale: Locale,
    ApiJson(payload): ApiJson<CreateMovementPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let reference = ItemReference { kind: payload.item_kind, key: ItemKey::Id(payload.item_id) };
    let request = MovementRequest {
        kind: payload.kind,
        quantity: payload.quantity,
        reason: payload.reason,
        actor: payload.actor,
    };

    record(&app_state, &locale, &reference, request).await
}

#[utoipa::path(
    post,
    path = "/api/movements/supply",
    tag = "Movements",
    request_body = NamedMovementPayload,
    responses(
        (status = 201, description = "Movimento aplicado ao insumo", body = Movement),
        (status = 400, description = "Quantidade inválida ou estoque insuficiente"),
        (status = 404, description = "Insumo não encontrado")
    )
)]
pub async fn create_supply_movement(
    State(app_state): State<AppState>,
    locale: Locale,
    ApiJson(payload): ApiJson<NamedMovementPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let (reference, request) = payload.into_parts(ItemKind::Supply);
    record(&app_state, &locale, &reference, request).await
}

#[utoipa::path(
    post,
    path = "/api/movements/tool",
    tag = "Movements",
    request_body = NamedMovementPayload,
    responses(
        (status = 201, description = "Movimento aplicado à ferramenta", body = Movement),
        (status = 400, description = "Quantidade inválida ou estoque insuficiente"),
        (status = 404, description = "Ferramenta não encontrada")
    )
)]
pub async fn create_tool_movement(
    State(app_state): State<AppState>,
    locale: Locale,
    ApiJson(payload): ApiJson<NamedMovementPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let (reference, request) = payload.into_parts(ItemKind::Tool);
    record(&app_state, &locale, &reference, request).await
}

async fn record(
    app_state: &AppState,
    locale: &Locale,
    reference: &ItemReference,
    request: MovementRequest,
) -> Result<(StatusCode, Json<ApiResponse<Movement>>), ApiError> {
    let movement = app_state
        .movement_service
        .apply_movement(reference, request)
        .await
        .map_err(|e| e.to_api_error(locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.message(locale, "movement.recorded");
    Ok((StatusCode::CREATED, Json(ApiResponse::with_message(message, movement))))
}

#[utoipa::path(
    get,
    path = "/api/movements/item/{kind}/{key}",
    tag = "Movements",
    params(
        ("kind" = String, Path, description = "supply ou tool"),
        ("key" = String, Path, description = "UUID ou nome do item")
    ),
    responses(
        (status = 200, description = "Histórico completo do item", body = [Movement]),
        (status = 400, description = "Tipo de item inválido"),
        (status = 404, description = "Item não encontrado")
    )
)]
pub async fn item_history(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((kind, key)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let kind: ItemKind = kind
        .parse()
        .map_err(|raw: String| AppError::InvalidItemKind(raw).to_api_error(&locale, &app_state.i18n_store))?;

    let movements = app_state
        .movement_service
        .item_history(kind, &ItemKey::parse(&key))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ApiResponse::data(movements))))
}

#[utoipa::path(
    get,
    path = "/api/movements/stats",
    tag = "Movements",
    params(StatisticsParams),
    responses(
        (status = 200, description = "Totais por tipo de item e tipo de movimento", body = MovementStatistics),
        (status = 400, description = "Intervalo de datas inválido")
    )
)]
pub async fn statistics(
    State(app_state): State<AppState>,
    locale: Locale,
    ApiQuery(params): ApiQuery<StatisticsParams>,
) -> Result<impl IntoResponse, ApiError> {
    let range = parse_range(params.from.as_deref(), params.to.as_deref())
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let stats = app_state
        .movement_service
        .statistics(range)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ApiResponse::data(stats))))
}
