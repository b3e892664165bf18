// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;
use crate::models::{item::ItemKind, movement::QuantityError};

// Nosso tipo de erro interno. Não sabe nada de idioma: a tradução acontece
// na borda, em `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Quantidade inválida: {0}")]
    InvalidQuantity(#[from] QuantityError),

    #[error("Data inválida: {0}")]
    InvalidDate(String),

    #[error("Intervalo de datas invertido")]
    InvalidDateRange,

    #[error("Tipo de item desconhecido: {0}")]
    InvalidItemKind(String),

    #[error("Requisição malformada: {0}")]
    MalformedPayload(String),

    #[error("Insumo não encontrado: {0}")]
    SupplyNotFound(String),

    #[error("Ferramenta não encontrada: {0}")]
    ToolNotFound(String),

    #[error("Nome duplicado ({kind}): {name}")]
    DuplicateName { kind: ItemKind, name: String },

    #[error("Estoque insuficiente de {name}: disponível {available}, solicitado {requested}")]
    InsufficientStock {
        name: String,
        available: Decimal,
        requested: Decimal,
    },

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("O armazenamento foi fechado")]
    StoreClosed,

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(kind: ItemKind, key: impl ToString) -> Self {
        match kind {
            ItemKind::Supply => AppError::SupplyNotFound(key.to_string()),
            ItemKind::Tool => AppError::ToolNotFound(key.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidQuantity(_)
            | AppError::InvalidDate(_)
            | AppError::InvalidDateRange
            | AppError::InvalidItemKind(_)
            | AppError::MalformedPayload(_)
            | AppError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
            AppError::SupplyNotFound(_) | AppError::ToolNotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateName { .. } => StatusCode::CONFLICT,
            // Falhas transitórias: o cliente pode tentar de novo
            AppError::StoreClosed
            | AppError::DatabaseError(sqlx::Error::PoolTimedOut)
            | AppError::DatabaseError(sqlx::Error::PoolClosed) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::InvalidQuantity(_) => "INVALID_QUANTITY",
            AppError::InvalidDate(_) | AppError::InvalidDateRange => "INVALID_DATE",
            AppError::InvalidItemKind(_) => "INVALID_ITEM_KIND",
            AppError::MalformedPayload(_) => "MALFORMED_REQUEST",
            AppError::SupplyNotFound(_) | AppError::ToolNotFound(_) => "NOT_FOUND",
            AppError::DuplicateName { .. } => "DUPLICATE_NAME",
            AppError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            _ if self.status() == StatusCode::SERVICE_UNAVAILABLE => "STORAGE_UNAVAILABLE",
            _ => "INTERNAL_ERROR",
        }
    }

    /// Converte para a resposta HTTP, com a mensagem no idioma do cliente.
    pub fn to_api_error(self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let status = self.status();
        let code = self.code();

        let message = match &self {
            AppError::ValidationError(_) => i18n.message(locale, "error.validation"),
            AppError::InvalidQuantity(err) => i18n.format(locale, quantity_key(err), &quantity_args(err)),
            AppError::InvalidDate(value) => {
                i18n.format(locale, "error.invalid_date", &[("value", value.clone())])
            }
            AppError::InvalidDateRange => i18n.message(locale, "error.invalid_date_range"),
            AppError::InvalidItemKind(value) => {
                i18n.format(locale, "error.invalid_item_kind", &[("value", value.clone())])
            }
            AppError::MalformedPayload(_) => i18n.message(locale, "error.malformed_request"),
            AppError::SupplyNotFound(key) => {
                i18n.format(locale, "error.supply_not_found", &[("key", key.clone())])
            }
            AppError::ToolNotFound(key) => {
                i18n.format(locale, "error.tool_not_found", &[("key", key.clone())])
            }
            AppError::DuplicateName { kind, name } => {
                let key = match kind {
                    ItemKind::Supply => "error.duplicate_supply",
                    ItemKind::Tool => "error.duplicate_tool",
                };
                i18n.format(locale, key, &[("name", name.clone())])
            }
            AppError::InsufficientStock { name, available, requested } => i18n.format(
                locale,
                "error.insufficient_stock",
                &[
                    ("name", name.clone()),
                    ("available", available.normalize().to_string()),
                    ("requested", requested.normalize().to_string()),
                ],
            ),
            _ if status == StatusCode::SERVICE_UNAVAILABLE => {
                tracing::warn!("Armazenamento indisponível: {}", self);
                i18n.message(locale, "error.storage_unavailable")
            }
            _ => {
                tracing::error!("Erro Interno do Servidor: {:?}", self);
                i18n.message(locale, "error.internal")
            }
        };

        // Sugestão B: Retornar todos os detalhes da validação.
        let details = match &self {
            AppError::ValidationError(errors) => Some(validation_details(errors)),
            _ => None,
        };

        let error = i18n.expose_error_details().then(|| self.to_string());

        ApiError { status, body: ErrorBody { success: false, code, message, details, error } }
    }
}

fn quantity_key(err: &QuantityError) -> &'static str {
    match err {
        QuantityError::NotPositive(_) => "error.quantity.not_positive",
        QuantityError::Negative(_) => "error.quantity.negative",
        QuantityError::Fractional(_) => "error.quantity.fractional",
        QuantityError::OutOfRange(_) => "error.quantity.out_of_range",
        QuantityError::Insufficient { .. } => "error.quantity.insufficient",
    }
}

// Sem o nome do item: quem conhece o item usa `InsufficientStock`
fn quantity_args(err: &QuantityError) -> Vec<(&'static str, String)> {
    match err {
        QuantityError::Insufficient { available, requested } => vec![
            ("available", available.normalize().to_string()),
            ("requested", requested.normalize().to_string()),
        ],
        _ => Vec::new(),
    }
}

fn validation_details(errors: &validator::ValidationErrors) -> Value {
    let mut details = HashMap::new();
    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<String> = field_errors
            .iter()
            .map(|e| match &e.message {
                Some(message) => message.to_string(),
                None => e.code.to_string(),
            })
            .collect();
        details.insert(field.to_string(), messages);
    }
    serde_json::to_value(details).unwrap_or_default()
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    // Diagnóstico técnico: só fora de produção
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// O erro já traduzido, pronto para virar resposta
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
