// src/models/movement.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::item::ItemKind;

// Ator padrão quando ninguém se identifica
pub const SYSTEM_ACTOR: &str = "system";

pub const INITIAL_CREATION_REASON: &str = "Initial creation";
pub const MANUAL_UPDATE_REASON: &str = "Manual update";

// --- Tipos de movimento ---
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "movement_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Entry,      // Entrada (compra, recebimento)
    Exit,       // Saída
    Adjustment, // Ajuste: a quantidade informada é o NOVO saldo
    Usage,      // Uso na cozinha
    Return,     // Devolução
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("quantity must be greater than zero, got {0}")]
    NotPositive(Decimal),

    #[error("quantity cannot be negative, got {0}")]
    Negative(Decimal),

    #[error("tools are counted in whole units, got {0}")]
    Fractional(Decimal),

    #[error("quantity {0} is out of range")]
    OutOfRange(Decimal),

    #[error("insufficient stock: available {available}, requested {requested}")]
    Insufficient { available: Decimal, requested: Decimal },
}

impl MovementKind {
    /// Calcula o saldo depois do movimento.
    ///
    /// `entry`/`return` somam, `exit`/`usage` subtraem e nunca deixam o saldo
    /// negativo, e `adjustment` trata `quantity` como o saldo final absoluto.
    pub fn resolve(self, before: Decimal, quantity: Decimal) -> Result<Decimal, QuantityError> {
        match self {
            MovementKind::Adjustment => {
                if quantity < Decimal::ZERO {
                    return Err(QuantityError::Negative(quantity));
                }
                Ok(quantity)
            }
            _ if quantity <= Decimal::ZERO => Err(QuantityError::NotPositive(quantity)),
            MovementKind::Entry | MovementKind::Return => {
                before.checked_add(quantity).ok_or(QuantityError::OutOfRange(quantity))
            }
            MovementKind::Exit | MovementKind::Usage => {
                let after = before - quantity;
                if after < Decimal::ZERO {
                    return Err(QuantityError::Insufficient { available: before, requested: quantity });
                }
                Ok(after)
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Entry => "entry",
            MovementKind::Exit => "exit",
            MovementKind::Adjustment => "adjustment",
            MovementKind::Usage => "usage",
            MovementKind::Return => "return",
        }
    }
}

// --- MOVIMENTO (Histórico, somente inserção) ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub id: Uuid,

    // Ordem de inserção: desempata movimentos no mesmo instante
    pub sequence: i64,

    pub item_kind: ItemKind,
    pub item_id: Uuid,

    // Nome copiado no momento do movimento (sobrevive à exclusão do item)
    pub item_name: String,

    pub kind: MovementKind,

    #[schema(example = "4")]
    pub quantity: Decimal,

    #[schema(example = "10")]
    pub quantity_before: Decimal,

    #[schema(example = "6")]
    pub quantity_after: Decimal,

    pub reason: String,
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

// O que o motor entrega ao armazenamento; id e sequência são do storage
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub item_kind: ItemKind,
    pub item_id: Uuid,
    pub item_name: String,
    pub kind: MovementKind,
    pub quantity: Decimal,
    pub quantity_before: Decimal,
    pub quantity_after: Decimal,
    pub reason: String,
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

impl NewMovement {
    pub fn into_movement(self, id: Uuid, sequence: i64) -> Movement {
        Movement {
            id,
            sequence,
            item_kind: self.item_kind,
            item_id: self.item_id,
            item_name: self.item_name,
            kind: self.kind,
            quantity: self.quantity,
            quantity_before: self.quantity_before,
            quantity_after: self.quantity_after,
            reason: self.reason,
            actor: self.actor,
            created_at: self.created_at,
        }
    }
}

// Janela de tempo com limites inclusivos nas duas pontas
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| instant >= from) && self.to.is_none_or(|to| instant <= to)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    pub item_kind: Option<ItemKind>,
    pub kind: Option<MovementKind>,
    pub item_id: Option<Uuid>,
    pub range: DateRange,
    // None = sem limite (histórico completo de um item)
    pub limit: Option<i64>,
}

impl MovementFilter {
    pub fn matches(&self, movement: &Movement) -> bool {
        self.item_kind.is_none_or(|kind| movement.item_kind == kind)
            && self.kind.is_none_or(|kind| movement.kind == kind)
            && self.item_id.is_none_or(|id| movement.item_id == id)
            && self.range.contains(movement.created_at)
    }
}

// --- Estatísticas ---

// Linha agregada vinda do banco: (tipo de item, tipo de movimento)
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct MovementTotal {
    pub item_kind: ItemKind,
    pub kind: MovementKind,
    pub count: i64,
    pub total_quantity: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KindTotals {
    pub count: i64,
    pub total_quantity: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemKindStatistics {
    #[schema(value_type = Object)]
    pub movements: BTreeMap<MovementKind, KindTotals>,
    pub total_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovementStatistics {
    #[schema(value_type = Object)]
    pub by_item_kind: BTreeMap<ItemKind, ItemKindStatistics>,
    pub total_count: i64,
}

impl MovementStatistics {
    pub fn from_totals(totals: impl IntoIterator<Item = MovementTotal>) -> Self {
        let mut stats = Self::default();
        for row in totals {
            let per_kind = stats.by_item_kind.entry(row.item_kind).or_default();
            let entry = per_kind.movements.entry(row.kind).or_default();
            entry.count += row.count;
            entry.total_quantity += row.total_quantity;
            per_kind.total_count += row.count;
            stats.total_count += row.count;
        }
        stats
    }
}
