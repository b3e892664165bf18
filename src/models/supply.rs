// src/models/supply.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{double_option, validate_not_blank, validate_not_negative};

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "supply_unit", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SupplyUnit {
    Kg,
    G,
    L,
    Ml,
    Unit,    // Vira "unit"
    Package, // Vira "package"
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "supply_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SupplyCategory {
    Ingredient,
    Condiment,
    Beverage,
    Other,
}

impl SupplyCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupplyCategory::Ingredient => "ingredient",
            SupplyCategory::Condiment => "condiment",
            SupplyCategory::Beverage => "beverage",
            SupplyCategory::Other => "other",
        }
    }
}

// --- INSUMO (Supply) ---
// Consumível: quantidade fracionária (kg, L...) e limite mínimo para alerta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Supply {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    #[schema(example = "Farinha de trigo")]
    pub name: String,

    pub category: SupplyCategory,

    #[schema(example = "12.5")]
    pub quantity: Decimal,

    pub unit: SupplyUnit,

    #[schema(example = "2")]
    pub minimum_threshold: Decimal,

    #[schema(example = "4.90")]
    pub unit_price: Decimal,

    pub supplier: String,

    #[schema(value_type = Option<String>, format = Date, example = "2026-12-31")]
    pub expiration_date: Option<NaiveDate>,

    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Supply {
    /// Estoque baixo: a quantidade chegou (ou passou) do limite mínimo.
    pub fn needs_restock(&self) -> bool {
        self.quantity <= self.minimum_threshold
    }

    pub fn total_value(&self) -> Decimal {
        self.quantity * self.unit_price
    }
}

// O que a API devolve: o registro + os campos calculados
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplyView {
    #[serde(flatten)]
    pub supply: Supply,
    pub needs_restock: bool,
    pub total_value: Decimal,
}

impl From<Supply> for SupplyView {
    fn from(supply: Supply) -> Self {
        let needs_restock = supply.needs_restock();
        let total_value = supply.total_value();
        Self { supply, needs_restock, total_value }
    }
}

// ---
// Payload: criação de insumo
// ---
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewSupply {
    #[validate(
        length(min = 1, max = 120, message = "The name must have between 1 and 120 characters."),
        custom(function = "validate_not_blank")
    )]
    #[schema(example = "Farinha de trigo")]
    pub name: String,

    #[serde(default = "default_supply_category")]
    pub category: SupplyCategory,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub quantity: Decimal,

    #[serde(default = "default_supply_unit")]
    pub unit: SupplyUnit,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub minimum_threshold: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub unit_price: Decimal,

    #[serde(default)]
    pub supplier: String,

    #[schema(value_type = Option<String>, format = Date)]
    pub expiration_date: Option<NaiveDate>,

    #[serde(default)]
    pub notes: String,

    // Quem está cadastrando (vai para o histórico da criação)
    pub actor: Option<String>,
}

fn default_supply_category() -> SupplyCategory {
    SupplyCategory::Ingredient
}

fn default_supply_unit() -> SupplyUnit {
    SupplyUnit::Unit
}

// ---
// Payload: atualização parcial
// ---
// `quantity` NÃO é gravada direto: vira um movimento de ajuste no histórico.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplyChanges {
    #[validate(
        length(min = 1, max = 120, message = "The name must have between 1 and 120 characters."),
        custom(function = "validate_not_blank")
    )]
    pub name: Option<String>,

    pub category: Option<SupplyCategory>,

    #[validate(custom(function = "validate_not_negative"))]
    pub quantity: Option<Decimal>,

    pub unit: Option<SupplyUnit>,

    #[validate(custom(function = "validate_not_negative"))]
    pub minimum_threshold: Option<Decimal>,

    #[validate(custom(function = "validate_not_negative"))]
    pub unit_price: Option<Decimal>,

    pub supplier: Option<String>,

    // Ausente = não mexe; null = limpa a data
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = Date)]
    pub expiration_date: Option<Option<NaiveDate>>,

    pub notes: Option<String>,

    pub actor: Option<String>,
}

impl SupplyChanges {
    /// Aplica os campos descritivos. A quantidade fica de fora de propósito.
    pub fn apply_fields(&self, supply: &mut Supply) {
        if let Some(name) = &self.name {
            supply.name = name.trim().to_string();
        }
        if let Some(category) = self.category {
            supply.category = category;
        }
        if let Some(unit) = self.unit {
            supply.unit = unit;
        }
        if let Some(threshold) = self.minimum_threshold {
            supply.minimum_threshold = threshold;
        }
        if let Some(price) = self.unit_price {
            supply.unit_price = price;
        }
        if let Some(supplier) = &self.supplier {
            supply.supplier = supplier.trim().to_string();
        }
        if let Some(expiration) = self.expiration_date {
            supply.expiration_date = expiration;
        }
        if let Some(notes) = &self.notes {
            supply.notes = notes.trim().to_string();
        }
    }
}

// Filtros da listagem (GET /api/supplies)
#[derive(Debug, Clone, Default)]
pub struct SupplyFilter {
    pub search: Option<String>,
    pub category: Option<SupplyCategory>,
}

impl SupplyFilter {
    pub fn matches(&self, supply: &Supply) -> bool {
        if let Some(category) = self.category {
            if supply.category != category {
                return false;
            }
        }
        match &self.search {
            Some(term) => {
                let term = term.to_lowercase();
                supply.name.to_lowercase().contains(&term)
                    || supply.category.as_str().contains(&term)
                    || supply.supplier.to_lowercase().contains(&term)
            }
            None => true,
        }
    }
}
