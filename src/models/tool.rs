// src/models/tool.rs

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
#[sqlx(type_name = "tool_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    Utensil,
    Appliance,
    Container,
    Other,
}

impl ToolCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolCategory::Utensil => "utensil",
            ToolCategory::Appliance => "appliance",
            ToolCategory::Container => "container",
            ToolCategory::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tool_condition", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ToolCondition {
    Excellent,
    Good,
    Fair,
    Poor,
    UnderRepair, // Vira "under_repair"
}

impl ToolCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolCondition::Excellent => "excellent",
            ToolCondition::Good => "good",
            ToolCondition::Fair => "fair",
            ToolCondition::Poor => "poor",
            ToolCondition::UnderRepair => "under_repair",
        }
    }
}

// Áreas físicas onde as ferramentas ficam guardadas
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "storage_area", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StorageArea {
    Warehouse, // bodega
    Workshop,  // taller
    Storeroom, // pañol
}

impl StorageArea {
    pub const ALL: [StorageArea; 3] = [
        StorageArea::Warehouse,
        StorageArea::Workshop,
        StorageArea::Storeroom,
    ];
}

// --- FERRAMENTA (Tool) ---
// Durável e contável: quantidade inteira, local e agenda de manutenção.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440001")]
    pub id: Uuid,

    #[schema(example = "Batedeira planetária")]
    pub name: String,

    pub category: ToolCategory,

    #[schema(example = 2)]
    pub quantity: i32,

    pub location: StorageArea,
    pub condition: ToolCondition,

    #[schema(value_type = Option<String>, format = Date)]
    pub purchase_date: Option<NaiveDate>,

    #[schema(example = "1299.00")]
    pub cost: Decimal,

    pub supplier: String,

    #[schema(value_type = Option<String>, format = Date, example = "2026-11-01")]
    pub next_maintenance_date: Option<NaiveDate>,

    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tool {
    /// Manutenção vencida: a data marcada já chegou (ou passou).
    pub fn needs_maintenance(&self, today: NaiveDate) -> bool {
        self.next_maintenance_date.is_some_and(|date| date <= today)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolView {
    #[serde(flatten)]
    pub tool: Tool,
    pub needs_maintenance: bool,
}

impl ToolView {
    pub fn new(tool: Tool, today: NaiveDate) -> Self {
        let needs_maintenance = tool.needs_maintenance(today);
        Self { tool, needs_maintenance }
    }
}

// ---
// Payload: criação de ferramenta
// ---
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewTool {
    #[validate(
        length(min = 1, max = 120, message = "The name must have between 1 and 120 characters."),
        custom(function = "validate_not_blank")
    )]
    #[schema(example = "Batedeira planetária")]
    pub name: String,

    #[serde(default = "default_tool_category")]
    pub category: ToolCategory,

    #[validate(range(min = 0, message = "The quantity cannot be negative."))]
    #[serde(default = "default_tool_quantity")]
    pub quantity: i32,

    pub location: StorageArea,

    #[serde(default = "default_tool_condition")]
    pub condition: ToolCondition,

    #[schema(value_type = Option<String>, format = Date)]
    pub purchase_date: Option<NaiveDate>,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub cost: Decimal,

    #[serde(default)]
    pub supplier: String,

    #[schema(value_type = Option<String>, format = Date)]
    pub next_maintenance_date: Option<NaiveDate>,

    #[serde(default)]
    pub notes: String,

    pub actor: Option<String>,
}

fn default_tool_category() -> ToolCategory {
    ToolCategory::Utensil
}

fn default_tool_quantity() -> i32 {
    1
}

fn default_tool_condition() -> ToolCondition {
    ToolCondition::Good
}

// ---
// Payload: atualização parcial
// ---
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolChanges {
    #[validate(
        length(min = 1, max = 120, message = "The name must have between 1 and 120 characters."),
        custom(function = "validate_not_blank")
    )]
    pub name: Option<String>,

    pub category: Option<ToolCategory>,

    #[validate(range(min = 0, message = "The quantity cannot be negative."))]
    pub quantity: Option<i32>,

    pub location: Option<StorageArea>,
    pub condition: Option<ToolCondition>,

    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = Date)]
    pub purchase_date: Option<Option<NaiveDate>>,

    #[validate(custom(function = "validate_not_negative"))]
    pub cost: Option<Decimal>,

    pub supplier: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = Date)]
    pub next_maintenance_date: Option<Option<NaiveDate>>,

    pub notes: Option<String>,

    pub actor: Option<String>,
}

impl ToolChanges {
    pub fn apply_fields(&self, tool: &mut Tool) {
        if let Some(name) = &self.name {
            tool.name = name.trim().to_string();
        }
        if let Some(category) = self.category {
            tool.category = category;
        }
        if let Some(location) = self.location {
            tool.location = location;
        }
        if let Some(condition) = self.condition {
            tool.condition = condition;
        }
        if let Some(purchase_date) = self.purchase_date {
            tool.purchase_date = purchase_date;
        }
        if let Some(cost) = self.cost {
            tool.cost = cost;
        }
        if let Some(supplier) = &self.supplier {
            tool.supplier = supplier.trim().to_string();
        }
        if let Some(next) = self.next_maintenance_date {
            tool.next_maintenance_date = next;
        }
        if let Some(notes) = &self.notes {
            tool.notes = notes.trim().to_string();
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ToolFilter {
    pub search: Option<String>,
    pub location: Option<StorageArea>,
    pub category: Option<ToolCategory>,
    pub condition: Option<ToolCondition>,
}

impl ToolFilter {
    pub fn matches(&self, tool: &Tool) -> bool {
        if self.location.is_some_and(|location| tool.location != location) {
            return false;
        }
        if self.category.is_some_and(|category| tool.category != category) {
            return false;
        }
        if self.condition.is_some_and(|condition| tool.condition != condition) {
            return false;
        }
        match &self.search {
            Some(term) => {
                let term = term.to_lowercase();
                tool.name.to_lowercase().contains(&term)
                    || tool.category.as_str().contains(&term)
                    || tool.condition.as_str().contains(&term)
            }
            None => true,
        }
    }
}

// --- Contagem por local (GET /api/tools/counts) ---
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationCounts {
    pub warehouse: i64,
    pub workshop: i64,
    pub storeroom: i64,
    // Soma de todos os locais
    pub all: i64,
}

impl LocationCounts {
    pub fn from_rows(rows: &[(StorageArea, i64)]) -> Self {
        let mut counts = Self::default();
        for (area, count) in rows {
            match area {
                StorageArea::Warehouse => counts.warehouse += count,
                StorageArea::Workshop => counts.workshop += count,
                StorageArea::Storeroom => counts.storeroom += count,
            }
            counts.all += count;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixer(next_maintenance_date: Option<NaiveDate>) -> Tool {
        let now = Utc::now();
        Tool {
            id: Uuid::new_v4(),
            name: "Mixer".into(),
            category: ToolCategory::Appliance,
            quantity: 1,
            location: StorageArea::Workshop,
            condition: ToolCondition::Good,
            purchase_date: None,
            cost: Decimal::ZERO,
            supplier: String::new(),
            next_maintenance_date,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn maintenance_is_due_on_the_scheduled_day() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert!(mixer(Some(today)).needs_maintenance(today));
        assert!(mixer(today.pred_opt()).needs_maintenance(today));
        assert!(!mixer(today.succ_opt()).needs_maintenance(today));
        assert!(!mixer(None).needs_maintenance(today));
    }

    #[test]
    fn location_counts_sum_into_all() {
        let counts = LocationCounts::from_rows(&[
            (StorageArea::Warehouse, 3),
            (StorageArea::Storeroom, 2),
        ]);
        assert_eq!(counts.warehouse, 3);
        assert_eq!(counts.workshop, 0);
        assert_eq!(counts.storeroom, 2);
        assert_eq!(counts.all, 5);
    }

    #[test]
    fn condition_uses_snake_case_on_the_wire() {
        let json = serde_json::to_string(&ToolCondition::UnderRepair).unwrap();
        assert_eq!(json, "\"under_repair\"");
    }

    #[test]
    fn filter_combines_location_and_search() {
        let tool = mixer(None);
        let hit = ToolFilter {
            location: Some(StorageArea::Workshop),
            search: Some("mix".into()),
            ..Default::default()
        };
        let wrong_place = ToolFilter { location: Some(StorageArea::Warehouse), ..Default::default() };
        assert!(hit.matches(&tool));
        assert!(!wrong_place.matches(&tool));
    }
}
