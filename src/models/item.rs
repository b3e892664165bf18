// src/models/item.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{movement::QuantityError, supply::Supply, tool::Tool};

// Os dois tipos de item que dividem o mesmo histórico de movimentos
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "item_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Supply,
    Tool,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Supply => "supply",
            ItemKind::Tool => "tool",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "supply" | "supplies" => Ok(ItemKind::Supply),
            "tool" | "tools" => Ok(ItemKind::Tool),
            other => Err(other.to_string()),
        }
    }
}

// ---
// Identidade: o UUID é a chave oficial, mas o nome também é único por tipo.
// ---
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKey {
    Id(Uuid),
    Name(String),
}

impl ItemKey {
    /// Texto vindo da URL: se parece um UUID, é um id; senão, é um nome.
    pub fn parse(raw: &str) -> Self {
        match Uuid::parse_str(raw) {
            Ok(id) => ItemKey::Id(id),
            Err(_) => ItemKey::Name(raw.trim().to_string()),
        }
    }

    pub fn matches(&self, id: Uuid, name: &str) -> bool {
        match self {
            ItemKey::Id(key) => *key == id,
            ItemKey::Name(key) => key.to_lowercase() == name.to_lowercase(),
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKey::Id(id) => write!(f, "{id}"),
            ItemKey::Name(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReference {
    pub kind: ItemKind,
    pub key: ItemKey,
}

impl ItemReference {
    pub fn supply(key: ItemKey) -> Self {
        Self { kind: ItemKind::Supply, key }
    }

    pub fn tool(key: ItemKey) -> Self {
        Self { kind: ItemKind::Tool, key }
    }
}

impl fmt::Display for ItemReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.key)
    }
}

// ---
// Item polimórfico: o motor de movimentos só enxerga esta forma comum.
// ---
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Supply(Supply),
    Tool(Tool),
}

impl Item {
    pub fn kind(&self) -> ItemKind {
        match self {
            Item::Supply(_) => ItemKind::Supply,
            Item::Tool(_) => ItemKind::Tool,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Item::Supply(supply) => supply.id,
            Item::Tool(tool) => tool.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Item::Supply(supply) => &supply.name,
            Item::Tool(tool) => &tool.name,
        }
    }

    pub fn quantity(&self) -> Decimal {
        match self {
            Item::Supply(supply) => supply.quantity,
            Item::Tool(tool) => Decimal::from(tool.quantity),
        }
    }

    /// Ferramentas só aceitam unidades inteiras.
    pub fn check_granularity(&self, quantity: Decimal) -> Result<(), QuantityError> {
        match self {
            Item::Supply(_) => Ok(()),
            Item::Tool(_) => Self::check_tool_quantity(quantity),
        }
    }

    pub fn set_quantity(&mut self, quantity: Decimal, now: DateTime<Utc>) -> Result<(), QuantityError> {
        if quantity < Decimal::ZERO {
            return Err(QuantityError::Negative(quantity));
        }
        match self {
            Item::Supply(supply) => {
                supply.quantity = quantity;
                supply.updated_at = now;
            }
            Item::Tool(tool) => {
                Self::check_tool_quantity(quantity)?;
                tool.quantity = quantity.to_i32().ok_or(QuantityError::OutOfRange(quantity))?;
                tool.updated_at = now;
            }
        }
        Ok(())
    }

    fn check_tool_quantity(quantity: Decimal) -> Result<(), QuantityError> {
        if quantity.fract().is_zero() {
            Ok(())
        } else {
            Err(QuantityError::Fractional(quantity))
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        match self {
            Item::Supply(supply) => supply.updated_at = now,
            Item::Tool(tool) => tool.updated_at = now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tool::{StorageArea, ToolCategory, ToolCondition};
    use rust_decimal_macros::dec;

    fn tool(quantity: i32) -> Item {
        let now = Utc::now();
        Item::Tool(Tool {
            id: Uuid::new_v4(),
            name: "Knife".into(),
            category: ToolCategory::Utensil,
            quantity,
            location: StorageArea::Warehouse,
            condition: ToolCondition::Excellent,
            purchase_date: None,
            cost: Decimal::ZERO,
            supplier: String::new(),
            next_maintenance_date: None,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        })
    }

    #[test]
    fn key_parses_uuid_or_name() {
        let id = Uuid::new_v4();
        assert_eq!(ItemKey::parse(&id.to_string()), ItemKey::Id(id));
        assert_eq!(ItemKey::parse(" Flour "), ItemKey::Name("Flour".into()));
    }

    #[test]
    fn name_key_matches_case_insensitively() {
        let id = Uuid::new_v4();
        assert!(ItemKey::Name("flour".into()).matches(id, "Flour"));
        assert!(!ItemKey::Name("sugar".into()).matches(id, "Flour"));
        assert!(ItemKey::Id(id).matches(id, "anything"));
    }

    #[test]
    fn tools_reject_fractional_quantities() {
        let mut item = tool(3);
        assert_eq!(
            item.set_quantity(dec!(2.5), Utc::now()),
            Err(QuantityError::Fractional(dec!(2.5)))
        );
        assert_eq!(item.quantity(), dec!(3));

        item.set_quantity(dec!(7), Utc::now()).unwrap();
        assert_eq!(item.quantity(), dec!(7));
    }

    #[test]
    fn item_kind_parses_plural_path_segments() {
        assert_eq!("tools".parse::<ItemKind>(), Ok(ItemKind::Tool));
        assert_eq!("Supply".parse::<ItemKind>(), Ok(ItemKind::Supply));
        assert!("gadget".parse::<ItemKind>().is_err());
    }
}
