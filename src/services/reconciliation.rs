// src/services/reconciliation.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::{
    common::{error::AppError, validation::field_error},
    db::StoreTransaction,
    models::{
        item::Item,
        movement::{Movement, MovementKind, NewMovement, QuantityError, INITIAL_CREATION_REASON, SYSTEM_ACTOR},
    },
};

// ---
// Motor de reconciliação: o ÚNICO caminho que altera a quantidade de um item.
// Tudo roda dentro da transação recebida; quem chama faz o commit.
// ---

/// Ator vazio ou ausente vira "system".
pub fn normalize_actor(actor: Option<&str>) -> String {
    match actor.map(str::trim) {
        Some(actor) if !actor.is_empty() => actor.to_string(),
        _ => SYSTEM_ACTOR.to_string(),
    }
}

pub fn require_reason(reason: &str) -> Result<String, AppError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(field_error("reason", "required", "A reason is required.").into());
    }
    Ok(reason.to_string())
}

/// Aplica um movimento a um item já travado pela transação.
///
/// Em caso de erro nada foi gravado: a validação acontece antes de qualquer
/// escrita, e o chamador descarta a transação.
pub async fn apply_in_tx(
    tx: &mut dyn StoreTransaction,
    item: &mut Item,
    kind: MovementKind,
    quantity: Decimal,
    reason: &str,
    actor: &str,
    now: DateTime<Utc>,
) -> Result<Movement, AppError> {
    item.check_granularity(quantity)?;

    let before = item.quantity();
    let after = kind.resolve(before, quantity).map_err(|e| match e {
        QuantityError::Insufficient { available, requested } => {
            tracing::warn!(
                item = %item.name(),
                kind = kind.as_str(),
                %available,
                %requested,
                "Movimento recusado: estoque insuficiente"
            );
            AppError::InsufficientStock { name: item.name().to_string(), available, requested }
        }
        other => other.into(),
    })?;

    item.set_quantity(after, now)?;
    tx.save_item(item).await?;

    let movement = tx
        .append_movement(NewMovement {
            item_kind: item.kind(),
            item_id: item.id(),
            item_name: item.name().to_string(),
            kind,
            quantity,
            quantity_before: before,
            quantity_after: after,
            reason: reason.to_string(),
            actor: actor.to_string(),
            created_at: now,
        })
        .await?;

    tracing::info!(
        item_kind = %movement.item_kind,
        item = %movement.item_name,
        kind = movement.kind.as_str(),
        before = %movement.quantity_before,
        after = %movement.quantity_after,
        "Movimento registrado"
    );

    Ok(movement)
}

/// Primeiro registro do histórico de um item recém-criado (saldo anterior 0).
pub async fn record_creation(
    tx: &mut dyn StoreTransaction,
    item: &Item,
    actor: &str,
) -> Result<Movement, AppError> {
    let quantity = item.quantity();
    let movement = tx
        .append_movement(NewMovement {
            item_kind: item.kind(),
            item_id: item.id(),
            item_name: item.name().to_string(),
            kind: MovementKind::Entry,
            quantity,
            quantity_before: Decimal::ZERO,
            quantity_after: quantity,
            reason: INITIAL_CREATION_REASON.to_string(),
            actor: actor.to_string(),
            created_at: match item {
                Item::Supply(supply) => supply.created_at,
                Item::Tool(tool) => tool.created_at,
            },
        })
        .await?;
    Ok(movement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{InventoryStore, MemoryStore};
    use crate::models::item::{ItemKey, ItemReference};
    use crate::models::movement::MovementFilter;
    use crate::models::tool::{StorageArea, Tool, ToolCategory, ToolCondition};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    async fn store_with_tool(quantity: i32) -> (MemoryStore, Uuid) {
        let store = MemoryStore::open();
        let now = Utc::now();
        let tool = Tool {
            id: Uuid::new_v4(),
            name: "Whisk".into(),
            category: ToolCategory::Utensil,
            quantity,
            location: StorageArea::Workshop,
            condition: ToolCondition::Good,
            purchase_date: None,
            cost: Decimal::ZERO,
            supplier: String::new(),
            next_maintenance_date: None,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        };
        let mut tx = store.begin().await.unwrap();
        tx.insert_tool(&tool).await.unwrap();
        tx.commit().await.unwrap();
        (store, tool.id)
    }

    #[test]
    fn actor_defaults_to_system() {
        assert_eq!(normalize_actor(None), "system");
        assert_eq!(normalize_actor(Some("   ")), "system");
        assert_eq!(normalize_actor(Some(" chef ")), "chef");
    }

    #[test]
    fn blank_reason_is_a_validation_error() {
        assert!(matches!(require_reason("  "), Err(AppError::ValidationError(_))));
        assert_eq!(require_reason(" restock ").unwrap(), "restock");
    }

    #[tokio::test]
    async fn tool_usage_snapshots_before_and_after() {
        let (store, id) = store_with_tool(3).await;
        let mut tx = store.begin().await.unwrap();
        let mut item = tx.lock_item(&ItemReference::tool(ItemKey::Id(id))).await.unwrap().unwrap();

        let movement = apply_in_tx(tx.as_mut(), &mut item, MovementKind::Usage, dec!(2), "service", "chef", Utc::now())
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(movement.quantity_before, dec!(3));
        assert_eq!(movement.quantity_after, dec!(1));
        assert_eq!(store.find_tool(&ItemKey::Id(id)).await.unwrap().unwrap().quantity, 1);
    }

    #[tokio::test]
    async fn fractional_tool_movements_write_nothing() {
        let (store, id) = store_with_tool(3).await;
        let mut tx = store.begin().await.unwrap();
        let mut item = tx.lock_item(&ItemReference::tool(ItemKey::Id(id))).await.unwrap().unwrap();

        let err = apply_in_tx(tx.as_mut(), &mut item, MovementKind::Entry, dec!(0.5), "oops", "chef", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidQuantity(QuantityError::Fractional(_))));
        drop(tx);

        assert_eq!(store.find_tool(&ItemKey::Id(id)).await.unwrap().unwrap().quantity, 3);
        assert!(store.list_movements(&MovementFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn insufficient_stock_names_the_item() {
        let (store, id) = store_with_tool(1).await;
        let mut tx = store.begin().await.unwrap();
        let mut item = tx.lock_item(&ItemReference::tool(ItemKey::Id(id))).await.unwrap().unwrap();

        let err = apply_in_tx(tx.as_mut(), &mut item, MovementKind::Exit, dec!(2), "lend", "chef", Utc::now())
            .await
            .unwrap_err();
        match err {
            AppError::InsufficientStock { name, available, requested } => {
                assert_eq!(name, "Whisk");
                assert_eq!(available, dec!(1));
                assert_eq!(requested, dec!(2));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(item.quantity(), dec!(1));
    }
}
