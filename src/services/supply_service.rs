// src/services/supply_service.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::InventoryStore,
    models::{
        item::{Item, ItemKey, ItemReference},
        movement::{MovementKind, MANUAL_UPDATE_REASON},
        supply::{NewSupply, Supply, SupplyChanges, SupplyFilter, SupplyView},
    },
    services::reconciliation,
};

#[derive(Clone)]
pub struct SupplyService {
    store: Arc<dyn InventoryStore>,
}

impl SupplyService {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, filter: &SupplyFilter) -> Result<Vec<SupplyView>, AppError> {
        let supplies = self.store.list_supplies(filter).await?;
        Ok(supplies.into_iter().map(SupplyView::from).collect())
    }

    pub async fn get(&self, key: &ItemKey) -> Result<SupplyView, AppError> {
        self.store
            .find_supply(key)
            .await?
            .map(SupplyView::from)
            .ok_or_else(|| AppError::SupplyNotFound(key.to_string()))
    }

    pub async fn low_stock(&self) -> Result<Vec<SupplyView>, AppError> {
        let supplies = self.store.low_stock_supplies().await?;
        Ok(supplies.into_iter().map(SupplyView::from).collect())
    }

    // --- CREATE SUPPLY ---
    // O cadastro e o primeiro movimento do histórico entram juntos.
    pub async fn create(&self, payload: NewSupply) -> Result<SupplyView, AppError> {
        let actor = reconciliation::normalize_actor(payload.actor.as_deref());
        let now = Utc::now();

        let supply = Supply {
            id: Uuid::new_v4(),
            name: payload.name.trim().to_string(),
            category: payload.category,
            quantity: payload.quantity,
            unit: payload.unit,
            minimum_threshold: payload.minimum_threshold,
            unit_price: payload.unit_price,
            supplier: payload.supplier.trim().to_string(),
            expiration_date: payload.expiration_date,
            notes: payload.notes.trim().to_string(),
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.store.begin().await?;
        tx.insert_supply(&supply).await?;
        reconciliation::record_creation(tx.as_mut(), &Item::Supply(supply.clone()), &actor).await?;
        tx.commit().await?;

        tracing::info!(supply = %supply.name, quantity = %supply.quantity, "Insumo criado");
        Ok(SupplyView::from(supply))
    }

    // --- UPDATE SUPPLY ---
    // Campos descritivos são gravados direto; uma nova quantidade vira ajuste.
    pub async fn update(&self, key: &ItemKey, changes: SupplyChanges) -> Result<SupplyView, AppError> {
        let actor = reconciliation::normalize_actor(changes.actor.as_deref());

        let mut tx = self.store.begin().await?;
        let mut item = tx
            .lock_item(&ItemReference::supply(key.clone()))
            .await?
            .ok_or_else(|| AppError::SupplyNotFound(key.to_string()))?;
        // Relógio lido só depois da trava: o histórico segue a ordem de commit
        let now = Utc::now();

        if let Item::Supply(supply) = &mut item {
            changes.apply_fields(supply);
        }
        item.touch(now);

        match changes.quantity {
            Some(quantity) if quantity != item.quantity() => {
                reconciliation::apply_in_tx(
                    tx.as_mut(),
                    &mut item,
                    MovementKind::Adjustment,
                    quantity,
                    MANUAL_UPDATE_REASON,
                    &actor,
                    now,
                )
                .await?;
            }
            _ => tx.save_item(&item).await?,
        }
        tx.commit().await?;

        match item {
            Item::Supply(supply) => Ok(SupplyView::from(supply)),
            Item::Tool(_) => Err(AppError::SupplyNotFound(key.to_string())),
        }
    }

    // --- DELETE SUPPLY ---
    // O histórico fica: os movimentos guardam o nome do item.
    pub async fn delete(&self, key: &ItemKey) -> Result<(), AppError> {
        let mut tx = self.store.begin().await?;
        let item = tx
            .lock_item(&ItemReference::supply(key.clone()))
            .await?
            .ok_or_else(|| AppError::SupplyNotFound(key.to_string()))?;

        if !tx.delete_item(item.kind(), item.id()).await? {
            return Err(AppError::SupplyNotFound(key.to_string()));
        }
        tx.commit().await?;

        tracing::info!(supply = %item.name(), "Insumo excluído");
        Ok(())
    }
}
