// src/services/tool_service.rs

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::InventoryStore,
    models::{
        item::{Item, ItemKey, ItemReference},
        movement::{MovementKind, MANUAL_UPDATE_REASON},
        tool::{LocationCounts, NewTool, Tool, ToolChanges, ToolFilter, ToolView},
    },
    services::reconciliation,
};

#[derive(Clone)]
pub struct ToolService {
    store: Arc<dyn InventoryStore>,
}

impl ToolService {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    // "Hoje" para a agenda de manutenção
    pub fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    pub async fn list(&self, filter: &ToolFilter) -> Result<Vec<ToolView>, AppError> {
        let today = Self::today();
        let tools = self.store.list_tools(filter).await?;
        Ok(tools.into_iter().map(|tool| ToolView::new(tool, today)).collect())
    }

    pub async fn get(&self, key: &ItemKey) -> Result<ToolView, AppError> {
        self.store
            .find_tool(key)
            .await?
            .map(|tool| ToolView::new(tool, Self::today()))
            .ok_or_else(|| AppError::ToolNotFound(key.to_string()))
    }

    pub async fn maintenance_due(&self, today: NaiveDate) -> Result<Vec<ToolView>, AppError> {
        let tools = self.store.maintenance_due_tools(today).await?;
        Ok(tools.into_iter().map(|tool| ToolView::new(tool, today)).collect())
    }

    pub async fn location_counts(&self) -> Result<LocationCounts, AppError> {
        let rows = self.store.tool_location_counts().await?;
        Ok(LocationCounts::from_rows(&rows))
    }

    // --- CREATE TOOL ---
    pub async fn create(&self, payload: NewTool) -> Result<ToolView, AppError> {
        let actor = reconciliation::normalize_actor(payload.actor.as_deref());
        let now = Utc::now();

        let tool = Tool {
            id: Uuid::new_v4(),
            name: payload.name.trim().to_string(),
            category: payload.category,
            quantity: payload.quantity,
            location: payload.location,
            condition: payload.condition,
            purchase_date: payload.purchase_date,
            cost: payload.cost,
            supplier: payload.supplier.trim().to_string(),
            next_maintenance_date: payload.next_maintenance_date,
            notes: payload.notes.trim().to_string(),
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.store.begin().await?;
        tx.insert_tool(&tool).await?;
        reconciliation::record_creation(tx.as_mut(), &Item::Tool(tool.clone()), &actor).await?;
        tx.commit().await?;

        tracing::info!(tool = %tool.name, quantity = tool.quantity, location = ?tool.location, "Ferramenta criada");
        Ok(ToolView::new(tool, Self::today()))
    }

    // --- UPDATE TOOL ---
    pub async fn update(&self, key: &ItemKey, changes: ToolChanges) -> Result<ToolView, AppError> {
        let actor = reconciliation::normalize_actor(changes.actor.as_deref());

        let mut tx = self.store.begin().await?;
        let mut item = tx
            .lock_item(&ItemReference::tool(key.clone()))
            .await?
            .ok_or_else(|| AppError::ToolNotFound(key.to_string()))?;
        // Relógio lido só depois da trava: o histórico segue a ordem de commit
        let now = Utc::now();

        if let Item::Tool(tool) = &mut item {
            changes.apply_fields(tool);
        }
        item.touch(now);

        match changes.quantity.map(Decimal::from) {
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
            Item::Tool(tool) => Ok(ToolView::new(tool, Self::today())),
            Item::Supply(_) => Err(AppError::ToolNotFound(key.to_string())),
        }
    }

    // --- DELETE TOOL ---
    pub async fn delete(&self, key: &ItemKey) -> Result<(), AppError> {
        let mut tx = self.store.begin().await?;
        let item = tx
            .lock_item(&ItemReference::tool(key.clone()))
            .await?
            .ok_or_else(|| AppError::ToolNotFound(key.to_string()))?;

        if !tx.delete_item(item.kind(), item.id()).await? {
            return Err(AppError::ToolNotFound(key.to_string()));
        }
        tx.commit().await?;

        tracing::info!(tool = %item.name(), "Ferramenta excluída");
        Ok(())
    }
}
