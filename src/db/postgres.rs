// src/db/postgres.rs

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        store::{InventoryStore, StoreTransaction},
        MovementRepository, SupplyRepository, ToolRepository,
    },
    models::{
        item::{Item, ItemKey, ItemKind, ItemReference},
        movement::{DateRange, Movement, MovementFilter, MovementTotal, NewMovement},
        supply::{Supply, SupplyFilter},
        tool::{StorageArea, Tool, ToolFilter},
    },
};

#[derive(Debug, Clone)]
pub struct PgSettings {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    supplies: SupplyRepository,
    tools: ToolRepository,
    movements: MovementRepository,
}

impl PgStore {
    /// Conecta e roda as migrações. Falha aqui é fatal para a inicialização.
    pub async fn open(settings: &PgSettings) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect(&settings.url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        sqlx::migrate!().run(&pool).await?;

        tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

        Ok(Self {
            pool,
            supplies: SupplyRepository::new(),
            tools: ToolRepository::new(),
            movements: MovementRepository::new(),
        })
    }
}

#[async_trait]
impl InventoryStore for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction {
            tx,
            supplies: self.supplies.clone(),
            tools: self.tools.clone(),
            movements: self.movements.clone(),
        }))
    }

    async fn list_supplies(&self, filter: &SupplyFilter) -> Result<Vec<Supply>, AppError> {
        self.supplies.list(&self.pool, filter).await
    }

    async fn find_supply(&self, key: &ItemKey) -> Result<Option<Supply>, AppError> {
        self.supplies.find(&self.pool, key, false).await
    }

    async fn low_stock_supplies(&self) -> Result<Vec<Supply>, AppError> {
        self.supplies.low_stock(&self.pool).await
    }

    async fn list_tools(&self, filter: &ToolFilter) -> Result<Vec<Tool>, AppError> {
        self.tools.list(&self.pool, filter).await
    }

    async fn find_tool(&self, key: &ItemKey) -> Result<Option<Tool>, AppError> {
        self.tools.find(&self.pool, key, false).await
    }

    async fn maintenance_due_tools(&self, today: NaiveDate) -> Result<Vec<Tool>, AppError> {
        self.tools.maintenance_due(&self.pool, today).await
    }

    async fn tool_location_counts(&self) -> Result<Vec<(StorageArea, i64)>, AppError> {
        self.tools.location_counts(&self.pool).await
    }

    async fn list_movements(&self, filter: &MovementFilter) -> Result<Vec<Movement>, AppError> {
        self.movements.list(&self.pool, filter).await
    }

    async fn movement_totals(&self, range: &DateRange) -> Result<Vec<MovementTotal>, AppError> {
        self.movements.totals(&self.pool, range).await
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Pool do banco de dados fechada.");
    }
}

// ---
// Transação Postgres: a trava por item é o `SELECT ... FOR UPDATE`.
// Soltar sem commit faz ROLLBACK (comportamento do sqlx::Transaction).
// ---
pub struct PgTransaction {
    tx: Transaction<'static, Postgres>,
    supplies: SupplyRepository,
    tools: ToolRepository,
    movements: MovementRepository,
}

#[async_trait]
impl StoreTransaction for PgTransaction {
    async fn insert_supply(&mut self, supply: &Supply) -> Result<(), AppError> {
        self.supplies.insert(&mut *self.tx, supply).await
    }

    async fn insert_tool(&mut self, tool: &Tool) -> Result<(), AppError> {
        self.tools.insert(&mut *self.tx, tool).await
    }

    async fn lock_item(&mut self, reference: &ItemReference) -> Result<Option<Item>, AppError> {
        let item = match reference.kind {
            ItemKind::Supply => self
                .supplies
                .find(&mut *self.tx, &reference.key, true)
                .await?
                .map(Item::Supply),
            ItemKind::Tool => self
                .tools
                .find(&mut *self.tx, &reference.key, true)
                .await?
                .map(Item::Tool),
        };
        Ok(item)
    }

    async fn save_item(&mut self, item: &Item) -> Result<(), AppError> {
        match item {
            Item::Supply(supply) => self.supplies.update(&mut *self.tx, supply).await,
            Item::Tool(tool) => self.tools.update(&mut *self.tx, tool).await,
        }
    }

    async fn delete_item(&mut self, kind: ItemKind, id: Uuid) -> Result<bool, AppError> {
        match kind {
            ItemKind::Supply => self.supplies.delete(&mut *self.tx, id).await,
            ItemKind::Tool => self.tools.delete(&mut *self.tx, id).await,
        }
    }

    async fn append_movement(&mut self, movement: NewMovement) -> Result<Movement, AppError> {
        self.movements.insert(&mut *self.tx, movement).await
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await?;
        tracing::debug!("Transação confirmada (postgres).");
        Ok(())
    }
}
