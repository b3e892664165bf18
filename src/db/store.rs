// src/db/store.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        item::{Item, ItemKey, ItemKind, ItemReference},
        movement::{DateRange, Movement, MovementFilter, MovementTotal, NewMovement},
        supply::{Supply, SupplyFilter},
        tool::{StorageArea, Tool, ToolFilter},
    },
};

// ---
// Contrato do armazenamento. Os serviços só conhecem estes dois traits;
// Postgres e memória são as implementações.
// ---

/// Leituras sem trava e abertura de transações.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, AppError>;

    // --- Insumos ---

    /// Ordenados por nome.
    async fn list_supplies(&self, filter: &SupplyFilter) -> Result<Vec<Supply>, AppError>;
    async fn find_supply(&self, key: &ItemKey) -> Result<Option<Supply>, AppError>;
    async fn low_stock_supplies(&self) -> Result<Vec<Supply>, AppError>;

    // --- Ferramentas ---

    async fn list_tools(&self, filter: &ToolFilter) -> Result<Vec<Tool>, AppError>;
    async fn find_tool(&self, key: &ItemKey) -> Result<Option<Tool>, AppError>;
    /// Data de manutenção <= `today`, da mais antiga para a mais nova.
    async fn maintenance_due_tools(&self, today: NaiveDate) -> Result<Vec<Tool>, AppError>;
    /// Número de registros de ferramenta por local (locais vazios podem faltar).
    async fn tool_location_counts(&self) -> Result<Vec<(StorageArea, i64)>, AppError>;

    // --- Movimentos ---

    /// Do mais novo para o mais antigo; empate no instante desfeito pela sequência.
    async fn list_movements(&self, filter: &MovementFilter) -> Result<Vec<Movement>, AppError>;
    async fn movement_totals(&self, range: &DateRange) -> Result<Vec<MovementTotal>, AppError>;

    /// Fecha o armazenamento. Chamadas posteriores falham com `StoreClosed`.
    async fn close(&self);
}

/// Unidade atômica de escrita. Soltar sem `commit` descarta tudo.
#[async_trait]
pub trait StoreTransaction: Send {
    async fn insert_supply(&mut self, supply: &Supply) -> Result<(), AppError>;
    async fn insert_tool(&mut self, tool: &Tool) -> Result<(), AppError>;

    /// Resolve o item e o trava até o fim da transação.
    async fn lock_item(&mut self, reference: &ItemReference) -> Result<Option<Item>, AppError>;

    async fn save_item(&mut self, item: &Item) -> Result<(), AppError>;

    /// `false` se o item não existia.
    async fn delete_item(&mut self, kind: ItemKind, id: Uuid) -> Result<bool, AppError>;

    /// Grava no histórico; o armazenamento atribui id e sequência.
    async fn append_movement(&mut self, movement: NewMovement) -> Result<Movement, AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}
