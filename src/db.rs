pub mod store;
pub use store::{InventoryStore, StoreTransaction};
pub mod supply_repo;
pub use supply_repo::SupplyRepository;
pub mod tool_repo;
pub use tool_repo::ToolRepository;
pub mod movement_repo;
pub use movement_repo::MovementRepository;
pub mod postgres;
pub use postgres::{PgSettings, PgStore};
pub mod memory;
pub use memory::MemoryStore;
