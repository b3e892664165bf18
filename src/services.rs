pub mod reconciliation;
pub mod movement_service;
pub use movement_service::{MovementQuery, MovementRequest, MovementService};
pub mod supply_service;
pub use supply_service::SupplyService;
pub mod tool_service;
pub use tool_service::ToolService;
