// src/docs.rs

use utoipa::OpenApi;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Health ---
        handlers::health::health,

        // --- SUPPLIES ---
        handlers::supplies::list_supplies,
        handlers::supplies::low_stock,
        handlers::supplies::get_supply,
        handlers::supplies::create_supply,
        handlers::supplies::update_supply,
        handlers::supplies::delete_supply,

        // --- TOOLS ---
        handlers::tools::list_tools,
        handlers::tools::location_counts,
        handlers::tools::maintenance_due,
        handlers::tools::get_tool,
        handlers::tools::create_tool,
        handlers::tools::update_tool,
        handlers::tools::delete_tool,

        // --- MOVEMENTS ---
        handlers::movements::list_movements,
        handlers::movements::create_movement,
        handlers::movements::create_supply_movement,
        handlers::movements::create_tool_movement,
        handlers::movements::item_history,
        handlers::movements::statistics,
    ),
    components(
        schemas(
            handlers::health::HealthStatus,

            // --- Supplies ---
            models::supply::SupplyCategory,
            models::supply::SupplyUnit,
            models::supply::Supply,
            models::supply::SupplyView,
            models::supply::NewSupply,
            models::supply::SupplyChanges,

            // --- Tools ---
            models::tool::ToolCategory,
            models::tool::ToolCondition,
            models::tool::StorageArea,
            models::tool::Tool,
            models::tool::ToolView,
            models::tool::NewTool,
            models::tool::ToolChanges,
            models::tool::LocationCounts,

            // --- Movements ---
            models::item::ItemKind,
            models::movement::MovementKind,
            models::movement::Movement,
            models::movement::KindTotals,
            models::movement::ItemKindStatistics,
            models::movement::MovementStatistics,

            // --- MOVEMENT PAYLOADS ---
            handlers::movements::CreateMovementPayload,
            handlers::movements::NamedMovementPayload,
        )
    ),
    tags(
        (name = "Health", description = "Estado do serviço"),
        (name = "Supplies", description = "Insumos consumíveis (ingredientes, bebidas, condimentos)"),
        (name = "Tools", description = "Ferramentas e equipamentos da cozinha"),
        (name = "Movements", description = "Histórico de movimentos e estatísticas")
    )
)]
pub struct ApiDoc;
