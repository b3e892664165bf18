// src/router.rs

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers};

pub fn build_router(app_state: AppState) -> Router {
    // Rotas fixas ficam ao lado de `/{key}`; o axum prioriza o segmento literal
    let supply_routes = Router::new()
        .route(
            "/",
            get(handlers::supplies::list_supplies).post(handlers::supplies::create_supply),
        )
        .route("/low-stock", get(handlers::supplies::low_stock))
        .route(
            "/{key}",
            get(handlers::supplies::get_supply)
                .put(handlers::supplies::update_supply)
                .delete(handlers::supplies::delete_supply),
        );

    let tool_routes = Router::new()
        .route(
            "/",
            get(handlers::tools::list_tools).post(handlers::tools::create_tool),
        )
        .route("/counts", get(handlers::tools::location_counts))
        .route("/maintenance-due", get(handlers::tools::maintenance_due))
        .route(
            "/{key}",
            get(handlers::tools::get_tool)
                .put(handlers::tools::update_tool)
                .delete(handlers::tools::delete_tool),
        );

    let movement_routes = Router::new()
        .route(
            "/",
            get(handlers::movements::list_movements).post(handlers::movements::create_movement),
        )
        .route("/supply", post(handlers::movements::create_supply_movement))
        .route("/tool", post(handlers::movements::create_tool_movement))
        .route("/item/{kind}/{key}", get(handlers::movements::item_history))
        .route("/stats", get(handlers::movements::statistics));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(handlers::health::health))
        .nest("/api/supplies", supply_routes)
        .nest("/api/tools", tool_routes)
        .nest("/api/movements", movement_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::AppConfig;
    use crate::db::{InventoryStore, MemoryStore};

    fn app() -> Router {
        let store: Arc<dyn InventoryStore> = Arc::new(MemoryStore::open());
        build_router(AppState::with_store(AppConfig::default(), store))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    async fn create_flour(app: &Router) -> Value {
        let (status, body) = send(
            app,
            post_json(
                "/api/supplies",
                json!({ "name": "Flour", "quantity": 10, "unit": "kg", "minimumThreshold": 2, "unitPrice": 1.5 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    #[tokio::test]
    async fn health_reports_the_backend() {
        let (status, body) = send(&app(), get("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "ok");
        assert_eq!(body["data"]["storage"], "memory");
    }

    #[tokio::test]
    async fn supplies_are_created_and_fetched_by_name() {
        let app = app();
        let created = create_flour(&app).await;
        assert_eq!(created["success"], true);
        assert_eq!(created["message"], "Supply created successfully.");
        assert_eq!(created["data"]["needsRestock"], false);

        let (status, body) = send(&app, get("/api/supplies/flour")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Flour");
        assert_eq!(body["data"]["id"], created["data"]["id"]);

        let (status, body) = send(&app, get("/api/supplies?search=FLO")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_payloads_report_field_details() {
        let (status, body) = send(
            &app(),
            post_json("/api/supplies", json!({ "name": "  ", "quantity": -1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["details"]["name"].is_array());
        assert!(body["details"]["quantity"].is_array());
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let request = Request::post("/api/supplies")
            .header("content-type", "application/json")
            .body(Body::from("{ not json"))
            .unwrap();
        let (status, body) = send(&app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "MALFORMED_REQUEST");
    }

    #[tokio::test]
    async fn missing_and_duplicate_items_map_to_404_and_409() {
        let app = app();
        let (status, body) = send(&app, get("/api/tools/Whisk")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");

        create_flour(&app).await;
        let (status, body) = send(&app, post_json("/api/supplies", json!({ "name": "FLOUR" }))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "DUPLICATE_NAME");
    }

    #[tokio::test]
    async fn movements_by_name_update_stock_and_localize_failures() {
        let app = app();
        create_flour(&app).await;

        let (status, body) = send(
            &app,
            post_json("/api/movements/supply", json!({ "name": "Flour", "kind": "exit", "quantity": 4, "reason": "bread" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["data"]["quantityBefore"], 10.0);
        assert_eq!(body["data"]["quantityAfter"], 6.0);

        let request = Request::post("/api/movements/supply")
            .header("content-type", "application/json")
            .header("accept-language", "es-ES,es;q=0.9")
            .body(Body::from(
                json!({ "name": "Flour", "kind": "usage", "quantity": 7, "reason": "cake" }).to_string(),
            ))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INSUFFICIENT_STOCK");
        assert!(body["message"].as_str().unwrap().contains("Flour"));
        assert!(body["message"].as_str().unwrap().starts_with("No hay suficiente stock"));

        let (_, body) = send(&app, get("/api/supplies/Flour")).await;
        assert_eq!(body["data"]["quantity"], 6.0);
    }

    #[tokio::test]
    async fn item_history_and_statistics_are_served() {
        let app = app();
        let created = create_flour(&app).await;
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            post_json(
                "/api/movements",
                json!({ "itemKind": "supply", "itemId": id, "kind": "entry", "quantity": 5, "reason": "delivery" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&app, get(&format!("/api/movements/item/supplies/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"][0]["kind"], "entry");
        assert_eq!(body["data"][0]["quantityAfter"], 15.0);

        let (status, body) = send(&app, get("/api/movements/item/gadget/Flour")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_ITEM_KIND");

        let (status, body) = send(&app, get("/api/movements/stats")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["totalCount"], 2);

        let (status, body) = send(&app, get("/api/movements?from=2026-10-20&to=2026-10-01")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_DATE");
    }

    #[tokio::test]
    async fn tool_counts_cover_every_location() {
        let app = app();
        let (status, body) = send(
            &app,
            post_json("/api/tools", json!({ "name": "Knife", "quantity": 3, "location": "warehouse" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");

        let (status, body) = send(&app, get("/api/tools/counts")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!({ "warehouse": 1, "workshop": 0, "storeroom": 0, "all": 1 }));
    }
}
