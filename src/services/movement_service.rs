// src/services/movement_service.rs

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::{error::AppError, validation::field_error},
    db::InventoryStore,
    models::{
        item::{ItemKey, ItemKind, ItemReference},
        movement::{DateRange, Movement, MovementFilter, MovementKind, MovementStatistics},
    },
    services::reconciliation,
};

// Pedido de movimento já desserializado, ainda não validado
#[derive(Debug, Clone)]
pub struct MovementRequest {
    pub kind: MovementKind,
    pub quantity: Decimal,
    pub reason: String,
    pub actor: Option<String>,
}

// Filtros da listagem (GET /api/movements)
#[derive(Debug, Clone, Default)]
pub struct MovementQuery {
    pub item_kind: Option<ItemKind>,
    pub kind: Option<MovementKind>,
    pub item_id: Option<Uuid>,
    pub range: DateRange,
    pub limit: Option<i64>,
}

#[derive(Clone)]
pub struct MovementService {
    store: Arc<dyn InventoryStore>,
    default_limit: i64,
    max_limit: i64,
}

impl MovementService {
    pub fn new(store: Arc<dyn InventoryStore>, default_limit: i64, max_limit: i64) -> Self {
        Self { store, default_limit, max_limit }
    }

    // --- APPLY MOVEMENT ---
    pub async fn apply_movement(
        &self,
        reference: &ItemReference,
        request: MovementRequest,
    ) -> Result<Movement, AppError> {
        let reason = reconciliation::require_reason(&request.reason)?;
        let actor = reconciliation::normalize_actor(request.actor.as_deref());

        let mut tx = self.store.begin().await?;

        // 1. Trava o item (FOR UPDATE / trava por item)
        let mut item = tx
            .lock_item(reference)
            .await?
            .ok_or_else(|| AppError::not_found(reference.kind, &reference.key))?;

        // 2. Calcula, valida e grava item + histórico
        let movement = reconciliation::apply_in_tx(
            tx.as_mut(),
            &mut item,
            request.kind,
            request.quantity,
            &reason,
            &actor,
            Utc::now(),
        )
        .await?;

        // 3. Commit
        tx.commit().await?;
        Ok(movement)
    }

    // --- HISTORY ---
    pub async fn history(&self, query: MovementQuery) -> Result<Vec<Movement>, AppError> {
        let limit = match query.limit {
            None => self.default_limit,
            Some(limit) if limit >= 1 => limit.min(self.max_limit),
            Some(_) => {
                return Err(field_error("limit", "range", "The limit must be at least 1.").into());
            }
        };

        let filter = MovementFilter {
            item_kind: query.item_kind,
            kind: query.kind,
            item_id: query.item_id,
            range: query.range,
            limit: Some(limit),
        };
        self.store.list_movements(&filter).await
    }

    /// Histórico completo de um item. Por id funciona mesmo depois da exclusão;
    /// por nome, só enquanto o item existir.
    pub async fn item_history(&self, kind: ItemKind, key: &ItemKey) -> Result<Vec<Movement>, AppError> {
        let item_id = match key {
            ItemKey::Id(id) => *id,
            ItemKey::Name(_) => {
                let found = match kind {
                    ItemKind::Supply => self.store.find_supply(key).await?.map(|s| s.id),
                    ItemKind::Tool => self.store.find_tool(key).await?.map(|t| t.id),
                };
                found.ok_or_else(|| AppError::not_found(kind, key))?
            }
        };

        let filter = MovementFilter {
            item_kind: Some(kind),
            item_id: Some(item_id),
            ..Default::default()
        };
        self.store.list_movements(&filter).await
    }

    // --- STATISTICS ---
    pub async fn statistics(&self, range: DateRange) -> Result<MovementStatistics, AppError> {
        let totals = self.store.movement_totals(&range).await?;
        Ok(MovementStatistics::from_totals(totals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::supply::{NewSupply, SupplyCategory, SupplyUnit};
    use crate::services::SupplyService;
    use rust_decimal_macros::dec;

    struct Kitchen {
        store: Arc<dyn InventoryStore>,
        supplies: SupplyService,
        movements: MovementService,
    }

    fn kitchen() -> Kitchen {
        let store: Arc<dyn InventoryStore> = Arc::new(MemoryStore::open());
        Kitchen {
            supplies: SupplyService::new(store.clone()),
            movements: MovementService::new(store.clone(), 100, 1000),
            store,
        }
    }

    fn new_supply(name: &str, quantity: Decimal, threshold: Decimal) -> NewSupply {
        NewSupply {
            name: name.into(),
            category: SupplyCategory::Ingredient,
            quantity,
            unit: SupplyUnit::Kg,
            minimum_threshold: threshold,
            unit_price: dec!(1.5),
            supplier: String::new(),
            expiration_date: None,
            notes: String::new(),
            actor: None,
        }
    }

    fn request(kind: MovementKind, quantity: Decimal) -> MovementRequest {
        MovementRequest { kind, quantity, reason: "kitchen".into(), actor: Some("chef".into()) }
    }

    fn flour() -> ItemReference {
        ItemReference::supply(ItemKey::Name("Flour".into()))
    }

    async fn assert_quantity_matches_last_movement(k: &Kitchen, name: &str) {
        let supply = k.supplies.get(&ItemKey::Name(name.into())).await.unwrap().supply;
        let history = k.movements.item_history(ItemKind::Supply, &ItemKey::Id(supply.id)).await.unwrap();
        assert_eq!(history.first().map(|m| m.quantity_after), Some(supply.quantity));
    }

    #[tokio::test]
    async fn exit_reduces_stock_and_records_snapshots() {
        let k = kitchen();
        k.supplies.create(new_supply("Flour", dec!(10), dec!(2))).await.unwrap();

        let movement = k.movements.apply_movement(&flour(), request(MovementKind::Exit, dec!(4))).await.unwrap();

        assert_eq!(movement.quantity_before, dec!(10));
        assert_eq!(movement.quantity_after, dec!(6));
        assert_eq!(movement.actor, "chef");
        let supply = k.supplies.get(&ItemKey::Name("flour".into())).await.unwrap();
        assert_eq!(supply.supply.quantity, dec!(6));
        assert_quantity_matches_last_movement(&k, "Flour").await;
    }

    #[tokio::test]
    async fn overuse_fails_without_partial_writes() {
        let k = kitchen();
        k.supplies.create(new_supply("Flour", dec!(10), dec!(2))).await.unwrap();
        k.movements.apply_movement(&flour(), request(MovementKind::Exit, dec!(4))).await.unwrap();

        let err = k
            .movements
            .apply_movement(&flour(), request(MovementKind::Exit, dec!(10)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { .. }));

        let supply = k.supplies.get(&ItemKey::Name("Flour".into())).await.unwrap();
        assert_eq!(supply.supply.quantity, dec!(6));
        let history = k.movements.history(MovementQuery::default()).await.unwrap();
        assert_eq!(history.len(), 2, "creation + first exit only");
        assert_quantity_matches_last_movement(&k, "Flour").await;
    }

    #[tokio::test]
    async fn unknown_items_and_blank_reasons_are_rejected() {
        let k = kitchen();
        let err = k.movements.apply_movement(&flour(), request(MovementKind::Entry, dec!(1))).await.unwrap_err();
        assert!(matches!(err, AppError::SupplyNotFound(_)));

        k.supplies.create(new_supply("Flour", dec!(1), dec!(0))).await.unwrap();
        let mut blank = request(MovementKind::Entry, dec!(1));
        blank.reason = "  ".into();
        let err = k.movements.apply_movement(&flour(), blank).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = k
            .movements
            .apply_movement(&flour(), request(MovementKind::Entry, dec!(0)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidQuantity(_)));
    }

    #[tokio::test]
    async fn adjustment_to_zero_is_allowed() {
        let k = kitchen();
        k.supplies.create(new_supply("Flour", dec!(3.5), dec!(1))).await.unwrap();

        let movement = k
            .movements
            .apply_movement(&flour(), request(MovementKind::Adjustment, dec!(0)))
            .await
            .unwrap();
        assert_eq!(movement.quantity_after, dec!(0));
        assert_eq!(movement.quantity, dec!(0));
    }

    #[tokio::test]
    async fn concurrent_exits_on_one_item_are_serialised() {
        let k = kitchen();
        k.supplies.create(new_supply("Flour", dec!(10), dec!(2))).await.unwrap();

        let first = {
            let movements = k.movements.clone();
            tokio::spawn(async move { movements.apply_movement(&flour(), request(MovementKind::Exit, dec!(6))).await })
        };
        let second = {
            let movements = k.movements.clone();
            tokio::spawn(async move { movements.apply_movement(&flour(), request(MovementKind::Exit, dec!(6))).await })
        };
        let results = [first.await.unwrap(), second.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results.iter().any(|r| matches!(r, Err(AppError::InsufficientStock { .. }))));

        let supply = k.supplies.get(&ItemKey::Name("Flour".into())).await.unwrap();
        assert_eq!(supply.supply.quantity, dec!(4));
        assert_quantity_matches_last_movement(&k, "Flour").await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn many_parallel_movements_keep_the_ledger_consistent() {
        let k = kitchen();
        k.supplies.create(new_supply("Flour", dec!(5), dec!(0))).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..20 {
            let movements = k.movements.clone();
            let kind = if i % 2 == 0 { MovementKind::Entry } else { MovementKind::Usage };
            handles.push(tokio::spawn(async move {
                movements.apply_movement(&flour(), request(kind, dec!(1))).await
            }));
        }
        for handle in handles {
            let _ = handle.await.unwrap();
        }

        let supply = k.supplies.get(&ItemKey::Name("Flour".into())).await.unwrap().supply;
        assert!(supply.quantity >= Decimal::ZERO);
        assert_quantity_matches_last_movement(&k, "Flour").await;

        // Cada movimento aceito encadeia no anterior
        let mut history = k.movements.item_history(ItemKind::Supply, &ItemKey::Id(supply.id)).await.unwrap();
        history.reverse();
        for pair in history.windows(2) {
            assert_eq!(pair[0].quantity_after, pair[1].quantity_before);
        }
    }

    #[tokio::test]
    async fn statistics_group_the_window() {
        let k = kitchen();
        k.supplies.create(new_supply("Flour", dec!(0), dec!(0))).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let window_start = Utc::now();

        for quantity in [dec!(5), dec!(3), dec!(2)] {
            k.movements.apply_movement(&flour(), request(MovementKind::Entry, quantity)).await.unwrap();
        }
        for quantity in [dec!(1), dec!(4)] {
            k.movements.apply_movement(&flour(), request(MovementKind::Exit, quantity)).await.unwrap();
        }

        let stats = k
            .movements
            .statistics(DateRange { from: Some(window_start), to: Some(Utc::now()) })
            .await
            .unwrap();
        let supplies = &stats.by_item_kind[&ItemKind::Supply];
        assert_eq!(supplies.movements[&MovementKind::Entry].count, 3);
        assert_eq!(supplies.movements[&MovementKind::Entry].total_quantity, dec!(10));
        assert_eq!(supplies.movements[&MovementKind::Exit].count, 2);
        assert_eq!(supplies.movements[&MovementKind::Exit].total_quantity, dec!(5));
        assert_eq!(stats.total_count, 5);
        assert!(!stats.by_item_kind.contains_key(&ItemKind::Tool));
    }

    #[tokio::test]
    async fn history_is_newest_first_and_limited() {
        let k = kitchen();
        k.supplies.create(new_supply("Flour", dec!(1), dec!(0))).await.unwrap();
        for _ in 0..3 {
            k.movements.apply_movement(&flour(), request(MovementKind::Entry, dec!(1))).await.unwrap();
        }

        let all = k.movements.history(MovementQuery::default()).await.unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].quantity_after, dec!(4));
        assert_eq!(all[3].reason, "Initial creation");

        let limited = k.movements.history(MovementQuery { limit: Some(2), ..Default::default() }).await.unwrap();
        assert_eq!(limited.len(), 2);

        let err = k.movements.history(MovementQuery { limit: Some(0), ..Default::default() }).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        // Leituras repetidas não mudam nada
        let again = k.movements.history(MovementQuery::default()).await.unwrap();
        assert_eq!(again, all);
        assert!(k.store.find_supply(&ItemKey::Name("Flour".into())).await.unwrap().is_some());
    }
}
