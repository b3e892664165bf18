// src/db/memory.rs

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex as SyncMutex, PoisonError};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::{InventoryStore, StoreTransaction},
    models::{
        item::{Item, ItemKey, ItemKind, ItemReference},
        movement::{DateRange, Movement, MovementFilter, MovementKind, MovementTotal, NewMovement},
        supply::{Supply, SupplyFilter},
        tool::{StorageArea, Tool, ToolFilter},
    },
};

// ---
// Armazenamento em memória (desenvolvimento e testes).
// As escritas de uma transação ficam em espera e só são aplicadas no commit,
// de uma vez, sob a trava de escrita do estado.
// ---

#[derive(Default)]
struct MemoryState {
    supplies: HashMap<Uuid, Supply>,
    tools: HashMap<Uuid, Tool>,
    movements: Vec<Movement>,
}

impl MemoryState {
    fn find_supply(&self, key: &ItemKey) -> Option<&Supply> {
        match key {
            ItemKey::Id(id) => self.supplies.get(id),
            ItemKey::Name(_) => self.supplies.values().find(|s| key.matches(s.id, &s.name)),
        }
    }

    fn find_tool(&self, key: &ItemKey) -> Option<&Tool> {
        match key {
            ItemKey::Id(id) => self.tools.get(id),
            ItemKey::Name(_) => self.tools.values().find(|t| key.matches(t.id, &t.name)),
        }
    }

    fn find_item(&self, reference: &ItemReference) -> Option<Item> {
        match reference.kind {
            ItemKind::Supply => self.find_supply(&reference.key).cloned().map(Item::Supply),
            ItemKind::Tool => self.find_tool(&reference.key).cloned().map(Item::Tool),
        }
    }

    fn contains(&self, kind: ItemKind, id: Uuid) -> bool {
        match kind {
            ItemKind::Supply => self.supplies.contains_key(&id),
            ItemKind::Tool => self.tools.contains_key(&id),
        }
    }

    /// Simula o índice único de nome: repassa as escritas pendentes sobre
    /// os nomes atuais e falha na primeira colisão.
    fn check_names(&self, staged: &[StagedWrite]) -> Result<(), AppError> {
        if !staged.iter().any(|w| matches!(w, StagedWrite::Supply(_) | StagedWrite::Tool(_))) {
            return Ok(());
        }

        let mut names: HashMap<ItemKind, HashMap<Uuid, String>> = HashMap::new();
        names.insert(
            ItemKind::Supply,
            self.supplies.values().map(|s| (s.id, s.name.to_lowercase())).collect(),
        );
        names.insert(
            ItemKind::Tool,
            self.tools.values().map(|t| (t.id, t.name.to_lowercase())).collect(),
        );

        for write in staged {
            let (kind, id, name) = match write {
                StagedWrite::Supply(supply) => (ItemKind::Supply, supply.id, &supply.name),
                StagedWrite::Tool(tool) => (ItemKind::Tool, tool.id, &tool.name),
                StagedWrite::Delete(kind, id) => {
                    if let Some(table) = names.get_mut(kind) {
                        table.remove(id);
                    }
                    continue;
                }
                StagedWrite::Movement(_) => continue,
            };

            let table = names.entry(kind).or_default();
            let lowered = name.to_lowercase();
            if table.iter().any(|(other, existing)| *other != id && *existing == lowered) {
                return Err(AppError::DuplicateName { kind, name: name.clone() });
            }
            table.insert(id, lowered);
        }
        Ok(())
    }

    fn apply(&mut self, write: StagedWrite) {
        match write {
            StagedWrite::Supply(supply) => {
                self.supplies.insert(supply.id, supply);
            }
            StagedWrite::Tool(tool) => {
                self.tools.insert(tool.id, tool);
            }
            StagedWrite::Delete(ItemKind::Supply, id) => {
                self.supplies.remove(&id);
            }
            StagedWrite::Delete(ItemKind::Tool, id) => {
                self.tools.remove(&id);
            }
            StagedWrite::Movement(movement) => self.movements.push(movement),
        }
    }
}

struct Shared {
    state: RwLock<MemoryState>,
    // Uma trava assíncrona por item; a entrada nasce no primeiro uso e sai
    // quando a última transação interessada a solta
    item_locks: SyncMutex<HashMap<Uuid, Arc<Mutex<()>>>>,
    sequence: AtomicI64,
    closed: AtomicBool,
}

impl Shared {
    fn ensure_open(&self) -> Result<(), AppError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(AppError::StoreClosed);
        }
        Ok(())
    }

    fn item_lock(&self, id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.item_locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(id).or_default().clone()
    }

    fn release_unused_locks(&self, ids: impl IntoIterator<Item = Uuid>) {
        let mut locks = self.item_locks.lock().unwrap_or_else(PoisonError::into_inner);
        for id in ids {
            if locks.get(&id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
                locks.remove(&id);
            }
        }
    }
}

#[derive(Clone)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    pub fn open() -> Self {
        tracing::info!("Usando armazenamento em memória (os dados somem ao reiniciar).");
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(MemoryState::default()),
                item_locks: SyncMutex::new(HashMap::new()),
                sequence: AtomicI64::new(0),
                closed: AtomicBool::new(false),
            }),
        }
    }
}

fn sorted_by_name<T>(mut rows: Vec<T>, name: impl Fn(&T) -> &str) -> Vec<T> {
    rows.sort_by_cached_key(|row| name(row).to_lowercase());
    rows
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, AppError> {
        self.shared.ensure_open()?;
        Ok(Box::new(MemoryTransaction {
            shared: self.shared.clone(),
            staged: Vec::new(),
            guards: ItemGuards { shared: self.shared.clone(), held: Vec::new() },
        }))
    }

    async fn list_supplies(&self, filter: &SupplyFilter) -> Result<Vec<Supply>, AppError> {
        self.shared.ensure_open()?;
        let state = self.shared.state.read().await;
        let rows: Vec<Supply> = state.supplies.values().filter(|s| filter.matches(s)).cloned().collect();
        Ok(sorted_by_name(rows, |s| s.name.as_str()))
    }

    async fn find_supply(&self, key: &ItemKey) -> Result<Option<Supply>, AppError> {
        self.shared.ensure_open()?;
        let state = self.shared.state.read().await;
        Ok(state.find_supply(key).cloned())
    }

    async fn low_stock_supplies(&self) -> Result<Vec<Supply>, AppError> {
        self.shared.ensure_open()?;
        let state = self.shared.state.read().await;
        let rows: Vec<Supply> = state.supplies.values().filter(|s| s.needs_restock()).cloned().collect();
        Ok(sorted_by_name(rows, |s| s.name.as_str()))
    }

    async fn list_tools(&self, filter: &ToolFilter) -> Result<Vec<Tool>, AppError> {
        self.shared.ensure_open()?;
        let state = self.shared.state.read().await;
        let rows: Vec<Tool> = state.tools.values().filter(|t| filter.matches(t)).cloned().collect();
        Ok(sorted_by_name(rows, |t| t.name.as_str()))
    }

    async fn find_tool(&self, key: &ItemKey) -> Result<Option<Tool>, AppError> {
        self.shared.ensure_open()?;
        let state = self.shared.state.read().await;
        Ok(state.find_tool(key).cloned())
    }

    async fn maintenance_due_tools(&self, today: NaiveDate) -> Result<Vec<Tool>, AppError> {
        self.shared.ensure_open()?;
        let state = self.shared.state.read().await;
        let mut rows: Vec<Tool> = state.tools.values().filter(|t| t.needs_maintenance(today)).cloned().collect();
        rows.sort_by_cached_key(|t| (t.next_maintenance_date, t.name.to_lowercase()));
        Ok(rows)
    }

    async fn tool_location_counts(&self) -> Result<Vec<(StorageArea, i64)>, AppError> {
        self.shared.ensure_open()?;
        let state = self.shared.state.read().await;
        let mut counts: BTreeMap<StorageArea, i64> = BTreeMap::new();
        for tool in state.tools.values() {
            *counts.entry(tool.location).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }

    async fn list_movements(&self, filter: &MovementFilter) -> Result<Vec<Movement>, AppError> {
        self.shared.ensure_open()?;
        let state = self.shared.state.read().await;
        let mut rows: Vec<Movement> = state.movements.iter().filter(|m| filter.matches(m)).cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.sequence.cmp(&a.sequence)));
        if let Some(limit) = filter.limit {
            rows.truncate(usize::try_from(limit).unwrap_or(0));
        }
        Ok(rows)
    }

    async fn movement_totals(&self, range: &DateRange) -> Result<Vec<MovementTotal>, AppError> {
        self.shared.ensure_open()?;
        let state = self.shared.state.read().await;
        let mut groups: BTreeMap<(ItemKind, MovementKind), (i64, Decimal)> = BTreeMap::new();
        for movement in state.movements.iter().filter(|m| range.contains(m.created_at)) {
            let group = groups.entry((movement.item_kind, movement.kind)).or_default();
            group.0 += 1;
            group.1 += movement.quantity;
        }
        Ok(groups
            .into_iter()
            .map(|((item_kind, kind), (count, total_quantity))| MovementTotal {
                item_kind,
                kind,
                count,
                total_quantity,
            })
            .collect())
    }

    async fn close(&self) {
        self.shared.closed.store(true, Ordering::Release);
        tracing::info!("Armazenamento em memória fechado.");
    }
}

enum StagedWrite {
    Supply(Supply),
    Tool(Tool),
    Delete(ItemKind, Uuid),
    Movement(Movement),
}

pub struct MemoryTransaction {
    shared: Arc<Shared>,
    staged: Vec<StagedWrite>,
    guards: ItemGuards,
}

// Travas dos itens tocados; liberadas no commit ou ao soltar a transação
struct ItemGuards {
    shared: Arc<Shared>,
    held: Vec<(Uuid, OwnedMutexGuard<()>)>,
}

impl Drop for ItemGuards {
    fn drop(&mut self) {
        let ids: Vec<Uuid> = self.held.drain(..).map(|(id, _guard)| id).collect();
        self.shared.release_unused_locks(ids);
    }
}

impl MemoryTransaction {
    // Leitura das próprias escritas pendentes (a mais recente vence)
    fn staged_item(&self, reference: &ItemReference) -> Option<Item> {
        self.staged.iter().rev().find_map(|write| match (write, reference.kind) {
            (StagedWrite::Supply(s), ItemKind::Supply) if reference.key.matches(s.id, &s.name) => {
                Some(Item::Supply(s.clone()))
            }
            (StagedWrite::Tool(t), ItemKind::Tool) if reference.key.matches(t.id, &t.name) => {
                Some(Item::Tool(t.clone()))
            }
            _ => None,
        })
    }

    fn holds(&self, id: Uuid) -> bool {
        self.guards.held.iter().any(|(held, _)| *held == id)
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn insert_supply(&mut self, supply: &Supply) -> Result<(), AppError> {
        self.shared.ensure_open()?;
        self.staged.push(StagedWrite::Supply(supply.clone()));
        Ok(())
    }

    async fn insert_tool(&mut self, tool: &Tool) -> Result<(), AppError> {
        self.shared.ensure_open()?;
        self.staged.push(StagedWrite::Tool(tool.clone()));
        Ok(())
    }

    async fn lock_item(&mut self, reference: &ItemReference) -> Result<Option<Item>, AppError> {
        self.shared.ensure_open()?;
        if let Some(item) = self.staged_item(reference) {
            return Ok(Some(item));
        }

        let id = {
            let state = self.shared.state.read().await;
            match state.find_item(reference) {
                Some(item) => item.id(),
                None => return Ok(None),
            }
        };

        if !self.holds(id) {
            let guard = self.shared.item_lock(id).lock_owned().await;
            self.guards.held.push((id, guard));
        }

        // Relê depois da trava: outra transação pode ter mudado ou apagado o item
        let state = self.shared.state.read().await;
        Ok(state.find_item(&ItemReference { kind: reference.kind, key: ItemKey::Id(id) }))
    }

    async fn save_item(&mut self, item: &Item) -> Result<(), AppError> {
        self.shared.ensure_open()?;
        let write = match item {
            Item::Supply(supply) => StagedWrite::Supply(supply.clone()),
            Item::Tool(tool) => StagedWrite::Tool(tool.clone()),
        };
        self.staged.push(write);
        Ok(())
    }

    async fn delete_item(&mut self, kind: ItemKind, id: Uuid) -> Result<bool, AppError> {
        self.shared.ensure_open()?;
        let existed = self.shared.state.read().await.contains(kind, id);
        self.staged.push(StagedWrite::Delete(kind, id));
        Ok(existed)
    }

    async fn append_movement(&mut self, movement: NewMovement) -> Result<Movement, AppError> {
        self.shared.ensure_open()?;
        let sequence = self.shared.sequence.fetch_add(1, Ordering::AcqRel) + 1;
        let movement = movement.into_movement(Uuid::new_v4(), sequence);
        self.staged.push(StagedWrite::Movement(movement.clone()));
        Ok(movement)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let MemoryTransaction { shared, staged, guards } = *self;
        shared.ensure_open()?;

        let mut state = shared.state.write().await;
        state.check_names(&staged)?;

        let writes = staged.len();
        for write in staged {
            state.apply(write);
        }
        drop(state);
        drop(guards);

        tracing::debug!(writes, "Transação confirmada (memória).");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::item::ItemKey;
    use crate::models::supply::{SupplyCategory, SupplyUnit};
    use chrono::{DateTime, Utc};
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn supply(name: &str, quantity: Decimal) -> Supply {
        let now = Utc::now();
        Supply {
            id: Uuid::new_v4(),
            name: name.into(),
            category: SupplyCategory::Ingredient,
            quantity,
            unit: SupplyUnit::Kg,
            minimum_threshold: dec!(1),
            unit_price: Decimal::ZERO,
            supplier: String::new(),
            expiration_date: None,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn movement_at(item: &Supply, created_at: DateTime<Utc>) -> NewMovement {
        NewMovement {
            item_kind: ItemKind::Supply,
            item_id: item.id,
            item_name: item.name.clone(),
            kind: MovementKind::Entry,
            quantity: dec!(1),
            quantity_before: dec!(0),
            quantity_after: dec!(1),
            reason: "test".into(),
            actor: "system".into(),
            created_at,
        }
    }

    async fn seeded(store: &MemoryStore, item: &Supply) {
        let mut tx = store.begin().await.unwrap();
        tx.insert_supply(item).await.unwrap();
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn writes_become_visible_only_on_commit() {
        let store = MemoryStore::open();
        let flour = supply("Flour", dec!(10));

        let mut tx = store.begin().await.unwrap();
        tx.insert_supply(&flour).await.unwrap();
        assert!(store.find_supply(&ItemKey::Id(flour.id)).await.unwrap().is_none());
        tx.commit().await.unwrap();

        let found = store.find_supply(&ItemKey::Name("FLOUR".into())).await.unwrap();
        assert_eq!(found.map(|s| s.id), Some(flour.id));
    }

    #[tokio::test]
    async fn dropping_a_transaction_discards_its_writes() {
        let store = MemoryStore::open();
        let flour = supply("Flour", dec!(10));
        seeded(&store, &flour).await;

        {
            let mut tx = store.begin().await.unwrap();
            let mut item = tx.lock_item(&ItemReference::supply(ItemKey::Id(flour.id))).await.unwrap().unwrap();
            item.set_quantity(dec!(0), Utc::now()).unwrap();
            tx.save_item(&item).await.unwrap();
            tx.append_movement(movement_at(&flour, Utc::now())).await.unwrap();
        }

        let current = store.find_supply(&ItemKey::Id(flour.id)).await.unwrap().unwrap();
        assert_eq!(current.quantity, dec!(10));
        assert!(store.list_movements(&MovementFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_names_fail_the_whole_commit() {
        let store = MemoryStore::open();
        seeded(&store, &supply("Flour", dec!(1))).await;

        let sugar = supply("Sugar", dec!(1));
        let mut tx = store.begin().await.unwrap();
        tx.insert_supply(&sugar).await.unwrap();
        tx.insert_supply(&supply("flour", dec!(2))).await.unwrap();
        let err = tx.commit().await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateName { kind: ItemKind::Supply, .. }));

        // Nada da transação foi aplicado
        assert!(store.find_supply(&ItemKey::Id(sugar.id)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn same_name_is_allowed_across_item_kinds() {
        let store = MemoryStore::open();
        let now = Utc::now();
        let tool = Tool {
            id: Uuid::new_v4(),
            name: "Flour".into(),
            category: crate::models::tool::ToolCategory::Container,
            quantity: 1,
            location: StorageArea::Storeroom,
            condition: crate::models::tool::ToolCondition::Good,
            purchase_date: None,
            cost: Decimal::ZERO,
            supplier: String::new(),
            next_maintenance_date: None,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        };
        seeded(&store, &supply("Flour", dec!(1))).await;

        let mut tx = store.begin().await.unwrap();
        tx.insert_tool(&tool).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(store.tool_location_counts().await.unwrap(), vec![(StorageArea::Storeroom, 1)]);
    }

    #[tokio::test]
    async fn a_locked_item_blocks_other_transactions() {
        let store = MemoryStore::open();
        let flour = supply("Flour", dec!(10));
        seeded(&store, &flour).await;
        let reference = ItemReference::supply(ItemKey::Id(flour.id));

        let mut first = store.begin().await.unwrap();
        first.lock_item(&reference).await.unwrap();

        let mut second = store.begin().await.unwrap();
        let waiting = tokio::time::timeout(Duration::from_millis(50), second.lock_item(&reference)).await;
        assert!(waiting.is_err(), "the second lock should still be waiting");

        first.commit().await.unwrap();
        let item = second.lock_item(&reference).await.unwrap();
        assert!(item.is_some());
    }

    fn lock_table_len(store: &MemoryStore) -> usize {
        store.shared.item_locks.lock().unwrap().len()
    }

    #[tokio::test]
    async fn item_locks_are_released_after_use() {
        let store = MemoryStore::open();
        let flour = supply("Flour", dec!(10));
        seeded(&store, &flour).await;
        let reference = ItemReference::supply(ItemKey::Id(flour.id));

        let mut tx = store.begin().await.unwrap();
        let mut item = tx.lock_item(&reference).await.unwrap().unwrap();
        assert_eq!(lock_table_len(&store), 1);
        item.set_quantity(dec!(11), Utc::now()).unwrap();
        tx.save_item(&item).await.unwrap();
        tx.append_movement(movement_at(&flour, Utc::now())).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(lock_table_len(&store), 0);

        // Transação abandonada também devolve a trava
        {
            let mut tx = store.begin().await.unwrap();
            tx.lock_item(&reference).await.unwrap();
        }
        assert_eq!(lock_table_len(&store), 0);

        let mut tx = store.begin().await.unwrap();
        tx.lock_item(&reference).await.unwrap();
        assert!(tx.delete_item(ItemKind::Supply, flour.id).await.unwrap());
        tx.commit().await.unwrap();
        assert_eq!(lock_table_len(&store), 0);
        assert!(store.find_supply(&ItemKey::Id(flour.id)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn a_waiting_transaction_keeps_the_lock_entry() {
        let store = MemoryStore::open();
        let flour = supply("Flour", dec!(10));
        seeded(&store, &flour).await;
        let reference = ItemReference::supply(ItemKey::Id(flour.id));

        let mut first = store.begin().await.unwrap();
        first.lock_item(&reference).await.unwrap();

        let waiter_store = store.clone();
        let waiter_ref = reference.clone();
        let waiter = tokio::spawn(async move {
            let mut second = waiter_store.begin().await.unwrap();
            second.lock_item(&waiter_ref).await.unwrap().is_some()
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        first.commit().await.unwrap();
        assert!(waiter.await.unwrap());
        assert_eq!(lock_table_len(&store), 0);
    }

    #[tokio::test]
    async fn movements_are_listed_newest_first_with_sequence_tiebreak() {
        let store = MemoryStore::open();
        let flour = supply("Flour", dec!(0));
        let instant = Utc::now();

        let mut tx = store.begin().await.unwrap();
        let older = tx.append_movement(movement_at(&flour, instant - chrono::Duration::seconds(5))).await.unwrap();
        let first = tx.append_movement(movement_at(&flour, instant)).await.unwrap();
        let second = tx.append_movement(movement_at(&flour, instant)).await.unwrap();
        tx.commit().await.unwrap();

        let listed = store.list_movements(&MovementFilter::default()).await.unwrap();
        let ids: Vec<Uuid> = listed.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![second.id, first.id, older.id]);

        let limited = store
            .list_movements(&MovementFilter { limit: Some(1), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn a_closed_store_refuses_work() {
        let store = MemoryStore::open();
        store.close().await;
        assert!(matches!(store.begin().await, Err(AppError::StoreClosed)));
        assert!(matches!(
            store.list_supplies(&SupplyFilter::default()).await,
            Err(AppError::StoreClosed)
        ));
    }
}
