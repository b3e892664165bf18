// src/db/movement_repo.rs

use sqlx::{Executor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::movement::{DateRange, Movement, MovementFilter, MovementTotal, NewMovement},
};

// Histórico de movimentos: só INSERT e SELECT, nunca UPDATE/DELETE.
#[derive(Clone, Default)]
pub struct MovementRepository;

fn push_range(query: &mut QueryBuilder<'_, Postgres>, range: &DateRange) {
    if let Some(from) = range.from {
        query.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = range.to {
        query.push(" AND created_at <= ").push_bind(to);
    }
}

impl MovementRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert<'e, E>(&self, executor: E, movement: NewMovement) -> Result<Movement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movement = sqlx::query_as::<_, Movement>(
            r#"
            INSERT INTO movements (
                id, item_kind, item_id, item_name, kind, quantity,
                quantity_before, quantity_after, reason, actor, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(movement.item_kind)
        .bind(movement.item_id)
        .bind(movement.item_name)
        .bind(movement.kind)
        .bind(movement.quantity)
        .bind(movement.quantity_before)
        .bind(movement.quantity_after)
        .bind(movement.reason)
        .bind(movement.actor)
        .bind(movement.created_at)
        .fetch_one(executor)
        .await?;

        Ok(movement)
    }

    pub async fn list<'e, E>(&self, executor: E, filter: &MovementFilter) -> Result<Vec<Movement>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM movements WHERE TRUE");

        if let Some(item_kind) = filter.item_kind {
            query.push(" AND item_kind = ").push_bind(item_kind);
        }
        if let Some(kind) = filter.kind {
            query.push(" AND kind = ").push_bind(kind);
        }
        if let Some(item_id) = filter.item_id {
            query.push(" AND item_id = ").push_bind(item_id);
        }
        push_range(&mut query, &filter.range);

        query.push(" ORDER BY created_at DESC, sequence DESC");
        if let Some(limit) = filter.limit {
            query.push(" LIMIT ").push_bind(limit);
        }

        let movements = query.build_query_as::<Movement>().fetch_all(executor).await?;
        Ok(movements)
    }

    /// Agrupa por (tipo de item, tipo de movimento) dentro do intervalo.
    pub async fn totals<'e, E>(&self, executor: E, range: &DateRange) -> Result<Vec<MovementTotal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut query = QueryBuilder::<Postgres>::new(
            r#"
            SELECT item_kind, kind, COUNT(*) AS count, COALESCE(SUM(quantity), 0) AS total_quantity
            FROM movements WHERE TRUE
            "#,
        );
        push_range(&mut query, range);
        query.push(" GROUP BY item_kind, kind ORDER BY item_kind, kind");

        let totals = query.build_query_as::<MovementTotal>().fetch_all(executor).await?;
        Ok(totals)
    }
}
