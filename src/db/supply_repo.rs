// src/db/supply_repo.rs

use sqlx::{Executor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{like_pattern, map_unique_violation},
        error::AppError,
    },
    models::{
        item::{ItemKey, ItemKind},
        supply::{Supply, SupplyFilter},
    },
};

#[derive(Clone, Default)]
pub struct SupplyRepository;

impl SupplyRepository {
    pub fn new() -> Self {
        Self
    }

    // ---
    // Leitura
    // ---

    pub async fn list<'e, E>(&self, executor: E, filter: &SupplyFilter) -> Result<Vec<Supply>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM supplies WHERE TRUE");

        if let Some(category) = filter.category {
            query.push(" AND category = ").push_bind(category);
        }
        if let Some(term) = &filter.search {
            let pattern = like_pattern(term);
            query
                .push(" AND (name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR category::text ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR supplier ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        query.push(" ORDER BY LOWER(name) ASC");

        let supplies = query.build_query_as::<Supply>().fetch_all(executor).await?;
        Ok(supplies)
    }

    /// Busca por id ou nome (sem diferenciar maiúsculas). `for_update` trava a linha.
    pub async fn find<'e, E>(
        &self,
        executor: E,
        key: &ItemKey,
        for_update: bool,
    ) -> Result<Option<Supply>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lock = if for_update { " FOR UPDATE" } else { "" };

        let supply = match key {
            ItemKey::Id(id) => {
                let sql = format!("SELECT * FROM supplies WHERE id = $1{lock}");
                sqlx::query_as::<_, Supply>(&sql).bind(id).fetch_optional(executor).await?
            }
            ItemKey::Name(name) => {
                let sql = format!("SELECT * FROM supplies WHERE LOWER(name) = LOWER($1){lock}");
                sqlx::query_as::<_, Supply>(&sql).bind(name).fetch_optional(executor).await?
            }
        };
        Ok(supply)
    }

    pub async fn low_stock<'e, E>(&self, executor: E) -> Result<Vec<Supply>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let supplies = sqlx::query_as::<_, Supply>(
            "SELECT * FROM supplies WHERE quantity <= minimum_threshold ORDER BY LOWER(name) ASC",
        )
        .fetch_all(executor)
        .await?;
        Ok(supplies)
    }

    // ---
    // Escrita (dentro da transação)
    // ---

    pub async fn insert<'e, E>(&self, executor: E, supply: &Supply) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO supplies (
                id, name, category, quantity, unit, minimum_threshold, unit_price,
                supplier, expiration_date, notes, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(supply.id)
        .bind(&supply.name)
        .bind(supply.category)
        .bind(supply.quantity)
        .bind(supply.unit)
        .bind(supply.minimum_threshold)
        .bind(supply.unit_price)
        .bind(&supply.supplier)
        .bind(supply.expiration_date)
        .bind(&supply.notes)
        .bind(supply.created_at)
        .bind(supply.updated_at)
        .execute(executor)
        .await
        .map_err(|e| map_unique_violation(e, ItemKind::Supply, &supply.name))?;
        Ok(())
    }

    pub async fn update<'e, E>(&self, executor: E, supply: &Supply) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE supplies SET
                name = $2, category = $3, quantity = $4, unit = $5,
                minimum_threshold = $6, unit_price = $7, supplier = $8,
                expiration_date = $9, notes = $10, updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(supply.id)
        .bind(&supply.name)
        .bind(supply.category)
        .bind(supply.quantity)
        .bind(supply.unit)
        .bind(supply.minimum_threshold)
        .bind(supply.unit_price)
        .bind(&supply.supplier)
        .bind(supply.expiration_date)
        .bind(&supply.notes)
        .bind(supply.updated_at)
        .execute(executor)
        .await
        .map_err(|e| map_unique_violation(e, ItemKind::Supply, &supply.name))?;
        Ok(())
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM supplies WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
