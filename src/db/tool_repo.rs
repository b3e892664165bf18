// src/db/tool_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{like_pattern, map_unique_violation},
        error::AppError,
    },
    models::{
        item::{ItemKey, ItemKind},
        tool::{StorageArea, Tool, ToolFilter},
    },
};

#[derive(Clone, Default)]
pub struct ToolRepository;

impl ToolRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn list<'e, E>(&self, executor: E, filter: &ToolFilter) -> Result<Vec<Tool>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM tools WHERE TRUE");

        if let Some(location) = filter.location {
            query.push(" AND location = ").push_bind(location);
        }
        if let Some(category) = filter.category {
            query.push(" AND category = ").push_bind(category);
        }
        if let Some(condition) = filter.condition {
            query.push(" AND condition = ").push_bind(condition);
        }
        if let Some(term) = &filter.search {
            let pattern = like_pattern(term);
            query
                .push(" AND (name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR category::text ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR condition::text ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        query.push(" ORDER BY LOWER(name) ASC");

        let tools = query.build_query_as::<Tool>().fetch_all(executor).await?;
        Ok(tools)
    }

    pub async fn find<'e, E>(&self, executor: E, key: &ItemKey, for_update: bool) -> Result<Option<Tool>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lock = if for_update { " FOR UPDATE" } else { "" };

        let tool = match key {
            ItemKey::Id(id) => {
                let sql = format!("SELECT * FROM tools WHERE id = $1{lock}");
                sqlx::query_as::<_, Tool>(&sql).bind(id).fetch_optional(executor).await?
            }
            ItemKey::Name(name) => {
                let sql = format!("SELECT * FROM tools WHERE LOWER(name) = LOWER($1){lock}");
                sqlx::query_as::<_, Tool>(&sql).bind(name).fetch_optional(executor).await?
            }
        };
        Ok(tool)
    }

    pub async fn maintenance_due<'e, E>(&self, executor: E, today: NaiveDate) -> Result<Vec<Tool>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tools = sqlx::query_as::<_, Tool>(
            r#"
            SELECT * FROM tools
            WHERE next_maintenance_date IS NOT NULL AND next_maintenance_date <= $1
            ORDER BY next_maintenance_date ASC, LOWER(name) ASC
            "#,
        )
        .bind(today)
        .fetch_all(executor)
        .await?;
        Ok(tools)
    }

    pub async fn location_counts<'e, E>(&self, executor: E) -> Result<Vec<(StorageArea, i64)>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, (StorageArea, i64)>(
            "SELECT location, COUNT(*) FROM tools GROUP BY location ORDER BY location",
        )
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn insert<'e, E>(&self, executor: E, tool: &Tool) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO tools (
                id, name, category, quantity, location, condition, purchase_date,
                cost, supplier, next_maintenance_date, notes, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(tool.id)
        .bind(&tool.name)
        .bind(tool.category)
        .bind(tool.quantity)
        .bind(tool.location)
        .bind(tool.condition)
        .bind(tool.purchase_date)
        .bind(tool.cost)
        .bind(&tool.supplier)
        .bind(tool.next_maintenance_date)
        .bind(&tool.notes)
        .bind(tool.created_at)
        .bind(tool.updated_at)
        .execute(executor)
        .await
        .map_err(|e| map_unique_violation(e, ItemKind::Tool, &tool.name))?;
        Ok(())
    }

    pub async fn update<'e, E>(&self, executor: E, tool: &Tool) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE tools SET
                name = $2, category = $3, quantity = $4, location = $5, condition = $6,
                purchase_date = $7, cost = $8, supplier = $9,
                next_maintenance_date = $10, notes = $11, updated_at = $12
            WHERE id = $1
            "#,
        )
        .bind(tool.id)
        .bind(&tool.name)
        .bind(tool.category)
        .bind(tool.quantity)
        .bind(tool.location)
        .bind(tool.condition)
        .bind(tool.purchase_date)
        .bind(tool.cost)
        .bind(&tool.supplier)
        .bind(tool.next_maintenance_date)
        .bind(&tool.notes)
        .bind(tool.updated_at)
        .execute(executor)
        .await
        .map_err(|e| map_unique_violation(e, ItemKind::Tool, &tool.name))?;
        Ok(())
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM tools WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
