//! Items repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::ItemState,
        item::{ItemDetails, ItemQuery, PageWindow},
    },
};

/// Item columns joined with the owning declaration and its author
const DETAILS_SELECT: &str = r#"
    SELECT i.id, i.name, i.description, i.photo_url, i.state, i.unique_code,
           i.crea_date, i.modif_date,
           d.id AS declaration_id, d.kind, d.location,
           d.citizen_id AS declarant_id, u.username AS declarant_username
    FROM items i
    LEFT JOIN declarations d ON d.item_id = i.id
    LEFT JOIN users u ON u.id = d.citizen_id
"#;

#[derive(Clone)]
pub struct ItemsRepository {
    pool: Pool<Postgres>,
}

impl ItemsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get item with its declaration context
    pub async fn get_details(&self, id: i32) -> AppResult<ItemDetails> {
        let query = format!("{} WHERE i.id = $1", DETAILS_SELECT);
        sqlx::query_as::<_, ItemDetails>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item with id {} not found", id)))
    }

    /// Search items with pagination
    pub async fn search(
        &self,
        query: &ItemQuery,
        window: PageWindow,
    ) -> AppResult<(Vec<ItemDetails>, i64)> {
        let pattern = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", q.to_lowercase()));

        let filter = r#"
            WHERE ($1::text IS NULL OR i.state = $1)
              AND ($2::text IS NULL OR LOWER(i.name) LIKE $2 OR LOWER(i.unique_code) LIKE $2)
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM items i {}", filter))
            .bind(query.state)
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        let select = format!(
            "{} {} ORDER BY i.modif_date DESC, i.id DESC LIMIT $3 OFFSET $4",
            DETAILS_SELECT, filter
        );
        let items = sqlx::query_as::<_, ItemDetails>(&select)
            .bind(query.state)
            .bind(&pattern)
            .bind(window.per_page)
            .bind(window.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((items, total))
    }

    /// Most recent items in any of the given states
    pub async fn recent(&self, states: &[ItemState], limit: i64) -> AppResult<Vec<ItemDetails>> {
        let states: Vec<&str> = states.iter().map(|s| s.as_str()).collect();
        let query = format!(
            "{} WHERE i.state = ANY($1) ORDER BY i.crea_date DESC, i.id DESC LIMIT $2",
            DETAILS_SELECT
        );
        let items = sqlx::query_as::<_, ItemDetails>(&query)
            .bind(&states)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    /// Delete an item with its declaration, participants and restitutions
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Item with id {} not found", id)));
        }
        Ok(())
    }
}
