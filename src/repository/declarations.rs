//! Declarations repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        declaration::{
            CreateDeclaration, Declaration, DeclarationDetails, DeclarationSummary, Participant,
            UpdateDeclaration,
        },
        enums::{DeclarationKind, ItemState},
        item::generate_unique_code,
    },
};

const SUMMARY_SELECT: &str = r#"
    SELECT d.id, d.citizen_id, d.kind, d.location, d.crea_date,
           i.id AS item_id, i.name AS item_name, i.state AS item_state, i.unique_code,
           COALESCE(d.photo_url, i.photo_url) AS photo_url,
           (SELECT COUNT(*) FROM declaration_finders f WHERE f.declaration_id = d.id) AS finder_count,
           (SELECT COUNT(*) FROM declaration_claimants c WHERE c.declaration_id = d.id) AS claimant_count
    FROM declarations d
    JOIN items i ON i.id = d.item_id
"#;

/// Text search on item name, item description, declaration description and location.
/// `$2` is a lowercased `%term%` pattern or NULL.
const SEARCH_FILTER: &str = r#"
    ($2::text IS NULL
        OR LOWER(i.name) LIKE $2
        OR LOWER(COALESCE(i.description, '')) LIKE $2
        OR LOWER(COALESCE(d.description, '')) LIKE $2
        OR LOWER(COALESCE(d.location, '')) LIKE $2)
"#;

/// Attempts at drawing an unused item code before giving up
const CODE_ATTEMPTS: usize = 5;

#[derive(Clone)]
pub struct DeclarationsRepository {
    pool: Pool<Postgres>,
}

impl DeclarationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get a declaration by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Declaration> {
        sqlx::query_as::<_, Declaration>("SELECT * FROM declarations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Declaration with id {} not found", id)))
    }

    /// Get a declaration with its item and participants
    pub async fn get_details(&self, id: i32) -> AppResult<DeclarationDetails> {
        let declaration = self.get_by_id(id).await?;

        let (item_name, item_description, item_state, unique_code, declarant_username) =
            sqlx::query_as::<_, (String, Option<String>, ItemState, String, String)>(
                r#"
                SELECT i.name, i.description, i.state, i.unique_code, u.username
                FROM items i, users u
                WHERE i.id = $1 AND u.id = $2
                "#,
            )
            .bind(declaration.item_id)
            .bind(declaration.citizen_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item of declaration {} not found", id)))?;

        let finders = self.participants("declaration_finders", id).await?;
        let claimants = self.participants("declaration_claimants", id).await?;

        Ok(DeclarationDetails {
            declaration,
            item_name,
            item_description,
            item_state,
            unique_code,
            declarant_username,
            finders,
            claimants,
        })
    }

    async fn participants(&self, table: &str, declaration_id: i32) -> AppResult<Vec<Participant>> {
        let query = format!(
            r#"
            SELECT u.id, u.username, u.first_name, u.last_name
            FROM {} p
            JOIN users u ON u.id = p.user_id
            WHERE p.declaration_id = $1
            ORDER BY p.crea_date, u.id
            "#,
            table
        );
        let participants = sqlx::query_as::<_, Participant>(&query)
            .bind(declaration_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(participants)
    }

    /// Create the item and its declaration in one transaction
    pub async fn create(&self, citizen_id: i32, data: &CreateDeclaration) -> AppResult<Declaration> {
        let mut tx = self.pool.begin().await?;

        let mut item_id = None;
        for _ in 0..CODE_ATTEMPTS {
            let id: Option<i32> = sqlx::query_scalar(
                r#"
                INSERT INTO items (name, description, photo_url, state, unique_code)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (unique_code) DO NOTHING
                RETURNING id
                "#,
            )
            .bind(&data.item_name)
            .bind(&data.item_description)
            .bind(&data.photo_url)
            .bind(ItemState::from(data.kind))
            .bind(generate_unique_code())
            .fetch_optional(&mut *tx)
            .await?;

            if id.is_some() {
                item_id = id;
                break;
            }
        }
        let item_id = item_id
            .ok_or_else(|| AppError::Internal("Could not allocate a unique item code".to_string()))?;

        let declaration = sqlx::query_as::<_, Declaration>(
            r#"
            INSERT INTO declarations (citizen_id, item_id, kind, location, description, photo_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(citizen_id)
        .bind(item_id)
        .bind(data.kind)
        .bind(&data.location)
        .bind(&data.description)
        .bind(&data.photo_url)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(declaration)
    }

    /// Update declaration and item fields
    pub async fn update(&self, id: i32, data: &UpdateDeclaration) -> AppResult<Declaration> {
        let mut tx = self.pool.begin().await?;

        let declaration = sqlx::query_as::<_, Declaration>(
            r#"
            UPDATE declarations SET
                location = COALESCE($2, location),
                description = COALESCE($3, description),
                photo_url = COALESCE($4, photo_url)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.location)
        .bind(&data.description)
        .bind(&data.photo_url)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Declaration with id {} not found", id)))?;

        sqlx::query(
            r#"
            UPDATE items SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                photo_url = COALESCE($4, photo_url),
                modif_date = NOW()
            WHERE id = $1
            "#,
        )
        .bind(declaration.item_id)
        .bind(&data.item_name)
        .bind(&data.item_description)
        .bind(&data.photo_url)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(declaration)
    }

    /// Delete a declaration through its item. Refused while a handover is planned.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let (item_id, state) = sqlx::query_as::<_, (i32, ItemState)>(
            r#"
            SELECT i.id, i.state
            FROM declarations d
            JOIN items i ON i.id = d.item_id
            WHERE d.id = $1
            FOR UPDATE OF i
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Declaration with id {} not found", id)))?;

        if state == ItemState::PendingReturn {
            return Err(AppError::BusinessRule(
                "A restitution is scheduled for this item; it must be cancelled first".to_string(),
            ));
        }

        sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Declarations of a kind that are still open to finders or claimants
    pub async fn list_open(
        &self,
        kind: DeclarationKind,
        pattern: Option<&str>,
    ) -> AppResult<Vec<DeclarationSummary>> {
        let open: Vec<&str> = vec![ItemState::from(kind).as_str(), ItemState::Claimed.as_str()];
        let query = format!(
            "{} WHERE d.kind = $1 AND {} AND i.state = ANY($3) ORDER BY d.crea_date DESC",
            SUMMARY_SELECT, SEARCH_FILTER
        );
        let declarations = sqlx::query_as::<_, DeclarationSummary>(&query)
            .bind(kind)
            .bind(pattern)
            .bind(&open)
            .fetch_all(&self.pool)
            .await?;
        Ok(declarations)
    }

    /// Declarations created by a citizen
    pub async fn list_by_citizen(
        &self,
        citizen_id: i32,
        kind: Option<DeclarationKind>,
        pattern: Option<&str>,
    ) -> AppResult<Vec<DeclarationSummary>> {
        let query = format!(
            "{} WHERE d.citizen_id = $1 AND {} AND ($3::text IS NULL OR d.kind = $3) \
             ORDER BY d.crea_date DESC",
            SUMMARY_SELECT, SEARCH_FILTER
        );
        let declarations = sqlx::query_as::<_, DeclarationSummary>(&query)
            .bind(citizen_id)
            .bind(pattern)
            .bind(kind)
            .fetch_all(&self.pool)
            .await?;
        Ok(declarations)
    }

    /// Latest declarations of a citizen
    pub async fn latest_by_citizen(
        &self,
        citizen_id: i32,
        limit: i64,
    ) -> AppResult<Vec<DeclarationSummary>> {
        let query = format!(
            "{} WHERE d.citizen_id = $1 ORDER BY d.crea_date DESC, d.id DESC LIMIT $2",
            SUMMARY_SELECT
        );
        let declarations = sqlx::query_as::<_, DeclarationSummary>(&query)
            .bind(citizen_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(declarations)
    }

    /// Claimed declarations awaiting a restitution
    pub async fn list_claimed(
        &self,
        kind: Option<DeclarationKind>,
    ) -> AppResult<Vec<DeclarationSummary>> {
        let query = format!(
            "{} WHERE i.state = $1 AND ($2::text IS NULL OR d.kind = $2) ORDER BY d.crea_date",
            SUMMARY_SELECT
        );
        let declarations = sqlx::query_as::<_, DeclarationSummary>(&query)
            .bind(ItemState::Claimed)
            .bind(kind)
            .fetch_all(&self.pool)
            .await?;
        Ok(declarations)
    }
}
