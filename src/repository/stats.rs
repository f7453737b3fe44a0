//! Aggregate counts for dashboards

use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{
        dashboard::{MonthlyDeclarations, StateCount},
        enums::{DeclarationKind, ItemState, RestitutionStatus, Role},
    },
};

#[derive(Clone)]
pub struct StatsRepository {
    pool: Pool<Postgres>,
}

impl StatsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn count_stations(&self) -> AppResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM police_stations")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_users(&self, role: Role, banned_only: bool) -> AppResult<i64> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE role = $1 AND (NOT $2 OR banned)",
        )
        .bind(role)
        .bind(banned_only)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn items_by_state(&self) -> AppResult<Vec<StateCount>> {
        let counts = sqlx::query_as::<_, StateCount>(
            "SELECT state, COUNT(*) AS count FROM items GROUP BY state ORDER BY state",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }

    pub async fn count_items(&self, state: ItemState, kind: Option<DeclarationKind>) -> AppResult<i64> {
        let count = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM items i
            LEFT JOIN declarations d ON d.item_id = i.id
            WHERE i.state = $1 AND ($2::text IS NULL OR d.kind = $2)
            "#,
        )
        .bind(state)
        .bind(kind)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn count_restitutions(&self, status: RestitutionStatus) -> AppResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM restitutions WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_unhandled_messages(&self) -> AppResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM contact_messages WHERE NOT handled")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Declarations per kind for each of the last `months` months, oldest first.
    /// Months without declarations are included with zero counts.
    pub async fn monthly_declarations(&self, months: i32) -> AppResult<Vec<MonthlyDeclarations>> {
        let series = sqlx::query_as::<_, MonthlyDeclarations>(
            r#"
            SELECT TO_CHAR(m.month, 'YYYY-MM') AS month,
                   COUNT(d.id) FILTER (WHERE d.kind = 'lost') AS lost,
                   COUNT(d.id) FILTER (WHERE d.kind = 'found') AS found
            FROM generate_series(
                     date_trunc('month', NOW()) - make_interval(months => $1 - 1),
                     date_trunc('month', NOW()),
                     INTERVAL '1 month'
                 ) AS m(month)
            LEFT JOIN declarations d ON date_trunc('month', d.crea_date) = m.month
            GROUP BY m.month
            ORDER BY m.month
            "#,
        )
        .bind(months)
        .fetch_all(&self.pool)
        .await?;
        Ok(series)
    }

    pub async fn count_declarations(&self, citizen_id: i32, kind: DeclarationKind) -> AppResult<i64> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM declarations WHERE citizen_id = $1 AND kind = $2",
        )
        .bind(citizen_id)
        .bind(kind)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Completed restitutions a citizen received or handed over
    pub async fn count_completed_restitutions(&self, user_id: i32) -> AppResult<i64> {
        let count = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM restitutions
            WHERE status = $2 AND (claimant_id = $1 OR finder_id = $1)
            "#,
        )
        .bind(user_id)
        .bind(RestitutionStatus::Done)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
