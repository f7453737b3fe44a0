//! Restitutions repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{enums::RestitutionStatus, restitution::RestitutionDetails},
};

const DETAILS_SELECT: &str = r#"
    SELECT r.id, r.item_id, r.claimant_id, r.finder_id, r.officer_id, r.performed_by,
           r.station_id, r.scheduled_date, r.scheduled_time, r.status, r.performed_at,
           r.crea_date,
           i.name AS item_name, i.unique_code,
           s.name AS station_name, s.address AS station_address,
           cu.username AS claimant_username, cu.email AS claimant_email,
           fu.username AS finder_username, fu.email AS finder_email,
           ou.username AS officer_username, ou.email AS officer_email,
           pu.username AS performer_username, pu.email AS performer_email
    FROM restitutions r
    LEFT JOIN items i ON i.id = r.item_id
    LEFT JOIN police_stations s ON s.id = r.station_id
    LEFT JOIN users cu ON cu.id = r.claimant_id
    LEFT JOIN users fu ON fu.id = r.finder_id
    LEFT JOIN users ou ON ou.id = r.officer_id
    LEFT JOIN users pu ON pu.id = r.performed_by
"#;

#[derive(Clone)]
pub struct RestitutionsRepository {
    pool: Pool<Postgres>,
}

impl RestitutionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get a restitution with item, station and participant names
    pub async fn get_details(&self, id: i32) -> AppResult<RestitutionDetails> {
        let query = format!("{} WHERE r.id = $1", DETAILS_SELECT);
        sqlx::query_as::<_, RestitutionDetails>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Restitution with id {} not found", id)))
    }

    /// All restitutions, optionally filtered by status
    pub async fn list(&self, status: Option<RestitutionStatus>) -> AppResult<Vec<RestitutionDetails>> {
        let query = format!(
            "{} WHERE ($1::text IS NULL OR r.status = $1) \
             ORDER BY r.scheduled_date DESC, r.scheduled_time DESC",
            DETAILS_SELECT
        );
        let restitutions = sqlx::query_as::<_, RestitutionDetails>(&query)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;
        Ok(restitutions)
    }

    /// Restitutions a citizen takes part in, as claimant or finder
    pub async fn list_for_citizen(&self, user_id: i32) -> AppResult<Vec<RestitutionDetails>> {
        let query = format!(
            "{} WHERE r.claimant_id = $1 OR r.finder_id = $1 \
             ORDER BY r.scheduled_date DESC, r.scheduled_time DESC",
            DETAILS_SELECT
        );
        let restitutions = sqlx::query_as::<_, RestitutionDetails>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(restitutions)
    }
}
