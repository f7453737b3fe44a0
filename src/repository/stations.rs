//! Police stations repository

use sqlx::{Pool, Postgres};

use crate::{
    error::{map_unique_violation, AppError, AppResult},
    models::station::{CreateStation, PoliceStation, UpdateStation},
};

#[derive(Clone)]
pub struct StationsRepository {
    pool: Pool<Postgres>,
}

impl StationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> AppResult<Vec<PoliceStation>> {
        let stations = sqlx::query_as::<_, PoliceStation>(
            "SELECT id, name, address FROM police_stations ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(stations)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<PoliceStation> {
        sqlx::query_as::<_, PoliceStation>(
            "SELECT id, name, address FROM police_stations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Police station with id {} not found", id)))
    }

    pub async fn create(&self, data: &CreateStation) -> AppResult<PoliceStation> {
        sqlx::query_as::<_, PoliceStation>(
            "INSERT INTO police_stations (name, address) VALUES ($1, $2) RETURNING id, name, address",
        )
        .bind(data.name.trim())
        .bind(data.address.trim())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "A police station with this name already exists"))
    }

    pub async fn update(&self, id: i32, data: &UpdateStation) -> AppResult<PoliceStation> {
        sqlx::query_as::<_, PoliceStation>(
            r#"
            UPDATE police_stations SET
                name = COALESCE($2, name),
                address = COALESCE($3, address)
            WHERE id = $1
            RETURNING id, name, address
            "#,
        )
        .bind(id)
        .bind(data.name.as_deref().map(str::trim))
        .bind(data.address.as_deref().map(str::trim))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "A police station with this name already exists"))?
        .ok_or_else(|| AppError::NotFound(format!("Police station with id {} not found", id)))
    }

    /// Whether officers or restitutions still reference the station
    pub async fn is_referenced(&self, id: i32) -> AppResult<bool> {
        let referenced: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(SELECT 1 FROM users WHERE station_id = $1)
                OR EXISTS(SELECT 1 FROM restitutions WHERE station_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(referenced)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM police_stations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Police station with id {} not found", id)));
        }
        Ok(())
    }
}
