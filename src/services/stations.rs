//! Police station management

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::station::{CreateStation, PoliceStation, UpdateStation},
    repository::Repository,
};

#[derive(Clone)]
pub struct StationsService {
    repository: Repository,
}

impl StationsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<PoliceStation>> {
        self.repository.stations.list().await
    }

    pub async fn create(&self, data: CreateStation) -> AppResult<PoliceStation> {
        data.validate()?;
        let station = self.repository.stations.create(&data).await?;
        tracing::info!(station_id = station.id, name = %station.name, "Police station created");
        Ok(station)
    }

    pub async fn update(&self, id: i32, data: UpdateStation) -> AppResult<PoliceStation> {
        data.validate()?;
        self.repository.stations.update(id, &data).await
    }

    /// Delete a station no officer or restitution refers to
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.stations.get_by_id(id).await?;
        if self.repository.stations.is_referenced(id).await? {
            return Err(AppError::Conflict(
                "Police station still has officers or restitutions".to_string(),
            ));
        }
        self.repository.stations.delete(id).await?;
        tracing::info!(station_id = id, "Police station deleted");
        Ok(())
    }
}
