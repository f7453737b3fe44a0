//! Police station model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PoliceStation {
    pub id: i32,
    pub name: String,
    pub address: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateStation {
    #[validate(length(min = 1, max = 150, message = "Name must be 1-150 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 255, message = "Address must be 1-255 characters"))]
    pub address: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStation {
    #[validate(length(min = 1, max = 150, message = "Name must be 1-150 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Address must be 1-255 characters"))]
    pub address: Option<String>,
}
