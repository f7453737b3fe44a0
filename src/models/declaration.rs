//! Declaration model and related types

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::{DeclarationKind, ItemState};

/// A citizen's report of a lost or found item
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Declaration {
    pub id: i32,
    pub citizen_id: i32,
    pub item_id: i32,
    pub kind: DeclarationKind,
    pub location: Option<String>,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub crea_date: DateTime<Utc>,
}

/// Declaration row joined with its item, for lists
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DeclarationSummary {
    pub id: i32,
    pub citizen_id: i32,
    pub kind: DeclarationKind,
    pub location: Option<String>,
    pub crea_date: DateTime<Utc>,
    pub item_id: i32,
    pub item_name: String,
    pub item_state: ItemState,
    pub unique_code: String,
    pub photo_url: Option<String>,
    pub finder_count: i64,
    pub claimant_count: i64,
}

/// Citizen taking part in a declaration as finder or claimant
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Participant {
    pub id: i32,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Full declaration view
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeclarationDetails {
    #[serde(flatten)]
    pub declaration: Declaration,
    pub item_name: String,
    pub item_description: Option<String>,
    pub item_state: ItemState,
    pub unique_code: String,
    pub declarant_username: String,
    pub finders: Vec<Participant>,
    pub claimants: Vec<Participant>,
}

/// Create declaration request. The item is created along with it.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDeclaration {
    pub kind: DeclarationKind,
    #[validate(length(min = 1, max = 200, message = "Item name must be 1-200 characters"))]
    pub item_name: String,
    #[validate(length(max = 2000, message = "Description is too long"))]
    pub item_description: Option<String>,
    #[validate(length(max = 255, message = "Location is too long"))]
    pub location: Option<String>,
    #[validate(length(max = 2000, message = "Description is too long"))]
    pub description: Option<String>,
    #[validate(url(message = "Invalid photo URL"))]
    pub photo_url: Option<String>,
}

/// Update declaration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateDeclaration {
    #[validate(length(min = 1, max = 200, message = "Item name must be 1-200 characters"))]
    pub item_name: Option<String>,
    #[validate(length(max = 2000, message = "Description is too long"))]
    pub item_description: Option<String>,
    #[validate(length(max = 255, message = "Location is too long"))]
    pub location: Option<String>,
    #[validate(length(max = 2000, message = "Description is too long"))]
    pub description: Option<String>,
    #[validate(url(message = "Invalid photo URL"))]
    pub photo_url: Option<String>,
}

/// Declaration search
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct DeclarationQuery {
    pub kind: Option<DeclarationKind>,
    /// Search in item name, description and location
    pub q: Option<String>,
}

/// Schedule a restitution for a claimed declaration
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ScheduleRestitution {
    pub station_id: i32,
    pub scheduled_date: NaiveDate,
    #[schema(value_type = String, example = "14:30:00")]
    pub scheduled_time: NaiveTime,
    /// Required for lost declarations with several finders
    pub finder_id: Option<i32>,
    /// Required for found declarations with several claimants
    pub claimant_id: Option<i32>,
}

impl DeclarationQuery {
    /// Lowercased `%term%` pattern, if a non-empty search term was given
    pub fn pattern(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", q.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pattern() {
        let query = DeclarationQuery {
            kind: None,
            q: Some("  Red Wallet ".to_string()),
        };
        assert_eq!(query.pattern().as_deref(), Some("%red wallet%"));
        assert_eq!(DeclarationQuery::default().pattern(), None);
    }

    #[test]
    fn test_create_declaration_validation() {
        let request = CreateDeclaration {
            kind: DeclarationKind::Lost,
            item_name: String::new(),
            item_description: None,
            location: None,
            description: None,
            photo_url: Some("not a url".to_string()),
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("item_name"));
        assert!(fields.contains_key("photo_url"));
    }
}
