//! Item model and related types

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::enums::{DeclarationKind, ItemState};
use crate::error::{AppError, AppResult};

/// Label shown when an item or its name is missing
pub const UNKNOWN_ITEM: &str = "Unknown item";

/// Label shown when an item has no declarant
pub const NO_DECLARANT: &str = "No declarant";

const CODE_PREFIX: &str = "OBJ-";
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LENGTH: usize = 8;

/// Item joined with its declaration, if any
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ItemDetails {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub state: ItemState,
    pub unique_code: String,
    pub crea_date: DateTime<Utc>,
    pub modif_date: DateTime<Utc>,
    pub declaration_id: Option<i32>,
    pub kind: Option<DeclarationKind>,
    pub location: Option<String>,
    pub declarant_id: Option<i32>,
    pub declarant_username: Option<String>,
}

impl ItemDetails {
    pub fn label(&self) -> &str {
        item_label(Some(&self.name))
    }

    pub fn declarant_label(&self) -> &str {
        self.declarant_username.as_deref().unwrap_or(NO_DECLARANT)
    }
}

/// Display name for an item that may be missing
pub fn item_label(name: Option<&str>) -> &str {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => name,
        _ => UNKNOWN_ITEM,
    }
}

/// Generate a fresh public item code
pub fn generate_unique_code() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..CODE_LENGTH)
        .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
        .collect();
    format!("{}{}", CODE_PREFIX, suffix)
}

/// Officer item list query
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ItemQuery {
    pub state: Option<ItemState>,
    /// Search in name and unique code
    pub q: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Rows of one result page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub per_page: i64,
    pub offset: i64,
}

impl ItemQuery {
    pub fn window(&self) -> AppResult<PageWindow> {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1)
            .checked_mul(per_page)
            .ok_or_else(|| AppError::Validation(format!("page {} is out of range", page)))?;

        Ok(PageWindow {
            page,
            per_page,
            offset,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemPage {
    pub items: Vec<ItemDetails>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// Item state before and after a workflow command
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StateChange {
    pub item_id: i32,
    pub from: ItemState,
    pub to: ItemState,
    /// Restitution created or touched by the command
    pub restitution_id: Option<i32>,
}

/// Public home feed
#[derive(Debug, Serialize, ToSchema)]
pub struct RecentItems {
    /// Latest lost or claimed items
    pub lost: Vec<ItemDetails>,
    /// Latest found items
    pub found: Vec<ItemDetails>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_code_format() {
        let code = generate_unique_code();
        assert_eq!(code.len(), CODE_PREFIX.len() + CODE_LENGTH);
        assert!(code.starts_with("OBJ-"));
        assert!(code[4..]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    fn query(page: Option<i64>, per_page: Option<i64>) -> ItemQuery {
        ItemQuery {
            state: None,
            q: None,
            page,
            per_page,
        }
    }

    #[test]
    fn test_page_window() {
        let window = query(Some(3), Some(500)).window().unwrap();
        assert_eq!(
            window,
            PageWindow {
                page: 3,
                per_page: 100,
                offset: 200
            }
        );

        let first = query(Some(-4), None).window().unwrap();
        assert_eq!((first.page, first.offset), (1, 0));
    }

    #[test]
    fn test_page_window_overflow_is_rejected() {
        let result = query(Some(i64::MAX), Some(20)).window();
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_item_label_fallback() {
        assert_eq!(item_label(None), UNKNOWN_ITEM);
        assert_eq!(item_label(Some("   ")), UNKNOWN_ITEM);
        assert_eq!(item_label(Some("Wallet")), "Wallet");
    }

    #[test]
    fn test_item_without_declaration_renders() {
        let now = Utc::now();
        let details = ItemDetails {
            id: 1,
            name: "Umbrella".to_string(),
            description: None,
            photo_url: None,
            state: ItemState::Found,
            unique_code: "OBJ-ABCDEFGH".to_string(),
            crea_date: now,
            modif_date: now,
            declaration_id: None,
            kind: None,
            location: None,
            declarant_id: None,
            declarant_username: None,
        };
        assert_eq!(details.label(), "Umbrella");
        assert_eq!(details.declarant_label(), NO_DECLARANT);
    }
}
