//! Dashboard figures for each role

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::{declaration::DeclarationSummary, enums::ItemState};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StateCount {
    pub state: ItemState,
    pub count: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminDashboard {
    pub stations: i64,
    pub admins: i64,
    pub officers: i64,
    pub citizens: i64,
    pub banned_citizens: i64,
    pub items_by_state: Vec<StateCount>,
    pub restitutions_planned: i64,
    pub restitutions_done: i64,
    pub restitutions_disputed: i64,
    pub unhandled_messages: i64,
}

/// Declarations created in one month
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MonthlyDeclarations {
    /// `YYYY-MM`
    pub month: String,
    pub lost: i64,
    pub found: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OfficerDashboard {
    /// Lost declarations with at least one finder, awaiting scheduling
    pub lost_claimed: i64,
    /// Found declarations with at least one claimant, awaiting scheduling
    pub found_claimed: i64,
    pub pending_return: i64,
    pub returned: i64,
    /// Last six months, oldest first
    pub monthly: Vec<MonthlyDeclarations>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CitizenDashboard {
    pub lost_declarations: i64,
    pub found_declarations: i64,
    pub completed_restitutions: i64,
    pub latest: Vec<DeclarationSummary>,
}
