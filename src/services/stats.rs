//! Dashboard figures

use crate::{
    error::AppResult,
    models::{
        dashboard::{AdminDashboard, CitizenDashboard, OfficerDashboard},
        enums::{DeclarationKind, ItemState, RestitutionStatus, Role},
    },
    repository::Repository,
};

const MONTHS_IN_SERIES: i32 = 6;
const LATEST_DECLARATIONS: i64 = 5;

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn admin_dashboard(&self) -> AppResult<AdminDashboard> {
        let stats = &self.repository.stats;
        Ok(AdminDashboard {
            stations: stats.count_stations().await?,
            admins: stats.count_users(Role::Admin, false).await?,
            officers: stats.count_users(Role::Officer, false).await?,
            citizens: stats.count_users(Role::Citizen, false).await?,
            banned_citizens: stats.count_users(Role::Citizen, true).await?,
            items_by_state: stats.items_by_state().await?,
            restitutions_planned: stats.count_restitutions(RestitutionStatus::Planned).await?,
            restitutions_done: stats.count_restitutions(RestitutionStatus::Done).await?,
            restitutions_disputed: stats.count_restitutions(RestitutionStatus::Disputed).await?,
            unhandled_messages: stats.count_unhandled_messages().await?,
        })
    }

    pub async fn officer_dashboard(&self) -> AppResult<OfficerDashboard> {
        let stats = &self.repository.stats;
        Ok(OfficerDashboard {
            lost_claimed: stats
                .count_items(ItemState::Claimed, Some(DeclarationKind::Lost))
                .await?,
            found_claimed: stats
                .count_items(ItemState::Claimed, Some(DeclarationKind::Found))
                .await?,
            pending_return: stats.count_items(ItemState::PendingReturn, None).await?,
            returned: stats.count_items(ItemState::Returned, None).await?,
            monthly: stats.monthly_declarations(MONTHS_IN_SERIES).await?,
        })
    }

    pub async fn citizen_dashboard(&self, citizen_id: i32) -> AppResult<CitizenDashboard> {
        let stats = &self.repository.stats;
        Ok(CitizenDashboard {
            lost_declarations: stats
                .count_declarations(citizen_id, DeclarationKind::Lost)
                .await?,
            found_declarations: stats
                .count_declarations(citizen_id, DeclarationKind::Found)
                .await?,
            completed_restitutions: stats.count_completed_restitutions(citizen_id).await?,
            latest: self
                .repository
                .declarations
                .latest_by_citizen(citizen_id, LATEST_DECLARATIONS)
                .await?,
        })
    }
}
