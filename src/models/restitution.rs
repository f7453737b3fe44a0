//! Restitution (scheduled handover) model

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::{enums::RestitutionStatus, item::item_label};

/// Restitution joined with item, station and participant names.
/// Every joined column is optional so that a dangling reference still renders.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RestitutionDetails {
    pub id: i32,
    pub item_id: i32,
    pub claimant_id: Option<i32>,
    pub finder_id: Option<i32>,
    pub officer_id: Option<i32>,
    pub performed_by: Option<i32>,
    pub station_id: i32,
    pub scheduled_date: NaiveDate,
    #[schema(value_type = String, example = "14:30:00")]
    pub scheduled_time: NaiveTime,
    pub status: RestitutionStatus,
    pub performed_at: Option<DateTime<Utc>>,
    pub crea_date: DateTime<Utc>,
    pub item_name: Option<String>,
    pub unique_code: Option<String>,
    pub station_name: Option<String>,
    pub station_address: Option<String>,
    pub claimant_username: Option<String>,
    pub claimant_email: Option<String>,
    pub finder_username: Option<String>,
    pub finder_email: Option<String>,
    pub officer_username: Option<String>,
    pub officer_email: Option<String>,
    pub performer_username: Option<String>,
    pub performer_email: Option<String>,
}

impl RestitutionDetails {
    pub fn item_label(&self) -> &str {
        item_label(self.item_name.as_deref())
    }

    /// Distinct email addresses of claimant and finder
    pub fn participant_emails(&self) -> Vec<String> {
        distinct_emails([self.claimant_email.as_deref(), self.finder_email.as_deref()])
    }

    /// Distinct email addresses of scheduling and performing officers
    pub fn officer_emails(&self) -> Vec<String> {
        distinct_emails([self.officer_email.as_deref(), self.performer_email.as_deref()])
    }
}

fn distinct_emails<const N: usize>(candidates: [Option<&str>; N]) -> Vec<String> {
    let mut emails: Vec<String> = Vec::with_capacity(N);
    for email in candidates.into_iter().flatten() {
        if !emails.iter().any(|e| e.eq_ignore_ascii_case(email)) {
            emails.push(email.to_string());
        }
    }
    emails
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct RestitutionQuery {
    pub status: Option<RestitutionStatus>,
}

/// Public answer of the QR verification link
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RestitutionVerification {
    pub restitution_id: i32,
    /// True when the handover was performed and is not disputed
    pub valid: bool,
    pub status: RestitutionStatus,
    pub item: String,
    pub unique_code: Option<String>,
    pub station: Option<String>,
    pub scheduled_date: NaiveDate,
    pub performed_at: Option<DateTime<Utc>>,
}

impl From<&RestitutionDetails> for RestitutionVerification {
    fn from(r: &RestitutionDetails) -> Self {
        Self {
            restitution_id: r.id,
            valid: r.status == RestitutionStatus::Done,
            status: r.status,
            item: r.item_label().to_string(),
            unique_code: r.unique_code.clone(),
            station: r.station_name.clone(),
            scheduled_date: r.scheduled_date,
            performed_at: r.performed_at,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn details(status: RestitutionStatus) -> RestitutionDetails {
        let now = Utc::now();
        RestitutionDetails {
            id: 12,
            item_id: 3,
            claimant_id: Some(1),
            finder_id: Some(2),
            officer_id: Some(10),
            performed_by: None,
            station_id: 4,
            scheduled_date: NaiveDate::from_ymd_opt(2025, 3, 12).unwrap(),
            scheduled_time: NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
            status,
            performed_at: None,
            crea_date: now,
            item_name: Some("Wallet".to_string()),
            unique_code: Some("OBJ-7K2M9QXA".to_string()),
            station_name: Some("Central station".to_string()),
            station_address: Some("1 Main Street".to_string()),
            claimant_username: Some("alice".to_string()),
            claimant_email: Some("alice@example.org".to_string()),
            finder_username: Some("bob".to_string()),
            finder_email: Some("bob@example.org".to_string()),
            officer_username: Some("carol".to_string()),
            officer_email: Some("carol@police.example.org".to_string()),
            performer_username: None,
            performer_email: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_emails_are_deduplicated() {
        let mut r = fixtures::details(RestitutionStatus::Planned);
        r.finder_email = Some("ALICE@example.org".to_string());
        assert_eq!(r.participant_emails(), vec!["alice@example.org".to_string()]);

        r.performer_email = r.officer_email.clone();
        assert_eq!(r.officer_emails().len(), 1);
    }

    #[test]
    fn test_verification_of_missing_item() {
        let mut r = fixtures::details(RestitutionStatus::Done);
        r.item_name = None;
        let verification = RestitutionVerification::from(&r);
        assert!(verification.valid);
        assert_eq!(verification.item, "Unknown item");

        let disputed = RestitutionVerification::from(&fixtures::details(RestitutionStatus::Disputed));
        assert!(!disputed.valid);
    }
}
