//! Item lifecycle state machine
//!
//! All state changes of an item go through [`decide`], which checks the
//! guards for a [`Command`] against the current [`Case`] and returns the
//! [`Effect`] to persist. The function does no I/O; the repository applies
//! the effect inside the transaction that loaded the case, and
//! [`Case::apply`] replays it in memory.
//!
//! ```text
//!  Lost ──found──┐                       ┌──cancel──> Lost | Found
//!                ├──> Claimed ──schedule──> PendingReturn ──complete──> Returned
//!  Found ─claim──┘       ^                                                 │
//!                        └──────────────────────reopen─────────────────────┘
//! ```

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::models::enums::{DeclarationKind, ItemState, RestitutionStatus, Role};

/// The authenticated user performing a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i32,
    pub role: Role,
}

/// What the workflow needs to know about a restitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestitutionFacts {
    pub id: i32,
    /// Scheduling officer; `None` once that account has been removed
    pub officer_id: Option<i32>,
    pub claimant_id: Option<i32>,
    pub finder_id: Option<i32>,
    pub status: RestitutionStatus,
}

/// An item together with its originating declaration and restitutions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Case {
    pub item_id: i32,
    pub declaration_id: i32,
    pub declarant_id: i32,
    pub kind: DeclarationKind,
    pub state: ItemState,
    pub finders: BTreeSet<i32>,
    pub claimants: BTreeSet<i32>,
    pub restitutions: Vec<RestitutionFacts>,
}

/// Where and when a handover takes place
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Appointment {
    pub station_id: i32,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A citizen reports having found a lost item
    ReportFound,
    /// A citizen claims ownership of a found item
    Claim,
    /// An officer schedules the handover
    Schedule {
        appointment: Appointment,
        finder_id: Option<i32>,
        claimant_id: Option<i32>,
    },
    /// The scheduling officer records the handover as performed
    Complete { restitution_id: i32 },
    /// The scheduling officer cancels a planned handover
    Cancel { restitution_id: i32 },
    /// The claimant contests a completed handover
    Reopen { restitution_id: i32 },
    DeleteRestitution { restitution_id: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRestitution {
    pub officer_id: i32,
    pub claimant_id: i32,
    pub finder_id: i32,
    pub appointment: Appointment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestitutionChange {
    Create(NewRestitution),
    MarkDone { restitution_id: i32, performed_by: i32 },
    MarkDisputed { restitution_id: i32 },
    Remove { restitution_id: i32 },
}

/// Mutations produced by an accepted command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Effect {
    pub from: ItemState,
    pub to: ItemState,
    pub add_finder: Option<i32>,
    pub add_claimant: Option<i32>,
    pub restitution: Option<RestitutionChange>,
}

impl Effect {
    fn stay(state: ItemState) -> Self {
        Self {
            from: state,
            to: state,
            add_finder: None,
            add_claimant: None,
            restitution: None,
        }
    }

    fn moving(from: ItemState, to: ItemState) -> Self {
        Self { to, ..Self::stay(from) }
    }

    pub fn changes_state(&self) -> bool {
        self.from != self.to
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("This action requires the {0} role")]
    RoleRequired(Role),

    #[error("You cannot act on your own declaration")]
    OwnDeclaration,

    #[error("You have already reported finding this item")]
    AlreadyFinder,

    #[error("You have already claimed this item")]
    AlreadyClaimant,

    #[error("Only the officer who scheduled this restitution may act on it")]
    NotCreatingOfficer,

    #[error("Only the citizen who received the item may reopen it")]
    NotClaimant,

    #[error("A {0} must be selected")]
    ParticipantRequired(&'static str),

    #[error("User {0} is not a participant of this declaration")]
    UnknownParticipant(i32),

    #[error("The restitution date cannot be in the past")]
    DateInPast,

    #[error("Restitution {0} does not belong to this item")]
    NoSuchRestitution(i32),

    #[error("This action is only available on {expected} declarations")]
    WrongKind { expected: DeclarationKind },

    #[error("Cannot {action} while the item is {}", .from.label().to_lowercase())]
    InvalidTransition { from: ItemState, action: &'static str },

    #[error("Cannot {action} a {status} restitution")]
    RestitutionStatus {
        status: RestitutionStatus,
        action: &'static str,
    },
}

/// Check a command against the case and compute its effect
pub fn decide(
    case: &Case,
    actor: &Actor,
    command: Command,
    today: NaiveDate,
) -> Result<Effect, WorkflowError> {
    match command {
        Command::ReportFound => report_found(case, actor),
        Command::Claim => claim(case, actor),
        Command::Schedule {
            appointment,
            finder_id,
            claimant_id,
        } => schedule(case, actor, appointment, finder_id, claimant_id, today),
        Command::Complete { restitution_id } => complete(case, actor, restitution_id),
        Command::Cancel { restitution_id } => cancel(case, actor, restitution_id),
        Command::Reopen { restitution_id } => reopen(case, actor, restitution_id),
        Command::DeleteRestitution { restitution_id } => {
            delete_restitution(case, actor, restitution_id)
        }
    }
}

fn require_role(actor: &Actor, role: Role) -> Result<(), WorkflowError> {
    if actor.role == role {
        Ok(())
    } else {
        Err(WorkflowError::RoleRequired(role))
    }
}

fn require_state(
    case: &Case,
    allowed: &[ItemState],
    action: &'static str,
) -> Result<(), WorkflowError> {
    if allowed.contains(&case.state) {
        Ok(())
    } else {
        Err(WorkflowError::InvalidTransition {
            from: case.state,
            action,
        })
    }
}

fn report_found(case: &Case, actor: &Actor) -> Result<Effect, WorkflowError> {
    require_role(actor, Role::Citizen)?;
    if case.kind != DeclarationKind::Lost {
        return Err(WorkflowError::WrongKind {
            expected: DeclarationKind::Lost,
        });
    }
    if actor.user_id == case.declarant_id {
        return Err(WorkflowError::OwnDeclaration);
    }
    if case.finders.contains(&actor.user_id) {
        return Err(WorkflowError::AlreadyFinder);
    }
    require_state(
        case,
        &[ItemState::Lost, ItemState::Claimed],
        "report this item as found",
    )?;

    Ok(Effect {
        add_finder: Some(actor.user_id),
        ..Effect::moving(case.state, ItemState::Claimed)
    })
}

fn claim(case: &Case, actor: &Actor) -> Result<Effect, WorkflowError> {
    require_role(actor, Role::Citizen)?;
    if case.kind != DeclarationKind::Found {
        return Err(WorkflowError::WrongKind {
            expected: DeclarationKind::Found,
        });
    }
    if actor.user_id == case.declarant_id {
        return Err(WorkflowError::OwnDeclaration);
    }
    if case.claimants.contains(&actor.user_id) {
        return Err(WorkflowError::AlreadyClaimant);
    }
    require_state(case, &[ItemState::Found, ItemState::Claimed], "claim this item")?;

    Ok(Effect {
        add_claimant: Some(actor.user_id),
        ..Effect::moving(case.state, ItemState::Claimed)
    })
}

/// Resolve a participant from an explicit choice or a single candidate
fn pick(
    candidates: &BTreeSet<i32>,
    chosen: Option<i32>,
    role: &'static str,
) -> Result<i32, WorkflowError> {
    match chosen {
        Some(id) if candidates.contains(&id) => Ok(id),
        Some(id) => Err(WorkflowError::UnknownParticipant(id)),
        None if candidates.len() == 1 => candidates
            .iter()
            .next()
            .copied()
            .ok_or(WorkflowError::ParticipantRequired(role)),
        None => Err(WorkflowError::ParticipantRequired(role)),
    }
}

fn schedule(
    case: &Case,
    actor: &Actor,
    appointment: Appointment,
    finder_id: Option<i32>,
    claimant_id: Option<i32>,
    today: NaiveDate,
) -> Result<Effect, WorkflowError> {
    require_role(actor, Role::Officer)?;
    require_state(case, &[ItemState::Claimed], "schedule a restitution")?;
    if appointment.date < today {
        return Err(WorkflowError::DateInPast);
    }

    let (claimant_id, finder_id) = match case.kind {
        DeclarationKind::Lost => (case.declarant_id, pick(&case.finders, finder_id, "finder")?),
        DeclarationKind::Found => (
            pick(&case.claimants, claimant_id, "claimant")?,
            case.declarant_id,
        ),
    };

    Ok(Effect {
        restitution: Some(RestitutionChange::Create(NewRestitution {
            officer_id: actor.user_id,
            claimant_id,
            finder_id,
            appointment,
        })),
        ..Effect::moving(case.state, ItemState::PendingReturn)
    })
}

fn scheduled_by_actor<'a>(
    case: &'a Case,
    actor: &Actor,
    restitution_id: i32,
) -> Result<&'a RestitutionFacts, WorkflowError> {
    require_role(actor, Role::Officer)?;
    let restitution = case.restitution(restitution_id)?;
    match restitution.officer_id {
        Some(officer_id) if officer_id != actor.user_id => Err(WorkflowError::NotCreatingOfficer),
        _ => Ok(restitution),
    }
}

fn require_status(
    restitution: &RestitutionFacts,
    expected: RestitutionStatus,
    action: &'static str,
) -> Result<(), WorkflowError> {
    if restitution.status == expected {
        Ok(())
    } else {
        Err(WorkflowError::RestitutionStatus {
            status: restitution.status,
            action,
        })
    }
}

fn complete(case: &Case, actor: &Actor, restitution_id: i32) -> Result<Effect, WorkflowError> {
    let restitution = scheduled_by_actor(case, actor, restitution_id)?;
    require_status(restitution, RestitutionStatus::Planned, "complete")?;
    require_state(case, &[ItemState::PendingReturn], "complete a restitution")?;

    Ok(Effect {
        restitution: Some(RestitutionChange::MarkDone {
            restitution_id,
            performed_by: actor.user_id,
        }),
        ..Effect::moving(case.state, ItemState::Returned)
    })
}

fn cancel(case: &Case, actor: &Actor, restitution_id: i32) -> Result<Effect, WorkflowError> {
    let restitution = scheduled_by_actor(case, actor, restitution_id)?;
    require_status(restitution, RestitutionStatus::Planned, "cancel")?;
    require_state(case, &[ItemState::PendingReturn], "cancel a restitution")?;

    Ok(Effect {
        restitution: Some(RestitutionChange::Remove { restitution_id }),
        ..Effect::moving(case.state, case.kind.into())
    })
}

fn reopen(case: &Case, actor: &Actor, restitution_id: i32) -> Result<Effect, WorkflowError> {
    require_role(actor, Role::Citizen)?;
    let restitution = case.restitution(restitution_id)?;
    if restitution.claimant_id != Some(actor.user_id) {
        return Err(WorkflowError::NotClaimant);
    }
    require_status(restitution, RestitutionStatus::Done, "reopen")?;
    require_state(case, &[ItemState::Returned], "reopen a restitution")?;

    Ok(Effect {
        restitution: Some(RestitutionChange::MarkDisputed { restitution_id }),
        ..Effect::moving(case.state, ItemState::Claimed)
    })
}

fn delete_restitution(
    case: &Case,
    actor: &Actor,
    restitution_id: i32,
) -> Result<Effect, WorkflowError> {
    let restitution = scheduled_by_actor(case, actor, restitution_id)?;
    match restitution.status {
        RestitutionStatus::Planned => cancel(case, actor, restitution_id),
        RestitutionStatus::Disputed => Ok(Effect {
            restitution: Some(RestitutionChange::Remove { restitution_id }),
            ..Effect::stay(case.state)
        }),
        RestitutionStatus::Done => Err(WorkflowError::RestitutionStatus {
            status: RestitutionStatus::Done,
            action: "delete",
        }),
    }
}

impl Case {
    pub fn restitution(&self, restitution_id: i32) -> Result<&RestitutionFacts, WorkflowError> {
        self.restitutions
            .iter()
            .find(|r| r.id == restitution_id)
            .ok_or(WorkflowError::NoSuchRestitution(restitution_id))
    }

    /// Owner the item would be handed back to if scheduled now.
    /// The declarant of a lost item is its default claimant.
    pub fn default_claimant(&self) -> Option<i32> {
        match self.kind {
            DeclarationKind::Lost => Some(self.declarant_id),
            DeclarationKind::Found if self.claimants.len() == 1 => {
                self.claimants.iter().next().copied()
            }
            DeclarationKind::Found => None,
        }
    }

    fn count(&self, status: RestitutionStatus) -> usize {
        self.restitutions.iter().filter(|r| r.status == status).count()
    }

    /// Replay an accepted effect in memory
    pub fn apply(&mut self, effect: &Effect, allocate_id: impl FnOnce() -> i32) {
        self.state = effect.to;
        if let Some(finder) = effect.add_finder {
            self.finders.insert(finder);
        }
        if let Some(claimant) = effect.add_claimant {
            self.claimants.insert(claimant);
        }
        match &effect.restitution {
            None => {}
            Some(RestitutionChange::Create(new)) => self.restitutions.push(RestitutionFacts {
                id: allocate_id(),
                officer_id: Some(new.officer_id),
                claimant_id: Some(new.claimant_id),
                finder_id: Some(new.finder_id),
                status: RestitutionStatus::Planned,
            }),
            Some(RestitutionChange::MarkDone { restitution_id, .. }) => {
                self.set_status(*restitution_id, RestitutionStatus::Done)
            }
            Some(RestitutionChange::MarkDisputed { restitution_id }) => {
                self.set_status(*restitution_id, RestitutionStatus::Disputed)
            }
            Some(RestitutionChange::Remove { restitution_id }) => {
                self.restitutions.retain(|r| r.id != *restitution_id)
            }
        }
    }

    fn set_status(&mut self, restitution_id: i32, status: RestitutionStatus) {
        if let Some(r) = self.restitutions.iter_mut().find(|r| r.id == restitution_id) {
            r.status = status;
        }
    }

    /// Check the consistency rules between item state, participants and
    /// restitutions. Returns the first violated rule.
    pub fn check_invariants(&self) -> Result<(), String> {
        let done = self.count(RestitutionStatus::Done);
        let planned = self.count(RestitutionStatus::Planned);

        let expected_done = usize::from(self.state == ItemState::Returned);
        if done != expected_done {
            return Err(format!(
                "item {} is {} with {} done restitution(s)",
                self.item_id, self.state, done
            ));
        }

        let expected_planned = usize::from(self.state == ItemState::PendingReturn);
        if planned != expected_planned {
            return Err(format!(
                "item {} is {} with {} planned restitution(s)",
                self.item_id, self.state, planned
            ));
        }

        if self.claimants.contains(&self.declarant_id) || self.finders.contains(&self.declarant_id)
        {
            return Err(format!(
                "declarant {} is recorded as finder or claimant of declaration {}",
                self.declarant_id, self.declaration_id
            ));
        }

        let (counterparts, role) = match self.kind {
            DeclarationKind::Lost => (&self.finders, "finder"),
            DeclarationKind::Found => (&self.claimants, "claimant"),
        };
        if self.state == ItemState::Claimed && counterparts.is_empty() {
            return Err(format!(
                "item {} is claimed without any {} on declaration {}",
                self.item_id, role, self.declaration_id
            ));
        }

        let foreign_initial = match self.kind {
            DeclarationKind::Lost => ItemState::Found,
            DeclarationKind::Found => ItemState::Lost,
        };
        if self.state == foreign_initial {
            return Err(format!(
                "{} declaration {} has an item in state {}",
                self.kind, self.declaration_id, self.state
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: i32 = 1;
    const BOB: i32 = 2;
    const CAROL: i32 = 3;
    const OFFICER: i32 = 10;
    const OTHER_OFFICER: i32 = 11;

    fn citizen(user_id: i32) -> Actor {
        Actor {
            user_id,
            role: Role::Citizen,
        }
    }

    fn officer(user_id: i32) -> Actor {
        Actor {
            user_id,
            role: Role::Officer,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn appointment() -> Appointment {
        Appointment {
            station_id: 7,
            date: NaiveDate::from_ymd_opt(2025, 3, 12).unwrap(),
            time: NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
        }
    }

    fn new_case(kind: DeclarationKind) -> Case {
        Case {
            item_id: 100,
            declaration_id: 200,
            declarant_id: ALICE,
            kind,
            state: kind.into(),
            finders: BTreeSet::new(),
            claimants: BTreeSet::new(),
            restitutions: Vec::new(),
        }
    }

    fn run(case: &mut Case, actor: Actor, command: Command) -> Result<Effect, WorkflowError> {
        let effect = decide(case, &actor, command, today())?;
        case.apply(&effect, || 300);
        Ok(effect)
    }

    fn schedule_cmd() -> Command {
        Command::Schedule {
            appointment: appointment(),
            finder_id: None,
            claimant_id: None,
        }
    }

    #[test]
    fn test_report_found_moves_lost_to_claimed() {
        let mut case = new_case(DeclarationKind::Lost);
        let effect = run(&mut case, citizen(BOB), Command::ReportFound).unwrap();
        assert_eq!(effect.from, ItemState::Lost);
        assert_eq!(effect.to, ItemState::Claimed);
        assert!(case.finders.contains(&BOB));
        assert_eq!(case.default_claimant(), Some(ALICE));
        assert!(case.check_invariants().is_ok());
    }

    #[test]
    fn test_second_finder_keeps_claimed() {
        let mut case = new_case(DeclarationKind::Lost);
        run(&mut case, citizen(BOB), Command::ReportFound).unwrap();
        let effect = run(&mut case, citizen(CAROL), Command::ReportFound).unwrap();
        assert!(!effect.changes_state());
        assert_eq!(case.finders.len(), 2);
    }

    #[test]
    fn test_cannot_find_own_item() {
        let case = new_case(DeclarationKind::Lost);
        let err = decide(&case, &citizen(ALICE), Command::ReportFound, today()).unwrap_err();
        assert_eq!(err, WorkflowError::OwnDeclaration);
    }

    #[test]
    fn test_report_found_on_found_declaration_is_rejected() {
        let case = new_case(DeclarationKind::Found);
        let err = decide(&case, &citizen(BOB), Command::ReportFound, today()).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::WrongKind {
                expected: DeclarationKind::Lost
            }
        );
    }

    #[test]
    fn test_claim_guards() {
        let mut case = new_case(DeclarationKind::Found);
        assert_eq!(
            decide(&case, &citizen(ALICE), Command::Claim, today()).unwrap_err(),
            WorkflowError::OwnDeclaration
        );
        run(&mut case, citizen(BOB), Command::Claim).unwrap();
        assert_eq!(case.state, ItemState::Claimed);
        assert_eq!(
            decide(&case, &citizen(BOB), Command::Claim, today()).unwrap_err(),
            WorkflowError::AlreadyClaimant
        );
        assert!(!case.claimants.contains(&ALICE));
    }

    #[test]
    fn test_officers_cannot_report_found() {
        let case = new_case(DeclarationKind::Lost);
        let err = decide(&case, &officer(OFFICER), Command::ReportFound, today()).unwrap_err();
        assert_eq!(err, WorkflowError::RoleRequired(Role::Citizen));
    }

    #[test]
    fn test_schedule_requires_claimed_state() {
        let case = new_case(DeclarationKind::Lost);
        let err = decide(&case, &officer(OFFICER), schedule_cmd(), today()).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { from: ItemState::Lost, .. }));
    }

    #[test]
    fn test_schedule_requires_finder_choice_when_ambiguous() {
        let mut case = new_case(DeclarationKind::Lost);
        run(&mut case, citizen(BOB), Command::ReportFound).unwrap();
        run(&mut case, citizen(CAROL), Command::ReportFound).unwrap();

        let err = decide(&case, &officer(OFFICER), schedule_cmd(), today()).unwrap_err();
        assert_eq!(err, WorkflowError::ParticipantRequired("finder"));

        let err = decide(
            &case,
            &officer(OFFICER),
            Command::Schedule {
                appointment: appointment(),
                finder_id: Some(42),
                claimant_id: None,
            },
            today(),
        )
        .unwrap_err();
        assert_eq!(err, WorkflowError::UnknownParticipant(42));

        let effect = decide(
            &case,
            &officer(OFFICER),
            Command::Schedule {
                appointment: appointment(),
                finder_id: Some(CAROL),
                claimant_id: None,
            },
            today(),
        )
        .unwrap();
        match effect.restitution {
            Some(RestitutionChange::Create(new)) => {
                assert_eq!(new.finder_id, CAROL);
                assert_eq!(new.claimant_id, ALICE);
                assert_eq!(new.officer_id, OFFICER);
            }
            other => panic!("unexpected restitution change: {:?}", other),
        }
    }

    #[test]
    fn test_schedule_in_the_past_is_rejected() {
        let mut case = new_case(DeclarationKind::Found);
        run(&mut case, citizen(BOB), Command::Claim).unwrap();
        let mut past = appointment();
        past.date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let err = decide(
            &case,
            &officer(OFFICER),
            Command::Schedule {
                appointment: past,
                finder_id: None,
                claimant_id: None,
            },
            today(),
        )
        .unwrap_err();
        assert_eq!(err, WorkflowError::DateInPast);
    }

    #[test]
    fn test_found_declaration_hands_item_to_claimant() {
        let mut case = new_case(DeclarationKind::Found);
        run(&mut case, citizen(BOB), Command::Claim).unwrap();
        run(&mut case, officer(OFFICER), schedule_cmd()).unwrap();
        let r = &case.restitutions[0];
        assert_eq!(r.claimant_id, Some(BOB));
        assert_eq!(r.finder_id, Some(ALICE));
    }

    #[test]
    fn test_only_creating_officer_may_complete() {
        let mut case = new_case(DeclarationKind::Found);
        run(&mut case, citizen(BOB), Command::Claim).unwrap();
        run(&mut case, officer(OFFICER), schedule_cmd()).unwrap();

        let err = decide(
            &case,
            &officer(OTHER_OFFICER),
            Command::Complete { restitution_id: 300 },
            today(),
        )
        .unwrap_err();
        assert_eq!(err, WorkflowError::NotCreatingOfficer);

        case.restitutions[0].officer_id = None;
        assert!(decide(
            &case,
            &officer(OTHER_OFFICER),
            Command::Complete { restitution_id: 300 },
            today(),
        )
        .is_ok());
    }

    #[test]
    fn test_complete_twice_is_rejected() {
        let mut case = new_case(DeclarationKind::Found);
        run(&mut case, citizen(BOB), Command::Claim).unwrap();
        run(&mut case, officer(OFFICER), schedule_cmd()).unwrap();
        run(&mut case, officer(OFFICER), Command::Complete { restitution_id: 300 }).unwrap();

        let err = decide(
            &case,
            &officer(OFFICER),
            Command::Complete { restitution_id: 300 },
            today(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            WorkflowError::RestitutionStatus {
                status: RestitutionStatus::Done,
                action: "complete"
            }
        );
        assert!(case.check_invariants().is_ok());
    }

    #[test]
    fn test_reopen_only_by_claimant() {
        let mut case = new_case(DeclarationKind::Found);
        run(&mut case, citizen(BOB), Command::Claim).unwrap();
        run(&mut case, officer(OFFICER), schedule_cmd()).unwrap();
        run(&mut case, officer(OFFICER), Command::Complete { restitution_id: 300 }).unwrap();

        let err = decide(&case, &citizen(CAROL), Command::Reopen { restitution_id: 300 }, today())
            .unwrap_err();
        assert_eq!(err, WorkflowError::NotClaimant);

        run(&mut case, citizen(BOB), Command::Reopen { restitution_id: 300 }).unwrap();
        assert_eq!(case.state, ItemState::Claimed);
        assert_eq!(case.restitutions[0].status, RestitutionStatus::Disputed);
        assert!(case.check_invariants().is_ok());
    }

    #[test]
    fn test_done_restitution_cannot_be_deleted() {
        let mut case = new_case(DeclarationKind::Found);
        run(&mut case, citizen(BOB), Command::Claim).unwrap();
        run(&mut case, officer(OFFICER), schedule_cmd()).unwrap();
        run(&mut case, officer(OFFICER), Command::Complete { restitution_id: 300 }).unwrap();

        let err = decide(
            &case,
            &officer(OFFICER),
            Command::DeleteRestitution { restitution_id: 300 },
            today(),
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::RestitutionStatus { .. }));
    }

    #[test]
    fn test_deleting_planned_restitution_reverts_state() {
        let mut case = new_case(DeclarationKind::Found);
        run(&mut case, citizen(BOB), Command::Claim).unwrap();
        run(&mut case, officer(OFFICER), schedule_cmd()).unwrap();
        let effect = run(
            &mut case,
            officer(OFFICER),
            Command::DeleteRestitution { restitution_id: 300 },
        )
        .unwrap();
        assert_eq!(effect.to, ItemState::Found);
        assert!(case.restitutions.is_empty());
    }

    #[test]
    fn test_unknown_restitution() {
        let case = new_case(DeclarationKind::Lost);
        let err = decide(&case, &officer(OFFICER), Command::Cancel { restitution_id: 9 }, today())
            .unwrap_err();
        assert_eq!(err, WorkflowError::NoSuchRestitution(9));
    }

    #[test]
    fn test_invariants_catch_inconsistent_case() {
        let mut case = new_case(DeclarationKind::Lost);
        case.state = ItemState::Returned;
        assert!(case.check_invariants().is_err());

        let mut case = new_case(DeclarationKind::Found);
        case.claimants.insert(ALICE);
        assert!(case.check_invariants().is_err());
    }

    #[test]
    fn test_invariants_catch_claimed_item_without_counterpart() {
        let mut case = new_case(DeclarationKind::Lost);
        run(&mut case, citizen(BOB), Command::ReportFound).unwrap();
        assert!(case.check_invariants().is_ok());

        // Finder account removed
        case.finders.clear();
        let violation = case.check_invariants().unwrap_err();
        assert!(violation.contains("without any finder"));

        let mut case = new_case(DeclarationKind::Found);
        case.state = ItemState::Claimed;
        assert!(case.check_invariants().unwrap_err().contains("without any claimant"));
    }

    #[test]
    fn test_error_messages() {
        let err = WorkflowError::InvalidTransition {
            from: ItemState::PendingReturn,
            action: "claim this item",
        };
        assert_eq!(err.to_string(), "Cannot claim this item while the item is pending return");
    }
}
