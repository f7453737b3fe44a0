//! End-to-end item lifecycles replayed against the workflow rules

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};

use lostfound_server::{
    models::enums::{DeclarationKind, ItemState, RestitutionStatus, Role},
    workflow::{decide, Actor, Appointment, Case, Command, Effect, WorkflowError},
};

const ALICE: i32 = 1;
const BOB: i32 = 2;
const OFFICER_C: i32 = 20;
const STATION_S: i32 = 4;

struct Scenario {
    case: Case,
    today: NaiveDate,
    next_restitution_id: i32,
}

impl Scenario {
    fn declared(kind: DeclarationKind) -> Self {
        Self {
            case: Case {
                item_id: 1,
                declaration_id: 1,
                declarant_id: ALICE,
                kind,
                state: kind.into(),
                finders: BTreeSet::new(),
                claimants: BTreeSet::new(),
                restitutions: Vec::new(),
            },
            today: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            next_restitution_id: 1,
        }
    }

    fn run(&mut self, actor: Actor, command: Command) -> Result<Effect, WorkflowError> {
        let effect = decide(&self.case, &actor, command, self.today)?;
        let id = self.next_restitution_id;
        self.case.apply(&effect, || id);
        self.next_restitution_id += 1;
        self.case.check_invariants().expect("invariants hold");
        Ok(effect)
    }

    fn schedule_at_station(&mut self) -> i32 {
        self.run(
            officer(OFFICER_C),
            Command::Schedule {
                appointment: Appointment {
                    station_id: STATION_S,
                    date: NaiveDate::from_ymd_opt(2025, 6, 5).unwrap(),
                    time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                },
                finder_id: None,
                claimant_id: None,
            },
        )
        .expect("schedule accepted");
        self.case.restitutions.last().expect("restitution created").id
    }
}

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

#[test]
fn lost_wallet_is_returned_to_its_owner() {
    let mut wallet = Scenario::declared(DeclarationKind::Lost);
    assert_eq!(wallet.case.state, ItemState::Lost);

    wallet.run(citizen(BOB), Command::ReportFound).unwrap();
    assert_eq!(wallet.case.state, ItemState::Claimed);
    assert!(wallet.case.finders.contains(&BOB));
    assert_eq!(wallet.case.default_claimant(), Some(ALICE));

    let restitution_id = wallet.schedule_at_station();
    assert_eq!(wallet.case.state, ItemState::PendingReturn);
    let planned = wallet.case.restitution(restitution_id).unwrap();
    assert_eq!(planned.finder_id, Some(BOB));
    assert_eq!(planned.claimant_id, Some(ALICE));
    assert_eq!(planned.officer_id, Some(OFFICER_C));

    wallet
        .run(officer(OFFICER_C), Command::Complete { restitution_id })
        .unwrap();
    assert_eq!(wallet.case.state, ItemState::Returned);
    let done: Vec<_> = wallet
        .case
        .restitutions
        .iter()
        .filter(|r| r.status == RestitutionStatus::Done)
        .collect();
    assert_eq!(done.len(), 1);
}

#[test]
fn cancelled_restitution_reverts_to_declared_kind() {
    for kind in [DeclarationKind::Lost, DeclarationKind::Found] {
        let mut scenario = Scenario::declared(kind);
        let command = match kind {
            DeclarationKind::Lost => Command::ReportFound,
            DeclarationKind::Found => Command::Claim,
        };
        scenario.run(citizen(BOB), command).unwrap();
        let restitution_id = scenario.schedule_at_station();

        let effect = scenario
            .run(officer(OFFICER_C), Command::Cancel { restitution_id })
            .unwrap();

        assert_eq!(effect.from, ItemState::PendingReturn);
        assert_eq!(scenario.case.state, ItemState::from(kind));
        assert!(scenario.case.restitutions.is_empty());
    }
}

#[test]
fn reporting_found_twice_changes_nothing() {
    let mut wallet = Scenario::declared(DeclarationKind::Lost);
    wallet.run(citizen(BOB), Command::ReportFound).unwrap();
    let before = wallet.case.clone();

    let err = wallet.run(citizen(BOB), Command::ReportFound).unwrap_err();

    assert_eq!(err, WorkflowError::AlreadyFinder);
    assert_eq!(wallet.case, before);
}

#[test]
fn declarant_never_becomes_claimant() {
    let mut umbrella = Scenario::declared(DeclarationKind::Found);

    let err = umbrella.run(citizen(ALICE), Command::Claim).unwrap_err();
    assert_eq!(err, WorkflowError::OwnDeclaration);

    umbrella.run(citizen(BOB), Command::Claim).unwrap();
    assert!(!umbrella.case.claimants.contains(&ALICE));
    assert_eq!(umbrella.case.default_claimant(), Some(BOB));
}

#[test]
fn returned_item_can_be_disputed_and_rescheduled() {
    let mut wallet = Scenario::declared(DeclarationKind::Lost);
    wallet.run(citizen(BOB), Command::ReportFound).unwrap();
    let first = wallet.schedule_at_station();
    wallet
        .run(officer(OFFICER_C), Command::Complete { restitution_id: first })
        .unwrap();

    wallet
        .run(citizen(ALICE), Command::Reopen { restitution_id: first })
        .unwrap();
    assert_eq!(wallet.case.state, ItemState::Claimed);
    assert_eq!(
        wallet.case.restitution(first).unwrap().status,
        RestitutionStatus::Disputed
    );

    let second = wallet.schedule_at_station();
    wallet
        .run(officer(OFFICER_C), Command::Complete { restitution_id: second })
        .unwrap();
    assert_eq!(wallet.case.state, ItemState::Returned);
}

#[test]
fn returned_item_accepts_no_new_participants() {
    let mut wallet = Scenario::declared(DeclarationKind::Lost);
    wallet.run(citizen(BOB), Command::ReportFound).unwrap();
    let restitution_id = wallet.schedule_at_station();
    wallet
        .run(officer(OFFICER_C), Command::Complete { restitution_id })
        .unwrap();

    let err = wallet.run(citizen(3), Command::ReportFound).unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::InvalidTransition {
            from: ItemState::Returned,
            ..
        }
    ));
}
