//! Restitution scheduling, completion and disputes

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        declaration::ScheduleRestitution,
        enums::{RestitutionStatus, Role},
        item::StateChange,
        restitution::{RestitutionDetails, RestitutionVerification},
    },
    repository::{cases::Transition, Repository},
    services::{
        active_user,
        email::{deliver, Attachment, Notifier, OutgoingMessage},
        proof::{verify_url, ProofContext, ProofDocument, ProofRenderer},
        run_command,
    },
    workflow::{Actor, Appointment, Command},
};

#[derive(Clone)]
pub struct RestitutionsService {
    repository: Repository,
    notifier: Arc<dyn Notifier>,
    proof_renderer: Arc<dyn ProofRenderer>,
    public_base_url: String,
}

impl RestitutionsService {
    pub fn new(
        repository: Repository,
        notifier: Arc<dyn Notifier>,
        proof_renderer: Arc<dyn ProofRenderer>,
        public_base_url: String,
    ) -> Self {
        Self {
            repository,
            notifier,
            proof_renderer,
            public_base_url,
        }
    }

    /// Restitution details, for officers and the two citizens involved
    pub async fn get_details(&self, actor: Actor, id: i32) -> AppResult<RestitutionDetails> {
        let restitution = self.repository.restitutions.get_details(id).await?;
        let involved = restitution.claimant_id == Some(actor.user_id)
            || restitution.finder_id == Some(actor.user_id);
        if actor.role == Role::Citizen && !involved {
            return Err(AppError::Authorization(
                "You are not part of this restitution".to_string(),
            ));
        }
        Ok(restitution)
    }

    pub async fn list(&self, status: Option<RestitutionStatus>) -> AppResult<Vec<RestitutionDetails>> {
        self.repository.restitutions.list(status).await
    }

    pub async fn list_for_citizen(&self, user_id: i32) -> AppResult<Vec<RestitutionDetails>> {
        self.repository.restitutions.list_for_citizen(user_id).await
    }

    /// Schedule the handover of a claimed declaration's item
    pub async fn schedule(
        &self,
        actor: Actor,
        declaration_id: i32,
        request: ScheduleRestitution,
    ) -> AppResult<StateChange> {
        request.validate()?;
        let station = self.repository.stations.get_by_id(request.station_id).await?;
        let item_id = self
            .repository
            .cases
            .item_of_declaration(declaration_id)
            .await?;

        let command = Command::Schedule {
            appointment: Appointment {
                station_id: station.id,
                date: request.scheduled_date,
                time: request.scheduled_time,
            },
            finder_id: request.finder_id,
            claimant_id: request.claimant_id,
        };
        let transition = run_command(&self.repository, item_id, actor, command).await?;

        if let Some(restitution) = self.committed(&transition).await {
            let body = format!(
                "Hello,\n\n\
                 The restitution of \"{}\" ({}) is scheduled on {} at {}.\n\
                 Place: {}, {}\n\n\
                 Please bring an identity document.\n",
                restitution.item_label(),
                restitution.unique_code.as_deref().unwrap_or("-"),
                restitution.scheduled_date,
                restitution.scheduled_time.format("%H:%M"),
                station.name,
                station.address,
            );
            deliver(
                self.notifier.as_ref(),
                OutgoingMessage::new(restitution.participant_emails(), "Restitution scheduled", body),
            )
            .await;
        }

        Ok(StateChange::from(&transition))
    }

    /// Record the handover as performed and send the proof of return
    pub async fn complete(&self, actor: Actor, id: i32) -> AppResult<StateChange> {
        let item_id = self.repository.cases.item_of_restitution(id).await?;
        let transition = run_command(
            &self.repository,
            item_id,
            actor,
            Command::Complete { restitution_id: id },
        )
        .await?;
        let Some(restitution) = self.committed(&transition).await else {
            return Ok(StateChange::from(&transition));
        };

        let body = format!(
            "Hello,\n\n\
             \"{}\" ({}) has been handed over. The proof of return is attached.\n\
             It can be verified at {}\n",
            restitution.item_label(),
            restitution.unique_code.as_deref().unwrap_or("-"),
            verify_url(&self.public_base_url, id),
        );
        let mut message =
            OutgoingMessage::new(restitution.participant_emails(), "Proof of return", body);
        match self.render_proof(&restitution) {
            Ok(doc) => {
                message = message.with_attachment(Attachment {
                    filename: doc.filename,
                    content_type: doc.content_type,
                    bytes: doc.bytes,
                })
            }
            Err(e) => {
                tracing::warn!(restitution_id = id, error = %e, "Proof of return not generated");
            }
        }
        deliver(self.notifier.as_ref(), message).await;

        Ok(StateChange::from(&transition))
    }

    /// Cancel a planned handover
    pub async fn cancel(&self, actor: Actor, id: i32) -> AppResult<StateChange> {
        self.withdraw(actor, id, Command::Cancel { restitution_id: id })
            .await
    }

    /// Delete a planned or disputed restitution
    pub async fn delete(&self, actor: Actor, id: i32) -> AppResult<StateChange> {
        self.withdraw(actor, id, Command::DeleteRestitution { restitution_id: id })
            .await
    }

    async fn withdraw(&self, actor: Actor, id: i32, command: Command) -> AppResult<StateChange> {
        // Read before the row disappears, for the notification
        let restitution = self.repository.restitutions.get_details(id).await?;
        let transition = run_command(&self.repository, restitution.item_id, actor, command).await?;

        if restitution.status == RestitutionStatus::Planned {
            let body = format!(
                "Hello,\n\n\
                 The restitution of \"{}\" planned on {} at {} has been cancelled.\n\
                 You will be contacted again to schedule a new appointment.\n",
                restitution.item_label(),
                restitution.scheduled_date,
                restitution.scheduled_time.format("%H:%M"),
            );
            deliver(
                self.notifier.as_ref(),
                OutgoingMessage::new(
                    restitution.participant_emails(),
                    "Restitution cancelled",
                    body,
                ),
            )
            .await;
        }

        Ok(StateChange::from(&transition))
    }

    /// The claimant contests a completed handover
    pub async fn reopen(&self, actor: Actor, id: i32) -> AppResult<StateChange> {
        let citizen = active_user(&self.repository, actor.user_id).await?;
        let item_id = self.repository.cases.item_of_restitution(id).await?;
        let transition = run_command(
            &self.repository,
            item_id,
            actor,
            Command::Reopen { restitution_id: id },
        )
        .await?;

        if let Some(restitution) = self.committed(&transition).await {
            let body = format!(
                "Hello,\n\n\
                 {} disputes the restitution #{} of \"{}\" ({}).\n\
                 The item is back to claimed and needs a new appointment.\n",
                citizen.username,
                id,
                restitution.item_label(),
                restitution.unique_code.as_deref().unwrap_or("-"),
            );
            deliver(
                self.notifier.as_ref(),
                OutgoingMessage::new(restitution.officer_emails(), "Restitution disputed", body),
            )
            .await;
        }

        Ok(StateChange::from(&transition))
    }

    /// Proof of return of a completed restitution
    pub async fn proof(&self, id: i32) -> AppResult<ProofDocument> {
        let restitution = self.repository.restitutions.get_details(id).await?;
        if restitution.status != RestitutionStatus::Done {
            return Err(AppError::BusinessRule(format!(
                "No proof of return for a {} restitution",
                restitution.status
            )));
        }
        self.render_proof(&restitution)
    }

    /// Public check of a restitution, target of the proof's QR code
    pub async fn verify(&self, id: i32) -> AppResult<RestitutionVerification> {
        let restitution = self.repository.restitutions.get_details(id).await?;
        Ok(RestitutionVerification::from(&restitution))
    }

    fn render_proof(&self, restitution: &RestitutionDetails) -> AppResult<ProofDocument> {
        self.proof_renderer.render(&ProofContext {
            restitution,
            verify_url: verify_url(&self.public_base_url, restitution.id),
        })
    }

    /// Details of the restitution a committed transition touched.
    /// `None` when the lookup fails, the transition stands either way.
    async fn committed(&self, transition: &Transition) -> Option<RestitutionDetails> {
        let lookup = match transition.restitution_id {
            Some(id) => self.repository.restitutions.get_details(id).await,
            None => Err(AppError::Internal(
                "Transition did not touch a restitution".to_string(),
            )),
        };
        after_commit(transition, lookup)
    }
}

/// Result of a read made after commit, failures are only logged
fn after_commit<T>(transition: &Transition, lookup: AppResult<T>) -> Option<T> {
    match lookup {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(
                item_id = transition.case.item_id,
                restitution_id = ?transition.restitution_id,
                to = %transition.effect.to,
                error = %e,
                "Transition committed but its restitution could not be read"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::{
        models::enums::{DeclarationKind, ItemState},
        workflow::{Case, Effect, RestitutionChange},
    };

    fn completed() -> Transition {
        Transition {
            case: Case {
                item_id: 3,
                declaration_id: 5,
                declarant_id: 1,
                kind: DeclarationKind::Lost,
                state: ItemState::Returned,
                finders: BTreeSet::from([2]),
                claimants: BTreeSet::from([1]),
                restitutions: Vec::new(),
            },
            effect: Effect {
                from: ItemState::PendingReturn,
                to: ItemState::Returned,
                add_finder: None,
                add_claimant: None,
                restitution: Some(RestitutionChange::MarkDone {
                    restitution_id: 12,
                    performed_by: 10,
                }),
            },
            restitution_id: Some(12),
        }
    }

    #[test]
    fn test_failed_lookup_keeps_committed_transition() {
        let transition = completed();
        let lookup: AppResult<RestitutionDetails> =
            Err(AppError::NotFound("Restitution 12 not found".to_string()));

        assert!(after_commit(&transition, lookup).is_none());

        let change = StateChange::from(&transition);
        assert_eq!(change.to, ItemState::Returned);
        assert_eq!(change.restitution_id, Some(12));
    }

    #[test]
    fn test_successful_lookup_is_returned() {
        let transition = completed();
        let lookup = Ok(crate::models::restitution::fixtures::details(RestitutionStatus::Done));

        let restitution = after_commit(&transition, lookup).unwrap();
        assert_eq!(restitution.id, 12);
    }
}
