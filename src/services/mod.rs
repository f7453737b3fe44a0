//! Business logic services

pub mod declarations;
pub mod email;
pub mod items;
pub mod messages;
pub mod proof;
pub mod restitutions;
pub mod stations;
pub mod stats;
pub mod users;

use std::sync::Arc;

use chrono::Utc;

use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
    models::user::User,
    repository::{cases::Transition, Repository},
    workflow::{self, Actor, Command},
};

use self::{
    email::{EmailService, Notifier},
    proof::{PdfProofRenderer, ProofRenderer},
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub declarations: declarations::DeclarationsService,
    pub items: items::ItemsService,
    pub messages: messages::MessagesService,
    pub restitutions: restitutions::RestitutionsService,
    pub stations: stations::StationsService,
    pub stats: stats::StatsService,
    pub users: users::UsersService,
    repository: Repository,
}

impl Services {
    /// Create all services with SMTP notifications and PDF proofs
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        Self::with_collaborators(
            repository,
            config,
            Arc::new(EmailService::new(config.email.clone())),
            Arc::new(PdfProofRenderer),
        )
    }

    pub fn with_collaborators(
        repository: Repository,
        config: &AppConfig,
        notifier: Arc<dyn Notifier>,
        proof_renderer: Arc<dyn ProofRenderer>,
    ) -> Self {
        Self {
            declarations: declarations::DeclarationsService::new(
                repository.clone(),
                notifier.clone(),
            ),
            items: items::ItemsService::new(repository.clone()),
            messages: messages::MessagesService::new(repository.clone(), notifier.clone()),
            restitutions: restitutions::RestitutionsService::new(
                repository.clone(),
                notifier.clone(),
                proof_renderer,
                config.proof.public_base_url.clone(),
            ),
            stations: stations::StationsService::new(repository.clone()),
            stats: stats::StatsService::new(repository.clone()),
            users: users::UsersService::new(repository.clone(), config.auth.clone(), notifier),
            repository,
        }
    }

    /// Check that the database answers
    pub async fn ping(&self) -> AppResult<()> {
        Ok(self.repository.ping().await?)
    }
}

/// Load the acting user and refuse banned accounts
pub(crate) async fn active_user(repository: &Repository, user_id: i32) -> AppResult<User> {
    let user = repository.users.get_by_id(user_id).await?;
    if user.banned {
        return Err(AppError::Authorization("Account is banned".to_string()));
    }
    Ok(user)
}

/// Run a workflow command on an item inside a locked transaction
pub(crate) async fn run_command(
    repository: &Repository,
    item_id: i32,
    actor: Actor,
    command: Command,
) -> AppResult<Transition> {
    let today = Utc::now().date_naive();
    let transition = repository
        .cases
        .transition(item_id, |case| {
            workflow::decide(case, &actor, command, today).map_err(AppError::from)
        })
        .await?;

    tracing::info!(
        item_id,
        actor_id = actor.user_id,
        role = %actor.role,
        from = %transition.effect.from,
        to = %transition.effect.to,
        restitution_id = ?transition.restitution_id,
        "Item transition"
    );

    if let Err(violation) = transition.case.check_invariants() {
        tracing::error!(item_id, %violation, "Item case is inconsistent after transition");
    }

    Ok(transition)
}
