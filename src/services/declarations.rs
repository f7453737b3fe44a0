//! Declarations service: citizen reports, finders and claimants

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        declaration::{
            CreateDeclaration, Declaration, DeclarationDetails, DeclarationQuery,
            DeclarationSummary, UpdateDeclaration,
        },
        enums::DeclarationKind,
        item::{StateChange, UNKNOWN_ITEM},
    },
    repository::Repository,
    services::{
        active_user,
        email::{deliver, Notifier, OutgoingMessage},
        run_command,
    },
    workflow::{Actor, Command},
};

#[derive(Clone)]
pub struct DeclarationsService {
    repository: Repository,
    notifier: Arc<dyn Notifier>,
}

impl DeclarationsService {
    pub fn new(repository: Repository, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            repository,
            notifier,
        }
    }

    /// Declare a lost or found item
    pub async fn create(&self, actor: Actor, data: CreateDeclaration) -> AppResult<Declaration> {
        data.validate()?;
        active_user(&self.repository, actor.user_id).await?;

        let declaration = self.repository.declarations.create(actor.user_id, &data).await?;
        tracing::info!(
            declaration_id = declaration.id,
            item_id = declaration.item_id,
            kind = %declaration.kind,
            citizen_id = actor.user_id,
            "Declaration created"
        );
        Ok(declaration)
    }

    pub async fn get_details(&self, id: i32) -> AppResult<DeclarationDetails> {
        self.repository.declarations.get_details(id).await
    }

    pub async fn update(
        &self,
        actor: Actor,
        id: i32,
        data: UpdateDeclaration,
    ) -> AppResult<Declaration> {
        data.validate()?;
        self.owned(actor, id).await?;
        self.repository.declarations.update(id, &data).await
    }

    pub async fn delete(&self, actor: Actor, id: i32) -> AppResult<()> {
        self.owned(actor, id).await?;
        self.repository.declarations.delete(id).await?;
        tracing::info!(declaration_id = id, citizen_id = actor.user_id, "Declaration deleted");
        Ok(())
    }

    /// Open declarations of a kind, for citizens looking for their item or its owner
    pub async fn list_open(
        &self,
        kind: DeclarationKind,
        query: &DeclarationQuery,
    ) -> AppResult<Vec<DeclarationSummary>> {
        self.repository
            .declarations
            .list_open(kind, query.pattern().as_deref())
            .await
    }

    pub async fn list_mine(
        &self,
        citizen_id: i32,
        query: &DeclarationQuery,
    ) -> AppResult<Vec<DeclarationSummary>> {
        self.repository
            .declarations
            .list_by_citizen(citizen_id, query.kind, query.pattern().as_deref())
            .await
    }

    /// Declarations waiting for an officer to schedule a restitution
    pub async fn list_claimed(
        &self,
        kind: Option<DeclarationKind>,
    ) -> AppResult<Vec<DeclarationSummary>> {
        self.repository.declarations.list_claimed(kind).await
    }

    /// A citizen reports having found the item of a lost declaration
    pub async fn report_found(&self, actor: Actor, declaration_id: i32) -> AppResult<StateChange> {
        self.participate(actor, declaration_id, Command::ReportFound).await
    }

    /// A citizen claims the item of a found declaration
    pub async fn claim(&self, actor: Actor, declaration_id: i32) -> AppResult<StateChange> {
        self.participate(actor, declaration_id, Command::Claim).await
    }

    async fn participate(
        &self,
        actor: Actor,
        declaration_id: i32,
        command: Command,
    ) -> AppResult<StateChange> {
        let citizen = active_user(&self.repository, actor.user_id).await?;
        let item_id = self
            .repository
            .cases
            .item_of_declaration(declaration_id)
            .await?;

        let subject = match command {
            Command::ReportFound => "Someone found your item",
            _ => "Someone claimed the item you found",
        };
        let transition = run_command(&self.repository, item_id, actor, command).await?;

        let declarant = self
            .repository
            .users
            .get_by_id(transition.case.declarant_id)
            .await;
        match declarant {
            Ok(declarant) => {
                let item = self.repository.items.get_details(item_id).await.ok();
                let body = format!(
                    "Hello {},\n\n{} reported on your declaration \"{}\" ({}).\n\
                     An officer will contact you to schedule the restitution.\n",
                    declarant.display_name(),
                    citizen.username,
                    item.as_ref().map(|i| i.label()).unwrap_or(UNKNOWN_ITEM),
                    item.as_ref().map(|i| i.unique_code.as_str()).unwrap_or("-"),
                );
                deliver(
                    self.notifier.as_ref(),
                    OutgoingMessage::new(vec![declarant.email], subject, body),
                )
                .await;
            }
            Err(e) => {
                tracing::warn!(item_id, error = %e, "Declarant could not be notified");
            }
        }

        Ok(StateChange::from(&transition))
    }

    /// Load a declaration owned by the acting citizen
    async fn owned(&self, actor: Actor, id: i32) -> AppResult<Declaration> {
        active_user(&self.repository, actor.user_id).await?;
        let declaration = self.repository.declarations.get_by_id(id).await?;
        if declaration.citizen_id != actor.user_id {
            return Err(AppError::Authorization(
                "You can only modify your own declarations".to_string(),
            ));
        }
        Ok(declaration)
    }
}
