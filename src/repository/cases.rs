//! Transactional persistence of workflow transitions
//!
//! A transition loads the item row with `FOR UPDATE`, so concurrent commands
//! on the same item run one after the other and each sees the state left by
//! the previous one.

use std::collections::BTreeSet;

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{DeclarationKind, ItemState, RestitutionStatus},
        item::StateChange,
    },
    workflow::{Case, Effect, RestitutionChange, RestitutionFacts},
};

/// Outcome of a committed transition
#[derive(Debug, Clone)]
pub struct Transition {
    pub case: Case,
    pub effect: Effect,
    /// Restitution created or touched by the transition
    pub restitution_id: Option<i32>,
}

impl From<&Transition> for StateChange {
    fn from(t: &Transition) -> Self {
        Self {
            item_id: t.case.item_id,
            from: t.effect.from,
            to: t.effect.to,
            restitution_id: t.restitution_id,
        }
    }
}

#[derive(Clone)]
pub struct CasesRepository {
    pool: Pool<Postgres>,
}

impl CasesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Item id referenced by a declaration
    pub async fn item_of_declaration(&self, declaration_id: i32) -> AppResult<i32> {
        sqlx::query_scalar("SELECT item_id FROM declarations WHERE id = $1")
            .bind(declaration_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Declaration with id {} not found", declaration_id))
            })
    }

    /// Item id referenced by a restitution
    pub async fn item_of_restitution(&self, restitution_id: i32) -> AppResult<i32> {
        sqlx::query_scalar("SELECT item_id FROM restitutions WHERE id = $1")
            .bind(restitution_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Restitution with id {} not found", restitution_id))
            })
    }

    /// Run a workflow decision on a locked case and persist its effect.
    ///
    /// `decide` sees the case as it is after the lock was taken. When it
    /// fails, the transaction is rolled back and nothing is written.
    pub async fn transition<F>(&self, item_id: i32, decide: F) -> AppResult<Transition>
    where
        F: FnOnce(&Case) -> AppResult<Effect>,
    {
        let mut tx = self.pool.begin().await?;

        let mut case = load_locked(&mut tx, item_id).await?;
        let effect = decide(&case)?;
        let restitution_id = persist(&mut tx, &case, &effect).await?;

        tx.commit().await?;

        case.apply(&effect, || restitution_id.unwrap_or_default());

        Ok(Transition {
            case,
            effect,
            restitution_id,
        })
    }
}

/// Load an item with its declaration and restitutions, locking the item row
async fn load_locked(conn: &mut PgConnection, item_id: i32) -> AppResult<Case> {
    let (state, declaration_id, declarant_id, kind) =
        sqlx::query_as::<_, (ItemState, i32, i32, DeclarationKind)>(
            r#"
            SELECT i.state, d.id, d.citizen_id, d.kind
            FROM items i
            JOIN declarations d ON d.item_id = i.id
            WHERE i.id = $1
            FOR UPDATE OF i
            "#,
        )
        .bind(item_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Item with id {} not found", item_id)))?;

    let finders: Vec<i32> =
        sqlx::query_scalar("SELECT user_id FROM declaration_finders WHERE declaration_id = $1")
            .bind(declaration_id)
            .fetch_all(&mut *conn)
            .await?;

    let claimants: Vec<i32> =
        sqlx::query_scalar("SELECT user_id FROM declaration_claimants WHERE declaration_id = $1")
            .bind(declaration_id)
            .fetch_all(&mut *conn)
            .await?;

    let restitutions = sqlx::query_as::<
        _,
        (i32, Option<i32>, Option<i32>, Option<i32>, RestitutionStatus),
    >(
        r#"
        SELECT id, officer_id, claimant_id, finder_id, status
        FROM restitutions
        WHERE item_id = $1
        ORDER BY id
        "#,
    )
    .bind(item_id)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|(id, officer_id, claimant_id, finder_id, status)| RestitutionFacts {
        id,
        officer_id,
        claimant_id,
        finder_id,
        status,
    })
    .collect();

    Ok(Case {
        item_id,
        declaration_id,
        declarant_id,
        kind,
        state,
        finders: finders.into_iter().collect::<BTreeSet<_>>(),
        claimants: claimants.into_iter().collect::<BTreeSet<_>>(),
        restitutions,
    })
}

/// Write an accepted effect. Returns the restitution it created or touched.
async fn persist(conn: &mut PgConnection, case: &Case, effect: &Effect) -> AppResult<Option<i32>> {
    if effect.changes_state() {
        sqlx::query("UPDATE items SET state = $1, modif_date = NOW() WHERE id = $2")
            .bind(effect.to)
            .bind(case.item_id)
            .execute(&mut *conn)
            .await?;
    }

    if let Some(finder) = effect.add_finder {
        sqlx::query("INSERT INTO declaration_finders (declaration_id, user_id) VALUES ($1, $2)")
            .bind(case.declaration_id)
            .bind(finder)
            .execute(&mut *conn)
            .await?;
    }

    if let Some(claimant) = effect.add_claimant {
        sqlx::query("INSERT INTO declaration_claimants (declaration_id, user_id) VALUES ($1, $2)")
            .bind(case.declaration_id)
            .bind(claimant)
            .execute(&mut *conn)
            .await?;
    }

    let touched = match &effect.restitution {
        None => None,
        Some(RestitutionChange::Create(new)) => {
            let id: i32 = sqlx::query_scalar(
                r#"
                INSERT INTO restitutions (
                    item_id, claimant_id, finder_id, officer_id, station_id,
                    scheduled_date, scheduled_time, status
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING id
                "#,
            )
            .bind(case.item_id)
            .bind(new.claimant_id)
            .bind(new.finder_id)
            .bind(new.officer_id)
            .bind(new.appointment.station_id)
            .bind(new.appointment.date)
            .bind(new.appointment.time)
            .bind(RestitutionStatus::Planned)
            .fetch_one(&mut *conn)
            .await?;
            Some(id)
        }
        Some(RestitutionChange::MarkDone {
            restitution_id,
            performed_by,
        }) => {
            sqlx::query(
                r#"
                UPDATE restitutions
                SET status = $1, performed_by = $2, performed_at = NOW()
                WHERE id = $3
                "#,
            )
            .bind(RestitutionStatus::Done)
            .bind(performed_by)
            .bind(restitution_id)
            .execute(&mut *conn)
            .await?;
            Some(*restitution_id)
        }
        Some(RestitutionChange::MarkDisputed { restitution_id }) => {
            sqlx::query("UPDATE restitutions SET status = $1 WHERE id = $2")
                .bind(RestitutionStatus::Disputed)
                .bind(restitution_id)
                .execute(&mut *conn)
                .await?;
            Some(*restitution_id)
        }
        Some(RestitutionChange::Remove { restitution_id }) => {
            sqlx::query("DELETE FROM restitutions WHERE id = $1")
                .bind(restitution_id)
                .execute(&mut *conn)
                .await?;
            Some(*restitution_id)
        }
    };

    Ok(touched)
}
