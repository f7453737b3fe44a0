//! Repository layer for database operations

pub mod cases;
pub mod declarations;
pub mod items;
pub mod messages;
pub mod restitutions;
pub mod stations;
pub mod stats;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub cases: cases::CasesRepository,
    pub declarations: declarations::DeclarationsRepository,
    pub items: items::ItemsRepository,
    pub messages: messages::MessagesRepository,
    pub restitutions: restitutions::RestitutionsRepository,
    pub stations: stations::StationsRepository,
    pub stats: stats::StatsRepository,
    pub users: users::UsersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            cases: cases::CasesRepository::new(pool.clone()),
            declarations: declarations::DeclarationsRepository::new(pool.clone()),
            items: items::ItemsRepository::new(pool.clone()),
            messages: messages::MessagesRepository::new(pool.clone()),
            restitutions: restitutions::RestitutionsRepository::new(pool.clone()),
            stations: stations::StationsRepository::new(pool.clone()),
            stats: stats::StatsRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            pool,
        }
    }

    /// Check database connectivity
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
