//! Users repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{map_unique_violation, AppError, AppResult},
    models::{
        enums::Role,
        user::{NewUser, UpdateProfile, UpdateUser, User, UserQuery},
    },
};

const DUPLICATE_ACCOUNT: &str = "An account with this username or email already exists";

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by username or email (case-insensitive)
    pub async fn get_by_login(&self, login: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE LOWER(username) = LOWER($1) OR LOWER(email) = LOWER($1)",
        )
        .bind(login.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Check if a username or email is already taken by another account
    pub async fn identity_taken(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        exclude_id: Option<i32>,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users
                WHERE (LOWER(username) = LOWER($1) OR LOWER(email) = LOWER($2))
                  AND ($3::int IS NULL OR id != $3)
            )
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Whether at least one administrator exists
    pub async fn admin_exists(&self) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE role = $1)")
                .bind(Role::Admin)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Search users by role and free text
    pub async fn search(&self, query: &UserQuery) -> AppResult<Vec<User>> {
        let pattern = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", q.to_lowercase()));

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE ($1::text IS NULL OR role = $1)
              AND ($2::text IS NULL
                   OR LOWER(username) LIKE $2
                   OR LOWER(email) LIKE $2
                   OR LOWER(COALESCE(first_name, '')) LIKE $2
                   OR LOWER(COALESCE(last_name, '')) LIKE $2)
            ORDER BY last_name NULLS LAST, first_name NULLS LAST, username
            "#,
        )
        .bind(query.role)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Email addresses of every account with a role
    pub async fn emails_by_role(&self, role: Role) -> AppResult<Vec<String>> {
        let emails = sqlx::query_scalar("SELECT email FROM users WHERE role = $1 ORDER BY id")
            .bind(role)
            .fetch_all(&self.pool)
            .await?;
        Ok(emails)
    }

    /// Create a new user
    pub async fn create(&self, user: &NewUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                username, email, password, first_name, last_name, phone, role, station_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(user.username.trim())
        .bind(user.email.trim())
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(user.role)
        .bind(user.station_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, DUPLICATE_ACCOUNT))
    }

    /// Update an account (admin)
    pub async fn update(&self, id: i32, user: &UpdateUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                email = COALESCE($2, email),
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                phone = COALESCE($5, phone),
                station_id = COALESCE($6, station_id),
                modif_date = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(user.station_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, DUPLICATE_ACCOUNT))?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Update own profile. `password_hash` replaces the password when set.
    pub async fn update_profile(
        &self,
        id: i32,
        profile: &UpdateProfile,
        password_hash: Option<String>,
    ) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                email = COALESCE($2, email),
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                phone = COALESCE($5, phone),
                password = COALESCE($6, password),
                modif_date = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&profile.email)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.phone)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, DUPLICATE_ACCOUNT))?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    pub async fn set_banned(&self, id: i32, banned: bool) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET banned = $2, modif_date = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(banned)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Delete an account with the items it declared.
    /// Restitutions it took part in keep a NULL reference.
    /// Delete a user with the items they declared.
    /// Returns the number of claimed items reverted to their declared state
    /// because the user was their last finder or claimant.
    pub async fn delete(&self, id: i32) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;

        let reverted = sqlx::query(
            r#"
            UPDATE items i
            SET state = d.kind, modif_date = NOW()
            FROM declarations d
            WHERE d.item_id = i.id
              AND d.citizen_id <> $1
              AND i.state = 'claimed'
              AND (
                (d.kind = 'lost' AND NOT EXISTS (
                    SELECT 1 FROM declaration_finders f
                    WHERE f.declaration_id = d.id AND f.user_id <> $1))
                OR
                (d.kind = 'found' AND NOT EXISTS (
                    SELECT 1 FROM declaration_claimants c
                    WHERE c.declaration_id = d.id AND c.user_id <> $1))
              )
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query(
            "DELETE FROM items WHERE id IN (SELECT item_id FROM declarations WHERE citizen_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }

        tx.commit().await?;
        Ok(reverted)
    }
}
