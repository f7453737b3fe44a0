//! Authentication and user management service

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use validator::Validate;

use crate::{
    config::{AuthConfig, BootstrapAdmin},
    error::{AppError, AppResult},
    models::{
        enums::Role,
        user::{
            CreateAdmin, CreateOfficer, LoginRequest, LoginResponse, NewUser, OfficerCreated,
            RegisterRequest, UpdateProfile, UpdateUser, User, UserClaims, UserQuery,
        },
    },
    repository::Repository,
    services::email::{deliver, Notifier, OutgoingMessage},
};

const GENERATED_PASSWORD_LENGTH: usize = 12;

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
    notifier: Arc<dyn Notifier>,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            repository,
            config,
            notifier,
        }
    }

    /// Citizen self-registration
    pub async fn register(&self, request: RegisterRequest) -> AppResult<User> {
        request.validate()?;
        self.ensure_identity_free(&request.username, &request.email)
            .await?;

        let user = self
            .repository
            .users
            .create(&NewUser {
                username: request.username,
                email: request.email,
                password_hash: hash_password(&request.password)?,
                first_name: request.first_name,
                last_name: request.last_name,
                phone: request.phone,
                role: Role::Citizen,
                station_id: None,
            })
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "Citizen registered");
        Ok(user)
    }

    /// Authenticate by username or email and return a JWT
    pub async fn login(&self, request: LoginRequest) -> AppResult<LoginResponse> {
        request.validate()?;

        let user = self
            .repository
            .users
            .get_by_login(&request.login)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid login or password".to_string()))?;

        if !verify_password(&user.password, &request.password) {
            return Err(AppError::Authentication("Invalid login or password".to_string()));
        }

        if user.banned {
            tracing::info!(user_id = user.id, "Login refused to banned account");
            return Err(AppError::Authentication("Account is banned".to_string()));
        }

        let expires_in = self.config.jwt_expiration_hours as i64 * 3600;
        let now = Utc::now().timestamp();
        let claims = UserClaims {
            sub: user.username.clone(),
            user_id: user.id,
            role: user.role,
            exp: now + expires_in,
            iat: now,
        };

        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        Ok(LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in,
            user,
        })
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Update own profile, checking the current password before changing it
    pub async fn update_profile(&self, user_id: i32, profile: UpdateProfile) -> AppResult<User> {
        profile.validate()?;
        let user = self.repository.users.get_by_id(user_id).await?;

        if let Some(ref email) = profile.email {
            if self
                .repository
                .users
                .identity_taken(None, Some(email), Some(user_id))
                .await?
            {
                return Err(AppError::Conflict("Email already in use".to_string()));
            }
        }

        let password_hash = match profile.new_password.as_deref() {
            Some(new_password) => {
                let current = profile.current_password.as_deref().ok_or_else(|| {
                    AppError::Validation("Current password is required".to_string())
                })?;
                if !verify_password(&user.password, current) {
                    return Err(AppError::Authentication(
                        "Current password is incorrect".to_string(),
                    ));
                }
                Some(hash_password(new_password)?)
            }
            None => None,
        };

        self.repository
            .users
            .update_profile(user_id, &profile, password_hash)
            .await
    }

    pub async fn search(&self, query: &UserQuery) -> AppResult<Vec<User>> {
        self.repository.users.search(query).await
    }

    /// Create an officer with a generated password sent by email
    pub async fn create_officer(&self, request: CreateOfficer) -> AppResult<OfficerCreated> {
        request.validate()?;
        let station = self.repository.stations.get_by_id(request.station_id).await?;
        self.ensure_identity_free(&request.username, &request.email)
            .await?;

        let password = generate_password();
        let user = self
            .repository
            .users
            .create(&NewUser {
                username: request.username,
                email: request.email,
                password_hash: hash_password(&password)?,
                first_name: request.first_name,
                last_name: request.last_name,
                phone: request.phone,
                role: Role::Officer,
                station_id: Some(station.id),
            })
            .await?;

        tracing::info!(user_id = user.id, station_id = station.id, "Officer account created");

        let body = format!(
            "Hello {},\n\n\
             A police officer account has been created for you at {}.\n\n\
             Username: {}\n\
             Password: {}\n\n\
             Please change this password after your first login.\n",
            user.display_name(),
            station.name,
            user.username,
            password
        );
        let password_sent = deliver(
            self.notifier.as_ref(),
            OutgoingMessage::new(vec![user.email.clone()], "Your officer account", body),
        )
        .await;

        Ok(OfficerCreated {
            user,
            password_sent,
        })
    }

    pub async fn create_admin(&self, request: CreateAdmin) -> AppResult<User> {
        request.validate()?;
        self.ensure_identity_free(&request.username, &request.email)
            .await?;

        let user = self
            .repository
            .users
            .create(&NewUser {
                username: request.username,
                email: request.email,
                password_hash: hash_password(&request.password)?,
                first_name: request.first_name,
                last_name: request.last_name,
                phone: None,
                role: Role::Admin,
                station_id: None,
            })
            .await?;

        tracing::info!(user_id = user.id, "Administrator account created");
        Ok(user)
    }

    pub async fn update_user(&self, id: i32, update: UpdateUser) -> AppResult<User> {
        update.validate()?;
        let user = self.repository.users.get_by_id(id).await?;

        if let Some(station_id) = update.station_id {
            if user.role != Role::Officer {
                return Err(AppError::Validation(
                    "Only officers are attached to a station".to_string(),
                ));
            }
            self.repository.stations.get_by_id(station_id).await?;
        }

        if let Some(ref email) = update.email {
            if self
                .repository
                .users
                .identity_taken(None, Some(email), Some(id))
                .await?
            {
                return Err(AppError::Conflict("Email already in use".to_string()));
            }
        }

        self.repository.users.update(id, &update).await
    }

    pub async fn delete_user(&self, acting_admin_id: i32, id: i32) -> AppResult<()> {
        if acting_admin_id == id {
            return Err(AppError::BusinessRule(
                "Administrators cannot delete their own account".to_string(),
            ));
        }
        let reverted_items = self.repository.users.delete(id).await?;
        tracing::info!(
            user_id = id,
            deleted_by = acting_admin_id,
            reverted_items,
            "User deleted"
        );
        Ok(())
    }

    /// Ban or unban a citizen
    pub async fn set_banned(&self, id: i32, banned: bool) -> AppResult<User> {
        let user = self.repository.users.get_by_id(id).await?;
        if user.role != Role::Citizen {
            return Err(AppError::BusinessRule("Only citizens can be banned".to_string()));
        }

        let user = self.repository.users.set_banned(id, banned).await?;
        tracing::info!(user_id = id, banned, "Citizen ban status changed");
        Ok(user)
    }

    /// Create the configured administrator when none exists yet
    pub async fn ensure_bootstrap_admin(&self, admin: Option<&BootstrapAdmin>) -> AppResult<()> {
        let Some(admin) = admin else {
            return Ok(());
        };
        if self.repository.users.admin_exists().await? {
            return Ok(());
        }

        let user = self
            .create_admin(CreateAdmin {
                username: admin.username.clone(),
                email: admin.email.clone(),
                password: admin.password.clone(),
                first_name: None,
                last_name: None,
            })
            .await?;

        tracing::warn!(
            user_id = user.id,
            username = %user.username,
            "Bootstrap administrator created, change its password"
        );
        Ok(())
    }

    async fn ensure_identity_free(&self, username: &str, email: &str) -> AppResult<()> {
        if self
            .repository
            .users
            .identity_taken(Some(username.trim()), Some(email.trim()), None)
            .await?
        {
            return Err(AppError::Conflict(
                "An account with this username or email already exists".to_string(),
            ));
        }
        Ok(())
    }
}

/// Hash a password with argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Check a password against an argon2 hash. Malformed hashes never match.
pub fn verify_password(hash: &str, password: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Random password for accounts created by an administrator
pub fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "correct horse"));
        assert!(!verify_password(&hash, "wrong horse"));
        assert!(!verify_password("not-a-hash", "correct horse"));
    }

    #[test]
    fn test_generated_password() {
        let password = generate_password();
        assert_eq!(password.len(), GENERATED_PASSWORD_LENGTH);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(password, generate_password());
    }
}
