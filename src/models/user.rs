//! User model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::Role;
use crate::{error::AppError, workflow::Actor};

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing, default)]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub banned: bool,
    /// Station an officer is attached to
    pub station_id: Option<i32>,
    pub crea_date: DateTime<Utc>,
    pub modif_date: DateTime<Utc>,
}

impl User {
    /// "First Last", falling back to the username
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(name), None) | (None, Some(name)) => name.to_string(),
            (None, None) => self.username.clone(),
        }
    }
}

/// User list query (admin)
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct UserQuery {
    pub role: Option<Role>,
    /// Search in username, email and names
    pub q: Option<String>,
}

/// Citizen self-registration
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

/// Login with username or email
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Login is required"))]
    pub login: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    pub user: User,
}

/// Update own profile request (for authenticated users)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfile {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    /// Current password (required to change password)
    pub current_password: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: Option<String>,
}

/// Officer account creation. The password is generated and emailed.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOfficer {
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub station_id: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAdmin {
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Admin update of any account
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    /// Only meaningful for officers
    pub station_id: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OfficerCreated {
    pub user: User,
    /// Whether the generated password could be emailed to the officer
    pub password_sent: bool,
}

/// New account fields handed to the repository
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub station_id: Option<i32>,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.user_id,
            role: self.role,
        }
    }

    fn require_role(&self, role: Role, message: &str) -> Result<(), AppError> {
        if self.role == role {
            Ok(())
        } else {
            Err(AppError::Authorization(message.to_string()))
        }
    }

    /// Require admin privileges
    pub fn require_admin(&self) -> Result<(), AppError> {
        self.require_role(Role::Admin, "Administrator privileges required")
    }

    pub fn require_officer(&self) -> Result<(), AppError> {
        self.require_role(Role::Officer, "Police officer privileges required")
    }

    pub fn require_citizen(&self) -> Result<(), AppError> {
        self.require_role(Role::Citizen, "This action is reserved to citizens")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: Role) -> UserClaims {
        let now = Utc::now().timestamp();
        UserClaims {
            sub: "alice".to_string(),
            user_id: 1,
            role,
            exp: now + 3600,
            iat: now,
        }
    }

    #[test]
    fn test_token_round_trip() {
        let token = claims(Role::Officer).create_token("secret").unwrap();
        let decoded = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(decoded.role, Role::Officer);
        assert_eq!(decoded.user_id, 1);
        assert!(UserClaims::from_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_role_checks() {
        let citizen = claims(Role::Citizen);
        assert!(citizen.require_citizen().is_ok());
        assert!(matches!(citizen.require_officer(), Err(AppError::Authorization(_))));
        assert!(citizen.require_admin().is_err());
    }

    #[test]
    fn test_password_never_serialized() {
        let now = Utc::now();
        let user = User {
            id: 1,
            username: "alice".to_string(),
            email: "alice@example.org".to_string(),
            password: "$argon2id$...".to_string(),
            first_name: Some("Alice".to_string()),
            last_name: None,
            phone: None,
            role: Role::Citizen,
            banned: false,
            station_id: None,
            crea_date: now,
            modif_date: now,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(user.display_name(), "Alice");
    }
}
