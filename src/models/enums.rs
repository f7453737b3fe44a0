//! Shared domain enums, stored as lowercase text columns

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Implements `as_str`, `Display`, `FromStr` and the sqlx text conversions
/// for a fieldless enum.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($name), s)),
                }
            }
        }

        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
                let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl sqlx::Encode<'_, sqlx::Postgres> for $name {
            fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// ItemState
// ---------------------------------------------------------------------------

/// Lifecycle state of a tracked item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    Lost,
    Found,
    Claimed,
    PendingReturn,
    Returned,
}

text_enum!(ItemState {
    Lost => "lost",
    Found => "found",
    Claimed => "claimed",
    PendingReturn => "pending_return",
    Returned => "returned",
});

impl ItemState {
    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            ItemState::Lost => "Lost",
            ItemState::Found => "Found",
            ItemState::Claimed => "Claimed",
            ItemState::PendingReturn => "Pending return",
            ItemState::Returned => "Returned",
        }
    }
}

// ---------------------------------------------------------------------------
// DeclarationKind
// ---------------------------------------------------------------------------

/// Whether a declaration reports a lost or a found item.
/// This is also the state the item starts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Lost,
    Found,
}

text_enum!(DeclarationKind {
    Lost => "lost",
    Found => "found",
});

impl From<DeclarationKind> for ItemState {
    fn from(kind: DeclarationKind) -> Self {
        match kind {
            DeclarationKind::Lost => ItemState::Lost,
            DeclarationKind::Found => ItemState::Found,
        }
    }
}

// ---------------------------------------------------------------------------
// RestitutionStatus
// ---------------------------------------------------------------------------

/// Status of a scheduled handover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RestitutionStatus {
    Planned,
    Done,
    /// A completed handover the claimant has contested
    Disputed,
}

text_enum!(RestitutionStatus {
    Planned => "planned",
    Done => "done",
    Disputed => "disputed",
});

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Officer,
    Citizen,
}

text_enum!(Role {
    Admin => "admin",
    Officer => "officer",
    Citizen => "citizen",
});
