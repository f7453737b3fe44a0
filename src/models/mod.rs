//! Data models for the Lost & Found server

pub mod dashboard;
pub mod declaration;
pub mod enums;
pub mod item;
pub mod message;
pub mod restitution;
pub mod station;
pub mod user;

// Re-export commonly used types
pub use declaration::{Declaration, DeclarationDetails, DeclarationSummary};
pub use enums::{DeclarationKind, ItemState, RestitutionStatus, Role};
pub use item::ItemDetails;
pub use message::{ContactMessage, Notification};
pub use restitution::RestitutionDetails;
pub use station::PoliceStation;
pub use user::{User, UserClaims};
