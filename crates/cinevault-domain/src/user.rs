//! User domain types.

use serde::{Deserialize, Serialize};

/// Account permission level carried in access tokens.
///
/// Wire format: `u8` (0 = Member, 1 = Moderator, 2 = Admin).
/// New accounts are always created as [`UserRole::Member`]. Promotion happens
/// on the stored `role` column; the auth service only reads it back and signs
/// it into tokens for downstream services to enforce.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Member = 0,
    Moderator = 1,
    Admin = 2,
}

impl UserRole {
    /// Convert from `u8` wire value. Returns `None` for unknown values.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Member),
            1 => Some(Self::Moderator),
            2 => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
