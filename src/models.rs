/// Domain records
///
/// Row types for the four persisted record kinds (users, roles, cars,
/// rentals) and the closed role enumeration used for access decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Access tiers, compared by value rather than by ad hoc string equality.
///
/// The database keeps these as rows in `roles`; this enum is the in-process
/// representation carried inside token claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::Admin => "ADMIN",
        }
    }

    /// Parse a role name as stored in the `roles` table.
    pub fn parse(name: &str) -> Result<Self, ApiError> {
        match name {
            "CUSTOMER" => Ok(Role::Customer),
            "ADMIN" => Ok(Role::Admin),
            other => Err(ApiError::Internal(format!("unknown role: {}", other))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A role row joined from the database, embedded in user responses and
/// token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: i64,
    pub name: Role,
}

/// User profile as returned by `GET /v1/auth/whoami`. The password hash
/// never leaves the persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub role: RoleRecord,
}

/// Catalog entry with rental state derived at query time.
///
/// `is_currently_rented` is never stored; it is computed from the rentals
/// table so the stored data cannot drift from the active-rental invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarRecord {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub size: String,
    pub image: Option<String>,
    pub is_currently_rented: bool,
}

/// A booking row. `rent_ended_at` is nullable in the schema; a null or
/// future end marks the rental as active and its car as occupied.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalRecord {
    pub id: i64,
    pub user_id: i64,
    pub car_id: i64,
    pub rent_started_at: DateTime<Utc>,
    pub rent_ended_at: Option<DateTime<Utc>>,
}
