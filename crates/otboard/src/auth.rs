//! Actors and the capabilities their role grants.
//!
//! Administrative operations are gated by the role stored with each user,
//! never by comparing identities.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::user_repo::{self, UserRow};
use crate::db::{format_timestamp, DatabaseError};
use crate::error::{AuthError, OtboardError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Operator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Operator => "operator",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "operator" => Ok(Role::Operator),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Change stage dates of archived work orders.
    EditArchivedDates,
    /// Create and restore backups.
    ManageBackups,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::EditArchivedDates => write!(f, "edit-archived-dates"),
            Capability::ManageBackups => write!(f, "manage-backups"),
        }
    }
}

/// The authenticated user on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl Actor {
    /// Loads the actor for a user id from the user store.
    pub fn resolve(conn: &Connection, user_id: &str) -> Result<Self, OtboardError> {
        let row = user_repo::find_by_id(conn, user_id)?
            .ok_or_else(|| AuthError::UnknownUser(user_id.to_string()))?;
        Self::from_row(&row)
    }

    fn from_row(row: &UserRow) -> Result<Self, OtboardError> {
        let role = row.role.parse::<Role>().map_err(|reason| DatabaseError::Corrupt {
            table: "users",
            column: "role",
            reason,
        })?;
        Ok(Self {
            id: row.id.clone(),
            email: row.email.clone(),
            role,
        })
    }

    pub fn can(&self, capability: Capability) -> bool {
        match capability {
            Capability::EditArchivedDates | Capability::ManageBackups => self.role == Role::Admin,
        }
    }

    pub fn require(&self, capability: Capability) -> Result<(), AuthError> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(AuthError::Forbidden {
                email: self.email.clone(),
                capability,
            })
        }
    }
}

/// Registers a user and returns the corresponding actor.
pub fn register_user(conn: &Connection, email: &str, role: Role) -> Result<Actor, OtboardError> {
    let row = UserRow {
        id: uuid::Uuid::new_v4().to_string(),
        email: email.trim().to_string(),
        role: role.as_str().to_string(),
        created_at: format_timestamp(Utc::now()),
    };
    user_repo::insert(conn, &row)?;
    log::info!("Registered {} user {}", role.as_str(), row.email);
    Actor::from_row(&row)
}
