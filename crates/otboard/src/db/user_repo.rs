//! User repository: identities and roles in the `users` table.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::DatabaseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub role: String,
    pub created_at: String,
}

impl UserRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            email: row.get("email")?,
            role: row.get("role")?,
            created_at: row.get("created_at")?,
        })
    }
}

pub fn insert(conn: &Connection, user: &UserRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, email, role, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![user.id, user.email, user.role, user.created_at],
    )?;
    Ok(())
}

pub fn find_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT * FROM users WHERE id = ?1",
            params![id],
            UserRow::from_row,
        )
        .optional()?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn sample_user(id: &str, email: &str) -> UserRow {
        UserRow {
            id: id.to_string(),
            email: email.to_string(),
            role: "operator".to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_insert_and_find() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            insert(conn, &sample_user("u1", "taller@example.com"))?;

            let by_id = find_by_id(conn, "u1")?.unwrap();
            assert_eq!(by_id.email, "taller@example.com");

            assert!(insert(conn, &sample_user("u2", "taller@example.com")).is_err());
            assert!(find_by_id(conn, "missing")?.is_none());
            Ok::<_, DatabaseError>(())
        })
        .unwrap();
    }
}
