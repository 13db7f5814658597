//! User and credential repository.
//!
//! # Responsibility
//! - Persist user rows and their owned credential rows.
//! - Provide lookups by id, email and first-name substring.
//!
//! # Invariants
//! - Only password hashes are stored; this module never sees plaintext.
//! - Deleting a user removes its credential row (`ON DELETE CASCADE`).

use super::{RepoError, RepoResult};
use crate::model::user::{NewUser, User, UserRole};
use crate::model::{EntityId, EntityKind};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_COLUMNS: &str = "user_id, first_name, last_name, email, role, created_at";

/// Repository interface for user accounts.
pub trait UserRepository {
    /// Inserts the user row only; credentials are stored separately.
    fn create_user(&self, user: &NewUser) -> RepoResult<User>;
    fn store_credential(&self, user_id: EntityId, password_hash: &str) -> RepoResult<()>;
    fn credential_hash(&self, user_id: EntityId) -> RepoResult<Option<String>>;
    fn get_user(&self, id: EntityId) -> RepoResult<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    fn list_users(&self) -> RepoResult<Vec<User>>;
    /// Substring match on `first_name`, case-insensitive for any script.
    fn search_users_by_first_name(&self, term: &str) -> RepoResult<Vec<User>>;
    /// Deletes one user and returns the removed row.
    fn delete_user(&self, id: EntityId) -> RepoResult<User>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &NewUser) -> RepoResult<User> {
        user.validate()?;

        let created = self.conn.query_row(
            &format!(
                "INSERT INTO users (first_name, last_name, email, role)
                 VALUES (?1, ?2, ?3, ?4)
                 RETURNING {USER_COLUMNS};"
            ),
            params![
                user.first_name.trim(),
                user.last_name.trim(),
                user.email.trim(),
                user.role.as_str(),
            ],
            |row| Ok(parse_user_row(row)),
        )??;

        Ok(created)
    }

    fn store_credential(&self, user_id: EntityId, password_hash: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO user_credentials (user_id, password_hash) VALUES (?1, ?2);",
            params![user_id, password_hash],
        )?;
        Ok(())
    }

    fn credential_hash(&self, user_id: EntityId) -> RepoResult<Option<String>> {
        let hash = self
            .conn
            .query_row(
                "SELECT password_hash FROM user_credentials WHERE user_id = ?1;",
                [user_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(hash)
    }

    fn get_user(&self, id: EntityId) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1;"),
                [id],
                |row| Ok(parse_user_row(row)),
            )
            .optional()?;
        user.transpose()
    }

    fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1;"),
                [email.trim()],
                |row| Ok(parse_user_row(row)),
            )
            .optional()?;
        user.transpose()
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY user_id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn search_users_by_first_name(&self, term: &str) -> RepoResult<Vec<User>> {
        // SQLite's LIKE and lower() fold ASCII only.
        let needle = term.to_lowercase();
        let mut users = self.list_users()?;
        users.retain(|user| user.first_name.to_lowercase().contains(&needle));
        Ok(users)
    }


    fn delete_user(&self, id: EntityId) -> RepoResult<User> {
        let deleted = self
            .conn
            .query_row(
                &format!("DELETE FROM users WHERE user_id = ?1 RETURNING {USER_COLUMNS};"),
                [id],
                |row| Ok(parse_user_row(row)),
            )
            .optional()?;

        match deleted {
            Some(user) => user,
            None => Err(RepoError::NotFound {
                kind: EntityKind::User,
                id,
            }),
        }
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let role_text: String = row.get("role")?;
    let role = UserRole::parse(&role_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid role `{role_text}` in users.role"))
    })?;

    Ok(User {
        id: row.get("user_id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        email: row.get("email")?,
        role,
        created_at: row.get("created_at")?,
    })
}
