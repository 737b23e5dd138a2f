use bcrypt::{hash, verify, BcryptError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use utoipa::ToSchema;

use super::project::Project;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// Public view of a user, never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub full_name: &'a str,
    pub password: &'a str,
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, BcryptError> {
    hash(password, cost)
}

impl User {
    pub fn check_password(&self, password: &str) -> bool {
        verify(password, &self.password_hash).unwrap_or(false)
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            created_at: self.created_at,
            is_active: self.is_active,
        }
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_username(
        pool: &SqlitePool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(
        pool: &SqlitePool,
        new_user: NewUser<'_>,
        bcrypt_cost: u32,
    ) -> Result<User, CreateUserError> {
        let password_hash = hash_password(new_user.password, bcrypt_cost)?;
        let result = sqlx::query(
            "INSERT INTO users (username, email, full_name, password_hash, is_active, created_at)
             VALUES (?, ?, ?, ?, 1, ?)",
        )
        .bind(new_user.username)
        .bind(new_user.email)
        .bind(new_user.full_name)
        .bind(&password_hash)
        .bind(Utc::now())
        .execute(pool)
        .await
        .map_err(duplicate_or_database)?;

        let user = User::find_by_id(pool, result.last_insert_rowid())
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        Ok(user)
    }

    pub async fn update_profile(
        pool: &SqlitePool,
        id: i64,
        full_name: &str,
        email: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET full_name = ?, email = ? WHERE id = ?")
            .bind(full_name)
            .bind(email)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    // Active projects the user owns or belongs to, newest first.
    pub async fn projects(pool: &SqlitePool, user_id: i64) -> Result<Vec<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            "SELECT p.* FROM projects p
             WHERE p.is_active = 1
               AND (p.owner_id = ?
                    OR EXISTS (SELECT 1 FROM project_members pm
                               WHERE pm.project_id = p.id AND pm.user_id = ?))
             ORDER BY p.created_at DESC, p.id DESC",
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn can_access_project(
        pool: &SqlitePool,
        user_id: i64,
        project_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM projects p
             WHERE p.id = ? AND p.is_active = 1
               AND (p.owner_id = ?
                    OR EXISTS (SELECT 1 FROM project_members pm
                               WHERE pm.project_id = p.id AND pm.user_id = ?))",
        )
        .bind(project_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CreateUserError {
    #[error("{0}")]
    Duplicate(&'static str),
    #[error(transparent)]
    Hash(#[from] BcryptError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

// A registration racing another one past the lookups trips the UNIQUE
// constraints instead.
fn duplicate_or_database(err: sqlx::Error) -> CreateUserError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            if db.message().contains("email") {
                CreateUserError::Duplicate("Email already exists")
            } else {
                CreateUserError::Duplicate("Username already exists")
            }
        }
        _ => CreateUserError::Database(err),
    }
}

impl From<CreateUserError> for crate::error::ApiError {
    fn from(err: CreateUserError) -> Self {
        match err {
            CreateUserError::Duplicate(message) => crate::error::ApiError::Conflict(message.into()),
            CreateUserError::Hash(e) => e.into(),
            CreateUserError::Database(e) => e.into(),
        }
    }
}
