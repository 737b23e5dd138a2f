use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    Member,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Member => "member",
            Role::Viewer => "viewer",
        }
    }

    pub fn can_manage_tasks(&self) -> bool {
        matches!(self, Role::Owner | Role::Admin | Role::Member)
    }

    pub fn can_manage_members(&self) -> bool {
        matches!(self, Role::Owner | Role::Admin)
    }

    pub fn can_edit_project(&self) -> bool {
        matches!(self, Role::Owner | Role::Admin)
    }

    pub fn can_delete_project(&self) -> bool {
        matches!(self, Role::Owner)
    }

    // Roles that can be granted through membership; ownership lives on the project.
    pub fn is_assignable(&self) -> bool {
        !matches!(self, Role::Owner)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Member
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            "member" => Ok(Role::Member),
            "viewer" => Ok(Role::Viewer),
            other => Err(format!("unknown role {other:?}")),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ProjectMember {
    pub project_id: i64,
    pub user_id: i64,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
}

// Member entry as listed for a project, joined with the user's details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MemberDetail {
    pub user_id: i64,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
    pub user_name: String,
    pub user_email: String,
}

impl ProjectMember {
    pub async fn find(
        pool: &SqlitePool,
        project_id: i64,
        user_id: i64,
    ) -> Result<Option<ProjectMember>, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(
            "SELECT * FROM project_members WHERE project_id = ? AND user_id = ?",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn for_project(
        pool: &SqlitePool,
        project_id: i64,
        role: Option<Role>,
    ) -> Result<Vec<MemberDetail>, sqlx::Error> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT pm.user_id, pm.role, pm.joined_at,
                    u.full_name AS user_name, u.email AS user_email
             FROM project_members pm
             JOIN users u ON u.id = pm.user_id
             WHERE pm.project_id = ",
        );
        query.push_bind(project_id);
        if let Some(role) = role {
            query.push(" AND pm.role = ").push_bind(role);
        }
        query.push(" ORDER BY pm.joined_at ASC, pm.user_id ASC");

        query.build_query_as::<MemberDetail>().fetch_all(pool).await
    }

    pub async fn detail(
        pool: &SqlitePool,
        project_id: i64,
        user_id: i64,
    ) -> Result<Option<MemberDetail>, sqlx::Error> {
        sqlx::query_as::<_, MemberDetail>(
            "SELECT pm.user_id, pm.role, pm.joined_at,
                    u.full_name AS user_name, u.email AS user_email
             FROM project_members pm
             JOIN users u ON u.id = pm.user_id
             WHERE pm.project_id = ? AND pm.user_id = ?",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn insert(
        pool: &SqlitePool,
        project_id: i64,
        user_id: i64,
        role: Role,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO project_members (project_id, user_id, role, joined_at) VALUES (?, ?, ?, ?)",
        )
        .bind(project_id)
        .bind(user_id)
        .bind(role)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn update_role(
        pool: &SqlitePool,
        project_id: i64,
        user_id: i64,
        role: Role,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE project_members SET role = ? WHERE project_id = ? AND user_id = ?",
        )
        .bind(role)
        .bind(project_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(pool: &SqlitePool, project_id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_members WHERE project_id = ? AND user_id = ?")
            .bind(project_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
