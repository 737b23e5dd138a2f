use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use utoipa::ToSchema;

use super::project::Project;
use super::task::Task;

const COMMENT_COLUMNS: &str = "SELECT c.id, c.task_id, c.user_id, c.comment_text, c.created_at, c.updated_at,
        COALESCE(u.full_name, 'Unknown') AS author_name
     FROM task_comments c
     LEFT JOIN users u ON u.id = c.user_id";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TaskComment {
    pub id: i64,
    pub task_id: i64,
    pub user_id: i64,
    pub comment_text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_name: String,
}

impl TaskComment {
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<TaskComment>, sqlx::Error> {
        sqlx::query_as::<_, TaskComment>(&format!("{COMMENT_COLUMNS} WHERE c.id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    // Oldest first, the order a conversation is read in.
    pub async fn for_task(pool: &SqlitePool, task_id: i64) -> Result<Vec<TaskComment>, sqlx::Error> {
        sqlx::query_as::<_, TaskComment>(&format!(
            "{COMMENT_COLUMNS} WHERE c.task_id = ? ORDER BY c.created_at ASC, c.id ASC"
        ))
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        task_id: i64,
        user_id: i64,
        comment_text: &str,
    ) -> Result<TaskComment, sqlx::Error> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO task_comments (task_id, user_id, comment_text, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(task_id)
        .bind(user_id)
        .bind(comment_text)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        TaskComment::find_by_id(pool, result.last_insert_rowid())
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn update_text(&mut self, pool: &SqlitePool, comment_text: &str) -> Result<(), sqlx::Error> {
        let now = Utc::now();
        sqlx::query("UPDATE task_comments SET comment_text = ?, updated_at = ? WHERE id = ?")
            .bind(comment_text)
            .bind(now)
            .bind(self.id)
            .execute(pool)
            .await?;
        self.comment_text = comment_text.to_string();
        self.updated_at = now;
        Ok(())
    }

    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM task_comments WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub fn can_user_edit(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }

    // Authors may delete their own comments; project owners and admins may
    // delete any comment on the project's tasks.
    pub async fn can_user_delete(&self, pool: &SqlitePool, user_id: i64) -> Result<bool, sqlx::Error> {
        if self.can_user_edit(user_id) {
            return Ok(true);
        }
        let Some(task) = Task::find_by_id(pool, self.task_id).await? else {
            return Ok(false);
        };
        let Some(project) = Project::find_active(pool, task.project_id).await? else {
            return Ok(false);
        };
        Ok(project
            .role_of(pool, user_id)
            .await?
            .is_some_and(|role| role.can_manage_members()))
    }
}
