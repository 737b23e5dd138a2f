use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use utoipa::ToSchema;

use super::comment::TaskComment;
use super::project::Project;
use super::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    // Open tasks still count towards overdue figures.
    pub fn is_open(&self) -> bool {
        !matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Critical => "critical",
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const TASK_COLUMNS: &str = "SELECT t.id, t.title, t.description, t.status, t.priority, t.project_id,
        t.assigned_to, t.created_by, t.due_date, t.completed_at, t.created_at, t.updated_at,
        (SELECT COUNT(*) FROM task_comments c WHERE c.task_id = t.id) AS comments_count
     FROM tasks t";

#[derive(Debug, Clone, FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub project_id: i64,
    pub assigned_to: Option<i64>,
    pub created_by: i64,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub comments_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TaskResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub project_id: i64,
    pub assigned_to: Option<i64>,
    pub created_by: i64,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_overdue: bool,
    pub comments_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<TaskComment>>,
}

pub struct NewTask<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub project_id: i64,
    pub created_by: i64,
    pub assigned_to: Option<i64>,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub project_id: Option<i64>,
    pub assigned_to: Option<i64>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Task {
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        self.status.is_open() && self.due_date.is_some_and(|due| due < now)
    }

    pub fn is_overdue(&self) -> bool {
        self.is_overdue_at(Utc::now())
    }

    // Completion time follows the status: set on completion, cleared otherwise.
    pub fn set_status(&mut self, status: TaskStatus, now: DateTime<Utc>) {
        if status == TaskStatus::Completed {
            if self.status != TaskStatus::Completed || self.completed_at.is_none() {
                self.completed_at = Some(now);
            }
        } else {
            self.completed_at = None;
        }
        self.status = status;
    }

    pub fn to_response(&self) -> TaskResponse {
        TaskResponse {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status,
            priority: self.priority,
            project_id: self.project_id,
            assigned_to: self.assigned_to,
            created_by: self.created_by,
            due_date: self.due_date,
            completed_at: self.completed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            is_overdue: self.is_overdue(),
            comments_count: self.comments_count,
            comments: None,
        }
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!("{TASK_COLUMNS} WHERE t.id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(pool: &SqlitePool, new_task: NewTask<'_>) -> Result<Task, sqlx::Error> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO tasks (title, description, status, priority, project_id, assigned_to,
                                created_by, due_date, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(new_task.title)
        .bind(new_task.description)
        .bind(TaskStatus::Pending)
        .bind(new_task.priority)
        .bind(new_task.project_id)
        .bind(new_task.assigned_to)
        .bind(new_task.created_by)
        .bind(new_task.due_date)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        Project::touch(pool, new_task.project_id).await?;
        Task::find_by_id(pool, result.last_insert_rowid())
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    // Persists every mutable field and stamps `updated_at`.
    pub async fn save(&mut self, pool: &SqlitePool) -> Result<(), sqlx::Error> {
        self.updated_at = Utc::now();
        sqlx::query(
            "UPDATE tasks SET title = ?, description = ?, status = ?, priority = ?, assigned_to = ?,
                              due_date = ?, completed_at = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&self.title)
        .bind(&self.description)
        .bind(self.status)
        .bind(self.priority)
        .bind(self.assigned_to)
        .bind(self.due_date)
        .bind(self.completed_at)
        .bind(self.updated_at)
        .bind(self.id)
        .execute(pool)
        .await?;
        Project::touch(pool, self.project_id).await
    }

    pub async fn delete(pool: &SqlitePool, id: i64, project_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Project::touch(pool, project_id).await
    }

    // Tasks matching the filter, restricted to the given projects, newest first.
    pub async fn list(
        pool: &SqlitePool,
        filter: &TaskFilter,
        project_ids: &[i64],
    ) -> Result<Vec<Task>, sqlx::Error> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(TASK_COLUMNS);
        query.push(" WHERE t.project_id IN (");
        let mut ids = query.separated(", ");
        for id in project_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");

        if let Some(project_id) = filter.project_id {
            query.push(" AND t.project_id = ").push_bind(project_id);
        }
        if let Some(assigned_to) = filter.assigned_to {
            query.push(" AND t.assigned_to = ").push_bind(assigned_to);
        }
        if let Some(status) = filter.status {
            query.push(" AND t.status = ").push_bind(status);
        }
        if let Some(priority) = filter.priority {
            query.push(" AND t.priority = ").push_bind(priority);
        }
        query.push(" ORDER BY t.created_at DESC, t.id DESC");
        // SQLite only accepts OFFSET after a LIMIT; -1 means unbounded.
        if filter.limit.is_some() || filter.offset.is_some() {
            query.push(" LIMIT ").push_bind(filter.limit.unwrap_or(-1));
            query.push(" OFFSET ").push_bind(filter.offset.unwrap_or(0));
        }

        query.build_query_as::<Task>().fetch_all(pool).await
    }

    // Tasks the user is assigned to or created, most recently touched first.
    pub async fn recent_for_user(
        pool: &SqlitePool,
        user_id: i64,
        project_ids: &[i64],
        limit: i64,
    ) -> Result<Vec<Task>, sqlx::Error> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(TASK_COLUMNS);
        query.push(" WHERE t.project_id IN (");
        let mut ids = query.separated(", ");
        for id in project_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");
        query.push(" AND (t.assigned_to = ").push_bind(user_id);
        query.push(" OR t.created_by = ").push_bind(user_id);
        query.push(") ORDER BY t.updated_at DESC, t.id DESC LIMIT ").push_bind(limit);

        query.build_query_as::<Task>().fetch_all(pool).await
    }

    pub async fn can_user_view(&self, pool: &SqlitePool, user_id: i64) -> Result<bool, sqlx::Error> {
        User::can_access_project(pool, user_id, self.project_id).await
    }

    // Project owners and task-managing members may edit, as may the task's
    // creator and assignee while they keep access to the project.
    pub async fn can_user_edit(&self, pool: &SqlitePool, user_id: i64) -> Result<bool, sqlx::Error> {
        let Some(project) = Project::find_active(pool, self.project_id).await? else {
            return Ok(false);
        };
        let Some(role) = project.role_of(pool, user_id).await? else {
            return Ok(false);
        };
        Ok(role.can_manage_tasks()
            || self.created_by == user_id
            || self.assigned_to == Some(user_id))
    }
}
