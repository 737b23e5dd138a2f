use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use utoipa::ToSchema;

use super::project_member::{MemberDetail, ProjectMember, Role};
use super::task::TaskStatus;
use super::user::User;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TaskStats {
    pub total_tasks: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub overdue: i64,
    pub completion_rate: f64,
}

impl TaskStats {
    pub fn from_tasks<I>(tasks: I, now: DateTime<Utc>) -> TaskStats
    where
        I: IntoIterator<Item = (TaskStatus, Option<DateTime<Utc>>)>,
    {
        let mut stats = TaskStats::default();
        for (status, due_date) in tasks {
            stats.total_tasks += 1;
            match status {
                TaskStatus::Pending => stats.pending += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::Cancelled => stats.cancelled += 1,
            }
            if status.is_open() && due_date.is_some_and(|due| due < now) {
                stats.overdue += 1;
            }
        }
        stats.completion_rate = percentage(stats.completed, stats.total_tasks);
        stats
    }
}

pub fn percentage(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64 * 10000.0).round() / 100.0
    }
}

#[derive(Debug, Clone, FromRow)]
struct StatusRow {
    status: TaskStatus,
    due_date: Option<DateTime<Utc>>,
}

impl Project {
    // Soft-deleted projects are treated as missing.
    pub async fn find_active(pool: &SqlitePool, id: i64) -> Result<Option<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ? AND is_active = 1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(
        pool: &SqlitePool,
        name: &str,
        description: Option<&str>,
        owner_id: i64,
    ) -> Result<Project, sqlx::Error> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO projects (name, description, owner_id, is_active, created_at, updated_at)
             VALUES (?, ?, ?, 1, ?, ?)",
        )
        .bind(name)
        .bind(description)
        .bind(owner_id)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        Project::find_active(pool, result.last_insert_rowid())
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE projects SET name = ?, description = ?, updated_at = ? WHERE id = ?")
            .bind(name)
            .bind(description)
            .bind(Utc::now())
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn soft_delete(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE projects SET is_active = 0, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    // Records activity on the project, e.g. when one of its tasks changes.
    pub async fn touch(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE projects SET updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    // The caller's role on the project, `Owner` for the project owner.
    pub async fn role_of(&self, pool: &SqlitePool, user_id: i64) -> Result<Option<Role>, sqlx::Error> {
        if self.owner_id == user_id {
            return Ok(Some(Role::Owner));
        }
        Ok(ProjectMember::find(pool, self.id, user_id)
            .await?
            .map(|member| member.role))
    }

    pub async fn task_stats(&self, pool: &SqlitePool) -> Result<TaskStats, sqlx::Error> {
        let rows = sqlx::query_as::<_, StatusRow>(
            "SELECT status, due_date FROM tasks WHERE project_id = ?",
        )
        .bind(self.id)
        .fetch_all(pool)
        .await?;

        Ok(TaskStats::from_tasks(
            rows.into_iter().map(|row| (row.status, row.due_date)),
            Utc::now(),
        ))
    }

    // Owner first, then members in join order.
    pub async fn members(&self, pool: &SqlitePool) -> Result<Vec<MemberDetail>, sqlx::Error> {
        let mut members = Vec::new();
        if let Some(owner) = User::find_by_id(pool, self.owner_id).await? {
            members.push(MemberDetail {
                user_id: owner.id,
                role: Role::Owner,
                joined_at: self.created_at,
                user_name: owner.full_name,
                user_email: owner.email,
            });
        }
        members.extend(ProjectMember::for_project(pool, self.id, None).await?);
        Ok(members)
    }

    // False when the user already owns or belongs to the project.
    pub async fn add_member(&self, pool: &SqlitePool, user_id: i64, role: Role) -> Result<bool, sqlx::Error> {
        if self.owner_id == user_id || ProjectMember::find(pool, self.id, user_id).await?.is_some() {
            return Ok(false);
        }
        ProjectMember::insert(pool, self.id, user_id, role).await?;
        Project::touch(pool, self.id).await?;
        Ok(true)
    }

    // False when the user is not a member; the owner is never a member row.
    pub async fn remove_member(&self, pool: &SqlitePool, user_id: i64) -> Result<bool, sqlx::Error> {
        if self.owner_id == user_id {
            return Ok(false);
        }
        let removed = ProjectMember::delete(pool, self.id, user_id).await?;
        if removed {
            Project::touch(pool, self.id).await?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn stats_for_empty_project() {
        let stats = TaskStats::from_tasks(Vec::new(), Utc::now());
        assert_eq!(stats, TaskStats::default());
        assert_eq!(stats.completion_rate, 0.0);
    }

    #[test]
    fn stats_count_statuses_and_overdue() {
        let now = Utc::now();
        let yesterday = Some(now - Duration::days(1));
        let tomorrow = Some(now + Duration::days(1));
        let stats = TaskStats::from_tasks(
            vec![
                (TaskStatus::Pending, yesterday),
                (TaskStatus::InProgress, tomorrow),
                (TaskStatus::Completed, yesterday),
                (TaskStatus::Cancelled, yesterday),
                (TaskStatus::Completed, None),
                (TaskStatus::Pending, None),
            ],
            now,
        );

        assert_eq!(stats.total_tasks, 6);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.cancelled, 1);
        // Completed and cancelled tasks are never overdue.
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.completion_rate, 33.33);
    }

    #[test]
    fn percentage_rounds_to_two_places() {
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(4, 4), 100.0);
    }
}
