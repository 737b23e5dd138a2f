use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::project::percentage;
use crate::models::{Task, TaskPriority, TaskStatus};
use crate::routes::validate::nullable;

#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    pub project_id: Option<i64>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecentTasksQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct TaskCreateRequest {
    #[schema(example = "Implement user authentication")]
    pub title: String,
    #[schema(example = "Create login and registration functionality")]
    pub description: Option<String>,
    #[schema(example = 1)]
    pub project_id: i64,
    pub assigned_to: Option<i64>,
    pub priority: Option<TaskPriority>,
    #[schema(example = "2024-12-31T23:59:59")]
    pub due_date: Option<String>,
}

// Absent fields are left alone; `null` clears the nullable ones.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TaskUpdateRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i64>)]
    pub assigned_to: Option<Option<i64>>,
    pub priority: Option<TaskPriority>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub due_date: Option<Option<String>>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct TaskStatusRequest {
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_projects: usize,
    pub total_tasks: i64,
    pub assigned_tasks: i64,
    pub created_tasks: i64,
    pub completed_tasks: i64,
    pub overdue_tasks: i64,
    pub completion_rate: f64,
}

impl DashboardStats {
    // Completion and overdue figures only count tasks assigned to the user.
    pub fn collect(user_id: i64, total_projects: usize, tasks: &[Task], now: DateTime<Utc>) -> Self {
        let mut stats = DashboardStats {
            total_projects,
            ..DashboardStats::default()
        };
        for task in tasks {
            stats.total_tasks += 1;
            if task.created_by == user_id {
                stats.created_tasks += 1;
            }
            if task.assigned_to != Some(user_id) {
                continue;
            }
            stats.assigned_tasks += 1;
            if task.status == TaskStatus::Completed {
                stats.completed_tasks += 1;
            }
            if task.is_overdue_at(now) {
                stats.overdue_tasks += 1;
            }
        }
        stats.completion_rate = percentage(stats.completed_tasks, stats.assigned_tasks);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn task(id: i64, created_by: i64, assigned_to: Option<i64>, status: TaskStatus) -> Task {
        let now = Utc::now();
        Task {
            id,
            title: format!("Task {id}"),
            description: None,
            status,
            priority: TaskPriority::Medium,
            project_id: 1,
            assigned_to,
            created_by,
            due_date: Some(now - Duration::days(1)),
            completed_at: None,
            created_at: now,
            updated_at: now,
            comments_count: 0,
        }
    }

    #[test]
    fn dashboard_counts_from_the_users_point_of_view() {
        let tasks = vec![
            task(1, 1, Some(1), TaskStatus::Completed),
            task(2, 1, Some(1), TaskStatus::Pending),
            task(3, 2, Some(1), TaskStatus::InProgress),
            task(4, 2, Some(2), TaskStatus::Pending),
            task(5, 1, None, TaskStatus::Cancelled),
        ];
        let stats = DashboardStats::collect(1, 2, &tasks, Utc::now());

        assert_eq!(stats.total_projects, 2);
        assert_eq!(stats.total_tasks, 5);
        assert_eq!(stats.created_tasks, 3);
        assert_eq!(stats.assigned_tasks, 3);
        assert_eq!(stats.completed_tasks, 1);
        assert_eq!(stats.overdue_tasks, 2);
        assert_eq!(stats.completion_rate, 33.33);
    }

    #[test]
    fn update_request_tracks_explicit_nulls() {
        let request: TaskUpdateRequest =
            serde_json::from_str(r#"{"assigned_to":null,"priority":"high"}"#).expect("json");
        assert_eq!(request.assigned_to, Some(None));
        assert_eq!(request.priority, Some(TaskPriority::High));
        assert!(request.title.is_none());
        assert!(request.due_date.is_none());
    }
}
