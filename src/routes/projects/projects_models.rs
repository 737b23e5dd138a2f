use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Project, Role, TaskStats};
use crate::routes::validate::nullable;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ProjectCreateRequest {
    #[schema(example = "My Project")]
    pub name: String,
    #[schema(example = "A sample project for task management")]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProjectUpdateRequest {
    pub name: Option<String>,
    // `null` clears the description, an absent field keeps it.
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ProjectWithStats {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub stats: TaskStats,
}

impl ProjectWithStats {
    pub fn new(project: Project, stats: TaskStats) -> Self {
        ProjectWithStats {
            id: project.id,
            name: project.name,
            description: project.description,
            owner_id: project.owner_id,
            is_active: project.is_active,
            created_at: project.created_at,
            updated_at: project.updated_at,
            stats,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct MemberAddRequest {
    pub user_id: i64,
    // admin, member or viewer; defaults to member.
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct MemberRoleRequest {
    pub role: Role,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ProjectAnalytics {
    pub project_id: i64,
    pub project_name: String,
    pub task_statistics: TaskStats,
    pub member_count: usize,
    pub project_age_days: i64,
    pub last_activity: DateTime<Utc>,
}
