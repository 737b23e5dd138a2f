// Lookups shared by the API handlers. Each one turns a missing row or a
// failed permission check into the matching `ApiError`.

use log::info;
use sqlx::SqlitePool;

use crate::error::{ApiError, ApiResult};
use crate::models::{Project, Role, Task, TaskComment, User};

pub async fn load_user(pool: &SqlitePool, user_id: i64) -> ApiResult<User> {
    User::find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))
}

pub async fn load_project(pool: &SqlitePool, project_id: i64) -> ApiResult<Project> {
    Project::find_active(pool, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".into()))
}

pub async fn load_task(pool: &SqlitePool, task_id: i64) -> ApiResult<Task> {
    Task::find_by_id(pool, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".into()))
}

pub async fn load_comment(pool: &SqlitePool, comment_id: i64) -> ApiResult<TaskComment> {
    TaskComment::find_by_id(pool, comment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".into()))
}

pub async fn require_project_access(pool: &SqlitePool, user_id: i64, project_id: i64) -> ApiResult<()> {
    if User::can_access_project(pool, user_id, project_id).await? {
        Ok(())
    } else {
        info!("User {} denied access to project {}", user_id, project_id);
        Err(ApiError::Forbidden("Access denied to project".into()))
    }
}

// The caller's role, or 403 when they neither own nor belong to the project.
pub async fn project_role(pool: &SqlitePool, project: &Project, user_id: i64) -> ApiResult<Role> {
    project.role_of(pool, user_id).await?.ok_or_else(|| {
        info!("User {} has no role on project {}", user_id, project.id);
        ApiError::Forbidden("Access denied".into())
    })
}

pub async fn require_member_manager(pool: &SqlitePool, project: &Project, user_id: i64) -> ApiResult<Role> {
    let role = project_role(pool, project, user_id).await?;
    if role.can_manage_members() {
        Ok(role)
    } else {
        Err(ApiError::Forbidden("Access denied".into()))
    }
}

pub async fn require_task_view(pool: &SqlitePool, task: &Task, user_id: i64) -> ApiResult<()> {
    if task.can_user_view(pool, user_id).await? {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Access denied to task".into()))
    }
}

pub async fn require_task_edit(pool: &SqlitePool, task: &Task, user_id: i64) -> ApiResult<()> {
    if task.can_user_edit(pool, user_id).await? {
        Ok(())
    } else {
        info!("User {} may not edit task {}", user_id, task.id);
        Err(ApiError::Forbidden("Access denied".into()))
    }
}

// Assignees must be able to see the project the task lives in.
pub async fn require_assignable(pool: &SqlitePool, assignee: i64, project_id: i64) -> ApiResult<()> {
    let has_access = match User::find_by_id(pool, assignee).await? {
        Some(user) => User::can_access_project(pool, user.id, project_id).await?,
        None => false,
    };
    if has_access {
        Ok(())
    } else {
        Err(ApiError::BadRequest(
            "Assigned user does not have access to project".into(),
        ))
    }
}
