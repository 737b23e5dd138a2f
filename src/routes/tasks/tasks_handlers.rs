use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::info;
use serde_json::{json, Map, Value};
use sqlx::SqlitePool;

use super::tasks_models::{
    DashboardStats, RecentTasksQuery, TaskCreateRequest, TaskListQuery, TaskStatusRequest,
    TaskUpdateRequest,
};
use crate::auth::AuthenticatedUser;
use crate::error::{ApiResult, ErrorResponse};
use crate::models::task::NewTask;
use crate::models::{Task, TaskComment, TaskFilter, TaskPriority, TaskResponse, TaskStatus, User};
use crate::routes::guards::{
    load_project, load_task, load_user, require_assignable, require_project_access,
    require_task_edit, require_task_view,
};
use crate::routes::validate;
use crate::websocket::events::{emit_task_created, emit_task_deleted, emit_task_updated};
use crate::websocket::Hub;

const DEFAULT_RECENT_LIMIT: i64 = 10;

fn validate_title(title: &str) -> ApiResult<()> {
    validate::length("title", title, 1, 200)
}

fn validate_description(description: Option<&str>) -> ApiResult<()> {
    validate::optional_length("description", description, 2000)
}

async fn accessible_project_ids(pool: &SqlitePool, user_id: i64) -> ApiResult<Vec<i64>> {
    Ok(User::projects(pool, user_id)
        .await?
        .into_iter()
        .map(|project| project.id)
        .collect())
}

// Handler to list tasks visible to the caller
#[utoipa::path(
    get,
    path = "/api/tasks",
    params(
        ("project_id" = Option<i64>, Query, description = "Filter by project"),
        ("status" = Option<TaskStatus>, Query, description = "Filter by status"),
        ("priority" = Option<TaskPriority>, Query, description = "Filter by priority"),
        ("assigned_to" = Option<i64>, Query, description = "Filter by assignee"),
        ("limit" = Option<i64>, Query, description = "Maximum number of tasks"),
        ("offset" = Option<i64>, Query, description = "Tasks to skip")
    ),
    responses(
        (status = 200, description = "Tasks, newest first", body = [TaskResponse]),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Access denied to project", body = ErrorResponse)
    ),
    tags = ["tasks"]
)]
pub async fn list_tasks(
    pool: web::Data<SqlitePool>,
    identity: AuthenticatedUser,
    query: web::Query<TaskListQuery>,
) -> ApiResult<web::Json<Vec<TaskResponse>>> {
    let user = load_user(&pool, identity.user_id).await?;
    if let Some(project_id) = query.project_id {
        require_project_access(&pool, user.id, project_id).await?;
    }

    let filter = TaskFilter {
        project_id: query.project_id,
        assigned_to: query.assigned_to,
        status: query.status,
        priority: query.priority,
        limit: query.limit,
        offset: query.offset,
    };
    let project_ids = accessible_project_ids(&pool, user.id).await?;
    let tasks = Task::list(&pool, &filter, &project_ids).await?;
    Ok(web::Json(tasks.iter().map(Task::to_response).collect()))
}

// Handler to create a task in a project the caller can access
#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = TaskCreateRequest,
    responses(
        (status = 201, description = "Task created", body = TaskResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Access denied to project", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tags = ["tasks"]
)]
pub async fn create_task(
    pool: web::Data<SqlitePool>,
    hub: web::Data<Hub>,
    identity: AuthenticatedUser,
    request: web::Json<TaskCreateRequest>,
) -> ApiResult<HttpResponse> {
    let request = request.into_inner();
    validate_title(&request.title)?;
    validate_description(request.description.as_deref())?;
    let due_date = request
        .due_date
        .as_deref()
        .map(|raw| validate::datetime("due_date", raw))
        .transpose()?;

    let user = load_user(&pool, identity.user_id).await?;
    require_project_access(&pool, user.id, request.project_id).await?;
    let project = load_project(&pool, request.project_id).await?;
    if let Some(assignee) = request.assigned_to {
        require_assignable(&pool, assignee, project.id).await?;
    }

    let task = Task::create(
        &pool,
        NewTask {
            title: &request.title,
            description: request.description.as_deref(),
            project_id: project.id,
            created_by: user.id,
            assigned_to: request.assigned_to,
            priority: request.priority.unwrap_or_default(),
            due_date,
        },
    )
    .await?;
    info!("Task {} created in project {} by user {}", task.id, project.id, user.id);

    let response = task.to_response();
    emit_task_created(&hub, &response, &user);
    Ok(HttpResponse::Created().json(response))
}

// Handler to fetch a task with its comments
#[utoipa::path(
    get,
    path = "/api/tasks/{task_id}",
    params(("task_id" = i64, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task with comments", body = TaskResponse),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tags = ["tasks"]
)]
pub async fn get_task(
    pool: web::Data<SqlitePool>,
    identity: AuthenticatedUser,
    path: web::Path<i64>,
) -> ApiResult<web::Json<TaskResponse>> {
    let task = load_task(&pool, path.into_inner()).await?;
    require_task_view(&pool, &task, identity.user_id).await?;

    let mut response = task.to_response();
    response.comments = Some(TaskComment::for_task(&pool, task.id).await?);
    Ok(web::Json(response))
}

// Handler for partial task updates
#[utoipa::path(
    put,
    path = "/api/tasks/{task_id}",
    params(("task_id" = i64, Path, description = "Task id")),
    request_body = TaskUpdateRequest,
    responses(
        (status = 200, description = "Updated task", body = TaskResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tags = ["tasks"]
)]
pub async fn update_task(
    pool: web::Data<SqlitePool>,
    hub: web::Data<Hub>,
    identity: AuthenticatedUser,
    path: web::Path<i64>,
    request: web::Json<TaskUpdateRequest>,
) -> ApiResult<web::Json<TaskResponse>> {
    let mut task = load_task(&pool, path.into_inner()).await?;
    require_task_edit(&pool, &task, identity.user_id).await?;
    let request = request.into_inner();

    // Changed fields as the client sent them, forwarded with the event.
    let mut changes = Map::new();

    if let Some(title) = request.title {
        validate_title(&title)?;
        changes.insert("title".into(), json!(title));
        task.title = title;
    }
    if let Some(description) = request.description {
        validate_description(description.as_deref())?;
        changes.insert("description".into(), json!(description));
        task.description = description;
    }
    if let Some(priority) = request.priority {
        changes.insert("priority".into(), json!(priority));
        task.priority = priority;
    }
    if let Some(due_date) = request.due_date {
        let parsed = due_date
            .as_deref()
            .map(|raw| validate::datetime("due_date", raw))
            .transpose()?;
        changes.insert("due_date".into(), json!(parsed));
        task.due_date = parsed;
    }
    if let Some(assigned_to) = request.assigned_to {
        if let Some(assignee) = assigned_to {
            require_assignable(&pool, assignee, task.project_id).await?;
        }
        changes.insert("assigned_to".into(), json!(assigned_to));
        task.assigned_to = assigned_to;
    }

    task.save(&pool).await?;
    info!("Task {} updated by user {}", task.id, identity.user_id);

    let user = load_user(&pool, identity.user_id).await?;
    let response = task.to_response();
    emit_task_updated(&hub, &response, &user, Value::Object(changes));
    Ok(web::Json(response))
}

#[utoipa::path(
    delete,
    path = "/api/tasks/{task_id}",
    params(("task_id" = i64, Path, description = "Task id")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tags = ["tasks"]
)]
pub async fn delete_task(
    pool: web::Data<SqlitePool>,
    hub: web::Data<Hub>,
    identity: AuthenticatedUser,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let task = load_task(&pool, path.into_inner()).await?;
    require_task_edit(&pool, &task, identity.user_id).await?;
    let user = load_user(&pool, identity.user_id).await?;

    Task::delete(&pool, task.id, task.project_id).await?;
    info!("Task {} deleted by user {}", task.id, user.id);

    emit_task_deleted(&hub, task.id, task.project_id, &task.title, &user);
    Ok(HttpResponse::NoContent().finish())
}

// Handler to move a task through its workflow
#[utoipa::path(
    patch,
    path = "/api/tasks/{task_id}/status",
    params(("task_id" = i64, Path, description = "Task id")),
    request_body = TaskStatusRequest,
    responses(
        (status = 200, description = "Updated task", body = TaskResponse),
        (status = 400, description = "Invalid status", body = ErrorResponse),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tags = ["tasks"]
)]
pub async fn update_task_status(
    pool: web::Data<SqlitePool>,
    hub: web::Data<Hub>,
    identity: AuthenticatedUser,
    path: web::Path<i64>,
    request: web::Json<TaskStatusRequest>,
) -> ApiResult<web::Json<TaskResponse>> {
    let mut task = load_task(&pool, path.into_inner()).await?;
    require_task_edit(&pool, &task, identity.user_id).await?;

    let old_status = task.status;
    task.set_status(request.status, Utc::now());
    task.save(&pool).await?;
    info!("Task {} moved from {} to {}", task.id, old_status, task.status);

    let user = load_user(&pool, identity.user_id).await?;
    let response = task.to_response();
    let changes = json!({ "status": { "old": old_status, "new": task.status } });
    emit_task_updated(&hub, &response, &user, changes);
    Ok(web::Json(response))
}

#[utoipa::path(
    get,
    path = "/api/tasks/dashboard/stats",
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStats),
        (status = 401, description = "Authentication required", body = ErrorResponse)
    ),
    tags = ["tasks"]
)]
pub async fn dashboard_stats(
    pool: web::Data<SqlitePool>,
    identity: AuthenticatedUser,
) -> ApiResult<web::Json<DashboardStats>> {
    let user = load_user(&pool, identity.user_id).await?;
    let project_ids = accessible_project_ids(&pool, user.id).await?;
    let tasks = Task::list(&pool, &TaskFilter::default(), &project_ids).await?;
    Ok(web::Json(DashboardStats::collect(
        user.id,
        project_ids.len(),
        &tasks,
        Utc::now(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/tasks/dashboard/recent",
    params(("limit" = Option<i64>, Query, description = "Maximum number of tasks, default 10")),
    responses(
        (status = 200, description = "Recently updated tasks", body = [TaskResponse]),
        (status = 401, description = "Authentication required", body = ErrorResponse)
    ),
    tags = ["tasks"]
)]
pub async fn recent_tasks(
    pool: web::Data<SqlitePool>,
    identity: AuthenticatedUser,
    query: web::Query<RecentTasksQuery>,
) -> ApiResult<web::Json<Vec<TaskResponse>>> {
    let user = load_user(&pool, identity.user_id).await?;
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT).max(0);
    let project_ids = accessible_project_ids(&pool, user.id).await?;
    let tasks = Task::recent_for_user(&pool, user.id, &project_ids, limit).await?;
    Ok(web::Json(tasks.iter().map(Task::to_response).collect()))
}
