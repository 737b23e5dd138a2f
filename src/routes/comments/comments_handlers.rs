use actix_web::{web, HttpResponse};
use log::info;
use sqlx::SqlitePool;

use super::comments_models::{CommentCreateRequest, CommentListQuery, CommentUpdateRequest};
use crate::auth::AuthenticatedUser;
use crate::error::{ApiError, ApiResult, ErrorResponse};
use crate::models::{Task, TaskComment};
use crate::routes::guards::{load_comment, load_task, require_task_view};
use crate::routes::validate;

fn validate_text(comment_text: &str) -> ApiResult<()> {
    validate::length("comment_text", comment_text, 1, 2000)
}

async fn comments_for_task(pool: &SqlitePool, user_id: i64, task_id: i64) -> ApiResult<Vec<TaskComment>> {
    let task = load_task(pool, task_id).await?;
    require_task_view(pool, &task, user_id).await?;
    Ok(TaskComment::for_task(pool, task.id).await?)
}

// Handler to list a task's comments, oldest first
#[utoipa::path(
    get,
    path = "/api/comments",
    params(("task_id" = i64, Query, description = "Task whose comments to list")),
    responses(
        (status = 200, description = "Comments, oldest first", body = [TaskComment]),
        (status = 400, description = "Task ID is required", body = ErrorResponse),
        (status = 403, description = "Access denied to task", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tags = ["comments"]
)]
pub async fn list_comments(
    pool: web::Data<SqlitePool>,
    identity: AuthenticatedUser,
    query: web::Query<CommentListQuery>,
) -> ApiResult<web::Json<Vec<TaskComment>>> {
    let task_id = query
        .task_id
        .ok_or_else(|| ApiError::BadRequest("Task ID is required".into()))?;
    Ok(web::Json(comments_for_task(&pool, identity.user_id, task_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/comments/task/{task_id}",
    params(("task_id" = i64, Path, description = "Task id")),
    responses(
        (status = 200, description = "Comments, oldest first", body = [TaskComment]),
        (status = 403, description = "Access denied to task", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tags = ["comments"]
)]
pub async fn list_task_comments(
    pool: web::Data<SqlitePool>,
    identity: AuthenticatedUser,
    path: web::Path<i64>,
) -> ApiResult<web::Json<Vec<TaskComment>>> {
    Ok(web::Json(
        comments_for_task(&pool, identity.user_id, path.into_inner()).await?,
    ))
}

// Handler to comment on a task the caller can view
#[utoipa::path(
    post,
    path = "/api/comments",
    request_body = CommentCreateRequest,
    responses(
        (status = 201, description = "Comment created", body = TaskComment),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Access denied to task", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tags = ["comments"]
)]
pub async fn create_comment(
    pool: web::Data<SqlitePool>,
    identity: AuthenticatedUser,
    request: web::Json<CommentCreateRequest>,
) -> ApiResult<HttpResponse> {
    validate_text(&request.comment_text)?;
    let task = load_task(&pool, request.task_id).await?;
    require_task_view(&pool, &task, identity.user_id).await?;

    let comment = TaskComment::create(&pool, task.id, identity.user_id, &request.comment_text).await?;
    info!("Comment {} added to task {} by user {}", comment.id, task.id, identity.user_id);
    Ok(HttpResponse::Created().json(comment))
}

#[utoipa::path(
    get,
    path = "/api/comments/{comment_id}",
    params(("comment_id" = i64, Path, description = "Comment id")),
    responses(
        (status = 200, description = "Comment", body = TaskComment),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse)
    ),
    tags = ["comments"]
)]
pub async fn get_comment(
    pool: web::Data<SqlitePool>,
    identity: AuthenticatedUser,
    path: web::Path<i64>,
) -> ApiResult<web::Json<TaskComment>> {
    let comment = load_comment(&pool, path.into_inner()).await?;
    let task = Task::find_by_id(&pool, comment.task_id)
        .await?
        .ok_or_else(|| ApiError::Forbidden("Access denied".into()))?;
    require_task_view(&pool, &task, identity.user_id).await?;
    Ok(web::Json(comment))
}

// Handler to edit a comment, author only
#[utoipa::path(
    put,
    path = "/api/comments/{comment_id}",
    params(("comment_id" = i64, Path, description = "Comment id")),
    request_body = CommentUpdateRequest,
    responses(
        (status = 200, description = "Updated comment", body = TaskComment),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Only the comment author can edit", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse)
    ),
    tags = ["comments"]
)]
pub async fn update_comment(
    pool: web::Data<SqlitePool>,
    identity: AuthenticatedUser,
    path: web::Path<i64>,
    request: web::Json<CommentUpdateRequest>,
) -> ApiResult<web::Json<TaskComment>> {
    let mut comment = load_comment(&pool, path.into_inner()).await?;
    if !comment.can_user_edit(identity.user_id) {
        return Err(ApiError::Forbidden(
            "Access denied - only comment author can edit".into(),
        ));
    }
    validate_text(&request.comment_text)?;

    comment.update_text(&pool, &request.comment_text).await?;
    info!("Comment {} edited by user {}", comment.id, identity.user_id);
    Ok(web::Json(comment))
}

// Handler to delete a comment, author or project owner/admin
#[utoipa::path(
    delete,
    path = "/api/comments/{comment_id}",
    params(("comment_id" = i64, Path, description = "Comment id")),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 403, description = "Insufficient permissions", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse)
    ),
    tags = ["comments"]
)]
pub async fn delete_comment(
    pool: web::Data<SqlitePool>,
    identity: AuthenticatedUser,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let comment = load_comment(&pool, path.into_inner()).await?;
    if !comment.can_user_delete(&pool, identity.user_id).await? {
        return Err(ApiError::Forbidden(
            "Access denied - insufficient permissions to delete comment".into(),
        ));
    }

    TaskComment::delete(&pool, comment.id).await?;
    info!("Comment {} deleted by user {}", comment.id, identity.user_id);
    Ok(HttpResponse::NoContent().finish())
}
