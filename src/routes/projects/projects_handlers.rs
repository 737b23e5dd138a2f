use actix_web::{web, HttpResponse};
use log::info;
use sqlx::SqlitePool;

use super::projects_models::{
    MemberAddRequest, MemberRoleRequest, ProjectAnalytics, ProjectCreateRequest,
    ProjectUpdateRequest, ProjectWithStats,
};
use crate::auth::AuthenticatedUser;
use crate::error::{ApiError, ApiResult, ErrorResponse};
use crate::models::{MemberDetail, Project, ProjectMember, Role, User};
use crate::routes::guards::{
    load_project, load_user, project_role, require_member_manager, require_project_access,
};
use crate::routes::validate;

fn validate_name(name: &str) -> ApiResult<()> {
    validate::length("name", name, 1, 200)
}

fn validate_description(description: Option<&str>) -> ApiResult<()> {
    validate::optional_length("description", description, 1000)
}

// Handler to list the caller's projects with task statistics
#[utoipa::path(
    get,
    path = "/api/projects",
    responses(
        (status = 200, description = "Projects the user owns or belongs to", body = [ProjectWithStats]),
        (status = 401, description = "Authentication required", body = ErrorResponse)
    ),
    tags = ["projects"]
)]
pub async fn list_projects(
    pool: web::Data<SqlitePool>,
    identity: AuthenticatedUser,
) -> ApiResult<web::Json<Vec<ProjectWithStats>>> {
    let user = load_user(&pool, identity.user_id).await?;
    let projects = User::projects(&pool, user.id).await?;

    let mut response = Vec::with_capacity(projects.len());
    for project in projects {
        let stats = project.task_stats(&pool).await?;
        response.push(ProjectWithStats::new(project, stats));
    }
    Ok(web::Json(response))
}

// Handler to create a project owned by the caller
#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = ProjectCreateRequest,
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse)
    ),
    tags = ["projects"]
)]
pub async fn create_project(
    pool: web::Data<SqlitePool>,
    identity: AuthenticatedUser,
    request: web::Json<ProjectCreateRequest>,
) -> ApiResult<HttpResponse> {
    validate_name(&request.name)?;
    validate_description(request.description.as_deref())?;
    let user = load_user(&pool, identity.user_id).await?;

    let project = Project::create(&pool, &request.name, request.description.as_deref(), user.id).await?;
    info!("Project {} created by user {}", project.id, user.id);
    Ok(HttpResponse::Created().json(project))
}

#[utoipa::path(
    get,
    path = "/api/projects/{project_id}",
    params(("project_id" = i64, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project with statistics", body = ProjectWithStats),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tags = ["projects"]
)]
pub async fn get_project(
    pool: web::Data<SqlitePool>,
    identity: AuthenticatedUser,
    path: web::Path<i64>,
) -> ApiResult<web::Json<ProjectWithStats>> {
    let project = load_project(&pool, path.into_inner()).await?;
    require_project_access(&pool, identity.user_id, project.id).await?;

    let stats = project.task_stats(&pool).await?;
    Ok(web::Json(ProjectWithStats::new(project, stats)))
}

// Handler to update a project, owner or admin only
#[utoipa::path(
    put,
    path = "/api/projects/{project_id}",
    params(("project_id" = i64, Path, description = "Project id")),
    request_body = ProjectUpdateRequest,
    responses(
        (status = 200, description = "Updated project", body = Project),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tags = ["projects"]
)]
pub async fn update_project(
    pool: web::Data<SqlitePool>,
    identity: AuthenticatedUser,
    path: web::Path<i64>,
    request: web::Json<ProjectUpdateRequest>,
) -> ApiResult<web::Json<Project>> {
    let project = load_project(&pool, path.into_inner()).await?;
    let role = project_role(&pool, &project, identity.user_id).await?;
    if !role.can_edit_project() {
        info!("User {} ({}) may not edit project {}", identity.user_id, role, project.id);
        return Err(ApiError::Forbidden("Access denied".into()));
    }

    let request = request.into_inner();
    if let Some(name) = &request.name {
        validate_name(name)?;
    }
    if let Some(description) = &request.description {
        validate_description(description.as_deref())?;
    }

    let name = request.name.unwrap_or_else(|| project.name.clone());
    let description = match request.description {
        Some(description) => description,
        None => project.description.clone(),
    };
    Project::update(&pool, project.id, &name, description.as_deref()).await?;
    info!("Project {} updated by user {}", project.id, identity.user_id);

    Ok(web::Json(load_project(&pool, project.id).await?))
}

// Handler to soft-delete a project, owner only
#[utoipa::path(
    delete,
    path = "/api/projects/{project_id}",
    params(("project_id" = i64, Path, description = "Project id")),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 403, description = "Only project owner can delete project", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tags = ["projects"]
)]
pub async fn delete_project(
    pool: web::Data<SqlitePool>,
    identity: AuthenticatedUser,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let project = load_project(&pool, path.into_inner()).await?;
    let can_delete = project
        .role_of(&pool, identity.user_id)
        .await?
        .is_some_and(|role| role.can_delete_project());
    if !can_delete {
        return Err(ApiError::Forbidden(
            "Only project owner can delete project".into(),
        ));
    }

    Project::soft_delete(&pool, project.id).await?;
    info!("Project {} deleted by user {}", project.id, identity.user_id);
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/projects/{project_id}/members",
    params(("project_id" = i64, Path, description = "Project id")),
    responses(
        (status = 200, description = "Owner followed by members", body = [MemberDetail]),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tags = ["projects"]
)]
pub async fn list_members(
    pool: web::Data<SqlitePool>,
    identity: AuthenticatedUser,
    path: web::Path<i64>,
) -> ApiResult<web::Json<Vec<MemberDetail>>> {
    let project = load_project(&pool, path.into_inner()).await?;
    require_project_access(&pool, identity.user_id, project.id).await?;
    Ok(web::Json(project.members(&pool).await?))
}

// Handler to add a member, owner or admin only
#[utoipa::path(
    post,
    path = "/api/projects/{project_id}/members",
    params(("project_id" = i64, Path, description = "Project id")),
    request_body = MemberAddRequest,
    responses(
        (status = 201, description = "Member added", body = MemberDetail),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "Project or user not found", body = ErrorResponse),
        (status = 409, description = "User already a member", body = ErrorResponse)
    ),
    tags = ["projects"]
)]
pub async fn add_member(
    pool: web::Data<SqlitePool>,
    identity: AuthenticatedUser,
    path: web::Path<i64>,
    request: web::Json<MemberAddRequest>,
) -> ApiResult<HttpResponse> {
    let project = load_project(&pool, path.into_inner()).await?;
    require_member_manager(&pool, &project, identity.user_id).await?;

    let role = request.role.unwrap_or_default();
    if !role.is_assignable() {
        return Err(ApiError::Validation(
            "Validation error: role must be one of admin, member, viewer".into(),
        ));
    }
    let target = load_user(&pool, request.user_id).await?;

    if !project.add_member(&pool, target.id, role).await? {
        return Err(ApiError::Conflict(
            "User already a member or is project owner".into(),
        ));
    }
    info!("User {} added to project {} as {}", target.id, project.id, role);

    let member = ProjectMember::detail(&pool, project.id, target.id)
        .await?
        .ok_or_else(|| ApiError::Internal("member row missing after insert".into()))?;
    Ok(HttpResponse::Created().json(member))
}

// Handler to change a member's role, owner or admin only
#[utoipa::path(
    put,
    path = "/api/projects/{project_id}/members/{user_id}",
    params(
        ("project_id" = i64, Path, description = "Project id"),
        ("user_id" = i64, Path, description = "Member user id")
    ),
    request_body = MemberRoleRequest,
    responses(
        (status = 200, description = "Updated member", body = MemberDetail),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "Project or member not found", body = ErrorResponse)
    ),
    tags = ["projects"]
)]
pub async fn update_member_role(
    pool: web::Data<SqlitePool>,
    identity: AuthenticatedUser,
    path: web::Path<(i64, i64)>,
    request: web::Json<MemberRoleRequest>,
) -> ApiResult<web::Json<MemberDetail>> {
    let (project_id, user_id) = path.into_inner();
    let project = load_project(&pool, project_id).await?;
    require_member_manager(&pool, &project, identity.user_id).await?;

    if request.role == Role::Owner {
        return Err(ApiError::Validation(
            "Validation error: ownership cannot be granted through membership".into(),
        ));
    }
    if !ProjectMember::update_role(&pool, project.id, user_id, request.role).await? {
        return Err(ApiError::NotFound("Member not found".into()));
    }
    Project::touch(&pool, project.id).await?;
    info!("User {} is now {} on project {}", user_id, request.role, project.id);

    ProjectMember::detail(&pool, project.id, user_id)
        .await?
        .map(web::Json)
        .ok_or_else(|| ApiError::NotFound("Member not found".into()))
}

// Handler to remove a member, owner or admin only
#[utoipa::path(
    delete,
    path = "/api/projects/{project_id}/members/{user_id}",
    params(
        ("project_id" = i64, Path, description = "Project id"),
        ("user_id" = i64, Path, description = "Member user id")
    ),
    responses(
        (status = 204, description = "Member removed"),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "Project or member not found", body = ErrorResponse)
    ),
    tags = ["projects"]
)]
pub async fn remove_member(
    pool: web::Data<SqlitePool>,
    identity: AuthenticatedUser,
    path: web::Path<(i64, i64)>,
) -> ApiResult<HttpResponse> {
    let (project_id, user_id) = path.into_inner();
    let project = load_project(&pool, project_id).await?;
    require_member_manager(&pool, &project, identity.user_id).await?;

    if !project.remove_member(&pool, user_id).await? {
        return Err(ApiError::NotFound(
            "Member not found or cannot remove project owner".into(),
        ));
    }
    info!("User {} removed from project {}", user_id, project.id);
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/projects/{project_id}/analytics",
    params(("project_id" = i64, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project analytics", body = ProjectAnalytics),
        (status = 403, description = "Access denied", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tags = ["projects"]
)]
pub async fn project_analytics(
    pool: web::Data<SqlitePool>,
    identity: AuthenticatedUser,
    path: web::Path<i64>,
) -> ApiResult<web::Json<ProjectAnalytics>> {
    let project = load_project(&pool, path.into_inner()).await?;
    require_project_access(&pool, identity.user_id, project.id).await?;

    let task_statistics = project.task_stats(&pool).await?;
    let member_count = project.members(&pool).await?.len();
    Ok(web::Json(ProjectAnalytics {
        project_id: project.id,
        project_name: project.name.clone(),
        task_statistics,
        member_count,
        project_age_days: (project.updated_at - project.created_at).num_days(),
        last_activity: project.updated_at,
    }))
}
