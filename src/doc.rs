//! OpenAPI document for the REST API, served by Swagger UI under `/api/docs/`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::ErrorResponse;
use crate::models::{
    MemberDetail, Project, Role, TaskComment, TaskPriority, TaskResponse, TaskStats, TaskStatus,
    UserProfile,
};
use crate::routes::auth::auth_models::{
    AccessTokenResponse, LoginRequest, MessageResponse, ProfileUpdateRequest, RegisterRequest,
    TokenResponse,
};
use crate::routes::comments::comments_models::{CommentCreateRequest, CommentUpdateRequest};
use crate::routes::health::health_models::{HealthResponse, WebsocketStatus};
use crate::routes::projects::projects_models::{
    MemberAddRequest, MemberRoleRequest, ProjectAnalytics, ProjectCreateRequest,
    ProjectUpdateRequest, ProjectWithStats,
};
use crate::routes::tasks::tasks_models::{
    DashboardStats, TaskCreateRequest, TaskStatusRequest, TaskUpdateRequest,
};

/// Registers the JWT bearer scheme every protected endpoint relies on.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "Bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Access token from POST /api/auth/login"))
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Task Manager API",
        description = "Projects, tasks, comments and team membership with JWT authentication."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("Bearer" = [])),
    paths(
        crate::routes::auth::auth_handlers::register,
        crate::routes::auth::auth_handlers::login,
        crate::routes::auth::auth_handlers::get_profile,
        crate::routes::auth::auth_handlers::update_profile,
        crate::routes::auth::auth_handlers::refresh,
        crate::routes::auth::auth_handlers::logout,
        crate::routes::projects::projects_handlers::list_projects,
        crate::routes::projects::projects_handlers::create_project,
        crate::routes::projects::projects_handlers::get_project,
        crate::routes::projects::projects_handlers::update_project,
        crate::routes::projects::projects_handlers::delete_project,
        crate::routes::projects::projects_handlers::list_members,
        crate::routes::projects::projects_handlers::add_member,
        crate::routes::projects::projects_handlers::update_member_role,
        crate::routes::projects::projects_handlers::remove_member,
        crate::routes::projects::projects_handlers::project_analytics,
        crate::routes::tasks::tasks_handlers::list_tasks,
        crate::routes::tasks::tasks_handlers::create_task,
        crate::routes::tasks::tasks_handlers::get_task,
        crate::routes::tasks::tasks_handlers::update_task,
        crate::routes::tasks::tasks_handlers::delete_task,
        crate::routes::tasks::tasks_handlers::update_task_status,
        crate::routes::tasks::tasks_handlers::dashboard_stats,
        crate::routes::tasks::tasks_handlers::recent_tasks,
        crate::routes::comments::comments_handlers::list_comments,
        crate::routes::comments::comments_handlers::list_task_comments,
        crate::routes::comments::comments_handlers::create_comment,
        crate::routes::comments::comments_handlers::get_comment,
        crate::routes::comments::comments_handlers::update_comment,
        crate::routes::comments::comments_handlers::delete_comment,
        crate::routes::health::health_handlers::health,
        crate::routes::health::health_handlers::websocket_status,
    ),
    components(schemas(
        ErrorResponse,
        UserProfile,
        RegisterRequest,
        LoginRequest,
        ProfileUpdateRequest,
        TokenResponse,
        AccessTokenResponse,
        MessageResponse,
        Project,
        TaskStats,
        ProjectWithStats,
        ProjectCreateRequest,
        ProjectUpdateRequest,
        ProjectAnalytics,
        Role,
        MemberDetail,
        MemberAddRequest,
        MemberRoleRequest,
        TaskStatus,
        TaskPriority,
        TaskResponse,
        TaskCreateRequest,
        TaskUpdateRequest,
        TaskStatusRequest,
        DashboardStats,
        TaskComment,
        CommentCreateRequest,
        CommentUpdateRequest,
        HealthResponse,
        WebsocketStatus,
    )),
    tags(
        (name = "auth", description = "Registration, login and token refresh"),
        (name = "projects", description = "Projects and their members"),
        (name = "tasks", description = "Tasks and the personal dashboard"),
        (name = "comments", description = "Discussion on tasks"),
        (name = "health", description = "Liveness and WebSocket status")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route_group() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/login",
            "/api/projects/{project_id}/members/{user_id}",
            "/api/tasks/dashboard/stats",
            "/api/comments/task/{task_id}",
            "/api/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn registers_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("Bearer"));
        assert!(components.schemas.contains_key("TaskResponse"));
    }
}
