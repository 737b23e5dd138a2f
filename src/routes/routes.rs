use actix_web::web;

use super::auth::auth_handlers;

pub fn auth_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/auth")
            .route("/register", web::post().to(auth_handlers::register))
            .route("/login", web::post().to(auth_handlers::login))
            .route("/profile", web::get().to(auth_handlers::get_profile))
            .route("/profile", web::put().to(auth_handlers::update_profile))
            .route("/refresh", web::post().to(auth_handlers::refresh))
            .route("/logout", web::post().to(auth_handlers::logout))
    );
}

use super::projects::projects_handlers;

pub fn projects_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/projects")
            .route("", web::get().to(projects_handlers::list_projects))
            .route("", web::post().to(projects_handlers::create_project))
            .route("/{project_id}", web::get().to(projects_handlers::get_project))
            .route("/{project_id}", web::put().to(projects_handlers::update_project))
            .route("/{project_id}", web::delete().to(projects_handlers::delete_project))
            .route("/{project_id}/members", web::get().to(projects_handlers::list_members))
            .route("/{project_id}/members", web::post().to(projects_handlers::add_member))
            .route("/{project_id}/members/{user_id}", web::put().to(projects_handlers::update_member_role))
            .route("/{project_id}/members/{user_id}", web::delete().to(projects_handlers::remove_member))
            .route("/{project_id}/analytics", web::get().to(projects_handlers::project_analytics))
    );
}

use super::tasks::tasks_handlers;

pub fn tasks_configure(cfg: &mut web::ServiceConfig) {
    // The dashboard routes go first so "dashboard" is never taken for a task id.
    cfg.service(
        web::scope("/api/tasks")
            .route("/dashboard/stats", web::get().to(tasks_handlers::dashboard_stats))
            .route("/dashboard/recent", web::get().to(tasks_handlers::recent_tasks))
            .route("", web::get().to(tasks_handlers::list_tasks))
            .route("", web::post().to(tasks_handlers::create_task))
            .route("/{task_id}", web::get().to(tasks_handlers::get_task))
            .route("/{task_id}", web::put().to(tasks_handlers::update_task))
            .route("/{task_id}", web::delete().to(tasks_handlers::delete_task))
            .route("/{task_id}/status", web::patch().to(tasks_handlers::update_task_status))
    );
}

use super::comments::comments_handlers;

pub fn comments_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/comments")
            .route("", web::get().to(comments_handlers::list_comments))
            .route("", web::post().to(comments_handlers::create_comment))
            .route("/task/{task_id}", web::get().to(comments_handlers::list_task_comments))
            .route("/{comment_id}", web::get().to(comments_handlers::get_comment))
            .route("/{comment_id}", web::put().to(comments_handlers::update_comment))
            .route("/{comment_id}", web::delete().to(comments_handlers::delete_comment))
    );
}

use super::health::health_handlers;

pub fn health_configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/health", web::get().to(health_handlers::health));
}

pub fn websocket_configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/ws", web::get().to(crate::websocket::ws_entry))
        .route("/websocket/status", web::get().to(health_handlers::websocket_status));
}

use super::frontend::frontend_handlers;

pub fn frontend_configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(frontend_handlers::index))
        .route("/login", web::get().to(frontend_handlers::login_form))
        .route("/login", web::post().to(frontend_handlers::login_submit))
        .route("/register", web::get().to(frontend_handlers::register_form))
        .route("/register", web::post().to(frontend_handlers::register_submit))
        .route("/logout", web::get().to(frontend_handlers::logout))
        .route("/dashboard", web::get().to(frontend_handlers::dashboard))
        .service(
            web::scope("/projects")
                .route("", web::get().to(frontend_handlers::projects))
                .route("", web::post().to(frontend_handlers::create_project))
                .route("/{project_id}", web::get().to(frontend_handlers::project_detail))
                .route("/{project_id}/tasks", web::post().to(frontend_handlers::create_task))
                .route("/{project_id}/members", web::post().to(frontend_handlers::add_member))
        )
        .service(
            web::scope("/tasks")
                .route("/{task_id}", web::get().to(frontend_handlers::task_detail))
                .route("/{task_id}/status", web::post().to(frontend_handlers::update_task_status))
                .route("/{task_id}/comments", web::post().to(frontend_handlers::add_comment))
        );
}
