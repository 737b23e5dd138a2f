use actix_session::Session;
use actix_web::{http::header::ContentType, web, HttpRequest, HttpResponse};
use log::info;
use serde_json::{json, Value};

use super::frontend_models::{
    CommentForm, LoginForm, MemberForm, ProjectForm, RegisterForm, StatusForm, TaskForm,
};
use super::frontend_utils::{
    access_token, api_failure, flash, login_required, page_data, redirect, store_login,
    take_flashes, ApiClient, FrontendError,
};
use super::frontend_views;
use crate::models::{MemberDetail, Role, TaskResponse, UserProfile};
use crate::routes::auth::auth_models::TokenResponse;
use crate::routes::projects::projects_models::ProjectWithStats;
use crate::routes::tasks::tasks_models::DashboardStats;

const RECENT_TASKS_ON_DASHBOARD: i64 = 5;

fn page(session: &Session, title: &str, user: Option<&UserProfile>, content: &str) -> HttpResponse {
    let flashes = take_flashes(session);
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(frontend_views::layout(title, user, &flashes, content))
}

fn blank_to_none(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

pub async fn index(session: Session) -> HttpResponse {
    if access_token(&session).is_some() {
        redirect("/dashboard")
    } else {
        redirect("/login")
    }
}

pub async fn login_form(session: Session) -> HttpResponse {
    if access_token(&session).is_some() {
        return redirect("/dashboard");
    }
    page(&session, "Log in", None, &frontend_views::login_page(""))
}

pub async fn login_submit(
    req: HttpRequest,
    session: Session,
    api: web::Data<ApiClient>,
    form: web::Form<LoginForm>,
) -> actix_web::Result<HttpResponse> {
    let body = json!({ "username": form.username, "password": form.password });
    let reply = match api.post(&req, &session, "/auth/login", &body).await {
        Ok(reply) => reply,
        // A 401 here means bad credentials rather than an expired session.
        Err(FrontendError::Unauthorized) => {
            flash(&session, "danger", "Invalid username or password.");
            return Ok(page(&session, "Log in", None, &frontend_views::login_page(&form.username)));
        }
        Err(e) => {
            flash(&session, "danger", format!("Login failed: {e}"));
            return Ok(page(&session, "Log in", None, &frontend_views::login_page(&form.username)));
        }
    };

    if !reply.is_success() {
        flash(&session, "danger", reply.message());
        return Ok(page(&session, "Log in", None, &frontend_views::login_page(&form.username)));
    }
    let Some(tokens) = reply.parse::<TokenResponse>() else {
        flash(&session, "danger", "Unexpected response from the API");
        return Ok(redirect("/login"));
    };
    store_login(&session, &tokens.access_token, &tokens.refresh_token, &tokens.user)?;
    info!("Front end login for {}", tokens.user.username);
    flash(&session, "success", format!("Welcome back, {}!", tokens.user.full_name));
    Ok(redirect("/dashboard"))
}

pub async fn register_form(session: Session) -> HttpResponse {
    if access_token(&session).is_some() {
        return redirect("/dashboard");
    }
    page(&session, "Register", None, &frontend_views::register_page("", "", ""))
}

pub async fn register_submit(
    req: HttpRequest,
    session: Session,
    api: web::Data<ApiClient>,
    form: web::Form<RegisterForm>,
) -> actix_web::Result<HttpResponse> {
    let refill = |session: &Session| {
        page(
            session,
            "Register",
            None,
            &frontend_views::register_page(&form.username, &form.email, &form.full_name),
        )
    };
    if form.password != form.confirm_password {
        flash(&session, "danger", "Passwords do not match.");
        return Ok(refill(&session));
    }

    let body = json!({
        "username": form.username,
        "email": form.email,
        "full_name": form.full_name,
        "password": form.password,
    });
    let reply = match api.post(&req, &session, "/auth/register", &body).await {
        Ok(reply) => reply,
        Err(e) => {
            flash(&session, "danger", e.to_string());
            return Ok(refill(&session));
        }
    };
    if !reply.is_success() {
        flash(&session, "danger", reply.message());
        return Ok(refill(&session));
    }
    let Some(tokens) = reply.parse::<TokenResponse>() else {
        flash(&session, "danger", "Unexpected response from the API");
        return Ok(redirect("/register"));
    };
    store_login(&session, &tokens.access_token, &tokens.refresh_token, &tokens.user)?;
    flash(&session, "success", "Registration successful!");
    Ok(redirect("/dashboard"))
}

pub async fn logout(session: Session) -> HttpResponse {
    session.clear();
    flash(&session, "info", "You have been logged out.");
    redirect("/login")
}

pub async fn dashboard(
    req: HttpRequest,
    session: Session,
    api: web::Data<ApiClient>,
) -> HttpResponse {
    let user = match login_required(&session) {
        Ok(user) => user,
        Err(response) => return response,
    };

    let stats: DashboardStats =
        match page_data(&session, api.get(&req, &session, "/tasks/dashboard/stats", &[]).await) {
            Ok(stats) => stats,
            Err(response) => return response,
        };
    let params = [("limit", RECENT_TASKS_ON_DASHBOARD.to_string())];
    let recent: Vec<TaskResponse> =
        match page_data(&session, api.get(&req, &session, "/tasks/dashboard/recent", &params).await) {
            Ok(recent) => recent,
            Err(response) => return response,
        };

    let content = frontend_views::dashboard_page(&user, &stats, &recent);
    page(&session, "Dashboard", Some(&user), &content)
}

pub async fn projects(
    req: HttpRequest,
    session: Session,
    api: web::Data<ApiClient>,
) -> HttpResponse {
    let user = match login_required(&session) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let projects: Vec<ProjectWithStats> =
        match page_data(&session, api.get(&req, &session, "/projects", &[]).await) {
            Ok(projects) => projects,
            Err(response) => return response,
        };
    page(&session, "Projects", Some(&user), &frontend_views::projects_page(&projects))
}

pub async fn create_project(
    req: HttpRequest,
    session: Session,
    api: web::Data<ApiClient>,
    form: web::Form<ProjectForm>,
) -> HttpResponse {
    if let Err(response) = login_required(&session) {
        return response;
    }
    let body = json!({
        "name": form.name.trim(),
        "description": blank_to_none(&form.description),
    });
    match api.post(&req, &session, "/projects", &body).await {
        Ok(reply) if reply.is_success() => {
            flash(&session, "success", "Project created successfully!");
            match reply.body.get("id").and_then(Value::as_i64) {
                Some(id) => redirect(&format!("/projects/{id}")),
                None => redirect("/projects"),
            }
        }
        Ok(reply) => {
            flash(&session, "danger", reply.message());
            redirect("/projects")
        }
        Err(e) => api_failure(&session, e, "/projects"),
    }
}

pub async fn project_detail(
    req: HttpRequest,
    session: Session,
    api: web::Data<ApiClient>,
    path: web::Path<i64>,
) -> HttpResponse {
    let user = match login_required(&session) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let project_id = path.into_inner();

    let project = match api.get(&req, &session, &format!("/projects/{project_id}"), &[]).await {
        Ok(reply) if reply.is_success() => reply.parse::<ProjectWithStats>(),
        Ok(reply) => {
            flash(&session, "danger", reply.message());
            None
        }
        Err(e) => return api_failure(&session, e, "/projects"),
    };
    let Some(project) = project else {
        return redirect("/projects");
    };

    let params = [("project_id", project_id.to_string())];
    let tasks: Vec<TaskResponse> =
        match page_data(&session, api.get(&req, &session, "/tasks", &params).await) {
            Ok(tasks) => tasks,
            Err(response) => return response,
        };
    let members_endpoint = format!("/projects/{project_id}/members");
    let members: Vec<MemberDetail> =
        match page_data(&session, api.get(&req, &session, &members_endpoint, &[]).await) {
            Ok(members) => members,
            Err(response) => return response,
        };
    let can_manage_members = members
        .iter()
        .any(|member| member.user_id == user.id && member.role.can_manage_members());

    let content = frontend_views::project_page(&project, &tasks, &members, can_manage_members);
    page(&session, &project.name, Some(&user), &content)
}

pub async fn create_task(
    req: HttpRequest,
    session: Session,
    api: web::Data<ApiClient>,
    path: web::Path<i64>,
    form: web::Form<TaskForm>,
) -> HttpResponse {
    if let Err(response) = login_required(&session) {
        return response;
    }
    let project_id = path.into_inner();
    let back = format!("/projects/{project_id}");

    let assigned_to = match blank_to_none(&form.assigned_to).map(str::parse::<i64>) {
        Some(Ok(id)) => Some(id),
        Some(Err(_)) => {
            flash(&session, "danger", "Invalid assignee.");
            return redirect(&back);
        }
        None => None,
    };
    let body = json!({
        "title": form.title.trim(),
        "description": blank_to_none(&form.description),
        "project_id": project_id,
        "priority": blank_to_none(&form.priority).unwrap_or("medium"),
        "due_date": blank_to_none(&form.due_date),
        "assigned_to": assigned_to,
    });
    match api.post(&req, &session, "/tasks", &body).await {
        Ok(reply) if reply.is_success() => {
            flash(&session, "success", "Task created successfully!");
            redirect(&back)
        }
        Ok(reply) => {
            flash(&session, "danger", reply.message());
            redirect(&back)
        }
        Err(e) => api_failure(&session, e, &back),
    }
}

pub async fn add_member(
    req: HttpRequest,
    session: Session,
    api: web::Data<ApiClient>,
    path: web::Path<i64>,
    form: web::Form<MemberForm>,
) -> HttpResponse {
    if let Err(response) = login_required(&session) {
        return response;
    }
    let project_id = path.into_inner();
    let back = format!("/projects/{project_id}");

    let role = match blank_to_none(&form.role) {
        None => Role::default(),
        Some(raw) => match raw.parse::<Role>() {
            Ok(role) if role.is_assignable() => role,
            _ => {
                flash(&session, "danger", "Invalid role.");
                return redirect(&back);
            }
        },
    };
    let body = json!({ "user_id": form.user_id, "role": role });
    match api
        .post(&req, &session, &format!("/projects/{project_id}/members"), &body)
        .await
    {
        Ok(reply) if reply.is_success() => {
            flash(&session, "success", "Member added.");
            redirect(&back)
        }
        Ok(reply) => {
            flash(&session, "danger", reply.message());
            redirect(&back)
        }
        Err(e) => api_failure(&session, e, &back),
    }
}

pub async fn task_detail(
    req: HttpRequest,
    session: Session,
    api: web::Data<ApiClient>,
    path: web::Path<i64>,
) -> HttpResponse {
    let user = match login_required(&session) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let task_id = path.into_inner();

    match api.get(&req, &session, &format!("/tasks/{task_id}"), &[]).await {
        Ok(reply) if reply.is_success() => match reply.parse::<TaskResponse>() {
            Some(task) => page(&session, &task.title, Some(&user), &frontend_views::task_page(&task)),
            None => redirect("/dashboard"),
        },
        Ok(reply) => {
            flash(&session, "danger", reply.message());
            redirect("/dashboard")
        }
        Err(e) => api_failure(&session, e, "/dashboard"),
    }
}

pub async fn update_task_status(
    req: HttpRequest,
    session: Session,
    api: web::Data<ApiClient>,
    path: web::Path<i64>,
    form: web::Form<StatusForm>,
) -> HttpResponse {
    if let Err(response) = login_required(&session) {
        return response;
    }
    let task_id = path.into_inner();
    let back = format!("/tasks/{task_id}");

    let body = json!({ "status": form.status });
    match api
        .patch(&req, &session, &format!("/tasks/{task_id}/status"), &body)
        .await
    {
        Ok(reply) if reply.is_success() => {
            flash(&session, "success", "Task status updated.");
            redirect(&back)
        }
        Ok(reply) => {
            flash(&session, "danger", reply.message());
            redirect(&back)
        }
        Err(e) => api_failure(&session, e, &back),
    }
}

pub async fn add_comment(
    req: HttpRequest,
    session: Session,
    api: web::Data<ApiClient>,
    path: web::Path<i64>,
    form: web::Form<CommentForm>,
) -> HttpResponse {
    if let Err(response) = login_required(&session) {
        return response;
    }
    let task_id = path.into_inner();
    let back = format!("/tasks/{task_id}");

    let body = json!({ "task_id": task_id, "comment_text": form.comment_text.trim() });
    match api.post(&req, &session, "/comments", &body).await {
        Ok(reply) if reply.is_success() => {
            flash(&session, "success", "Comment added.");
            redirect(&back)
        }
        Ok(reply) => {
            flash(&session, "danger", reply.message());
            redirect(&back)
        }
        Err(e) => api_failure(&session, e, &back),
    }
}

