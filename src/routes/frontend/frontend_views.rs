// HTML for the server-rendered pages. Every value that came from a user goes
// through `escape`.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use super::frontend_utils::{format_datetime, priority_class, status_class, Flash};
use crate::models::{MemberDetail, TaskResponse, UserProfile};
use crate::routes::projects::projects_models::ProjectWithStats;
use crate::routes::tasks::tasks_models::DashboardStats;

const STATUSES: [(&str, &str); 4] = [
    ("pending", "Pending"),
    ("in_progress", "In progress"),
    ("completed", "Completed"),
    ("cancelled", "Cancelled"),
];
const PRIORITIES: [&str; 4] = ["low", "medium", "high", "critical"];

pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn when(value: &DateTime<Utc>) -> String {
    format_datetime(&value.to_rfc3339())
}

fn badge(class: &str, label: &str) -> String {
    format!(r#"<span class="badge {}">{}</span>"#, class, escape(label))
}

pub fn layout(title: &str, user: Option<&UserProfile>, flashes: &[Flash], content: &str) -> String {
    let nav = match user {
        Some(user) => format!(
            r#"<a href="/dashboard">Dashboard</a> <a href="/projects">Projects</a>
        <span class="user">{}</span> <a href="/logout">Log out</a>"#,
            escape(&user.full_name)
        ),
        None => r#"<a href="/login">Log in</a> <a href="/register">Register</a>"#.to_string(),
    };
    let mut messages = String::new();
    for flash in flashes {
        let _ = write!(
            messages,
            r#"<div class="alert alert-{}">{}</div>"#,
            escape(&flash.level),
            escape(&flash.message)
        );
    }
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>{title} - Task Manager</title>
</head>
<body>
    <nav>{nav}</nav>
    <main>
        {messages}
        {content}
    </main>
</body>
</html>"#,
        title = escape(title),
    )
}

pub fn login_page(username: &str) -> String {
    format!(
        r#"<h1>Log in</h1>
<form method="post" action="/login">
    <label>Username <input name="username" value="{}" required></label>
    <label>Password <input name="password" type="password" required></label>
    <button type="submit">Log in</button>
</form>
<p>No account yet? <a href="/register">Register</a></p>"#,
        escape(username)
    )
}

pub fn register_page(username: &str, email: &str, full_name: &str) -> String {
    format!(
        r#"<h1>Register</h1>
<form method="post" action="/register">
    <label>Username <input name="username" value="{}" minlength="3" maxlength="80" required></label>
    <label>Email <input name="email" type="email" value="{}" required></label>
    <label>Full name <input name="full_name" value="{}" maxlength="200" required></label>
    <label>Password <input name="password" type="password" minlength="6" required></label>
    <label>Confirm password <input name="confirm_password" type="password" required></label>
    <button type="submit">Create account</button>
</form>"#,
        escape(username),
        escape(email),
        escape(full_name)
    )
}

fn task_rows(tasks: &[TaskResponse]) -> String {
    if tasks.is_empty() {
        return "<p>No tasks yet.</p>".to_string();
    }
    let mut rows = String::from(
        "<table class=\"tasks\">\n<tr><th>Title</th><th>Status</th><th>Priority</th><th>Due</th></tr>\n",
    );
    for task in tasks {
        let due = task.due_date.as_ref().map(when).unwrap_or_default();
        let overdue = if task.is_overdue { r#" class="overdue""# } else { "" };
        let _ = writeln!(
            rows,
            r#"<tr{overdue}><td><a href="/tasks/{}">{}</a></td><td>{}</td><td>{}</td><td>{}</td></tr>"#,
            task.id,
            escape(&task.title),
            badge(status_class(task.status.as_str()), task.status.as_str()),
            badge(priority_class(task.priority.as_str()), task.priority.as_str()),
            due,
        );
    }
    rows.push_str("</table>");
    rows
}

pub fn dashboard_page(user: &UserProfile, stats: &DashboardStats, recent: &[TaskResponse]) -> String {
    format!(
        r#"<h1>Welcome, {name}</h1>
<ul class="stats">
    <li>Projects: {projects}</li>
    <li>Tasks: {tasks}</li>
    <li>Assigned to you: {assigned}</li>
    <li>Created by you: {created}</li>
    <li>Completed: {completed}</li>
    <li>Overdue: {overdue}</li>
    <li>Completion rate: {rate:.1}%</li>
</ul>
<h2>Recent tasks</h2>
{rows}"#,
        name = escape(&user.full_name),
        projects = stats.total_projects,
        tasks = stats.total_tasks,
        assigned = stats.assigned_tasks,
        created = stats.created_tasks,
        completed = stats.completed_tasks,
        overdue = stats.overdue_tasks,
        rate = stats.completion_rate,
        rows = task_rows(recent),
    )
}

pub fn projects_page(projects: &[ProjectWithStats]) -> String {
    let mut list = String::new();
    if projects.is_empty() {
        list.push_str("<p>You are not part of any project yet.</p>");
    }
    for project in projects {
        let _ = writeln!(
            list,
            r#"<div class="project"><h3><a href="/projects/{}">{}</a></h3><p>{}</p><p>{} tasks, {:.1}% complete</p></div>"#,
            project.id,
            escape(&project.name),
            escape(project.description.as_deref().unwrap_or("")),
            project.stats.total_tasks,
            project.stats.completion_rate,
        );
    }
    format!(
        r#"<h1>Projects</h1>
{list}
<h2>New project</h2>
<form method="post" action="/projects">
    <label>Name <input name="name" maxlength="200" required></label>
    <label>Description <textarea name="description" maxlength="1000"></textarea></label>
    <button type="submit">Create project</button>
</form>"#
    )
}

fn option_list<'a>(options: impl Iterator<Item = (&'a str, &'a str)>, selected: &str) -> String {
    let mut html = String::new();
    for (value, label) in options {
        let marker = if value == selected { " selected" } else { "" };
        let _ = write!(html, r#"<option value="{value}"{marker}>{label}</option>"#);
    }
    html
}

pub fn project_page(
    project: &ProjectWithStats,
    tasks: &[TaskResponse],
    members: &[MemberDetail],
    can_manage_members: bool,
) -> String {
    let mut member_list = String::new();
    let mut assignees = String::from(r#"<option value="">Unassigned</option>"#);
    for member in members {
        let _ = writeln!(
            member_list,
            "<li>{} &lt;{}&gt; {}</li>",
            escape(&member.user_name),
            escape(&member.user_email),
            badge("badge-light", member.role.as_str()),
        );
        let _ = write!(
            assignees,
            r#"<option value="{}">{}</option>"#,
            member.user_id,
            escape(&member.user_name)
        );
    }
    let member_form = if can_manage_members {
        format!(
            r#"<form method="post" action="/projects/{}/members">
    <label>User id <input name="user_id" type="number" min="1" required></label>
    <select name="role">{}</select>
    <button type="submit">Add member</button>
</form>"#,
            project.id,
            option_list(
                [("member", "Member"), ("admin", "Admin"), ("viewer", "Viewer")].into_iter(),
                "member"
            ),
        )
    } else {
        String::new()
    };
    let stats = &project.stats;

    format!(
        r#"<h1>{name}</h1>
<p>{description}</p>
<p>{total} tasks: {pending} pending, {in_progress} in progress, {completed} completed, {overdue} overdue</p>
<h2>Tasks</h2>
{rows}
<h2>New task</h2>
<form method="post" action="/projects/{id}/tasks">
    <label>Title <input name="title" maxlength="200" required></label>
    <label>Description <textarea name="description" maxlength="2000"></textarea></label>
    <label>Priority <select name="priority">{priorities}</select></label>
    <label>Due <input name="due_date" type="datetime-local"></label>
    <label>Assignee <select name="assigned_to">{assignees}</select></label>
    <button type="submit">Add task</button>
</form>
<h2>Members</h2>
<ul>{member_list}</ul>
{member_form}"#,
        name = escape(&project.name),
        description = escape(project.description.as_deref().unwrap_or("")),
        total = stats.total_tasks,
        pending = stats.pending,
        in_progress = stats.in_progress,
        completed = stats.completed,
        overdue = stats.overdue,
        rows = task_rows(tasks),
        id = project.id,
        priorities = option_list(PRIORITIES.iter().map(|p| (*p, *p)), "medium"),
    )
}

pub fn task_page(task: &TaskResponse) -> String {
    let mut comments = String::new();
    for comment in task.comments.as_deref().unwrap_or_default() {
        let _ = writeln!(
            comments,
            r#"<div class="comment"><strong>{}</strong> <small>{}</small><p>{}</p></div>"#,
            escape(&comment.author_name),
            when(&comment.created_at),
            escape(&comment.comment_text),
        );
    }
    if comments.is_empty() {
        comments.push_str("<p>No comments yet.</p>");
    }
    let due = task.due_date.as_ref().map(when).unwrap_or_else(|| "none".to_string());

    format!(
        r#"<p><a href="/projects/{project_id}">Back to project</a></p>
<h1>{title}</h1>
<p>{status} {priority}{overdue}</p>
<p>{description}</p>
<p>Due: {due} &middot; Created: {created} &middot; Updated: {updated}</p>
<form method="post" action="/tasks/{id}/status">
    <select name="status">{statuses}</select>
    <button type="submit">Update status</button>
</form>
<h2>Comments ({count})</h2>
{comments}
<form method="post" action="/tasks/{id}/comments">
    <textarea name="comment_text" maxlength="2000" required></textarea>
    <button type="submit">Add comment</button>
</form>"#,
        project_id = task.project_id,
        title = escape(&task.title),
        status = badge(status_class(task.status.as_str()), task.status.as_str()),
        priority = badge(priority_class(task.priority.as_str()), task.priority.as_str()),
        overdue = if task.is_overdue { r#" <span class="badge badge-danger">overdue</span>"# } else { "" },
        description = escape(task.description.as_deref().unwrap_or("")),
        created = when(&task.created_at),
        updated = when(&task.updated_at),
        id = task.id,
        statuses = option_list(STATUSES.into_iter(), task.status.as_str()),
        count = task.comments_count,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskPriority, TaskStatus};

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape(r#"<script>alert("x & y")</script>"#),
            "&lt;script&gt;alert(&quot;x &amp; y&quot;)&lt;/script&gt;"
        );
    }

    #[test]
    fn layout_renders_flashes_and_nav() {
        let flashes = vec![Flash {
            level: "warning".into(),
            message: "Please log in to access this page.".into(),
        }];
        let html = layout("Log in", None, &flashes, "<p>body</p>");
        assert!(html.contains(r#"<div class="alert alert-warning">Please log in to access this page.</div>"#));
        assert!(html.contains(r#"href="/register""#));
        assert!(html.contains("<p>body</p>"));
    }

    #[test]
    fn task_page_marks_current_status() {
        let now = Utc::now();
        let task = TaskResponse {
            id: 7,
            title: "Fix <login>".into(),
            description: None,
            status: TaskStatus::InProgress,
            priority: TaskPriority::High,
            project_id: 2,
            assigned_to: None,
            created_by: 1,
            due_date: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
            is_overdue: false,
            comments_count: 0,
            comments: Some(Vec::new()),
        };
        let html = task_page(&task);
        assert!(html.contains("Fix &lt;login&gt;"));
        assert!(html.contains(r#"<option value="in_progress" selected>"#));
        assert!(html.contains("badge-warning"));
        assert!(html.contains("No comments yet."));
    }
}
