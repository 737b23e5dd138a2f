// src/models/mod.rs

pub mod comment;
pub mod project;
pub mod project_member;
pub mod task;
pub mod user;

pub use comment::TaskComment;
pub use project::{Project, TaskStats};
pub use project_member::{MemberDetail, ProjectMember, Role};
pub use task::{Task, TaskFilter, TaskPriority, TaskResponse, TaskStatus};
pub use user::{User, UserProfile};
