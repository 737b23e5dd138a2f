// Route groups. Each `routes::*_configure` function mounts one scope.

pub mod auth;
pub mod comments;
pub mod frontend;
pub mod guards;
pub mod health;
pub mod projects;
pub mod routes;
pub mod tasks;
pub mod validate;
