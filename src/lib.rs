//! Task Manager: projects, tasks, comments and team membership over a JSON
//! API, realtime WebSocket notifications and server-rendered pages.

pub mod app;
pub mod auth;
pub mod commands;
pub mod config;
pub mod db;
pub mod doc;
pub mod error;
pub mod models;
pub mod routes;
pub mod websocket;
