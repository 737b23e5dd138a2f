pub mod health_handlers;
pub mod health_models;
