pub mod frontend_handlers;
pub mod frontend_models;
pub mod frontend_utils;
pub mod frontend_views;
