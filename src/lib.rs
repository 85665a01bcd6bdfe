pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod errors;
pub mod fixtures;
pub mod flow;
pub mod handlers;
pub mod models;
pub mod store;
pub mod templates_structs;
