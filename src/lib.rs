pub mod auth;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
