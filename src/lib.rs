pub mod activity;
pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod upstream;
