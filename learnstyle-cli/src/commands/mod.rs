pub mod auth;
pub mod check;
pub mod config;
pub mod serve;
