//! Middleware for the learnstyle server

mod auth;

pub use auth::auth_middleware;
