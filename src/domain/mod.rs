pub mod ai;
pub mod auth;
pub mod health;
pub mod prompt;
