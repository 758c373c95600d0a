pub mod dto;
pub mod entity;
pub mod handler;
pub mod service;
pub mod store;

pub use store::{AccountRecord, AccountStore};
