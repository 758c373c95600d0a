pub mod dto;
pub mod entity;
pub mod handler;
pub mod store;

pub use dto::{NewPromptRecord, PromptRecord};
pub use store::{DurableStore, EphemeralStore, PromptBackend, PromptStore};
