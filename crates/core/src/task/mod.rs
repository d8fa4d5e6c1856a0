//! Task module
//!
//! This module contains task-related types and logic.

mod model;
mod query;
mod repository;

pub use model::*;
pub use query::*;
pub use repository::TaskRepository;
