//! Core library for VitaWave
//!
//! This crate contains the task-tracking logic used by the field worker
//! screens, including:
//! - Task records and their validation
//! - Filtering and dashboard queries
//! - Key-value storage and the JSON persistence adapter
//! - The task store provider that owns the load/save lifecycle

pub mod config;
pub mod error;
pub mod persistence;
pub mod provider;
pub mod storage;
pub mod task;

pub use config::StoreConfig;
pub use error::Error;
pub use persistence::TaskPersistence;
pub use provider::{TaskSnapshot, TaskStoreProvider};
pub type Result<T> = std::result::Result<T, Error>;
