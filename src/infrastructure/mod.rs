//! Infrastructure module for the backing store.
//!
//! This module contains the repository trait, one implementation per
//! database engine, and the factory that picks one at startup.

pub mod factory;
pub mod postgres;
pub mod repository;
pub mod sqlite;

pub use factory::{FactoryError, RepositoryFactory, StoreConfig};
pub use postgres::PostgresTodoRepository;
pub use repository::{PaginatedResult, Pagination, RepositoryError, TodoRepository};
pub use sqlite::SqliteTodoRepository;

#[cfg(test)]
pub use repository::MockTodoRepository;
