//! Todo API Library
//!
//! A CRUD REST service for todo records with soft delete and pagination,
//! backed by `SQLite` or `PostgreSQL`.
//!
//! Layers, outermost first: [`api`] (axum handlers and DTOs), [`service`]
//! (business rules), [`infrastructure`] (repositories and store selection),
//! [`domain`] (entities).

pub mod api;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod service;
