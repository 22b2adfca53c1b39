//! Domain module for todo management.
//!
//! This module contains the todo entity and its value objects.

pub mod todo;

pub use todo::{NewTodo, ParsePriorityError, Priority, Todo, TodoId};
