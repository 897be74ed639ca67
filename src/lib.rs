//! This crate provides a client for a to-do REST API.
//!
//! It provides an HTTP client in the [`client`] module, that implements the [`AuthService`](traits::AuthService) and [`TaskService`](traits::TaskService) traits.
//! A stand-in service that lives in the current process is provided in the [`cache`] module.
//!
//! Tasks fetched from a service can be grouped by due date and sorted for display by [`projector::project`]. \
//! A [`TaskList`](projector::TaskList) wraps this with the service calls: it fetches tasks, toggles their completion, and fetches them again after every change.
//! The [`format`] module turns the resulting values into display strings.

pub mod traits;

mod task;
pub use task::{Due, Priority, Task, TaskId};
mod session;
pub use session::Session;
pub mod error;
pub use error::Error;

pub mod projector;
pub use projector::{project, DateGroup, Projection, TaskList};
pub mod format;
pub mod account;

pub mod client;
pub mod cache;
pub mod mock_behaviour;

pub mod config;
