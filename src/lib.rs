//! Terminal client that keeps a live packet table in step with a remote
//! capture server.

pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod model;
pub mod network;
pub mod reconcile;
pub mod runtime;
pub mod scroll;
pub mod selection;
pub mod session;
pub mod ui;

pub use app::{App, Completion, Effect, Request};
pub use config::Config;
pub use error::{ErrorKind, MonitorError};
pub use network::SessionClient;
