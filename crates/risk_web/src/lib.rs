//! Web front end for the risk calculator
//!
//! Serves the input form, evaluates submissions through `riskcalc-core` and
//! keeps the visitor's language in a signed session cookie.

pub mod config;
pub mod server;
pub mod session;
pub mod telemetry;
pub mod views;

pub use config::AppConfig;
pub use server::{build_router, start_server, AppState, Stage};
pub use session::{SessionKey, SessionKeyError, SESSION_COOKIE};
