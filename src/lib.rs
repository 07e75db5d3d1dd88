//! Base - a small convention-driven MVC web framework
//!
//! Base provides:
//! - URL-to-controller routing over nested controller directories
//! - Templates with layout inheritance and named sections
//! - Sessions with flash values over pluggable drivers
//! - Sealed cookies, dotted configuration and a lazy database handle

// Library code propagates errors instead of panicking
#![cfg_attr(
    not(test),
    warn(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
    )
)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used,))]

pub mod app;
pub mod cli;
pub mod config;
pub mod configuration;
pub mod context;
pub mod controller;
pub mod crypto;
pub mod db;
pub mod error;
pub mod http;
pub mod reply;
pub mod routing;
pub mod session;
pub mod url;
pub mod views;

// Re-export main types for public API
pub use app::App;
pub use config::{AppConfig, Environment};
pub use configuration::ConfigStore;
pub use context::Context;
pub use controller::{Actions, Controller, ControllerRegistry};
pub use crypto::Cipher;
pub use db::{DbHandle, QueryResult, SqlValue};
pub use error::{Error, Result};
pub use http::{CookieJar, CookieOptions, Request, Response};
pub use reply::{Redirect, Reply};
pub use routing::{Params, Route, RouteResolver};
pub use session::{Session, SessionStore};
pub use views::{RenderOutcome, View, ViewEngine};

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use serde::{Deserialize, Serialize};
pub use serde_json::{json, Value};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::actions;
    pub use crate::*;
    pub use serde_json::json;
    pub use std::collections::HashMap;
}
