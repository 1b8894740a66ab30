// lib.rs - central orchestrator
pub mod api;
pub mod common;
pub mod data;
pub mod model;
pub mod recommend;

pub use common::config::AppCfg;
pub use common::error::{BookrecError, BookrecResult, ErrorCode};
pub use recommend::{AppContext, BookView, Recommendation};
