//! Shared utilities for lockstock
//!
//! Tracing setup and `.env` loading used by the binaries in this workspace.

pub mod env;
pub mod logging;

pub use env::{load_dotenv, var_non_empty};
pub use logging::{init_tracing, init_tracing_with_default};
