//! `xcresult_triage`: analyze Xcode test results.
//!
//! The pipeline is load → resolve → diagnose → reconstruct:
//!
//! - [`loader`] fetches and decodes the summary and tests documents
//! - [`resolve`] finds nodes by identifier or listing index
//! - [`diagnostics`] classifies failure text and suggests fixes
//! - [`timeline`] rebuilds the activity timeline for one test
//!
//! [`store`] is the boundary to the result-store tool, and [`cli`] wires it
//! all to the `xctriage` binary.

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod format;
pub mod loader;
pub mod logging;
pub mod model;
pub mod output;
pub mod resolve;
pub mod store;
pub mod timeline;
pub mod util;

pub use error::{ErrorCode, Result, StructuredError, TriageError};
