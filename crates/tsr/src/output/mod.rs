//! Output formatting utilities for the tsr CLI.
//!
//! This module provides functions for formatting results as tables or JSON.
//! It is organized into submodules by command:
//!
//! - [`check`] - Query check output (canonical form, term tree, warnings)
//! - [`preview`] - Matching events for a query
//! - [`apply`] - Rule application report
//! - [`helpers`] - Common formatting utilities (truncation, times, targets)

mod apply;
mod check;
pub mod helpers;
mod preview;

pub use apply::{format_apply_json, format_apply_table};
pub use check::{format_check_json, format_check_table};
pub use preview::{format_preview_json, format_preview_table};
