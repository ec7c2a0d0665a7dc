//! Shared utilities for the attendance workspace.
//!
//! Currently this is the validation layer used by configuration loading and
//! the request payloads in `domain`.

pub mod validation;
