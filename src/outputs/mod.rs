//! Output generation for downstream consumers.
//!
//! # Submodules
//!
//! - [`json`]: exports stored results to a single JSON document

pub mod json;
