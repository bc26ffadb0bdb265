// ABOUTME: Extraction of structured problem data from statement page markup.
// ABOUTME: Limit label parsing and statement region parsing live here.

//! Extraction module.
//!
//! Submodules:
//! - `limits`: Time and memory limit parsing from free-form label text.
//! - `statement`: Statement region lookup and ProblemDetails assembly.

pub mod limits;
pub mod statement;
