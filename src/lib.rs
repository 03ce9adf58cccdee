// File: src/lib.rs
//
// Library interface for the DMO interpreter.
// Exposes modules for integration testing and for hosts that embed the
// interpreter or hand it ASTs produced by their own front end.

pub mod ast;
pub mod config;
pub mod errors;
pub mod interpreter;
pub mod module;
