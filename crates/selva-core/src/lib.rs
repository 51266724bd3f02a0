//! Selva core runtime model
//!
//! This crate provides the shared data model the interop bridge builds on:
//! - Script values (functions, classes, instances with tagged host backing)
//! - The minimal AST and scope resolver used for synthesized fragments
//! - A tree-walking call evaluator seam
//! - The host capability registry standing in for runtime reflection
//! - The runtime error taxonomy

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod ast;
pub mod error;
pub mod eval;
pub mod host;
pub mod resolve;
pub mod value;

pub use error::{RuntimeError, RuntimeResult};
pub use eval::{Environment, Interpreter};
pub use value::{Class, ClassOrigin, Function, Instance, Value};
