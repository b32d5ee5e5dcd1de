//! ALC Core - Fundamental types
//!
//! This crate provides the core types shared by the compiler and its hosts:
//! - `Value`: literal and cell values (numbers, text, booleans, null)
//! - `ParseError`, `GenerateError`, `CompileError`: structured errors
//! - `RegisterBook`: in-memory tax register tables

mod value;
mod error;
mod register;

pub use value::Value;
pub use error::{codes, CompileError, GenerateError, Location, ParseError};
pub use register::{RegisterAccess, RegisterBook, RegisterRow, TaxRegister};
