//! hearsay_script: parser and compiler for Hearsay dialogue scripts
//!
//! A script is indentation-structured text:
//!
//! ```text
//! alice: Good morning!
//! choice
//!   > Ask about the weather
//!     alice: Looks like rain.
//!   > Say goodbye
//!     jump end
//! choose
//! label [end]
//!   alice: Bye.
//! ```
//!
//! [`compile`] turns it into a [`hearsay_data::Script`]: a graph of named node
//! blocks, with constant sub-expressions already folded. The parsing machinery it is
//! built on lives in [`parse`] and is usable on its own.

#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

pub mod compiler;
pub mod config;
mod idgen;
pub mod parse;

pub use compiler::{CompileError, Location, compile, compile_with};
pub use config::{CompileOptions, load_options, parse_options};
