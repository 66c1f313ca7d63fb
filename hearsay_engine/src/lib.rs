//! Runs compiled Hearsay scripts one suspension at a time.
//!
//! The engine never blocks or sleeps. Each call into a [`Story`] runs nodes until one
//! of them hands control back, and the returned [`Yield`] tells the driver what it
//! is waiting for:
//!
//! ```text
//! Advance         never returned; the story keeps going
//! AwaitResume     `wait`: call Story::resume
//! AwaitDuration   `pause`: call Story::update with elapsed time, or resume to skip
//! AwaitChoice     `choose`: call Story::choose with one of the offered ids
//! Finished        nothing left to run
//! ```
//!
//! What to show lives in a [`Presentation`] that the driver owns and lends to every
//! call.

#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod error;
pub mod execute;
pub mod presentation;
pub mod signal;
pub mod story;

pub use config::{StoryConfig, load_config, parse_config};
pub use error::StoryError;
pub use execute::{Flow, Outcome, dispatch_node};
pub use presentation::{Line, Offer, Presentation};
pub use signal::Yield;
pub use story::Story;

pub const HEARSAY_VERSION: &str = env!("CARGO_PKG_VERSION");
