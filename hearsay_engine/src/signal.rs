//! Suspension signals returned to the driver.

use std::fmt;

use variantly::Variantly;

/// What the driver should do after a node has run.
#[derive(Debug, Clone, Copy, PartialEq, Variantly)]
pub enum Yield {
    /// Run the next node straight away.
    Advance,
    /// Halt until the driver calls `resume`.
    AwaitResume,
    /// Halt for this many seconds, then continue on its own.
    AwaitDuration(f64),
    /// Halt until the driver picks one of the open choices.
    AwaitChoice,
    /// Nothing left to run.
    Finished,
}

impl Yield {
    /// True for every signal that hands control back to the driver.
    pub fn is_suspended(&self) -> bool {
        matches!(self, Yield::AwaitResume | Yield::AwaitDuration(_) | Yield::AwaitChoice)
    }
}

impl fmt::Display for Yield {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Yield::Advance => write!(f, "advance"),
            Yield::AwaitResume => write!(f, "await resume"),
            Yield::AwaitDuration(seconds) => write!(f, "await {seconds}s"),
            Yield::AwaitChoice => write!(f, "await choice"),
            Yield::Finished => write!(f, "finished"),
        }
    }
}
