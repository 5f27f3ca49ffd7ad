#![no_std]

extern crate alloc;

pub use action::*;
pub use board::*;
pub use cell::*;
pub use error::*;
pub use replay::*;
pub use types::*;

mod action;
mod board;
mod cell;
mod error;
mod replay;
mod types;

/// Side length of the square grid the game is played on.
pub const GRID_SIZE: Coord = 6;

/// Outcome of a gameplay mutation that board rules may reject.
///
/// A rejection is a normal answer, not an error: the board is left untouched
/// and the caller decides whether to surface it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied,
    Rejected,
}

impl ActionOutcome {
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}
