//! Console error taxonomy
//!
//! Every failure is a value. Nothing in the core aborts the process; the
//! caller decides whether a failure is fatal.

use std::fmt;
use std::io;
use thiserror::Error;

use super::attr::StyleAttribute;
use super::geometry::{Coord, Size};

/// The operation a device refused, with the value that was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Apply {
    Style(u16),
    Restore(StyleAttribute),
    Cursor(Coord),
    BufferSize(Size),
    Fill { ch: char, at: Coord },
    Scroll(u16),
}

impl fmt::Display for Apply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Apply::Style(code) => write!(f, "style code {}", code),
            Apply::Restore(attr) => write!(f, "original attributes 0x{:04X}", attr.bits()),
            Apply::Cursor(at) => write!(f, "cursor position ({}, {})", at.x, at.y),
            Apply::BufferSize(size) => write!(f, "buffer size {}x{}", size.columns, size.rows),
            Apply::Fill { ch, at } => write!(f, "fill of {:?} at ({}, {})", ch, at.x, at.y),
            Apply::Scroll(amount) => write!(f, "scroll by {} rows", amount),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("Console output device unavailable: {0}")]
    DeviceUnavailable(#[source] io::Error),

    #[error("Failed to query console screen buffer: {0}")]
    QueryFailed(#[source] io::Error),

    #[error("Console rejected {op}: {source}")]
    ApplyFailed {
        op: Apply,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write to terminal: {0}")]
    Write(#[source] io::Error),
}

impl ConsoleError {
    pub(crate) fn apply(op: Apply) -> impl FnOnce(io::Error) -> ConsoleError {
        move |source| ConsoleError::ApplyFailed { op, source }
    }

    /// The attempted operation, for `ApplyFailed`.
    pub fn rejected(&self) -> Option<Apply> {
        match self {
            ConsoleError::ApplyFailed { op, .. } => Some(*op),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConsoleError>;
