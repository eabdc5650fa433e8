//! termctl - terminal control with a native Windows console backend
//!
//! Application code sets text style, moves and queries the cursor, reads and
//! resizes the screen area, and fills or scrolls the screen buffer through
//! one [`TerminalBackend`] interface. Two implementations sit behind it:
//!
//! - **native** ([`ConsoleSession`]): the Windows console API, translating
//!   1-based window-relative positions into the console's 0-based buffer
//!   coordinates and style codes into attribute masks
//! - **ansi** ([`AnsiBackend`]): escape sequences through crossterm
//!
//! # Example
//!
//! ```
//! use termctl::{ConsoleSession, MemoryConsole, Position, Stream, TerminalBackend};
//!
//! let mut session = ConsoleSession::init(MemoryConsole::new(80, 25))?;
//! session.set_style(Stream::Output, 0x0C)?;
//! session.set_cursor_position(Position::new(10, 5))?;
//! assert_eq!(session.current_position()?, Position::new(10, 5));
//! session.restore()?;
//! # Ok::<(), termctl::ConsoleError>(())
//! ```
//!
//! # Threading
//!
//! The console is one process-wide resource. Operations take `&mut self`;
//! wrap the backend in a mutex to share it, and expect interleaved writers
//! to observe each other's cursor moves.

pub mod ansi;
pub mod backend;
pub mod config;
pub mod core;

pub use crate::ansi::AnsiBackend;
pub use crate::backend::{select, BackendKind, TerminalBackend};
pub use crate::config::{Config, ConfigError};
pub use crate::core::{
    Apply, ConsoleDevice, ConsoleError, ConsoleSession, Coord, FillCell, MemoryConsole, Position,
    Rect, ScreenSnapshot, SessionOptions, Size, SnapshotPolicy, Stream, StreamHandle,
    StyleAttribute,
};
#[cfg(windows)]
pub use crate::core::Win32Console;
