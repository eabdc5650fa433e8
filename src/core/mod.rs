//! Native console backend.
//!
//! - **device**: the OS primitives the backend is written against
//! - **session**: process-wide session (output handle + original attributes)
//! - **attr**: style attributes and the attribute controller
//! - **geometry**: window-relative vs. absolute coordinates, cursor and size
//! - **editor**: character fills and scrolling
//! - **memory**: in-memory device for tests and demo mode
//! - **win32**: Windows console device
//!
//! # Architecture
//!
//! ```text
//! ConsoleSession<D: ConsoleDevice>
//! ├── attr      set_style_on / unset_style_on / restore
//! ├── geometry  current_position / window_size / resize_buffer / set_cursor_position
//! └── editor    fill_region_on / scroll_up
//!        │
//!        ▼
//! ConsoleDevice ── Win32Console (Windows)
//!               └─ MemoryConsole
//! ```

pub mod attr;
pub mod device;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod memory;
pub mod session;
#[cfg(windows)]
pub mod win32;

pub use attr::StyleAttribute;
pub use device::{ConsoleDevice, FillCell, Stream, StreamHandle};
pub use error::{Apply, ConsoleError, Result};
pub use geometry::{Coord, Position, Rect, ScreenSnapshot, Size};
pub use memory::MemoryConsole;
pub use session::{ConsoleSession, SessionOptions, SnapshotPolicy};
#[cfg(windows)]
pub use win32::Win32Console;
