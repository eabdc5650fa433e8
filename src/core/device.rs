//! Console device seam
//!
//! The handful of OS console primitives the core needs. `Win32Console`
//! forwards them to the Windows console API; `MemoryConsole` emulates them in
//! memory so sessions can be built without a real console.

use std::io;

use super::attr::StyleAttribute;
use super::geometry::{Coord, Rect, ScreenSnapshot, Size};

/// A standard stream the device can resolve to a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    Output,
    Error,
}

/// Raw console handle as handed out by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamHandle(pub isize);

/// Character and attributes written into cells vacated by a scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillCell {
    pub ch: char,
    pub attributes: StyleAttribute,
}

impl Default for FillCell {
    fn default() -> Self {
        Self {
            ch: ' ',
            attributes: StyleAttribute::FOREGROUND_RED | StyleAttribute::FOREGROUND_INTENSITY,
        }
    }
}

pub trait ConsoleDevice {
    /// Handle for a standard stream. Fails if the process has no console
    /// attached to it.
    fn std_handle(&mut self, stream: Stream) -> io::Result<StreamHandle>;

    /// Buffer size, window rectangle, cursor and current attributes.
    fn screen_info(&mut self, handle: StreamHandle) -> io::Result<ScreenSnapshot>;

    fn set_attributes(&mut self, handle: StreamHandle, attributes: StyleAttribute) -> io::Result<()>;

    fn set_buffer_size(&mut self, handle: StreamHandle, size: Size) -> io::Result<()>;

    fn set_cursor(&mut self, handle: StreamHandle, at: Coord) -> io::Result<()>;

    /// Write `length` copies of `ch` starting at `at`, wrapping across rows.
    /// Returns how many cells were written before the end of the buffer.
    fn fill_characters(
        &mut self,
        handle: StreamHandle,
        ch: char,
        length: u32,
        at: Coord,
    ) -> io::Result<u32>;

    /// Move the cells of `scroll` so its top-left lands on `destination`.
    /// Cells of `scroll` left without a source are set to `fill`. Only cells
    /// inside `clip` change.
    fn scroll(
        &mut self,
        handle: StreamHandle,
        scroll: Rect,
        clip: Option<Rect>,
        destination: Coord,
        fill: FillCell,
    ) -> io::Result<()>;
}
