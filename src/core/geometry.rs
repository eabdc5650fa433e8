//! Geometry translator
//!
//! Two coordinate spaces meet here:
//!
//! ```text
//! window-relative (callers)        absolute buffer (native console)
//! 1-based, origin at the top-left  0-based, origin at the top-left of
//! of the visible window            the whole scroll-back buffer
//!
//!   buffer ┌──────────────────────────┐
//!          │                          │
//!          │   window ┌─────────┐     │  abs.x = x - 1 + window.left
//!          │          │ (1,1)   │     │  abs.y = y - 1 + window.top
//!          │          └─────────┘     │
//!          └──────────────────────────┘
//! ```
//!
//! The window moves whenever the user scrolls or resizes the console, so every
//! translation starts from a freshly queried [`ScreenSnapshot`].

use tracing::trace;

use super::attr::StyleAttribute;
use super::device::ConsoleDevice;
use super::error::{Apply, ConsoleError, Result};
use super::session::ConsoleSession;

/// 1-based position relative to the visible window.
///
/// Values below 1 or past the window edge occur when the cursor sits outside
/// the visible area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Columns by rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub columns: u16,
    pub rows: u16,
}

impl Size {
    pub const fn new(columns: u16, rows: u16) -> Self {
        Self { columns, rows }
    }
}

/// 0-based absolute buffer coordinate (native `COORD`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Coord {
    pub x: i16,
    pub y: i16,
}

impl Coord {
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }
}

/// Inclusive rectangle in buffer coordinates (native `SMALL_RECT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub left: i16,
    pub top: i16,
    pub right: i16,
    pub bottom: i16,
}

impl Rect {
    pub const fn new(left: i16, top: i16, right: i16, bottom: i16) -> Self {
        Self { left, top, right, bottom }
    }

    /// The rectangle covering a whole buffer of `size`.
    pub fn covering(size: Size) -> Self {
        Self {
            left: 0,
            top: 0,
            right: clamp_i16(i64::from(size.columns) - 1),
            bottom: clamp_i16(i64::from(size.rows) - 1),
        }
    }

    pub fn width(&self) -> i32 {
        i32::from(self.right) - i32::from(self.left) + 1
    }

    pub fn height(&self) -> i32 {
        i32::from(self.bottom) - i32::from(self.top) + 1
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    pub fn contains(&self, at: Coord) -> bool {
        at.x >= self.left && at.x <= self.right && at.y >= self.top && at.y <= self.bottom
    }

    pub fn intersect(&self, other: &Rect) -> Rect {
        Rect {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.min(other.right),
            bottom: self.bottom.min(other.bottom),
        }
    }
}

/// Point-in-time read of the console screen buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScreenSnapshot {
    /// Allocated buffer dimensions, scroll-back included
    pub buffer: Size,
    /// Visible window inside the buffer
    pub window: Rect,
    /// Absolute cursor position
    pub cursor: Coord,
    /// Attributes applied to newly written characters
    pub attributes: StyleAttribute,
}

/// Arguments for a native scroll-with-fill call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollPlan {
    pub scroll: Rect,
    pub clip: Rect,
    pub destination: Coord,
}

pub(crate) fn clamp_i16(value: i64) -> i16 {
    value.clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16
}

/// Window-relative position to absolute buffer coordinate.
///
/// Out-of-window positions are translated anyway; the device decides whether
/// to clamp or reject them.
pub fn to_absolute(snapshot: &ScreenSnapshot, pos: Position) -> Coord {
    Coord {
        x: clamp_i16(i64::from(pos.x) - 1 + i64::from(snapshot.window.left)),
        y: clamp_i16(i64::from(pos.y) - 1 + i64::from(snapshot.window.top)),
    }
}

/// Absolute buffer coordinate to window-relative position.
pub fn to_relative(snapshot: &ScreenSnapshot, at: Coord) -> Position {
    Position {
        x: i32::from(at.x) - i32::from(snapshot.window.left) + 1,
        y: i32::from(at.y) - i32::from(snapshot.window.top) + 1,
    }
}

/// Dimensions of the visible window, not the buffer.
pub fn visible_size(snapshot: &ScreenSnapshot) -> Size {
    let w = &snapshot.window;
    Size {
        columns: w.width().clamp(0, i32::from(u16::MAX)) as u16,
        rows: w.height().clamp(0, i32::from(u16::MAX)) as u16,
    }
}

/// Shift the whole buffer up by `amount` rows.
///
/// The destination origin sits `amount` rows above the buffer, so the rows
/// that no longer have a source are the ones the device fills.
pub fn scroll_plan(buffer: Size, amount: u16) -> ScrollPlan {
    let whole = Rect::covering(buffer);
    ScrollPlan {
        scroll: whole,
        clip: whole,
        destination: Coord::new(0, clamp_i16(-i64::from(amount))),
    }
}

impl<D: ConsoleDevice> ConsoleSession<D> {
    /// Cursor position relative to the visible window, 1-based.
    pub fn current_position(&mut self) -> Result<Position> {
        let snapshot = self.snapshot()?;
        Ok(to_relative(&snapshot, snapshot.cursor))
    }

    /// Visible window dimensions, queried fresh on every call.
    pub fn window_size(&mut self) -> Result<Size> {
        let snapshot = self.snapshot()?;
        Ok(visible_size(&snapshot))
    }

    /// Ask the device to reallocate its buffer.
    ///
    /// Buffer capacity and window size are distinct; the visible window does
    /// not necessarily change.
    pub fn resize_buffer(&mut self, size: Size) -> Result<()> {
        trace!(columns = size.columns, rows = size.rows, "resize buffer");
        self.device
            .set_buffer_size(self.output, size)
            .map_err(ConsoleError::apply(Apply::BufferSize(size)))
    }

    /// Move the cursor to a 1-based, window-relative position.
    ///
    /// Bounds are not checked here.
    pub fn set_cursor_position(&mut self, pos: Position) -> Result<()> {
        let snapshot = self.snapshot()?;
        let at = to_absolute(&snapshot, pos);
        self.device
            .set_cursor(self.output, at)
            .map_err(ConsoleError::apply(Apply::Cursor(at)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::memory::{MemoryConsole, Primitive};

    fn snapshot_with_window(window: Rect) -> ScreenSnapshot {
        ScreenSnapshot {
            buffer: Size::new(120, 300),
            window,
            cursor: Coord::new(0, 0),
            attributes: StyleAttribute::CONSOLE_DEFAULT,
        }
    }

    #[test]
    fn test_translation_at_origin() {
        let snap = snapshot_with_window(Rect::new(0, 0, 79, 24));
        assert_eq!(to_absolute(&snap, Position::new(1, 1)), Coord::new(0, 0));
        assert_eq!(to_absolute(&snap, Position::new(80, 25)), Coord::new(79, 24));
    }

    #[test]
    fn test_translation_with_scrolled_window() {
        let snap = snapshot_with_window(Rect::new(10, 200, 89, 224));
        assert_eq!(to_absolute(&snap, Position::new(1, 1)), Coord::new(10, 200));
        assert_eq!(to_absolute(&snap, Position::new(5, 3)), Coord::new(14, 202));
        assert_eq!(to_relative(&snap, Coord::new(14, 202)), Position::new(5, 3));

        // Cursor above the visible window
        assert_eq!(to_relative(&snap, Coord::new(10, 150)), Position::new(1, -49));
    }

    #[test]
    fn test_translation_saturates() {
        let snap = snapshot_with_window(Rect::new(0, 0, 79, 24));
        let at = to_absolute(&snap, Position::new(i32::MAX, i32::MIN));
        assert_eq!(at, Coord::new(i16::MAX, i16::MIN));
    }

    #[test]
    fn test_translation_saturates_in_scrolled_window() {
        let snap = snapshot_with_window(Rect::new(5, 120, 44, 129));
        let at = to_absolute(&snap, Position::new(i32::MAX, i32::MAX));
        assert_eq!(at, Coord::new(i16::MAX, i16::MAX));
        let at = to_absolute(&snap, Position::new(i32::MIN, i32::MIN));
        assert_eq!(at, Coord::new(i16::MIN, i16::MIN));
    }

    #[test]
    fn test_visible_size_is_window_not_buffer() {
        let snap = snapshot_with_window(Rect::new(0, 100, 79, 129));
        assert_eq!(visible_size(&snap), Size::new(80, 30));
    }

    #[test]
    fn test_scroll_plan_covers_buffer() {
        let plan = scroll_plan(Size::new(80, 25), 3);
        assert_eq!(plan.scroll, Rect::new(0, 0, 79, 24));
        assert_eq!(plan.clip, plan.scroll);
        assert_eq!(plan.destination, Coord::new(0, -3));
    }

    #[test]
    fn test_cursor_round_trip() {
        let console = MemoryConsole::new(40, 10);
        let mut session = ConsoleSession::init(console).unwrap();

        for (x, y) in [(1, 1), (40, 10), (7, 3), (40, 1), (1, 10)] {
            session.set_cursor_position(Position::new(x, y)).unwrap();
            assert_eq!(session.current_position().unwrap(), Position::new(x, y));
        }
    }

    #[test]
    fn test_cursor_round_trip_after_user_scroll() {
        let console = MemoryConsole::with_buffer(Size::new(60, 200), Size::new(40, 10));
        let mut session = ConsoleSession::init(console).unwrap();

        // The user scrolls the window between calls
        session.device_mut().set_window(Rect::new(5, 120, 44, 129));

        session.set_cursor_position(Position::new(3, 4)).unwrap();
        assert_eq!(session.device().cursor(), Coord::new(7, 123));
        assert_eq!(session.current_position().unwrap(), Position::new(3, 4));
    }

    #[test]
    fn test_window_size_tracks_resize_by_user() {
        let console = MemoryConsole::with_buffer(Size::new(120, 300), Size::new(80, 25));
        let mut session = ConsoleSession::init(console).unwrap();
        assert_eq!(session.window_size().unwrap(), Size::new(80, 25));

        session.device_mut().set_window(Rect::new(0, 0, 99, 39));
        assert_eq!(session.window_size().unwrap(), Size::new(100, 40));
    }

    #[test]
    fn test_resize_buffer_leaves_window_alone() {
        let console = MemoryConsole::with_buffer(Size::new(80, 25), Size::new(80, 25));
        let mut session = ConsoleSession::init(console).unwrap();

        session.resize_buffer(Size::new(200, 500)).unwrap();

        // Buffer capacity grew, the visible window did not
        assert_eq!(session.window_size().unwrap(), Size::new(80, 25));
        assert_eq!(session.snapshot().unwrap().buffer, Size::new(200, 500));
    }

    #[test]
    fn test_resize_below_window_is_rejected() {
        let console = MemoryConsole::new(80, 25);
        let mut session = ConsoleSession::init(console).unwrap();

        let err = session.resize_buffer(Size::new(40, 10)).unwrap_err();
        assert_eq!(err.rejected(), Some(Apply::BufferSize(Size::new(40, 10))));
    }

    #[test]
    fn test_out_of_buffer_cursor_is_device_decision() {
        let console = MemoryConsole::new(10, 5);
        let mut session = ConsoleSession::init(console).unwrap();

        let err = session.set_cursor_position(Position::new(0, 1)).unwrap_err();
        assert_eq!(err.rejected(), Some(Apply::Cursor(Coord::new(-1, 0))));
    }

    #[test]
    fn test_huge_cursor_position_is_rejected() {
        let console = MemoryConsole::with_buffer(Size::new(60, 200), Size::new(40, 10));
        let mut session = ConsoleSession::init(console).unwrap();
        session.device_mut().set_window(Rect::new(5, 120, 44, 129));

        let err = session
            .set_cursor_position(Position::new(i32::MAX, 1))
            .unwrap_err();
        assert_eq!(err.rejected(), Some(Apply::Cursor(Coord::new(i16::MAX, 120))));
    }

    #[test]
    fn test_cursor_failure() {
        let console = MemoryConsole::with_buffer(Size::new(60, 200), Size::new(40, 10));
        let mut session = ConsoleSession::init(console).unwrap();
        session.device_mut().set_window(Rect::new(5, 120, 44, 129));
        session.device_mut().fail(Primitive::SetCursor);

        let err = session.set_cursor_position(Position::new(3, 4)).unwrap_err();
        assert_eq!(err.rejected(), Some(Apply::Cursor(Coord::new(7, 123))));
        assert_eq!(session.device().cursor(), Coord::new(0, 0));
        assert_eq!(session.device().window(), Rect::new(5, 120, 44, 129));
    }
}
