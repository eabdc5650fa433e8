//! In-memory console
//!
//! Emulates a native console screen buffer closely enough to exercise the
//! session: the window is a movable rectangle inside a larger buffer, fills
//! wrap across rows and stop at the end of the buffer, moving the cursor
//! drags the window along, and scrolling follows the scroll/clip/destination
//! rules of the native call. Used by the tests and by demo mode on hosts
//! without a Windows console.

use std::collections::HashSet;
use std::io;

use super::attr::StyleAttribute;
use super::device::{ConsoleDevice, FillCell, Stream, StreamHandle};
use super::geometry::{Coord, Rect, ScreenSnapshot, Size};

const OUTPUT: StreamHandle = StreamHandle(0x10);
const ERROR: StreamHandle = StreamHandle(0x14);

/// Device primitives that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    StdHandle,
    ScreenInfo,
    SetAttributes,
    SetBufferSize,
    SetCursor,
    FillCharacters,
    Scroll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub attributes: StyleAttribute,
}

pub struct MemoryConsole {
    buffer: Size,
    cells: Vec<Cell>,
    window: Rect,
    cursor: Coord,
    attributes: StyleAttribute,
    attached: bool,
    failing: HashSet<Primitive>,
}

impl MemoryConsole {
    /// A console whose buffer is exactly the visible window.
    pub fn new(columns: u16, rows: u16) -> Self {
        let size = Size::new(columns, rows);
        Self::with_buffer(size, size)
    }

    /// A buffer with scroll-back; the window starts at the buffer origin.
    pub fn with_buffer(buffer: Size, window: Size) -> Self {
        let attributes = StyleAttribute::CONSOLE_DEFAULT;
        let blank = Cell { ch: ' ', attributes };
        Self {
            buffer,
            cells: vec![blank; usize::from(buffer.columns) * usize::from(buffer.rows)],
            window: Rect::covering(Size::new(
                window.columns.min(buffer.columns),
                window.rows.min(buffer.rows),
            )),
            cursor: Coord::default(),
            attributes,
            attached: true,
            failing: HashSet::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: StyleAttribute) -> Self {
        self.attributes = attributes;
        for cell in &mut self.cells {
            cell.attributes = attributes;
        }
        self
    }

    /// Simulate the process having no console.
    pub fn detach(&mut self) {
        self.attached = false;
    }

    /// Make `primitive` fail until [`MemoryConsole::heal`].
    pub fn fail(&mut self, primitive: Primitive) {
        self.failing.insert(primitive);
    }

    pub fn heal(&mut self) {
        self.failing.clear();
    }

    /// Move or resize the visible window, as a user dragging the console would.
    pub fn set_window(&mut self, window: Rect) {
        self.window = window.intersect(&Rect::covering(self.buffer));
    }

    /// Reallocate the buffer without the native size checks.
    pub fn set_buffer(&mut self, size: Size) {
        let blank = Cell {
            ch: ' ',
            attributes: self.attributes,
        };
        let mut cells = vec![blank; usize::from(size.columns) * usize::from(size.rows)];
        let keep_cols = usize::from(size.columns.min(self.buffer.columns));
        let keep_rows = usize::from(size.rows.min(self.buffer.rows));
        for y in 0..keep_rows {
            let from = y * usize::from(self.buffer.columns);
            let to = y * usize::from(size.columns);
            cells[to..to + keep_cols].copy_from_slice(&self.cells[from..from + keep_cols]);
        }
        self.cells = cells;
        self.buffer = size;

        let bounds = Rect::covering(size);
        self.window = self.window.intersect(&bounds);
        self.cursor = Coord::new(
            self.cursor.x.min(bounds.right).max(0),
            self.cursor.y.min(bounds.bottom).max(0),
        );
    }

    /// Write text at an absolute position with the current attributes,
    /// clipped at the end of the row.
    pub fn write_str(&mut self, at: Coord, text: &str) {
        let attributes = self.attributes;
        for (i, ch) in text.chars().enumerate() {
            let x = i32::from(at.x) + i as i32;
            if x >= i32::from(self.buffer.columns) {
                break;
            }
            if let Some(idx) = self.index(Coord::new(x as i16, at.y)) {
                self.cells[idx] = Cell { ch, attributes };
            }
        }
    }

    /// Overwrite the attributes of one cell.
    pub fn paint(&mut self, at: Coord, attributes: StyleAttribute) {
        if let Some(idx) = self.index(at) {
            self.cells[idx].attributes = attributes;
        }
    }

    pub fn cell(&self, at: Coord) -> Option<Cell> {
        self.index(at).map(|idx| self.cells[idx])
    }

    /// Characters of buffer row `y`.
    pub fn row_text(&self, y: i16) -> String {
        (0..self.buffer.columns as i16)
            .filter_map(|x| self.cell(Coord::new(x, y)))
            .map(|cell| cell.ch)
            .collect()
    }

    /// The visible window as text, one line per row.
    pub fn window_text(&self) -> String {
        (self.window.top..=self.window.bottom)
            .map(|y| {
                let row = self.row_text(y);
                row.chars()
                    .skip(self.window.left as usize)
                    .take(self.window.width().max(0) as usize)
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn cursor(&self) -> Coord {
        self.cursor
    }

    pub fn attributes(&self) -> StyleAttribute {
        self.attributes
    }

    pub fn window(&self) -> Rect {
        self.window
    }

    fn index(&self, at: Coord) -> Option<usize> {
        if at.x < 0 || at.y < 0 {
            return None;
        }
        let (x, y) = (at.x as usize, at.y as usize);
        let (cols, rows) = (usize::from(self.buffer.columns), usize::from(self.buffer.rows));
        (x < cols && y < rows).then(|| y * cols + x)
    }

    fn check(&self, primitive: Primitive, handle: Option<StreamHandle>) -> io::Result<()> {
        if self.failing.contains(&primitive) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("{:?} failed", primitive),
            ));
        }
        if !self.attached {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no console attached"));
        }
        match handle {
            Some(h) if h != OUTPUT && h != ERROR => {
                Err(io::Error::new(io::ErrorKind::InvalidInput, "invalid handle"))
            }
            _ => Ok(()),
        }
    }

    fn invalid(msg: &'static str) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidInput, msg)
    }

    /// Scroll the window just far enough to show the cursor.
    fn follow_cursor(&mut self) {
        let w = &mut self.window;
        let dx = if self.cursor.x < w.left {
            self.cursor.x - w.left
        } else if self.cursor.x > w.right {
            self.cursor.x - w.right
        } else {
            0
        };
        let dy = if self.cursor.y < w.top {
            self.cursor.y - w.top
        } else if self.cursor.y > w.bottom {
            self.cursor.y - w.bottom
        } else {
            0
        };
        w.left += dx;
        w.right += dx;
        w.top += dy;
        w.bottom += dy;
    }
}

impl ConsoleDevice for MemoryConsole {
    fn std_handle(&mut self, stream: Stream) -> io::Result<StreamHandle> {
        self.check(Primitive::StdHandle, None)?;
        Ok(match stream {
            Stream::Output => OUTPUT,
            Stream::Error => ERROR,
        })
    }

    fn screen_info(&mut self, handle: StreamHandle) -> io::Result<ScreenSnapshot> {
        self.check(Primitive::ScreenInfo, Some(handle))?;
        Ok(ScreenSnapshot {
            buffer: self.buffer,
            window: self.window,
            cursor: self.cursor,
            attributes: self.attributes,
        })
    }

    fn set_attributes(&mut self, handle: StreamHandle, attributes: StyleAttribute) -> io::Result<()> {
        self.check(Primitive::SetAttributes, Some(handle))?;
        self.attributes = attributes;
        Ok(())
    }

    fn set_buffer_size(&mut self, handle: StreamHandle, size: Size) -> io::Result<()> {
        self.check(Primitive::SetBufferSize, Some(handle))?;
        // The buffer must stay at least as large as the window it holds
        if i32::from(size.columns) <= i32::from(self.window.right)
            || i32::from(size.rows) <= i32::from(self.window.bottom)
        {
            return Err(Self::invalid("buffer smaller than window"));
        }
        if size.columns > i16::MAX as u16 || size.rows > i16::MAX as u16 {
            return Err(Self::invalid("buffer too large"));
        }
        self.set_buffer(size);
        Ok(())
    }

    fn set_cursor(&mut self, handle: StreamHandle, at: Coord) -> io::Result<()> {
        self.check(Primitive::SetCursor, Some(handle))?;
        if self.index(at).is_none() {
            return Err(Self::invalid("cursor outside buffer"));
        }
        self.cursor = at;
        self.follow_cursor();
        Ok(())
    }

    fn fill_characters(
        &mut self,
        handle: StreamHandle,
        ch: char,
        length: u32,
        at: Coord,
    ) -> io::Result<u32> {
        self.check(Primitive::FillCharacters, Some(handle))?;
        let start = self.index(at).ok_or_else(|| Self::invalid("fill outside buffer"))?;
        let end = start.saturating_add(length as usize).min(self.cells.len());
        for cell in &mut self.cells[start..end] {
            cell.ch = ch;
        }
        Ok((end - start) as u32)
    }

    fn scroll(
        &mut self,
        handle: StreamHandle,
        scroll: Rect,
        clip: Option<Rect>,
        destination: Coord,
        fill: FillCell,
    ) -> io::Result<()> {
        self.check(Primitive::Scroll, Some(handle))?;
        let bounds = Rect::covering(self.buffer);
        let source = scroll.intersect(&bounds);
        if source.is_empty() {
            return Err(Self::invalid("scroll rectangle outside buffer"));
        }
        let clip = clip.map_or(bounds, |c| c.intersect(&bounds));
        let dx = i32::from(destination.x) - i32::from(source.left);
        let dy = i32::from(destination.y) - i32::from(source.top);

        let mut moved = Vec::with_capacity((source.width() * source.height()) as usize);
        for y in source.top..=source.bottom {
            for x in source.left..=source.right {
                let at = Coord::new(x, y);
                if let Some(cell) = self.cell(at) {
                    moved.push((at, cell));
                }
                if clip.contains(at) {
                    if let Some(idx) = self.index(at) {
                        self.cells[idx] = Cell {
                            ch: fill.ch,
                            attributes: fill.attributes,
                        };
                    }
                }
            }
        }

        for (from, cell) in moved {
            let (Ok(x), Ok(y)) = (
                i16::try_from(i32::from(from.x) + dx),
                i16::try_from(i32::from(from.y) + dy),
            ) else {
                continue;
            };
            let to = Coord::new(x, y);
            if clip.contains(to) {
                if let Some(idx) = self.index(to) {
                    self.cells[idx] = cell;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_drags_window() {
        let mut console = MemoryConsole::with_buffer(Size::new(20, 50), Size::new(10, 5));
        console.set_cursor(OUTPUT, Coord::new(3, 30)).unwrap();
        assert_eq!(console.window(), Rect::new(0, 26, 9, 30));

        console.set_cursor(OUTPUT, Coord::new(15, 27)).unwrap();
        assert_eq!(console.window(), Rect::new(6, 26, 15, 30));
    }

    #[test]
    fn test_resize_preserves_content() {
        let mut console = MemoryConsole::new(4, 2);
        console.write_str(Coord::new(0, 0), "abcd");
        console.write_str(Coord::new(0, 1), "efgh");

        console.set_buffer_size(OUTPUT, Size::new(6, 3)).unwrap();
        assert_eq!(console.row_text(0), "abcd  ");
        assert_eq!(console.row_text(1), "efgh  ");
        assert_eq!(console.row_text(2), "      ");
    }

    #[test]
    fn test_scroll_respects_clip() {
        let mut console = MemoryConsole::new(3, 3);
        console.write_str(Coord::new(0, 0), "aaa");
        console.write_str(Coord::new(0, 1), "bbb");
        console.write_str(Coord::new(0, 2), "ccc");

        // Only the bottom two rows may change
        let fill = FillCell { ch: '.', ..FillCell::default() };
        console
            .scroll(
                OUTPUT,
                Rect::new(0, 1, 2, 2),
                Some(Rect::new(0, 1, 2, 2)),
                Coord::new(0, 0),
                fill,
            )
            .unwrap();
        assert_eq!(console.row_text(0), "aaa");
        assert_eq!(console.row_text(1), "ccc");
        assert_eq!(console.row_text(2), "...");
    }

    #[test]
    fn test_unknown_handle_rejected() {
        let mut console = MemoryConsole::new(3, 3);
        assert!(console.screen_info(StreamHandle(-1)).is_err());
    }

    #[test]
    fn test_window_text() {
        let mut console = MemoryConsole::with_buffer(Size::new(6, 4), Size::new(3, 2));
        console.write_str(Coord::new(0, 1), "012345");
        console.write_str(Coord::new(0, 2), "abcdef");
        console.set_window(Rect::new(2, 1, 4, 2));
        assert_eq!(console.window_text(), "234\ncde");
    }
}
