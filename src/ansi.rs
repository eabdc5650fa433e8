//! ANSI backend using crossterm
//!
//! Style codes are SGR parameters. Cursor, scroll and resize requests become
//! crossterm commands queued on the stream and flushed right away.

use std::io::{self, Write};

use crossterm::{
    cursor::{MoveTo, RestorePosition, SavePosition},
    queue,
    style::{Attribute, Color, Print, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{self, ScrollUp, SetSize},
};
use tracing::warn;
use unicode_width::UnicodeWidthChar;

use crate::backend::TerminalBackend;
use crate::core::geometry::clamp_i16;
use crate::core::{Apply, ConsoleError, Coord, Position, Result, Size, Stream};

/// What a single SGR parameter turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sgr {
    Attribute(Attribute),
    Foreground(Color),
    Background(Color),
}

/// Map an SGR parameter to a crossterm style change.
pub fn sgr(code: u16) -> Option<Sgr> {
    let attr = |a| Some(Sgr::Attribute(a));
    match code {
        0 => attr(Attribute::Reset),
        1 => attr(Attribute::Bold),
        2 => attr(Attribute::Dim),
        3 => attr(Attribute::Italic),
        4 => attr(Attribute::Underlined),
        5 => attr(Attribute::SlowBlink),
        7 => attr(Attribute::Reverse),
        8 => attr(Attribute::Hidden),
        9 => attr(Attribute::CrossedOut),
        22 => attr(Attribute::NormalIntensity),
        23 => attr(Attribute::NoItalic),
        24 => attr(Attribute::NoUnderline),
        25 => attr(Attribute::NoBlink),
        27 => attr(Attribute::NoReverse),
        28 => attr(Attribute::NoHidden),
        29 => attr(Attribute::NotCrossedOut),
        30..=37 => Some(Sgr::Foreground(Color::AnsiValue((code - 30) as u8))),
        39 => Some(Sgr::Foreground(Color::Reset)),
        40..=47 => Some(Sgr::Background(Color::AnsiValue((code - 40) as u8))),
        49 => Some(Sgr::Background(Color::Reset)),
        90..=97 => Some(Sgr::Foreground(Color::AnsiValue((code - 90 + 8) as u8))),
        100..=107 => Some(Sgr::Background(Color::AnsiValue((code - 100 + 8) as u8))),
        _ => None,
    }
}

/// Terminal driven by escape sequences.
pub struct AnsiBackend<W: Write> {
    out: W,
    err: W,
    /// Fixed column count; queried from the terminal when unset
    columns: Option<u16>,
}

impl AnsiBackend<Box<dyn Write + Send>> {
    /// Backend on the process's stdout and stderr.
    pub fn stdio() -> Self {
        Self::new(Box::new(io::stdout()), Box::new(io::stderr()))
    }
}

impl<W: Write> AnsiBackend<W> {
    pub fn new(out: W, err: W) -> Self {
        Self {
            out,
            err,
            columns: None,
        }
    }

    /// Clip fills against `columns` instead of asking the terminal.
    pub fn with_columns(mut self, columns: u16) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn into_inner(self) -> (W, W) {
        (self.out, self.err)
    }

    fn stream(&mut self, stream: Stream) -> &mut W {
        match stream {
            Stream::Output => &mut self.out,
            Stream::Error => &mut self.err,
        }
    }

    fn columns(&self) -> Result<u16> {
        match self.columns {
            Some(columns) => Ok(columns),
            None => terminal::size()
                .map(|(columns, _)| columns)
                .map_err(ConsoleError::QueryFailed),
        }
    }

    fn reset(&mut self, stream: Stream) -> Result<()> {
        let w = self.stream(stream);
        queue!(w, SetAttribute(Attribute::Reset)).map_err(ConsoleError::Write)?;
        w.flush().map_err(ConsoleError::Write)
    }
}

/// 0-based terminal cell for a 1-based position, if it has one.
fn cell(pos: Position) -> Option<(u16, u16)> {
    let x = u16::try_from(i64::from(pos.x) - 1).ok()?;
    let y = u16::try_from(i64::from(pos.y) - 1).ok()?;
    Some((x, y))
}

/// 0-based coordinate for error reporting, saturated to `i16`.
fn attempted(pos: Position) -> Coord {
    Coord::new(
        clamp_i16(i64::from(pos.x) - 1),
        clamp_i16(i64::from(pos.y) - 1),
    )
}

fn out_of_range(pos: Position) -> ConsoleError {
    ConsoleError::ApplyFailed {
        op: Apply::Cursor(attempted(pos)),
        source: io::Error::new(io::ErrorKind::InvalidInput, "position outside terminal"),
    }
}

impl<W: Write> TerminalBackend for AnsiBackend<W> {
    fn name(&self) -> &'static str {
        "ansi"
    }

    fn restore(&mut self) -> Result<()> {
        self.reset(Stream::Output)
    }

    fn set_style(&mut self, stream: Stream, code: u16) -> Result<()> {
        let Some(change) = sgr(code) else {
            warn!(code, "unsupported SGR parameter");
            return Err(ConsoleError::ApplyFailed {
                op: Apply::Style(code),
                source: io::Error::new(io::ErrorKind::InvalidInput, "unsupported SGR parameter"),
            });
        };
        let w = self.stream(stream);
        let queued = match change {
            Sgr::Attribute(a) => queue!(w, SetAttribute(a)),
            Sgr::Foreground(c) => queue!(w, SetForegroundColor(c)),
            Sgr::Background(c) => queue!(w, SetBackgroundColor(c)),
        };
        queued.map_err(ConsoleError::Write)?;
        w.flush().map_err(ConsoleError::Write)
    }

    fn unset_style(&mut self, stream: Stream) -> Result<()> {
        self.reset(stream)
    }

    fn current_position(&mut self) -> Result<Position> {
        let (x, y) = crossterm::cursor::position().map_err(ConsoleError::QueryFailed)?;
        Ok(Position::new(i32::from(x) + 1, i32::from(y) + 1))
    }

    fn window_size(&mut self) -> Result<Size> {
        let (columns, rows) = terminal::size().map_err(ConsoleError::QueryFailed)?;
        Ok(Size::new(columns, rows))
    }

    fn resize_buffer(&mut self, size: Size) -> Result<()> {
        let w = &mut self.out;
        queue!(w, SetSize(size.columns, size.rows)).map_err(ConsoleError::Write)?;
        w.flush().map_err(ConsoleError::Write)
    }

    fn set_cursor_position(&mut self, pos: Position) -> Result<()> {
        let (x, y) = cell(pos).ok_or_else(|| out_of_range(pos))?;
        let w = &mut self.out;
        queue!(w, MoveTo(x, y)).map_err(ConsoleError::Write)?;
        w.flush().map_err(ConsoleError::Write)
    }

    /// Fills stop at the right edge of the window; the cursor is put back
    /// where it was.
    fn fill_region(&mut self, stream: Stream, ch: char, length: u32, pos: Position) -> Result<u32> {
        let (x, y) = cell(pos).ok_or_else(|| out_of_range(pos))?;
        let width = match ch.width() {
            Some(w) if w > 0 => w as u32,
            _ => {
                return Err(ConsoleError::ApplyFailed {
                    op: Apply::Fill {
                        ch,
                        at: attempted(pos),
                    },
                    source: io::Error::new(io::ErrorKind::InvalidInput, "character has no width"),
                })
            }
        };
        let remaining = u32::from(self.columns()?.saturating_sub(x));
        let count = length.min(remaining / width);
        if count == 0 {
            return Ok(0);
        }

        let run: String = std::iter::repeat(ch).take(count as usize).collect();
        let w = self.stream(stream);
        queue!(w, SavePosition, MoveTo(x, y), Print(run), RestorePosition)
            .map_err(ConsoleError::Write)?;
        w.flush().map_err(ConsoleError::Write)?;
        Ok(count)
    }

    fn scroll_up(&mut self, amount: u16) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let w = &mut self.out;
        queue!(w, ScrollUp(amount)).map_err(ConsoleError::Write)?;
        w.flush().map_err(ConsoleError::Write)
    }
}
