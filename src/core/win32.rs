//! Windows console device
//!
//! Thin wrapper over the Win32 console API. Handles come from
//! `GetStdHandle` and are owned by the process, so nothing is closed here.

use std::io;

use windows::Win32::Foundation::HANDLE;
use windows::Win32::System::Console::{
    FillConsoleOutputCharacterW, GetConsoleScreenBufferInfo, GetStdHandle,
    ScrollConsoleScreenBufferW, SetConsoleCursorPosition, SetConsoleScreenBufferSize,
    SetConsoleTextAttribute, CHAR_INFO, CHAR_INFO_0, CONSOLE_CHARACTER_ATTRIBUTES,
    CONSOLE_SCREEN_BUFFER_INFO, COORD, SMALL_RECT, STD_ERROR_HANDLE, STD_OUTPUT_HANDLE,
};

use super::attr::StyleAttribute;
use super::device::{ConsoleDevice, FillCell, Stream, StreamHandle};
use super::geometry::{Coord, Rect, ScreenSnapshot, Size};

fn os_error(e: windows::core::Error) -> io::Error {
    io::Error::from_raw_os_error(e.code().0)
}

fn raw(handle: StreamHandle) -> HANDLE {
    HANDLE(handle.0 as _)
}

fn coord(at: Coord) -> COORD {
    COORD { X: at.x, Y: at.y }
}

fn small_rect(r: Rect) -> SMALL_RECT {
    SMALL_RECT {
        Left: r.left,
        Top: r.top,
        Right: r.right,
        Bottom: r.bottom,
    }
}

/// UTF-16 code unit for a console cell. Cells hold one unit, so characters
/// outside the BMP cannot be written.
fn cell_unit(ch: char) -> io::Result<u16> {
    let mut units = [0u16; 2];
    match ch.encode_utf16(&mut units) {
        [unit] => Ok(*unit),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "character does not fit in a console cell",
        )),
    }
}

/// The real Windows console.
#[derive(Debug, Default)]
pub struct Win32Console;

impl Win32Console {
    pub fn new() -> Self {
        Self
    }
}

impl ConsoleDevice for Win32Console {
    fn std_handle(&mut self, stream: Stream) -> io::Result<StreamHandle> {
        let which = match stream {
            Stream::Output => STD_OUTPUT_HANDLE,
            Stream::Error => STD_ERROR_HANDLE,
        };
        let handle = unsafe { GetStdHandle(which) }.map_err(os_error)?;
        // A process without a console gets a null handle rather than an error
        if handle.is_invalid() || handle.0 as isize == 0 {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "no console attached to standard handle",
            ));
        }
        Ok(StreamHandle(handle.0 as isize))
    }

    fn screen_info(&mut self, handle: StreamHandle) -> io::Result<ScreenSnapshot> {
        let mut info = CONSOLE_SCREEN_BUFFER_INFO::default();
        unsafe { GetConsoleScreenBufferInfo(raw(handle), &mut info) }.map_err(os_error)?;

        Ok(ScreenSnapshot {
            buffer: Size::new(info.dwSize.X.max(0) as u16, info.dwSize.Y.max(0) as u16),
            window: Rect::new(
                info.srWindow.Left,
                info.srWindow.Top,
                info.srWindow.Right,
                info.srWindow.Bottom,
            ),
            cursor: Coord::new(info.dwCursorPosition.X, info.dwCursorPosition.Y),
            attributes: StyleAttribute::from_code(info.wAttributes.0),
        })
    }

    fn set_attributes(&mut self, handle: StreamHandle, attributes: StyleAttribute) -> io::Result<()> {
        unsafe { SetConsoleTextAttribute(raw(handle), CONSOLE_CHARACTER_ATTRIBUTES(attributes.bits())) }
            .map_err(os_error)
    }

    fn set_buffer_size(&mut self, handle: StreamHandle, size: Size) -> io::Result<()> {
        let dims = COORD {
            X: i16::try_from(size.columns).unwrap_or(i16::MAX),
            Y: i16::try_from(size.rows).unwrap_or(i16::MAX),
        };
        unsafe { SetConsoleScreenBufferSize(raw(handle), dims) }.map_err(os_error)
    }

    fn set_cursor(&mut self, handle: StreamHandle, at: Coord) -> io::Result<()> {
        unsafe { SetConsoleCursorPosition(raw(handle), coord(at)) }.map_err(os_error)
    }

    fn fill_characters(
        &mut self,
        handle: StreamHandle,
        ch: char,
        length: u32,
        at: Coord,
    ) -> io::Result<u32> {
        let unit = cell_unit(ch)?;
        let mut written: u32 = 0;
        unsafe { FillConsoleOutputCharacterW(raw(handle), unit, length, coord(at), &mut written) }
            .map_err(os_error)?;
        Ok(written)
    }

    fn scroll(
        &mut self,
        handle: StreamHandle,
        scroll: Rect,
        clip: Option<Rect>,
        destination: Coord,
        fill: FillCell,
    ) -> io::Result<()> {
        let scroll = small_rect(scroll);
        let clip = clip.map(small_rect);
        let fill = CHAR_INFO {
            Char: CHAR_INFO_0 {
                UnicodeChar: cell_unit(fill.ch)?,
            },
            Attributes: fill.attributes.bits(),
        };

        unsafe {
            ScrollConsoleScreenBufferW(
                raw(handle),
                &scroll,
                clip.as_ref().map(|c| c as *const SMALL_RECT),
                coord(destination),
                &fill,
            )
        }
        .map_err(os_error)
    }
}
