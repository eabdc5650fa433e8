//! Backend abstraction
//!
//! Callers program against [`TerminalBackend`]; which implementation they get
//! is decided once, at startup, by [`select`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ansi::AnsiBackend;
use crate::core::{
    ConsoleDevice, ConsoleSession, MemoryConsole, Position, Result, SessionOptions, Size, Stream,
};

/// The terminal-control operation set shared by every backend.
///
/// Style codes are backend-specific: a console attribute mask for the native
/// backend, an SGR parameter for the ANSI backend.
pub trait TerminalBackend {
    fn name(&self) -> &'static str;

    /// Return the terminal to the style it had at startup.
    fn restore(&mut self) -> Result<()>;

    fn set_style(&mut self, stream: Stream, code: u16) -> Result<()>;

    fn unset_style(&mut self, stream: Stream) -> Result<()>;

    fn current_position(&mut self) -> Result<Position>;

    fn window_size(&mut self) -> Result<Size>;

    fn resize_buffer(&mut self, size: Size) -> Result<()>;

    fn set_cursor_position(&mut self, pos: Position) -> Result<()>;

    fn fill_region(&mut self, stream: Stream, ch: char, length: u32, pos: Position) -> Result<u32>;

    fn scroll_up(&mut self, amount: u16) -> Result<()>;
}

impl<D: ConsoleDevice> TerminalBackend for ConsoleSession<D> {
    fn name(&self) -> &'static str {
        "native"
    }

    fn restore(&mut self) -> Result<()> {
        ConsoleSession::restore(self)
    }

    fn set_style(&mut self, stream: Stream, code: u16) -> Result<()> {
        let handle = self.handle_for(stream)?;
        self.set_style_on(handle, code)
    }

    fn unset_style(&mut self, stream: Stream) -> Result<()> {
        let handle = self.handle_for(stream)?;
        self.unset_style_on(handle)
    }

    fn current_position(&mut self) -> Result<Position> {
        ConsoleSession::current_position(self)
    }

    fn window_size(&mut self) -> Result<Size> {
        ConsoleSession::window_size(self)
    }

    fn resize_buffer(&mut self, size: Size) -> Result<()> {
        ConsoleSession::resize_buffer(self, size)
    }

    fn set_cursor_position(&mut self, pos: Position) -> Result<()> {
        ConsoleSession::set_cursor_position(self, pos)
    }

    fn fill_region(&mut self, stream: Stream, ch: char, length: u32, pos: Position) -> Result<u32> {
        let handle = self.handle_for(stream)?;
        self.fill_region_on(handle, ch, length, pos)
    }

    fn scroll_up(&mut self, amount: u16) -> Result<()> {
        ConsoleSession::scroll_up(self, amount)
    }
}

/// Which backend to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Native console when one is attached, ANSI otherwise
    #[default]
    Auto,
    Native,
    Ansi,
    /// In-memory console, no terminal output
    Memory,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "native" | "console" | "win32" => Ok(Self::Native),
            "ansi" | "vt" => Ok(Self::Ansi),
            "memory" | "mem" => Ok(Self::Memory),
            other => Err(format!("Unknown backend: {}", other)),
        }
    }
}

/// Default dimensions of the in-memory console.
pub const MEMORY_CONSOLE_SIZE: Size = Size::new(80, 25);

/// Build the backend for `kind`.
pub fn select(kind: BackendKind, options: SessionOptions) -> Result<Box<dyn TerminalBackend>> {
    let backend: Box<dyn TerminalBackend> = match kind {
        BackendKind::Native => native(options)?,
        BackendKind::Ansi => Box::new(AnsiBackend::stdio()),
        BackendKind::Memory => {
            let console = MemoryConsole::new(MEMORY_CONSOLE_SIZE.columns, MEMORY_CONSOLE_SIZE.rows);
            Box::new(ConsoleSession::init(console)?.with_options(options))
        }
        BackendKind::Auto => match native(options) {
            Ok(backend) => backend,
            Err(e) => {
                debug!(error = %e, "native console unavailable, using ANSI");
                Box::new(AnsiBackend::stdio())
            }
        },
    };
    info!(requested = ?kind, backend = backend.name(), "terminal backend selected");
    Ok(backend)
}

#[cfg(windows)]
fn native(options: SessionOptions) -> Result<Box<dyn TerminalBackend>> {
    use crate::core::Win32Console;

    let session = ConsoleSession::init(Win32Console::new())?;
    Ok(Box::new(session.with_options(options)))
}

#[cfg(not(windows))]
fn native(_options: SessionOptions) -> Result<Box<dyn TerminalBackend>> {
    use crate::core::ConsoleError;
    use std::io;

    Err(ConsoleError::DeviceUnavailable(io::Error::new(
        io::ErrorKind::Unsupported,
        "native console backend requires Windows",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StyleAttribute;

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!("auto".parse::<BackendKind>(), Ok(BackendKind::Auto));
        assert_eq!("Native".parse::<BackendKind>(), Ok(BackendKind::Native));
        assert_eq!("vt".parse::<BackendKind>(), Ok(BackendKind::Ansi));
        assert_eq!("mem".parse::<BackendKind>(), Ok(BackendKind::Memory));
        assert!("curses".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_memory_backend_through_trait() {
        let mut backend = select(BackendKind::Memory, SessionOptions::default()).unwrap();
        assert_eq!(backend.name(), "native");
        assert_eq!(backend.window_size().unwrap(), MEMORY_CONSOLE_SIZE);

        backend.set_cursor_position(Position::new(10, 4)).unwrap();
        assert_eq!(backend.current_position().unwrap(), Position::new(10, 4));

        assert_eq!(backend.fill_region(Stream::Error, '-', 80, Position::new(1, 2)).unwrap(), 80);
        backend.set_style(Stream::Output, 0x0E).unwrap();
        backend.unset_style(Stream::Output).unwrap();
        backend.scroll_up(2).unwrap();
        backend.restore().unwrap();
    }

    #[test]
    fn test_trait_object_over_session() {
        let console = MemoryConsole::new(10, 3);
        let session = ConsoleSession::init(console).unwrap();
        let mut backend: Box<dyn TerminalBackend> = Box::new(session);

        backend.set_style(Stream::Output, StyleAttribute::BACKGROUND_RED.bits()).unwrap();
        backend.resize_buffer(Size::new(20, 6)).unwrap();
        // Buffer grew, the visible window stayed 10x3
        assert_eq!(backend.window_size().unwrap(), Size::new(10, 3));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_native_requires_windows() {
        use crate::core::ConsoleError;

        let result = select(BackendKind::Native, SessionOptions::default());
        assert!(matches!(result, Err(ConsoleError::DeviceUnavailable(_))));
    }
}
