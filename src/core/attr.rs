//! Attribute controller
//!
//! Native console attributes are a 16-bit mask of foreground/background
//! color bits plus a few line-drawing and decoration flags. Callers hand the
//! backend an opaque integer code, so unknown bits are kept as-is.

use bitflags::bitflags;
use tracing::{trace, warn};

use super::device::{ConsoleDevice, StreamHandle};
use super::error::{Apply, ConsoleError, Result};
use super::session::ConsoleSession;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct StyleAttribute: u16 {
        const FOREGROUND_BLUE          = 0x0001;
        const FOREGROUND_GREEN         = 0x0002;
        const FOREGROUND_RED           = 0x0004;
        const FOREGROUND_INTENSITY     = 0x0008;
        const BACKGROUND_BLUE          = 0x0010;
        const BACKGROUND_GREEN         = 0x0020;
        const BACKGROUND_RED           = 0x0040;
        const BACKGROUND_INTENSITY     = 0x0080;
        const COMMON_LVB_GRID_HORIZONTAL = 0x0400;
        const COMMON_LVB_GRID_LVERTICAL  = 0x0800;
        const COMMON_LVB_GRID_RVERTICAL  = 0x1000;
        const COMMON_LVB_REVERSE_VIDEO   = 0x4000;
        const COMMON_LVB_UNDERSCORE      = 0x8000;
    }
}

impl StyleAttribute {
    /// Light gray on black, the stock console default.
    pub const CONSOLE_DEFAULT: Self = Self::FOREGROUND_RED
        .union(Self::FOREGROUND_GREEN)
        .union(Self::FOREGROUND_BLUE);

    /// Interpret a caller-supplied style code, keeping bits we have no name for.
    pub const fn from_code(code: u16) -> Self {
        Self::from_bits_retain(code)
    }
}

impl<D: ConsoleDevice> ConsoleSession<D> {
    /// Apply `code` to the device behind `handle` right away.
    ///
    /// Failures are logged and returned; a caller coloring output can drop
    /// the error and keep writing.
    pub fn set_style_on(&mut self, handle: StreamHandle, code: u16) -> Result<()> {
        match self.device.set_attributes(handle, StyleAttribute::from_code(code)) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(code, handle = ?handle, error = %e, "set style failed");
                Err(ConsoleError::ApplyFailed {
                    op: Apply::Style(code),
                    source: e,
                })
            }
        }
    }

    /// Undo style changes on `handle`.
    ///
    /// The console only knows "current" and "original", so this always puts
    /// back the attributes captured at init, on the session's own output
    /// handle. There is no per-call-site stack.
    pub fn unset_style_on(&mut self, handle: StreamHandle) -> Result<()> {
        trace!(handle = ?handle, "unset style restores original attributes");
        self.restore()
    }
}
