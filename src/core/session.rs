//! Console session state
//!
//! One session per process. It owns the device, the standard output handle
//! and the attributes that were active before the program touched anything.

use tracing::{debug, warn};

use super::attr::StyleAttribute;
use super::device::{ConsoleDevice, FillCell, Stream, StreamHandle};
use super::error::{Apply, ConsoleError, Result};
use super::geometry::ScreenSnapshot;

/// Which snapshot `scroll_up` computes its rectangle from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapshotPolicy {
    /// Query the device first, like every other operation.
    #[default]
    Refresh,
    /// Reuse whatever snapshot was fetched last (init at the latest).
    LastFetched,
}

/// Tunables that do not come from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionOptions {
    pub scroll_fill: FillCell,
    pub scroll_snapshot: SnapshotPolicy,
}

/// The process-wide console session.
///
/// A value of this type only exists once [`ConsoleSession::init`] has
/// succeeded, so no operation can run against an uninitialized console.
/// Operations take `&mut self`; sharing a session between threads needs an
/// outer lock.
pub struct ConsoleSession<D> {
    pub(super) device: D,
    pub(super) output: StreamHandle,
    pub(super) original: StyleAttribute,
    pub(super) last: ScreenSnapshot,
    pub(super) options: SessionOptions,
}

impl<D: ConsoleDevice> ConsoleSession<D> {
    /// Acquire standard output and remember its current attributes.
    ///
    /// Intended to run once. There is no teardown; calling it again yields a
    /// second, independent session whose "original" attributes are whatever
    /// the first one left behind.
    pub fn init(mut device: D) -> Result<Self> {
        let output = device
            .std_handle(Stream::Output)
            .map_err(ConsoleError::DeviceUnavailable)?;
        let snapshot = device
            .screen_info(output)
            .map_err(ConsoleError::QueryFailed)?;

        debug!(
            handle = ?output,
            buffer = ?snapshot.buffer,
            window = ?snapshot.window,
            attributes = snapshot.attributes.bits(),
            "console session initialized"
        );

        Ok(Self {
            device,
            output,
            original: snapshot.attributes,
            last: snapshot,
            options: SessionOptions::default(),
        })
    }

    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Put back the attributes captured at init on the session's output.
    ///
    /// Call this on every exit path after changing style, error paths
    /// included, so the user's shell does not inherit our colors.
    pub fn restore(&mut self) -> Result<()> {
        self.device
            .set_attributes(self.output, self.original)
            .map_err(|e| {
                warn!(error = %e, "restoring original attributes failed");
                ConsoleError::ApplyFailed {
                    op: Apply::Restore(self.original),
                    source: e,
                }
            })
    }

    /// Query the device and remember the result as the last snapshot.
    pub fn snapshot(&mut self) -> Result<ScreenSnapshot> {
        let snapshot = self
            .device
            .screen_info(self.output)
            .map_err(ConsoleError::QueryFailed)?;
        self.last = snapshot;
        Ok(snapshot)
    }

    /// Resolve a standard stream, reusing the session handle for output.
    pub fn handle_for(&mut self, stream: Stream) -> Result<StreamHandle> {
        match stream {
            Stream::Output => Ok(self.output),
            other => self
                .device
                .std_handle(other)
                .map_err(ConsoleError::DeviceUnavailable),
        }
    }

    pub fn original_attributes(&self) -> StyleAttribute {
        self.original
    }

    pub fn output_handle(&self) -> StreamHandle {
        self.output
    }

    pub fn last_snapshot(&self) -> &ScreenSnapshot {
        &self.last
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Size;
    use crate::core::memory::{MemoryConsole, Primitive};

    #[test]
    fn test_init_captures_original_attributes() {
        let attrs = StyleAttribute::FOREGROUND_GREEN | StyleAttribute::BACKGROUND_BLUE;
        let console = MemoryConsole::new(80, 25).with_attributes(attrs);

        let session = ConsoleSession::init(console).unwrap();
        assert_eq!(session.original_attributes(), attrs);
        assert_eq!(session.last_snapshot().buffer, Size::new(80, 25));
    }

    #[test]
    fn test_init_without_console() {
        let mut console = MemoryConsole::new(80, 25);
        console.detach();

        let result = ConsoleSession::init(console);
        assert!(matches!(result, Err(ConsoleError::DeviceUnavailable(_))));
    }

    #[test]
    fn test_init_handle_failure() {
        let mut console = MemoryConsole::new(80, 25);
        console.fail(Primitive::StdHandle);

        let result = ConsoleSession::init(console);
        assert!(matches!(result, Err(ConsoleError::DeviceUnavailable(_))));
    }

    #[test]
    fn test_init_query_failure() {
        let mut console = MemoryConsole::new(80, 25);
        console.fail(Primitive::ScreenInfo);

        let result = ConsoleSession::init(console);
        assert!(matches!(result, Err(ConsoleError::QueryFailed(_))));
    }

    #[test]
    fn test_restore_failure() {
        let console = MemoryConsole::new(80, 25);
        let mut session = ConsoleSession::init(console).unwrap();
        session.device_mut().fail(Primitive::SetAttributes);

        let err = session.restore().unwrap_err();
        assert_eq!(
            err.rejected(),
            Some(Apply::Restore(StyleAttribute::CONSOLE_DEFAULT))
        );
    }

    #[test]
    fn test_query_failure_after_init() {
        let console = MemoryConsole::new(80, 25);
        let mut session = ConsoleSession::init(console).unwrap();
        session.device_mut().fail(Primitive::ScreenInfo);

        assert!(matches!(
            session.current_position(),
            Err(ConsoleError::QueryFailed(_))
        ));
        assert!(matches!(session.window_size(), Err(ConsoleError::QueryFailed(_))));

        session.device_mut().heal();
        assert!(session.window_size().is_ok());
    }

    #[test]
    fn test_error_stream_resolves_through_device() {
        let console = MemoryConsole::new(80, 25);
        let mut session = ConsoleSession::init(console).unwrap();

        let out = session.handle_for(Stream::Output).unwrap();
        let err = session.handle_for(Stream::Error).unwrap();
        assert_eq!(out, session.output_handle());
        assert_ne!(out, err);

        // Output keeps the handle acquired at init
        session.device_mut().fail(Primitive::StdHandle);
        assert_eq!(session.handle_for(Stream::Output).unwrap(), out);
        assert!(matches!(
            session.handle_for(Stream::Error),
            Err(ConsoleError::DeviceUnavailable(_))
        ));
    }
}
