//! Buffer editor: character fills and scrolling.

use tracing::trace;

use super::device::{ConsoleDevice, StreamHandle};
use super::error::{Apply, ConsoleError, Result};
use super::geometry::{scroll_plan, to_absolute, Position};
use super::session::{ConsoleSession, SnapshotPolicy};

impl<D: ConsoleDevice> ConsoleSession<D> {
    /// Write `length` copies of `ch` from a window-relative position.
    ///
    /// Only characters change; cell attributes are left as they are. The
    /// device wraps across rows and stops at the end of the buffer, so the
    /// returned count can be smaller than `length`.
    pub fn fill_region_on(
        &mut self,
        handle: StreamHandle,
        ch: char,
        length: u32,
        pos: Position,
    ) -> Result<u32> {
        let snapshot = self.snapshot()?;
        let at = to_absolute(&snapshot, pos);
        let written = self
            .device
            .fill_characters(handle, ch, length, at)
            .map_err(ConsoleError::apply(Apply::Fill { ch, at }))?;
        trace!(?ch, length, written, x = at.x, y = at.y, "fill");
        Ok(written)
    }

    /// Shift the buffer contents up by `amount` rows, filling the rows left
    /// behind with the configured fill cell.
    pub fn scroll_up(&mut self, amount: u16) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let snapshot = match self.options.scroll_snapshot {
            SnapshotPolicy::Refresh => self.snapshot()?,
            SnapshotPolicy::LastFetched => self.last,
        };
        let plan = scroll_plan(snapshot.buffer, amount);
        trace!(amount, scroll = ?plan.scroll, "scroll up");
        self.device
            .scroll(
                self.output,
                plan.scroll,
                Some(plan.clip),
                plan.destination,
                self.options.scroll_fill,
            )
            .map_err(ConsoleError::apply(Apply::Scroll(amount)))
    }
}
