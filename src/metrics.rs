//! Metric sink: a pair of write-only streams the placement engines report
//! progress to. Both streams are optional and best-effort; a flush failure
//! surfaces as [`crate::error::PlacerError::IoFailure`].

use std::io::Write;

use crate::chip::Chip;
use crate::error::PlacerError;
use crate::hpwl::CoordSource;
use crate::plan::Plan;

/// Borrowed write-only metric streams. `iter_stream` receives one line per
/// iterative-placer step (`"<prev_bbox>\n"`); `snapshot_stream` receives
/// periodic full-placement dumps from both the iterative and quadratic
/// placers.
pub struct MetricSink<'a> {
    iter_stream: Option<&'a mut dyn Write>,
    snapshot_stream: Option<&'a mut dyn Write>,
}

impl<'a> MetricSink<'a> {
    /// Builds a sink from zero, one, or both streams.
    pub fn new(
        iter_stream: Option<&'a mut dyn Write>,
        snapshot_stream: Option<&'a mut dyn Write>,
    ) -> Self {
        MetricSink {
            iter_stream,
            snapshot_stream,
        }
    }

    /// A sink with neither stream attached; placers treat this as "do
    /// nothing" rather than requiring callers to special-case `None`.
    pub fn none() -> Self {
        MetricSink {
            iter_stream: None,
            snapshot_stream: None,
        }
    }

    /// Records one iterative-placer step's pre-move cost.
    pub fn record_iter(&mut self, prev_bbox: i64) -> Result<(), PlacerError> {
        if let Some(stream) = self.iter_stream.as_deref_mut() {
            writeln!(stream, "{prev_bbox}")?;
        }
        Ok(())
    }

    /// Writes a full Chip snapshot: header `ss <step> (<W>,<H>):` followed
    /// by one `(<x>,<y>)` line per atom in netlist-iteration order.
    pub fn snapshot_chip(&mut self, step: usize, chip: &Chip) -> Result<(), PlacerError> {
        let Some(stream) = self.snapshot_stream.as_deref_mut() else {
            return Ok(());
        };
        writeln!(stream, "ss {step} ({},{}):", chip.width(), chip.height())?;
        for atom in chip.netlist().iter_in_netlist_order() {
            let (x, y) = chip.coord_of(atom)?;
            writeln!(stream, "({x},{y})")?;
        }
        Ok(())
    }

    /// Writes a full Plan snapshot, identical in shape to
    /// [`MetricSink::snapshot_chip`] but with floating-point coordinates.
    pub fn snapshot_plan(&mut self, step: usize, plan: &Plan) -> Result<(), PlacerError> {
        let Some(stream) = self.snapshot_stream.as_deref_mut() else {
            return Ok(());
        };
        writeln!(stream, "ss {step} ({},{}):", plan.width(), plan.height())?;
        for atom in plan.netlist().iter_in_netlist_order() {
            let (x, y) = plan.coord_of(atom);
            writeln!(stream, "({x},{y})")?;
        }
        Ok(())
    }
}
