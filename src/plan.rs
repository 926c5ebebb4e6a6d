//! Continuous placement (C3): per-atom real-valued coordinates, the
//! partition list used by the quadratic placer, and recursive geometric
//! partitioning.

use crate::error::PlacerError;
use crate::hpwl::{self, CoordSource};
use crate::ids::AtomId;
use crate::netlist::Netlist;

/// An axis-aligned rectangle bounding a partition's atoms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    /// Lower edge on the x (row) axis.
    pub x0: f64,
    /// Upper edge on the x (row) axis.
    pub x1: f64,
    /// Lower edge on the y (column) axis.
    pub y0: f64,
    /// Upper edge on the y (column) axis.
    pub y1: f64,
}

impl Bound {
    fn axis_range(self, axis: Axis) -> (f64, f64) {
        match axis {
            Axis::X => (self.x0, self.x1),
            Axis::Y => (self.y0, self.y1),
        }
    }

    fn with_axis_hi(self, axis: Axis, hi: f64) -> Bound {
        match axis {
            Axis::X => Bound { x1: hi, ..self },
            Axis::Y => Bound { y1: hi, ..self },
        }
    }

    fn with_axis_lo(self, axis: Axis, lo: f64) -> Bound {
        match axis {
            Axis::X => Bound { x0: lo, ..self },
            Axis::Y => Bound { y0: lo, ..self },
        }
    }

    /// Clamps a coordinate pair component-wise into this rectangle.
    pub fn clamp(self, x: f64, y: f64) -> (f64, f64) {
        (x.clamp(self.x0, self.x1), y.clamp(self.y0, self.y1))
    }
}

/// The axis a partitioning step splits along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Split horizontally: sort and divide on the x coordinate.
    X,
    /// Split vertically: sort and divide on the y coordinate.
    Y,
}

impl Axis {
    /// The axis alternated with this one across outer iterations.
    pub fn flip(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }
}

/// How the split coordinate along the chosen axis is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// The median atom's coordinate, clamped into the bound.
    Adaptive,
    /// The midpoint of the bound.
    Bisection,
}

/// Plan's two-state machine: unpartitioned, or partitioned after `k`
/// recursive splits (each split doubles the partition count).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanState {
    /// No split has occurred; a single partition spans every movable atom.
    Unpartitioned,
    /// `recursive_partition` has run this many times.
    Partitioned(u32),
}

/// The continuous placement: a Plan over the same netlist as a
/// [`crate::chip::Chip`], but with real-valued atom coordinates and a
/// partition/bound structure used by the quadratic placer.
#[derive(Debug)]
pub struct Plan<'n> {
    netlist: &'n Netlist,
    width: usize,
    height: usize,
    coords: Vec<(f64, f64)>,
    partitions: Vec<Vec<AtomId>>,
    bounds: Vec<Bound>,
    splits: u32,
}

impl<'n> Plan<'n> {
    /// Builds a Plan with every movable atom in a single partition, bound
    /// to the full chip rectangle: x (row axis) in `[0, height-1]`, y
    /// (column axis) in `[0, width-1]`, matching [`crate::chip::Chip`]'s
    /// coordinate system. Movable atoms start at the centre of that
    /// rectangle; border pins start at their fixed positions. Fails with
    /// [`PlacerError::InvalidDimensions`] under the same capacity and
    /// border-pin constraints as [`crate::chip::Chip::from_netlist`].
    pub fn from_netlist(
        width: usize,
        height: usize,
        netlist: &'n Netlist,
    ) -> Result<Self, PlacerError> {
        let luts = netlist.num_luts();
        let ffs = netlist.num_ffs();
        let ipins = netlist.num_ipins();
        let opins = netlist.num_opins();

        let capacity_ok = width * height >= 2 * luts.max(ffs);
        let ipins_ok = ipins == 0 || height >= ipins;
        let opins_ok = opins == 0 || height >= opins;
        if !capacity_ok || !ipins_ok || !opins_ok {
            return Err(PlacerError::InvalidDimensions {
                width,
                height,
                luts,
                ffs,
                ipins,
                opins,
            });
        }

        let total = netlist.total_atoms();
        let mut coords = vec![(0.0, 0.0); total];

        let centre_x = (height.saturating_sub(1)) as f64 / 2.0;
        let centre_y = (width.saturating_sub(1)) as f64 / 2.0;
        let movable: Vec<AtomId> = netlist.iter_movable().collect();
        for &atom in &movable {
            coords[atom.as_raw() as usize] = (centre_x, centre_y);
        }

        for (k, &atom) in netlist.ipins().iter().enumerate() {
            coords[atom.as_raw() as usize] = (-1.0, ((k * height) / ipins.max(1)) as f64);
        }
        for (k, &atom) in netlist.opins().iter().enumerate() {
            coords[atom.as_raw() as usize] = (width as f64, ((k * height) / opins.max(1)) as f64);
        }

        let full_bound = Bound {
            x0: 0.0,
            x1: (height.saturating_sub(1)) as f64,
            y0: 0.0,
            y1: (width.saturating_sub(1)) as f64,
        };

        Ok(Plan {
            netlist,
            width,
            height,
            coords,
            partitions: vec![movable],
            bounds: vec![full_bound],
            splits: 0,
        })
    }

    /// Grid width (the full chip's column count).
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height (the full chip's row count).
    pub fn height(&self) -> usize {
        self.height
    }

    /// The netlist this Plan places.
    pub fn netlist(&self) -> &'n Netlist {
        self.netlist
    }

    /// The current partitions, in order.
    pub fn partitions(&self) -> &[Vec<AtomId>] {
        &self.partitions
    }

    /// The bound rectangle for each partition, parallel to
    /// [`Plan::partitions`].
    pub fn bounds(&self) -> &[Bound] {
        &self.bounds
    }

    /// Current state: unpartitioned, or partitioned after `k` splits.
    pub fn state(&self) -> PlanState {
        if self.splits == 0 {
            PlanState::Unpartitioned
        } else {
            PlanState::Partitioned(self.splits)
        }
    }

    /// The coordinate of any movable atom or border pin. Fails with
    /// [`PlacerError::Unplaced`] for an atom id foreign to this Plan.
    pub fn get_coord(&self, atom: AtomId) -> Result<(f64, f64), PlacerError> {
        let idx = atom.as_raw() as usize;
        if idx >= self.coords.len() {
            return Err(PlacerError::Unplaced(atom));
        }
        Ok(self.coords[idx])
    }

    /// Updates the coordinates of every atom in partition `partition_idx`
    /// (in the partition's own order) and records the partition's bound.
    /// `coords` must be the same length as the partition.
    pub fn assign_coords(&mut self, partition_idx: usize, coords: &[(f64, f64)], bound: Bound) {
        let partition = &self.partitions[partition_idx];
        assert_eq!(partition.len(), coords.len());
        for (&atom, &(x, y)) in partition.iter().zip(coords) {
            self.coords[atom.as_raw() as usize] = (x, y);
        }
        self.bounds[partition_idx] = bound;
    }

    /// Total HPWL across every net, evaluated at the Plan's current
    /// real-valued coordinates.
    pub fn total_cost(&self) -> f64 {
        hpwl::total_cost(self, self.netlist)
    }

    /// Splits every non-empty partition into two equal halves along
    /// `axis`, sorted by `method`'s split coordinate. The lower half gets
    /// `⌊|P|/2⌋` atoms. Empty partitions pass through unsplit.
    pub fn recursive_partition(&mut self, axis: Axis, method: Method) {
        let mut new_partitions = Vec::with_capacity(self.partitions.len() * 2);
        let mut new_bounds = Vec::with_capacity(self.bounds.len() * 2);

        for (partition, bound) in self.partitions.drain(..).zip(self.bounds.drain(..)) {
            if partition.is_empty() {
                new_partitions.push(partition);
                new_bounds.push(bound);
                continue;
            }

            let mut sorted = partition;
            sorted.sort_by(|&a, &b| {
                let (ka, _) = coord_on_axis(&self.coords, a, axis);
                let (kb, _) = coord_on_axis(&self.coords, b, axis);
                ka.partial_cmp(&kb).unwrap()
            });

            let mid = sorted.len() / 2;
            let (lo, hi) = bound.axis_range(axis);
            let split = match method {
                Method::Adaptive => {
                    let median_atom = sorted[mid.min(sorted.len() - 1)];
                    let (v, _) = coord_on_axis(&self.coords, median_atom, axis);
                    v.clamp(lo, hi)
                }
                Method::Bisection => (lo + hi) / 2.0,
            };

            let lower: Vec<AtomId> = sorted[..mid].to_vec();
            let upper: Vec<AtomId> = sorted[mid..].to_vec();
            let lower_bound = bound.with_axis_hi(axis, split);
            let upper_bound = bound.with_axis_lo(axis, split);

            new_partitions.push(lower);
            new_bounds.push(lower_bound);
            new_partitions.push(upper);
            new_bounds.push(upper_bound);
        }

        self.partitions = new_partitions;
        self.bounds = new_bounds;
        self.splits += 1;
    }
}

fn coord_on_axis(coords: &[(f64, f64)], atom: AtomId, axis: Axis) -> (f64, f64) {
    let (x, y) = coords[atom.as_raw() as usize];
    match axis {
        Axis::X => (x, y),
        Axis::Y => (y, x),
    }
}

impl CoordSource for Plan<'_> {
    fn coord_of(&self, atom: AtomId) -> (f64, f64) {
        self.coords[atom.as_raw() as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_plan_is_one_partition_unpartitioned() {
        let nl = Netlist::new(0, 0, 5, 3, 1, 1, 16);
        let plan = Plan::from_netlist(10, 10, &nl).unwrap();
        assert_eq!(plan.partitions().len(), 1);
        assert_eq!(plan.partitions()[0].len(), 8);
        assert_eq!(plan.state(), PlanState::Unpartitioned);
    }

    #[test]
    fn from_netlist_rejects_undersized_grid() {
        let nl = Netlist::new(0, 0, 10, 10, 1, 1, 16);
        let err = Plan::from_netlist(2, 2, &nl).unwrap_err();
        assert!(matches!(err, PlacerError::InvalidDimensions { .. }));
    }

    #[test]
    fn from_netlist_rejects_too_few_rows_for_border_pins() {
        let nl = Netlist::new(5, 0, 1, 0, 1, 1, 16);
        let err = Plan::from_netlist(10, 2, &nl).unwrap_err();
        assert!(matches!(err, PlacerError::InvalidDimensions { .. }));
    }

    #[test]
    fn recursive_partition_doubles_count() {
        let nl = Netlist::new(0, 0, 8, 0, 1, 1, 16);
        let mut plan = Plan::from_netlist(10, 10, &nl).unwrap();
        plan.recursive_partition(Axis::X, Method::Bisection);
        assert_eq!(plan.partitions().len(), 2);
        assert_eq!(plan.state(), PlanState::Partitioned(1));
        plan.recursive_partition(Axis::Y, Method::Bisection);
        assert_eq!(plan.partitions().len(), 4);
        assert_eq!(plan.state(), PlanState::Partitioned(2));
    }

    #[test]
    fn recursive_partition_splits_lower_half_floor() {
        let nl = Netlist::new(0, 0, 5, 0, 1, 1, 16);
        let mut plan = Plan::from_netlist(10, 10, &nl).unwrap();
        plan.recursive_partition(Axis::X, Method::Bisection);
        assert_eq!(plan.partitions()[0].len(), 2);
        assert_eq!(plan.partitions()[1].len(), 3);
    }

    #[test]
    fn empty_partition_passes_through_unsplit() {
        let nl = Netlist::new(0, 0, 1, 0, 1, 1, 16);
        let mut plan = Plan::from_netlist(10, 10, &nl).unwrap();
        // Force two partitions, one of which is empty.
        plan.partitions.push(Vec::new());
        plan.bounds.push(plan.bounds[0]);
        plan.recursive_partition(Axis::X, Method::Bisection);
        assert!(plan.partitions().iter().any(|p| p.is_empty()));
    }

    #[test]
    fn assign_coords_updates_positions_and_bound() {
        let nl = Netlist::new(0, 0, 2, 0, 1, 1, 16);
        let mut plan = Plan::from_netlist(10, 10, &nl).unwrap();
        let atoms = plan.partitions()[0].clone();
        let new_bound = Bound {
            x0: 0.0,
            x1: 5.0,
            y0: 0.0,
            y1: 5.0,
        };
        plan.assign_coords(0, &[(1.0, 2.0), (3.0, 4.0)], new_bound);
        assert_eq!(plan.get_coord(atoms[0]).unwrap(), (1.0, 2.0));
        assert_eq!(plan.get_coord(atoms[1]).unwrap(), (3.0, 4.0));
        assert_eq!(plan.bounds()[0], new_bound);
    }

    #[test]
    fn bound_clamp_respects_rectangle() {
        let b = Bound {
            x0: 0.0,
            x1: 10.0,
            y0: 0.0,
            y1: 10.0,
        };
        assert_eq!(b.clamp(-5.0, 20.0), (0.0, 10.0));
        assert_eq!(b.clamp(3.0, 3.0), (3.0, 3.0));
    }

    #[test]
    fn axis_flip_alternates() {
        assert_eq!(Axis::X.flip(), Axis::Y);
        assert_eq!(Axis::Y.flip(), Axis::X);
    }
}
