//! Discrete placement (C2): the bijection between movable atoms and grid
//! slots, and incremental HPWL maintenance under single-atom swaps.

use crate::error::PlacerError;
use crate::hpwl::{self, CoordSource};
use crate::ids::{AtomId, OPortId};
use crate::netlist::{AtomKind, Netlist};

/// A discrete W×H placement grid. Slot index `i` maps to coordinate
/// `(i / W, i % W)`. Even slots host LUTs, odd slots host FFs. Border
/// IPIN/OPIN atoms sit outside the grid proper, at fixed positions
/// computed once at construction.
#[derive(Debug)]
pub struct Chip<'n> {
    netlist: &'n Netlist,
    width: usize,
    height: usize,
    /// `slot -> atom`, `None` for an empty slot.
    slot_atom: Vec<Option<AtomId>>,
    /// `atom -> slot`, `None` for atoms with no grid slot (border pins).
    atom_slot: Vec<Option<usize>>,
    /// Every atom's current coordinate, as `f64` so it can double as a
    /// [`CoordSource`] for the shared HPWL evaluator. Grid coordinates are
    /// small non-negative integers and border coordinates are small
    /// integers offset by one, both exactly representable in `f64`.
    coords: Vec<(f64, f64)>,
    /// Running total HPWL across every net, maintained incrementally by
    /// [`Chip::swap`].
    bbox: i64,
}

fn slot_to_coord(width: usize, slot: usize) -> (f64, f64) {
    ((slot / width) as f64, (slot % width) as f64)
}

fn border_coord(side_x: f64, height: usize, count: usize, k: usize) -> (f64, f64) {
    (side_x, ((k * height) / count) as f64)
}

impl<'n> Chip<'n> {
    /// Builds a Chip from a netlist with an initial deterministic
    /// placement: LUT `i` goes to slot `2i`, FF `i` to slot `2i+1`. Fails
    /// with [`PlacerError::InvalidDimensions`] if the grid cannot fit
    /// every LUT/FF at its parity-correct slot or every border pin at a
    /// distinct row.
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
        let mut slot_atom = vec![None; width * height];
        let mut atom_slot = vec![None; total];
        let mut coords = vec![(0.0, 0.0); total];

        for (i, &atom) in netlist.luts().iter().enumerate() {
            let slot = 2 * i;
            slot_atom[slot] = Some(atom);
            atom_slot[atom.as_raw() as usize] = Some(slot);
            coords[atom.as_raw() as usize] = slot_to_coord(width, slot);
        }
        for (i, &atom) in netlist.ffs().iter().enumerate() {
            let slot = 2 * i + 1;
            slot_atom[slot] = Some(atom);
            atom_slot[atom.as_raw() as usize] = Some(slot);
            coords[atom.as_raw() as usize] = slot_to_coord(width, slot);
        }
        for (k, &atom) in netlist.ipins().iter().enumerate() {
            coords[atom.as_raw() as usize] = border_coord(-1.0, height, ipins, k);
        }
        for (k, &atom) in netlist.opins().iter().enumerate() {
            coords[atom.as_raw() as usize] = border_coord(width as f64, height, opins, k);
        }

        let mut chip = Chip {
            netlist,
            width,
            height,
            slot_atom,
            atom_slot,
            coords,
            bbox: 0,
        };
        chip.bbox = hpwl::total_cost(&chip, netlist).round() as i64;
        Ok(chip)
    }

    /// Legalizes `plan` onto a freshly built Chip (§4.7).
    pub fn from_plan(plan: &crate::plan::Plan<'n>) -> Result<Self, PlacerError> {
        crate::legalize::legalize(plan)
    }

    /// Grid width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The netlist this Chip places.
    pub fn netlist(&self) -> &'n Netlist {
        self.netlist
    }

    /// The running total HPWL cost.
    pub fn bbox(&self) -> i64 {
        self.bbox
    }

    /// The integer coordinate of any placed atom or border pin. Fails with
    /// [`PlacerError::Unplaced`] for an atom id foreign to this Chip.
    pub fn coord_of(&self, atom: AtomId) -> Result<(i64, i64), PlacerError> {
        let idx = atom.as_raw() as usize;
        if idx >= self.coords.len() {
            return Err(PlacerError::Unplaced(atom));
        }
        let (x, y) = self.coords[idx];
        Ok((x.round() as i64, y.round() as i64))
    }

    fn slot_of(&self, atom: AtomId) -> usize {
        self.atom_slot[atom.as_raw() as usize].expect("movable atom always has a slot")
    }

    /// Builds an empty Chip with border pins placed but no LUTs/FFs
    /// assigned to slots yet. Used by the legalizer to build up a Chip
    /// slot-by-slot from a Plan.
    pub(crate) fn new_empty(width: usize, height: usize, netlist: &'n Netlist) -> Self {
        let total = netlist.total_atoms();
        let mut coords = vec![(0.0, 0.0); total];

        let ipins = netlist.num_ipins();
        for (k, &atom) in netlist.ipins().iter().enumerate() {
            coords[atom.as_raw() as usize] = border_coord(-1.0, height, ipins.max(1), k);
        }
        let opins = netlist.num_opins();
        for (k, &atom) in netlist.opins().iter().enumerate() {
            coords[atom.as_raw() as usize] = border_coord(width as f64, height, opins.max(1), k);
        }

        Chip {
            netlist,
            width,
            height,
            slot_atom: vec![None; width * height],
            atom_slot: vec![None; total],
            coords,
            bbox: 0,
        }
    }

    /// Whether `slot` currently holds an atom.
    pub(crate) fn slot_occupied(&self, slot: usize) -> bool {
        self.slot_atom[slot].is_some()
    }

    /// Places `atom` into `slot`, assumed free. Used by the legalizer.
    pub(crate) fn insert(&mut self, atom: AtomId, slot: usize) {
        self.place_at(atom, slot);
    }

    /// Recomputes `bbox` from scratch. Used by the legalizer once every
    /// atom has been inserted.
    pub(crate) fn recompute_bbox(&mut self) {
        self.bbox = hpwl::total_cost(self, self.netlist).round() as i64;
    }

    fn index_in_ladder(&self, kind: AtomKind, slot: usize) -> usize {
        match kind {
            AtomKind::Lut => slot / 2,
            AtomKind::Ff => (slot - 1) / 2,
            _ => unreachable!("only LUTs and FFs occupy grid slots"),
        }
    }

    fn place_at(&mut self, atom: AtomId, slot: usize) {
        self.slot_atom[slot] = Some(atom);
        self.atom_slot[atom.as_raw() as usize] = Some(slot);
        self.coords[atom.as_raw() as usize] = slot_to_coord(self.width, slot);
    }

    fn nets_touching(&self, atoms: &[AtomId]) -> Vec<OPortId> {
        let mut seen = std::collections::HashSet::new();
        let mut nets = Vec::new();
        for &atom in atoms {
            for net in hpwl::affected_nets(self.netlist, atom) {
                if seen.insert(net.as_raw()) {
                    nets.push(net);
                }
            }
        }
        nets
    }

    fn sum_nets(&self, nets: &[OPortId]) -> f64 {
        nets.iter()
            .map(|&n| hpwl::bbox_for_net(self, self.netlist, n))
            .sum()
    }

    /// Moves `atom` to the slot addressed by `target_idx` (a LUT index if
    /// `atom` is a LUT, an FF index otherwise), exchanging places with
    /// whoever occupies that slot, if anyone. Returns the LUT/FF index
    /// `atom` previously occupied. `bbox` is updated incrementally by
    /// summing only the nets touching `atom` or its swap partner, before
    /// and after the move.
    pub fn swap(&mut self, atom: AtomId, target_idx: usize) -> usize {
        let kind = self.netlist.atom_kind(atom);
        let target_slot = match kind {
            AtomKind::Lut => 2 * target_idx,
            AtomKind::Ff => 2 * target_idx + 1,
            _ => unreachable!("only LUTs and FFs are swappable"),
        };
        let prev_slot = self.slot_of(atom);

        if prev_slot == target_slot {
            return target_idx;
        }

        let victim = self.slot_atom[target_slot];
        let mut touched = vec![atom];
        if let Some(v) = victim {
            touched.push(v);
        }
        let nets = self.nets_touching(&touched);
        let before = self.sum_nets(&nets);

        let prev_idx = self.index_in_ladder(kind, prev_slot);

        self.place_at(atom, target_slot);
        match victim {
            Some(v) => self.place_at(v, prev_slot),
            None => self.slot_atom[prev_slot] = None,
        }

        let after = self.sum_nets(&nets);
        self.bbox += (after - before).round() as i64;

        prev_idx
    }
}

impl CoordSource for Chip<'_> {
    fn coord_of(&self, atom: AtomId) -> (f64, f64) {
        self.coords[atom.as_raw() as usize]
    }
}
