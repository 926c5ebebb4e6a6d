//! Legalizer (C7): projects a [`Plan`]'s real-valued coordinates onto a
//! [`Chip`]'s discrete, parity-constrained grid.

use crate::chip::Chip;
use crate::error::PlacerError;
use crate::netlist::AtomKind;
use crate::plan::Plan;

/// Legalizes `plan` into a Chip: every movable atom's continuous
/// coordinate is rounded, clamped, and snapped onto the nearest free slot
/// of the correct parity.
pub fn legalize<'n>(plan: &Plan<'n>) -> Result<Chip<'n>, PlacerError> {
    let netlist = plan.netlist();
    let width = plan.width();
    let height = plan.height();
    let mut chip = Chip::new_empty(width, height, netlist);
    let total_slots = width * height;

    for atom in netlist.iter_movable() {
        let (x, y) = plan
            .get_coord(atom)
            .expect("every movable atom has a plan coordinate");

        let max_x = (height as f64 - 2.0).max(0.0);
        let max_y = (width as f64 - 2.0).max(0.0);
        let rx = x.round().clamp(0.0, max_x) as usize;
        let ry = y.round().clamp(0.0, max_y) as usize;
        let ori_idx = rx * width + ry;

        let wants_even = matches!(netlist.atom_kind(atom), AtomKind::Lut);
        let parity_ok = ori_idx.is_multiple_of(2) == wants_even;
        let start = if parity_ok { ori_idx } else { ori_idx + 1 };

        let slot = if !chip.slot_occupied(start) {
            start
        } else {
            find_free_slot(&chip, start, total_slots).ok_or(PlacerError::NoFreeSlot(atom))?
        };

        chip.insert(atom, slot);
    }

    chip.recompute_bbox();
    Ok(chip)
}

/// Walks the same-parity ladder from `start`: first downward by 2 until
/// exhausted, then upward by 2 from `start`. Returns the first free slot
/// found, or `None` if the entire ladder is taken.
fn find_free_slot(chip: &Chip, start: usize, total_slots: usize) -> Option<usize> {
    let mut idx = start;
    while idx >= 2 {
        idx -= 2;
        if !chip.slot_occupied(idx) {
            return Some(idx);
        }
    }

    let mut idx = start;
    loop {
        idx += 2;
        if idx >= total_slots {
            return None;
        }
        if !chip.slot_occupied(idx) {
            return Some(idx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hpwl;
    use crate::ids::AtomId;
    use crate::netlist::Netlist;

    #[test]
    fn legalize_places_every_atom() {
        let nl = Netlist::new(0, 0, 5, 5, 1, 1, 16);
        let plan = Plan::from_netlist(10, 10, &nl).unwrap();
        let chip = Chip::from_plan(&plan).unwrap();
        for &atom in nl.luts().iter().chain(nl.ffs()) {
            assert!(chip.coord_of(atom).is_ok());
        }
    }

    #[test]
    fn legalize_preserves_parity() {
        let nl = Netlist::new(0, 0, 10, 10, 1, 1, 16);
        let plan = Plan::from_netlist(10, 10, &nl).unwrap();
        let chip = Chip::from_plan(&plan).unwrap();
        for (i, &lut) in nl.luts().iter().enumerate() {
            let (x, y) = chip.coord_of(lut).unwrap();
            let slot = x as usize * chip.width() + y as usize;
            assert_eq!(slot % 2, 0, "lut {i} not on an even slot");
        }
        for (i, &ff) in nl.ffs().iter().enumerate() {
            let (x, y) = chip.coord_of(ff).unwrap();
            let slot = x as usize * chip.width() + y as usize;
            assert_eq!(slot % 2, 1, "ff {i} not on an odd slot");
        }
    }

    #[test]
    fn legalize_no_collisions() {
        let nl = Netlist::new(0, 0, 20, 20, 1, 1, 16);
        let mut plan = Plan::from_netlist(10, 10, &nl).unwrap();
        // Push every atom toward the same point to force ladder search.
        let atoms: Vec<AtomId> = plan.partitions()[0].clone();
        let coords: Vec<(f64, f64)> = atoms.iter().map(|_| (5.0, 5.0)).collect();
        let bound = plan.bounds()[0];
        plan.assign_coords(0, &coords, bound);

        let chip = Chip::from_plan(&plan).unwrap();
        let mut seen = std::collections::HashSet::new();
        for &atom in &atoms {
            let (x, y) = chip.coord_of(atom).unwrap();
            assert!(seen.insert((x, y)), "collision at ({x},{y})");
        }
    }

    #[test]
    fn legalized_chip_bbox_matches_recomputation() {
        let mut nl = Netlist::new(0, 0, 4, 0, 1, 1, 16);
        let src = nl.oports_of(nl.luts()[0])[0];
        let dst = nl.iports_of(nl.luts()[1])[0];
        nl.connect(src, dst).unwrap();
        let plan = Plan::from_netlist(10, 10, &nl).unwrap();
        let chip = Chip::from_plan(&plan).unwrap();
        let recomputed = hpwl::total_cost(&chip, &nl).round() as i64;
        assert_eq!(chip.bbox(), recomputed);
    }
}
