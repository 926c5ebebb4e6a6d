//! Iterative placer (C5): random descent and simulated annealing over a
//! discrete [`Chip`], both built from the same deterministic move
//! selection so that annealing with `hot -> 0` degenerates to random
//! descent given the same seed (§8, P8).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::chip::Chip;
use crate::error::PlacerError;
use crate::ids::AtomId;
use crate::metrics::MetricSink;
use crate::netlist::Netlist;

/// Picks a movable atom uniformly via a fair coin between LUT and FF, then
/// a target LUT/FF index uniformly in `[0, max_idx)`. Falls back to
/// whichever kind is non-empty if the coin picks an empty population.
fn random_move(rng: &mut StdRng, netlist: &Netlist, max_idx: usize) -> Option<(AtomId, usize)> {
    let want_lut = rng.gen::<bool>();
    let pool = if want_lut {
        if !netlist.luts().is_empty() {
            netlist.luts()
        } else {
            netlist.ffs()
        }
    } else if !netlist.ffs().is_empty() {
        netlist.ffs()
    } else {
        netlist.luts()
    };
    if pool.is_empty() || max_idx == 0 {
        return None;
    }
    let atom = pool[rng.gen_range(0..pool.len())];
    let target = rng.gen_range(0..max_idx);
    Some((atom, target))
}

/// Random descent: each iteration performs a random swap and undoes it if
/// the total cost worsened. `seed` makes the run reproducible.
pub fn random_placement(
    chip: &mut Chip,
    iterations: usize,
    seed: u64,
    sink: &mut MetricSink,
) -> Result<(), PlacerError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let max_idx = (chip.width() * chip.height()) / 2;

    sink.snapshot_chip(0, chip)?;
    for _ in 0..iterations {
        let Some((atom, target)) = random_move(&mut rng, chip.netlist(), max_idx) else {
            break;
        };
        let prev_bbox = chip.bbox();
        sink.record_iter(prev_bbox)?;
        let prev_idx = chip.swap(atom, target);
        if chip.bbox() > prev_bbox {
            chip.swap(atom, prev_idx);
        }
    }
    sink.snapshot_chip(iterations, chip)?;
    Ok(())
}

/// Simulated annealing: `outer` temperature steps of `inner` moves each,
/// starting at `hot` and multiplying by `cooling_factor` after every outer
/// step. Worsening moves of magnitude `delta` are accepted with
/// probability `exp(-delta / temperature)`.
pub fn simulated_annealing(
    chip: &mut Chip,
    outer: usize,
    inner: usize,
    hot: f64,
    cooling_factor: f64,
    seed: u64,
    sink: &mut MetricSink,
) -> Result<(), PlacerError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let max_idx = (chip.width() * chip.height()) / 2;
    let mut temperature = hot;

    sink.snapshot_chip(0, chip)?;
    for _ in 0..outer {
        for _ in 0..inner {
            let Some((atom, target)) = random_move(&mut rng, chip.netlist(), max_idx) else {
                break;
            };
            let prev_bbox = chip.bbox();
            sink.record_iter(prev_bbox)?;
            let prev_idx = chip.swap(atom, target);
            let delta = (chip.bbox() - prev_bbox) as f64;
            let accept = delta <= 0.0 || rng.gen::<f64>() < (-delta / temperature).exp();
            if !accept {
                chip.swap(atom, prev_idx);
            }
        }
        temperature *= cooling_factor;
    }
    sink.snapshot_chip(outer, chip)?;
    Ok(())
}
