//! Quadratic placer (C6): recursive partitioning plus a per-partition
//! linear solve that pulls each atom toward the weighted average position
//! of its neighbors, anchored by out-of-partition connections.

use std::collections::HashMap;

use nalgebra::{DMatrix, DVector};

use crate::error::PlacerError;
use crate::ids::AtomId;
use crate::metrics::MetricSink;
use crate::netlist::{AtomKind, Netlist};
use crate::plan::{Axis, Bound, Method, Plan};

/// Runs `outer_iterations` rounds of partition + solve, starting from a
/// single partition spanning every movable atom. The first round solves
/// without partitioning; each subsequent round partitions first, along an
/// axis that alternates every round.
pub fn quadratic_placement<'n>(
    width: usize,
    height: usize,
    netlist: &'n Netlist,
    outer_iterations: usize,
    method: Method,
    expected_phases: f64,
    sink: &mut MetricSink,
) -> Result<Plan<'n>, PlacerError> {
    let mut plan = Plan::from_netlist(width, height, netlist)?;
    let mut axis = Axis::X;
    let avg_fanin = average_ipin_fanout(netlist);

    for r in 0..outer_iterations {
        if r > 0 {
            plan.recursive_partition(axis, method);
            axis = axis.flip();
        }
        solve_all_partitions(&mut plan, netlist, expected_phases, avg_fanin);
        sink.snapshot_plan(r, &plan)?;
    }
    Ok(plan)
}

/// Mean fanout count across every IPIN's output port — the `avg_fanin`
/// weighting applied to OPIN anchors (§4.6).
fn average_ipin_fanout(netlist: &Netlist) -> f64 {
    let ipins = netlist.ipins();
    if ipins.is_empty() {
        return 1.0;
    }
    let total: usize = ipins
        .iter()
        .flat_map(|&atom| netlist.oports_of(atom))
        .map(|&oport| netlist.net_size(oport))
        .sum();
    total as f64 / ipins.len() as f64
}

type PartitionSolution = (usize, Vec<(f64, f64)>, Bound);

fn solve_all_partitions(plan: &mut Plan, netlist: &Netlist, expected_phases: f64, avg_fanin: f64) {
    let solved: Vec<PartitionSolution> = plan
        .partitions()
        .iter()
        .zip(plan.bounds().iter())
        .enumerate()
        .filter(|(_, (partition, _))| !partition.is_empty())
        .map(|(idx, (partition, &bound))| {
            let coords = solve_partition(plan, netlist, partition, bound, expected_phases, avg_fanin);
            (idx, coords, bound)
        })
        .collect();

    for (idx, coords, bound) in solved {
        plan.assign_coords(idx, &coords, bound);
    }
}

fn solve_partition(
    plan: &Plan,
    netlist: &Netlist,
    partition: &[AtomId],
    bound: Bound,
    expected_phases: f64,
    avg_fanin: f64,
) -> Vec<(f64, f64)> {
    let (a, bx, by) = build_system(plan, netlist, partition, bound, expected_phases, avg_fanin);

    let x_sol = solve_symmetric_tolerant(&a, &bx);
    let y_sol = solve_symmetric_tolerant(&a, &by);

    (0..partition.len()).map(|i| (x_sol[i], y_sol[i])).collect()
}

/// Builds the per-partition matrix `A` and right-hand sides `bx`/`by`
/// (§4.6): in-partition neighbors contribute edge-weighted Laplacian
/// entries, out-of-partition neighbors contribute an anchor term to the
/// diagonal and RHS only.
fn build_system(
    plan: &Plan,
    netlist: &Netlist,
    partition: &[AtomId],
    bound: Bound,
    expected_phases: f64,
    avg_fanin: f64,
) -> (DMatrix<f64>, DVector<f64>, DVector<f64>) {
    let n = partition.len();
    let index_of: HashMap<u32, usize> = partition
        .iter()
        .enumerate()
        .map(|(i, a)| (a.as_raw(), i))
        .collect();

    let mut a = DMatrix::<f64>::zeros(n, n);
    let mut bx = DVector::<f64>::zeros(n);
    let mut by = DVector::<f64>::zeros(n);

    for (i, &atom) in partition.iter().enumerate() {
        for &iport in netlist.iports_of(atom) {
            let Some(fanin) = netlist.fanin(iport) else {
                continue;
            };
            let target = netlist.oport_atom(fanin);
            let size = netlist.net_size(fanin);
            if size == 0 || target == atom {
                continue;
            }
            let w = 1.0 / size as f64;
            register_target(
                i,
                target,
                w,
                &index_of,
                plan,
                netlist,
                bound,
                expected_phases,
                avg_fanin,
                &mut a,
                &mut bx,
                &mut by,
            );
        }
        for &oport in netlist.oports_of(atom) {
            let size = netlist.net_size(oport);
            if size == 0 {
                continue;
            }
            let w = 1.0 / size as f64;
            for &sink_iport in netlist.fanouts(oport) {
                let target = netlist.iport_atom(sink_iport);
                if target == atom {
                    continue;
                }
                register_target(
                    i,
                    target,
                    w,
                    &index_of,
                    plan,
                    netlist,
                    bound,
                    expected_phases,
                    avg_fanin,
                    &mut a,
                    &mut bx,
                    &mut by,
                );
            }
        }
    }

    (a, bx, by)
}

#[allow(clippy::too_many_arguments)]
fn register_target(
    i: usize,
    target: AtomId,
    w: f64,
    index_of: &HashMap<u32, usize>,
    plan: &Plan,
    netlist: &Netlist,
    bound: Bound,
    expected_phases: f64,
    avg_fanin: f64,
    a: &mut DMatrix<f64>,
    bx: &mut DVector<f64>,
    by: &mut DVector<f64>,
) {
    if let Some(&j) = index_of.get(&target.as_raw()) {
        a[(i, i)] += w;
        a[(i, j)] -= w;
        return;
    }

    let (tx, ty) = plan.get_coord(target).unwrap_or((0.0, 0.0));
    let (tx, ty) = bound.clamp(tx, ty);

    let mut anchor_w = w / expected_phases;
    if netlist.atom_kind(target) == AtomKind::OPin {
        anchor_w *= avg_fanin;
    }

    a[(i, i)] += anchor_w;
    bx[i] += anchor_w * tx;
    by[i] += anchor_w * ty;
}

/// Solves `A x = b` by Gaussian elimination, treating a near-zero pivot as
/// "this variable is undetermined by the system" and leaving its solution
/// component at zero rather than failing — the behavior an isolated,
/// unanchored atom needs (its row and column are all-zero, so it should
/// land at `(0, 0)`, not propagate a singular-matrix error).
fn solve_symmetric_tolerant(a: &DMatrix<f64>, b: &DVector<f64>) -> DVector<f64> {
    const EPS: f64 = 1e-12;
    let n = b.len();
    let mut m = a.clone();
    let mut rhs = b.clone();
    let mut x = DVector::zeros(n);

    for k in 0..n {
        let pivot = m[(k, k)];
        if pivot.abs() < EPS {
            continue;
        }
        for i in (k + 1)..n {
            let factor = m[(i, k)] / pivot;
            if factor == 0.0 {
                continue;
            }
            for j in k..n {
                m[(i, j)] -= factor * m[(k, j)];
            }
            rhs[i] -= factor * rhs[k];
        }
    }

    for k in (0..n).rev() {
        let pivot = m[(k, k)];
        if pivot.abs() < EPS {
            x[k] = 0.0;
            continue;
        }
        let mut sum = rhs[k];
        for j in (k + 1)..n {
            sum -= m[(k, j)] * x[j];
        }
        x[k] = sum / pivot;
    }

    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hpwl::CoordSource;
    use crate::netlist::Netlist;

    #[test]
    fn isolated_atom_solves_to_origin() {
        let a = DMatrix::<f64>::zeros(1, 1);
        let b = DVector::<f64>::zeros(1);
        let x = solve_symmetric_tolerant(&a, &b);
        assert_eq!(x[0], 0.0);
    }

    #[test]
    fn solves_simple_anchored_system() {
        // A single variable anchored to 4.0 with weight 2: 2x = 8 -> x=4.
        let a = DMatrix::from_row_slice(1, 1, &[2.0]);
        let b = DVector::from_row_slice(&[8.0]);
        let x = solve_symmetric_tolerant(&a, &b);
        assert!((x[0] - 4.0).abs() < 1e-9);
    }

    #[test]
    fn average_ipin_fanout_matches_manual_computation() {
        let mut nl = Netlist::new(2, 0, 1, 0, 2, 1, 16);
        let ip0 = nl.ipins()[0];
        let ip1 = nl.ipins()[1];
        let o0 = nl.oports_of(ip0)[0];
        let o1 = nl.oports_of(ip1)[0];
        let lut = nl.luts()[0];
        nl.connect(o0, nl.iports_of(lut)[0]).unwrap();
        nl.connect(o1, nl.iports_of(lut)[1]).unwrap();
        // each IPIN drives exactly one sink, so the mean fanout is 1.
        assert_eq!(average_ipin_fanout(&nl), 1.0);
    }

    #[test]
    fn p6_matrix_is_symmetric_with_anchor_only_where_externally_connected() {
        // IPIN -> LUT0 -> LUT1, partition = {LUT0, LUT1}. LUT0 has an
        // out-of-partition neighbor (the IPIN); LUT1's only neighbor
        // (LUT0) is in-partition.
        let mut nl = Netlist::new(1, 0, 2, 0, 1, 1, 16);
        let ipin = nl.ipins()[0];
        let lut0 = nl.luts()[0];
        let lut1 = nl.luts()[1];
        nl.connect(nl.oports_of(ipin)[0], nl.iports_of(lut0)[0])
            .unwrap();
        nl.connect(nl.oports_of(lut0)[0], nl.iports_of(lut1)[0])
            .unwrap();

        let plan = Plan::from_netlist(10, 10, &nl).unwrap();
        let bound = plan.bounds()[0];
        let partition = [lut0, lut1];
        let avg_fanin = average_ipin_fanout(&nl);
        let (a, _bx, _by) = build_system(&plan, &nl, &partition, bound, 1.0, avg_fanin);

        assert_eq!(a.nrows(), 2);
        assert_eq!(a[(0, 1)], a[(1, 0)], "A must be symmetric");

        let edge_w = 1.0; // single fanout on both nets.
        assert_eq!(a[(0, 1)], -edge_w);

        // LUT0: anchor (IPIN, weight edge_w / expected_phases) + in-partition edge.
        assert_eq!(a[(0, 0)], edge_w + edge_w);
        // LUT1: only the in-partition edge, no out-of-partition neighbor.
        assert_eq!(a[(1, 1)], edge_w);

        let anchor_only_diag = a[(0, 0)] - a[(0, 1)].abs();
        assert!(anchor_only_diag > 0.0, "LUT0's anchor diagonal must be positive");
        let no_anchor_diag = a[(1, 1)] - a[(1, 0)].abs();
        assert_eq!(no_anchor_diag, 0.0, "LUT1 has no out-of-partition neighbor");
    }

    #[test]
    fn quadratic_placement_produces_finite_coords_for_every_atom() {
        let mut nl = Netlist::new(2, 2, 8, 8, 2, 2, 16);
        for i in 0..8 {
            let src = nl.oports_of(nl.luts()[i])[0];
            let dst = nl.iports_of(nl.ffs()[i])[0];
            nl.connect(src, dst).unwrap();
        }
        let mut sink = MetricSink::none();
        let plan = quadratic_placement(20, 20, &nl, 4, Method::Adaptive, 1.0, &mut sink).unwrap();

        for atom in nl.iter_movable() {
            let (x, y) = plan.coord_of(atom);
            assert!(x.is_finite() && y.is_finite());
        }
    }

    #[test]
    fn s4_quadratic_then_legalize_places_every_atom() {
        let mut nl = Netlist::new(10, 5, 1000, 1000, 3, 3, 10_000_000);
        for i in 0..1000 {
            let src = nl.oports_of(nl.luts()[i])[0];
            let dst = nl.iports_of(nl.ffs()[i])[0];
            nl.connect(src, dst).unwrap();
        }
        let mut sink = MetricSink::none();
        let plan = quadratic_placement(100, 100, &nl, 8, Method::Adaptive, 1.0, &mut sink).unwrap();
        let chip = crate::chip::Chip::from_plan(&plan).unwrap();
        for atom in nl.luts().iter().chain(nl.ffs()) {
            assert!(chip.coord_of(*atom).is_ok());
        }
    }
}
