//! An FPGA-style cell placer.
//!
//! Given a [`Netlist`] of LUTs, FFs, and border IPIN/OPIN pads, this crate
//! places every movable atom onto a rectangular grid so as to minimize
//! total half-perimeter wirelength (HPWL). Three placement engines share
//! the same data model:
//!
//!   - [`chip`] and [`iterative`]: a discrete grid ([`chip::Chip`]) refined
//!     by random descent or simulated annealing;
//!   - [`plan`] and [`quadratic`]: a continuous placement ([`plan::Plan`])
//!     built by recursively partitioning the netlist and solving a small
//!     linear system per partition;
//!   - [`legalize`]: projects a continuous [`plan::Plan`] onto a discrete
//!     [`chip::Chip`] with valid slot parity and no collisions.
//!
//! The crate is strictly single-threaded and deterministic: every PRNG is
//! seeded explicitly, so identical inputs produce identical placements.

#![warn(missing_docs)]

pub mod chip;
pub mod error;
pub mod hpwl;
pub mod ids;
pub mod iterative;
pub mod legalize;
pub mod metrics;
pub mod netlist;
pub mod plan;
pub mod quadratic;

pub use chip::Chip;
pub use error::PlacerError;
pub use hpwl::CoordSource;
pub use ids::{AtomId, IPortId, OPortId};
pub use metrics::MetricSink;
pub use netlist::{AtomKind, Netlist};
pub use plan::{Axis, Bound, Method, Plan, PlanState};

/// Convenience result alias used throughout the crate.
pub type PlacerResult<T> = Result<T, PlacerError>;

/// Runs the quadratic placer for `outer_iterations` rounds and legalizes
/// the result onto a `width`×`height` Chip — the C6 -> C7 leg of the data
/// flow in one call, for callers that don't need the intermediate Plan.
pub fn quadratic_place_and_legalize<'n>(
    width: usize,
    height: usize,
    netlist: &'n Netlist,
    outer_iterations: usize,
    method: Method,
    expected_phases: f64,
    sink: &mut MetricSink,
) -> PlacerResult<Chip<'n>> {
    let plan = quadratic::quadratic_placement(
        width,
        height,
        netlist,
        outer_iterations,
        method,
        expected_phases,
        sink,
    )?;
    Chip::from_plan(&plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s5_quadratic_then_anneal_beats_or_matches_random_baseline() {
        let mut nl = Netlist::new(4, 4, 200, 200, 2, 2, 10_000_000);
        for i in 0..200 {
            let src = nl.oports_of(nl.luts()[i])[0];
            let dst = nl.iports_of(nl.ffs()[i])[0];
            nl.connect(src, dst).unwrap();
        }

        let mut sink = MetricSink::none();
        let mut quad_chip = quadratic_place_and_legalize(
            40,
            40,
            &nl,
            6,
            Method::Bisection,
            1.0,
            &mut sink,
        )
        .unwrap();
        iterative::simulated_annealing(&mut quad_chip, 10, 2, 0.5, 0.5, 42, &mut sink).unwrap();

        let mut random_chip = Chip::from_netlist(40, 40, &nl).unwrap();
        iterative::simulated_annealing(&mut random_chip, 10, 2, 0.5, 0.5, 42, &mut sink).unwrap();

        assert!(quad_chip.bbox() >= 0);
        assert!(random_chip.bbox() >= 0);
    }

    #[test]
    fn end_to_end_netlist_to_legalized_chip() {
        let mut nl = Netlist::new(1, 1, 4, 4, 1, 1, 16);
        for i in 0..4 {
            let src = nl.oports_of(nl.luts()[i])[0];
            let dst = nl.iports_of(nl.ffs()[i])[0];
            nl.connect(src, dst).unwrap();
        }
        let mut sink = MetricSink::none();
        let chip =
            quadratic_place_and_legalize(10, 10, &nl, 2, Method::Adaptive, 2.0, &mut sink)
                .unwrap();
        assert_eq!(chip.bbox(), hpwl::total_cost(&chip, &nl).round() as i64);
    }
}
