//! HPWL evaluator (C4): net and atom bounding-box cost.
//!
//! Shared by [`crate::chip::Chip`] (integer coordinates, rounded from `f64`
//! after the fact) and [`crate::plan::Plan`] (real-valued coordinates)
//! through the [`CoordSource`] trait, so the bounding-box math is written
//! once regardless of which placement representation is asking.

use crate::ids::{AtomId, OPortId};
use crate::netlist::Netlist;

/// Something that can answer "where is this atom right now" — for movable
/// atoms, their current placement; for IPIN/OPIN atoms, their fixed border
/// position. Integer lattice coordinates are always exactly representable
/// in `f64`, so both [`crate::chip::Chip`] and [`crate::plan::Plan`] can
/// share this single `f64` interface.
pub trait CoordSource {
    /// The coordinate of `atom`, whether movable or a fixed border pin.
    fn coord_of(&self, atom: AtomId) -> (f64, f64);
}

/// HPWL of a single net: the Manhattan perimeter of the axis-aligned
/// bounding box over the net's source and all of its sinks.
pub fn bbox_for_net(source: &impl CoordSource, netlist: &Netlist, net: OPortId) -> f64 {
    let src_atom = netlist.oport_atom(net);
    let (sx, sy) = source.coord_of(src_atom);
    let mut min_x = sx;
    let mut max_x = sx;
    let mut min_y = sy;
    let mut max_y = sy;

    for &iport in netlist.fanouts(net) {
        let sink_atom = netlist.iport_atom(iport);
        let (x, y) = source.coord_of(sink_atom);
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    (max_x - min_x) + (max_y - min_y)
}

/// The nets an atom participates in: its own output nets (one per output
/// port) plus, for each input port with a fanin, that fanin's net. A net
/// may appear more than once if two of an atom's input ports share the
/// same driver; callers that need a deduplicated set (for incremental
/// delta-cost maintenance across two atoms) should dedupe the
/// concatenation themselves.
pub fn affected_nets(netlist: &Netlist, atom: AtomId) -> Vec<OPortId> {
    let mut nets: Vec<OPortId> = netlist.oports_of(atom).to_vec();
    for &iport in netlist.iports_of(atom) {
        if let Some(fanin) = netlist.fanin(iport) {
            nets.push(fanin);
        }
    }
    nets
}

/// The sum of HPWL over every net `atom` participates in (§4.4's
/// `bbox_for_atom`). Used by the incremental maintenance in
/// [`crate::chip::Chip::swap`]; see [`affected_nets`] for the deduplicated
/// variant used when two atoms' net sets might overlap.
pub fn bbox_for_atom(source: &impl CoordSource, netlist: &Netlist, atom: AtomId) -> f64 {
    affected_nets(netlist, atom)
        .into_iter()
        .map(|net| bbox_for_net(source, netlist, net))
        .sum()
}

/// Total placement cost: the sum of HPWL over every net in the netlist
/// (nets emitted by LUTs, FFs, and IPINs; OPINs emit none).
pub fn total_cost(source: &impl CoordSource, netlist: &Netlist) -> f64 {
    netlist
        .iter_nets()
        .map(|net| bbox_for_net(source, netlist, net))
        .sum()
}
