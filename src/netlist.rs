//! Netlist data model (C1).
//!
//! A [`Netlist`] is a fixed population of atoms — LUTs, FFs, and border
//! IPIN/OPIN pads — wired together by input and output ports. Atoms, input
//! ports, and output ports each live in their own arena, addressed by the
//! opaque [`AtomId`]/[`IPortId`]/[`OPortId`] newtypes from [`crate::ids`]
//! rather than by pointer, so the whole structure is plain, `Clone`-able
//! data with no fixup step after a move (see `DESIGN.md` for why the
//! original back-pointer design was dropped).
//!
//! A net is synonymous with an output port together with its fanouts: there
//! is no separate `Net` type.

use crate::error::PlacerError;
use crate::ids::{AtomId, IPortId, OPortId};

/// The kind of a netlist atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomKind {
    /// A look-up table. Movable.
    Lut,
    /// A flip-flop. Movable.
    Ff,
    /// A primary input pad. Fixed at the chip's west border.
    IPin,
    /// A primary output pad. Fixed at the chip's east border.
    OPin,
}

impl AtomKind {
    /// Whether atoms of this kind are placed by the placement engines
    /// (LUTs and FFs) as opposed to fixed at the chip border (IPIN/OPIN).
    pub fn is_movable(self) -> bool {
        matches!(self, AtomKind::Lut | AtomKind::Ff)
    }
}

#[derive(Debug, Clone)]
struct AtomRecord {
    kind: AtomKind,
    iports: Vec<IPortId>,
    oports: Vec<OPortId>,
}

#[derive(Debug, Clone)]
struct IPortRecord {
    atom: AtomId,
    fanin: Option<OPortId>,
}

#[derive(Debug, Clone)]
struct OPortRecord {
    atom: AtomId,
    fanouts: Vec<IPortId>,
    capacity: usize,
}

/// The netlist: a fixed population of atoms and the ports wiring them
/// together. Constructed once and then only mutated via [`Netlist::connect`].
#[derive(Debug, Clone)]
pub struct Netlist {
    atoms: Vec<AtomRecord>,
    iports: Vec<IPortRecord>,
    oports: Vec<OPortRecord>,
    luts: Vec<AtomId>,
    ffs: Vec<AtomId>,
    ipins: Vec<AtomId>,
    opins: Vec<AtomId>,
}

impl Netlist {
    /// Builds a netlist with the given atom counts and per-atom port
    /// capacities. LUTs and FFs each get `max_inputs` input ports and
    /// `max_outputs` output ports (each with `max_fanouts` capacity);
    /// IPINs get a single `max_fanouts`-capacity output port; OPINs get a
    /// single input port.
    pub fn new(
        num_ipins: usize,
        num_opins: usize,
        num_luts: usize,
        num_ffs: usize,
        max_inputs: usize,
        max_outputs: usize,
        max_fanouts: usize,
    ) -> Self {
        let mut nl = Netlist {
            atoms: Vec::new(),
            iports: Vec::new(),
            oports: Vec::new(),
            luts: Vec::with_capacity(num_luts),
            ffs: Vec::with_capacity(num_ffs),
            ipins: Vec::with_capacity(num_ipins),
            opins: Vec::with_capacity(num_opins),
        };

        for _ in 0..num_luts {
            let id = nl.add_atom(AtomKind::Lut, max_inputs, max_outputs, max_fanouts);
            nl.luts.push(id);
        }
        for _ in 0..num_ffs {
            let id = nl.add_atom(AtomKind::Ff, max_inputs, max_outputs, max_fanouts);
            nl.ffs.push(id);
        }
        for _ in 0..num_ipins {
            let id = nl.add_atom(AtomKind::IPin, 0, 1, max_fanouts);
            nl.ipins.push(id);
        }
        for _ in 0..num_opins {
            let id = nl.add_atom(AtomKind::OPin, 1, 0, 0);
            nl.opins.push(id);
        }

        nl
    }

    fn add_atom(
        &mut self,
        kind: AtomKind,
        num_inputs: usize,
        num_outputs: usize,
        fanout_capacity: usize,
    ) -> AtomId {
        let atom_id = AtomId::from_raw(self.atoms.len() as u32);

        let mut iports = Vec::with_capacity(num_inputs);
        for _ in 0..num_inputs {
            let id = IPortId::from_raw(self.iports.len() as u32);
            self.iports.push(IPortRecord {
                atom: atom_id,
                fanin: None,
            });
            iports.push(id);
        }

        let mut oports = Vec::with_capacity(num_outputs);
        for _ in 0..num_outputs {
            let id = OPortId::from_raw(self.oports.len() as u32);
            self.oports.push(OPortRecord {
                atom: atom_id,
                fanouts: Vec::new(),
                capacity: fanout_capacity,
            });
            oports.push(id);
        }

        self.atoms.push(AtomRecord {
            kind,
            iports,
            oports,
        });
        atom_id
    }

    /// Connects `oport` as the fanin of `iport`. Fails with
    /// [`PlacerError::AlreadyConnected`] if `iport` already has a fanin, or
    /// [`PlacerError::CapacityExceeded`] if `oport` is already at its fanout
    /// capacity. Otherwise both directions are established atomically.
    pub fn connect(&mut self, oport: OPortId, iport: IPortId) -> Result<(), PlacerError> {
        if self.iports[iport.as_raw() as usize].fanin.is_some() {
            return Err(PlacerError::AlreadyConnected(iport));
        }
        let orec = &mut self.oports[oport.as_raw() as usize];
        if orec.fanouts.len() >= orec.capacity {
            return Err(PlacerError::CapacityExceeded(oport));
        }
        orec.fanouts.push(iport);
        self.iports[iport.as_raw() as usize].fanin = Some(oport);
        Ok(())
    }

    /// The kind of the given atom.
    pub fn atom_kind(&self, atom: AtomId) -> AtomKind {
        self.atoms[atom.as_raw() as usize].kind
    }

    /// The input ports belonging to an atom, in declaration order.
    pub fn iports_of(&self, atom: AtomId) -> &[IPortId] {
        &self.atoms[atom.as_raw() as usize].iports
    }

    /// The output ports belonging to an atom, in declaration order.
    pub fn oports_of(&self, atom: AtomId) -> &[OPortId] {
        &self.atoms[atom.as_raw() as usize].oports
    }

    /// The atom that owns `iport`.
    pub fn iport_atom(&self, iport: IPortId) -> AtomId {
        self.iports[iport.as_raw() as usize].atom
    }

    /// The atom that owns `oport`.
    pub fn oport_atom(&self, oport: OPortId) -> AtomId {
        self.oports[oport.as_raw() as usize].atom
    }

    /// The driving output port of `iport`, if connected.
    pub fn fanin(&self, iport: IPortId) -> Option<OPortId> {
        self.iports[iport.as_raw() as usize].fanin
    }

    /// The input ports driven by `oport`.
    pub fn fanouts(&self, oport: OPortId) -> &[IPortId] {
        &self.oports[oport.as_raw() as usize].fanouts
    }

    /// The number of fanouts on `oport` — the size of the net it defines.
    pub fn net_size(&self, oport: OPortId) -> usize {
        self.oports[oport.as_raw() as usize].fanouts.len()
    }

    /// All LUT atom IDs, in construction order.
    pub fn luts(&self) -> &[AtomId] {
        &self.luts
    }

    /// All FF atom IDs, in construction order.
    pub fn ffs(&self) -> &[AtomId] {
        &self.ffs
    }

    /// All IPIN atom IDs, in construction order (also their border-position
    /// order: the k-th IPIN sits at column x = -1, row ⌊k·H/|IPINs|⌋).
    pub fn ipins(&self) -> &[AtomId] {
        &self.ipins
    }

    /// All OPIN atom IDs, in construction order (also their border-position
    /// order: the k-th OPIN sits at column x = W, row ⌊k·H/|OPINs|⌋).
    pub fn opins(&self) -> &[AtomId] {
        &self.opins
    }

    /// Number of LUTs.
    pub fn num_luts(&self) -> usize {
        self.luts.len()
    }

    /// Number of FFs.
    pub fn num_ffs(&self) -> usize {
        self.ffs.len()
    }

    /// Number of IPINs.
    pub fn num_ipins(&self) -> usize {
        self.ipins.len()
    }

    /// Number of OPINs.
    pub fn num_opins(&self) -> usize {
        self.opins.len()
    }

    /// Total number of atoms of every kind. Atom IDs are dense over
    /// `0..total_atoms()`, which lets `Chip` and `Plan` size their
    /// per-atom arrays (coordinate tables, placement maps) directly from
    /// this count.
    pub fn total_atoms(&self) -> usize {
        self.atoms.len()
    }

    /// All atom IDs that emit at least potential nets — LUTs, FFs, and
    /// IPINs — in the netlist-iteration order used by snapshot dumps:
    /// LUTs, then FFs, then IPINs, then OPINs.
    pub fn iter_in_netlist_order(&self) -> impl Iterator<Item = AtomId> + '_ {
        self.luts
            .iter()
            .chain(self.ffs.iter())
            .chain(self.ipins.iter())
            .chain(self.opins.iter())
            .copied()
    }

    /// All movable (LUT and FF) atom IDs, LUTs first, in construction order.
    pub fn iter_movable(&self) -> impl Iterator<Item = AtomId> + '_ {
        self.luts.iter().chain(self.ffs.iter()).copied()
    }

    /// Every net in the netlist: the output ports of every LUT, FF, and
    /// IPIN (OPINs have no output ports and so emit no nets).
    pub fn iter_nets(&self) -> impl Iterator<Item = OPortId> + '_ {
        self.luts
            .iter()
            .chain(self.ffs.iter())
            .chain(self.ipins.iter())
            .flat_map(move |&atom| self.oports_of(atom).iter().copied())
    }
}
