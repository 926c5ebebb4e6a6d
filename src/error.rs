//! The crate's single error type.
//!
//! Every fallible operation in the placer — netlist wiring, chip/plan
//! construction, coordinate lookups, legalization, and metric-sink flushes —
//! returns `Result<T, PlacerError>`.

/// Errors raised by the placer's data structures and algorithms.
#[derive(Debug, thiserror::Error)]
pub enum PlacerError {
    /// Chip or Plan dimensions do not satisfy the capacity/border-pin
    /// constraints required at construction time.
    #[error("invalid chip dimensions {width}x{height} for netlist with {luts} LUTs, {ffs} FFs, {ipins} IPINs, {opins} OPINs")]
    InvalidDimensions {
        /// Requested grid width.
        width: usize,
        /// Requested grid height.
        height: usize,
        /// Number of LUTs in the netlist.
        luts: usize,
        /// Number of FFs in the netlist.
        ffs: usize,
        /// Number of IPINs in the netlist.
        ipins: usize,
        /// Number of OPINs in the netlist.
        opins: usize,
    },

    /// A coordinate was requested for an atom that has no placement.
    #[error("atom {0} has no placement")]
    Unplaced(crate::ids::AtomId),

    /// `connect` was called on an input port that already has a fanin.
    #[error("input port {0} already has a fanin")]
    AlreadyConnected(crate::ids::IPortId),

    /// `connect` was called on an output port that is already at capacity.
    #[error("output port {0} is at fanout capacity")]
    CapacityExceeded(crate::ids::OPortId),

    /// The legalizer could not find a free, same-parity slot for an atom.
    ///
    /// Precluded by the capacity checks in `Chip`/`Plan` constructors; kept
    /// as a surfaced error rather than a panic because it signals a broken
    /// invariant rather than expected user input.
    #[error("no free slot available for atom {0}")]
    NoFreeSlot(crate::ids::AtomId),

    /// A metric-sink stream could not be flushed.
    #[error("metric sink I/O failure: {0}")]
    IoFailure(#[from] std::io::Error),
}
