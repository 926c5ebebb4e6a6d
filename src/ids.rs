//! Opaque ID newtypes for netlist entities.
//!
//! [`AtomId`], [`IPortId`], and [`OPortId`] are thin `u32` wrappers used as
//! arena indices into a [`crate::netlist::Netlist`]. They are `Copy` and
//! `Hash`, which is what lets `Chip` and `Plan` key their placement maps on
//! them directly instead of on pointers into the netlist's own storage.

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for an atom (LUT, FF, IPIN, or OPIN) in a netlist.
    AtomId
);

define_id!(
    /// Opaque, copyable ID for an input port in a netlist.
    IPortId
);

define_id!(
    /// Opaque, copyable ID for an output port in a netlist. Since a net is
    /// synonymous with an output port and its fanouts, this also identifies
    /// a net.
    OPortId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atom_id_roundtrip() {
        let id = AtomId::from_raw(42);
        assert_eq!(id.as_raw(), 42);
    }

    #[test]
    fn id_equality() {
        let a = AtomId::from_raw(3);
        let b = AtomId::from_raw(3);
        let c = AtomId::from_raw(4);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn id_hash_in_set() {
        let mut set = std::collections::HashSet::new();
        set.insert(OPortId::from_raw(1));
        set.insert(OPortId::from_raw(2));
        set.insert(OPortId::from_raw(1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn id_display() {
        let id = IPortId::from_raw(7);
        assert_eq!(format!("{id}"), "7");
    }
}
