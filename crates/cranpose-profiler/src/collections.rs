//! Hash map used for component lookups, switchable to std with `std-hash`.

#[cfg(feature = "std-hash")]
pub mod map {
    pub use std::collections::hash_map::Entry;
    pub use std::collections::HashMap;
}

#[cfg(not(feature = "std-hash"))]
pub mod map {
    pub use rustc_hash::FxHashMap as HashMap;
    pub use std::collections::hash_map::Entry;
}

/// Map keyed by the address of a component's `Rc` allocation.
pub(crate) type AddressMap<V> = map::HashMap<usize, V>;
