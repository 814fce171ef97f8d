//! Column family definitions for the unit store.

use rocksdb::{ColumnFamilyDescriptor, Options};

/// Column family names.
pub mod cf_names {
    /// Unit records: `unit_id (16 bytes)` → JSON-encoded `AtomicUnit`
    /// (embedding included).
    pub const UNITS: &str = "units";

    /// Temporal index: `created_at_nanos (8 bytes BE, sign-flipped) ++
    /// unit_id (16 bytes)` → `unit_id (16 bytes)`. Drives stable
    /// insertion-order listing.
    pub const TEMPORAL: &str = "temporal";
}

/// All column families, in descriptor order.
pub const ALL_COLUMN_FAMILIES: [&str; 2] = [cf_names::UNITS, cf_names::TEMPORAL];

/// Build the descriptors used when opening the database.
pub fn column_family_descriptors() -> Vec<ColumnFamilyDescriptor> {
    ALL_COLUMN_FAMILIES
        .iter()
        .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptors_cover_all_families() {
        assert_eq!(column_family_descriptors().len(), ALL_COLUMN_FAMILIES.len());
    }
}
