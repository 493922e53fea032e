pub mod appr;
pub mod gate;
pub mod lift;
pub mod residue;

/// Schema version stamped on every JSON payload.
pub const OUTPUT_SCHEMA: u32 = 1;
