//! # Colonia Checkpoint
//!
//! Serializes agent state into size-bounded external slots and restores it
//! with a validate-before-trust loader. The external store may have been
//! written by a prior, possibly crashed, run: nothing read from a slot is
//! trusted until it passes validation, and any failure degrades to a freshly
//! initialized default rather than an error.
//!
//! - [`SlotStore`]: abstraction over the host's fixed-capacity named slots
//! - [`CheckpointBlob`]: versioned envelope `{ control, policy }`
//! - [`CheckpointStore`]: budgeted save, validated load, metrics slot
//! - [`Compactable`]: precision-shedding hook for oversized payloads

pub mod blob;
pub mod slot;
pub mod store;

pub use blob::{CheckpointBlob, Compactable, ControlFlags};
pub use slot::{CheckpointError, MemorySlots, SlotId, SlotStore};
pub use store::{CheckpointConfig, CheckpointStore};

/// Current envelope format version.
pub const FORMAT_VERSION: u32 = 1;

/// Byte ceiling of a policy or metrics slot.
pub const SLOT_BYTE_BUDGET: usize = 100 * 1024;

/// Byte ceiling of the always-resident status record.
pub const STATUS_BYTE_BUDGET: usize = 1024;
