// crates/templ-economics/src/checkpoint.rs
//
// Checkpoint log and overflow-safe settlement snapshots.
//
// A cumulative reward index grows without bound over the ledger's lifetime,
// but each member's stored settlement snapshot has a fixed width. A snapshot
// is therefore stored as `(value, generation)`: `value` is the index modulo
// 2^width and `generation` counts how many times the index wrapped past that
// width. The pair packs into one `u128` as `(generation << 64) | value`.
//
// Settlement compares generations before subtracting. A mismatch means the
// stored snapshot belongs to an older generation: it is read as baseline zero
// in the current generation, and the tail the member had not yet collected in
// the older generation(s) is credited on top. The member is never shorted,
// and a stale low `value` is never subtracted from a wrapped high index.

use serde::{Deserialize, Serialize};

use templ_core::error::{StateError, ValidationError};

/// Width, in bits, of a packed snapshot's value field (8..=64).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SnapshotWidth(u32);

impl SnapshotWidth {
    pub const DEFAULT: SnapshotWidth = SnapshotWidth(64);

    pub fn new(bits: u32) -> Result<Self, ValidationError> {
        if !(8..=64).contains(&bits) {
            return Err(ValidationError::InvalidSnapshotWidth(bits));
        }
        Ok(Self(bits))
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    /// 2^bits.
    pub fn modulus(&self) -> u128 {
        1u128 << self.0
    }
}

impl Default for SnapshotWidth {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for SnapshotWidth {
    type Error = ValidationError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        SnapshotWidth::new(bits)
    }
}

impl From<SnapshotWidth> for u32 {
    fn from(w: SnapshotWidth) -> u32 {
        w.0
    }
}

/// A cumulative index value stamped with its wrap generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Index modulo 2^width.
    pub value: u64,
    /// Number of times the index wrapped past the width.
    pub generation: u64,
}

impl Snapshot {
    pub const ZERO: Snapshot = Snapshot {
        value: 0,
        generation: 0,
    };

    /// Encode a raw wide index at `width`.
    pub fn from_raw(raw: u128, width: SnapshotWidth) -> Self {
        let bits = width.bits();
        Snapshot {
            value: (raw & (width.modulus() - 1)) as u64,
            generation: (raw >> bits) as u64,
        }
    }

    /// Pack into one word: `(generation << 64) | value`.
    pub fn pack(&self) -> u128 {
        ((self.generation as u128) << 64) | self.value as u128
    }

    pub fn unpack(word: u128) -> Self {
        Snapshot {
            value: word as u64,
            generation: (word >> 64) as u64,
        }
    }

    /// Advance the index by `delta`, wrapping into the next generation(s).
    ///
    /// # Errors
    /// `StateError::ArithmeticOverflow` if the generation counter itself
    /// would overflow.
    pub fn advance(&self, delta: u128, width: SnapshotWidth) -> Result<Snapshot, StateError> {
        let sum = (self.value as u128)
            .checked_add(delta)
            .ok_or(StateError::ArithmeticOverflow)?;
        let wraps = sum >> width.bits();
        let wraps = u64::try_from(wraps).map_err(|_| StateError::ArithmeticOverflow)?;
        let generation = self
            .generation
            .checked_add(wraps)
            .ok_or(StateError::ArithmeticOverflow)?;
        Ok(Snapshot {
            value: (sum & (width.modulus() - 1)) as u64,
            generation,
        })
    }

    /// Credit accrued between a stored settlement snapshot and `self`.
    ///
    /// Same generation: plain difference. Older stored generation: the stored
    /// value is read as baseline zero in the current generation, and the
    /// uncollected tail of the older generation(s) is added back.
    pub fn accrued_since(&self, stored: &Snapshot, width: SnapshotWidth) -> u128 {
        if stored.generation == self.generation {
            return (self.value as u128).saturating_sub(stored.value as u128);
        }
        if stored.generation > self.generation {
            // A snapshot can never be ahead of the index it was taken from.
            return 0;
        }
        let gens = (self.generation - stored.generation) as u128;
        let tail = gens
            .saturating_mul(width.modulus())
            .saturating_sub(stored.value as u128);
        tail.saturating_add(self.value as u128)
    }
}

/// One recorded point in a checkpoint log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Strictly increasing sequence (admission or purchase counter).
    pub sequence: u64,
    /// Members at the time of the checkpoint.
    pub member_count: u64,
    /// Cumulative per-member index at the checkpoint.
    pub cumulative: Snapshot,
}

/// Append-only log of checkpoints with strictly increasing sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointIndex {
    entries: Vec<Checkpoint>,
}

impl CheckpointIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a checkpoint.
    ///
    /// Appends when `sequence` is past the last entry; replaces the last entry
    /// in place when it is equal (several updates within one sequence step
    /// collapse into one checkpoint).
    ///
    /// # Errors
    /// `StateError::CheckpointOrder` if `sequence` is below the last entry.
    pub fn record(&mut self, checkpoint: Checkpoint) -> Result<(), StateError> {
        if !self.can_record(checkpoint.sequence) {
            return Err(StateError::CheckpointOrder);
        }
        self.append(checkpoint);
        Ok(())
    }

    /// Check that `sequence` could be recorded, without recording it.
    pub fn can_record(&self, sequence: u64) -> bool {
        self.entries.last().map_or(true, |last| sequence >= last.sequence)
    }

    /// Record a checkpoint whose sequence was already accepted by
    /// `can_record`.
    pub fn append(&mut self, checkpoint: Checkpoint) {
        debug_assert!(self.can_record(checkpoint.sequence));
        match self.entries.last_mut() {
            Some(last) if checkpoint.sequence == last.sequence => *last = checkpoint,
            _ => self.entries.push(checkpoint),
        }
    }

    /// Latest checkpoint with `sequence < before`. Binary search.
    pub fn latest_before(&self, before: u64) -> Option<&Checkpoint> {
        let idx = self.entries.partition_point(|c| c.sequence < before);
        idx.checked_sub(1).map(|i| &self.entries[i])
    }

    pub fn last(&self) -> Option<&Checkpoint> {
        self.entries.last()
    }

    pub fn entries(&self) -> &[Checkpoint] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
