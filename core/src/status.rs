//! Per-source status bitset.
//!
//! Modeled as a bitset rather than an enum because multiple bits can be
//! set at once: an LSI can be `ASSERTED | SENT` simultaneously, and the
//! reject entrypoint sets/clears bits that are only meaningful for one of
//! the two source kinds.

bitflags::bitflags! {
    /// Status bits tracked per interrupt source.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SourceStatus: u8 {
        /// The source's line is currently asserted (LSI only).
        const ASSERTED = 0x1;
        /// A delivery for this source is outstanding at a presenter.
        const SENT = 0x2;
        /// A delivery was displaced and is queued for replay.
        const REJECTED = 0x4;
        /// An edge arrived while the source was masked (MSI only).
        const MASKED_PENDING = 0x8;
    }
}
