//! Per-pass diagnostics.
//!
//! A pass returns its counters and records by value; nothing here outlives
//! the document it was produced for.
//!
//! - `Diagnostics` holds the counters used for quality auditing.
//! - `OffsetReport` is emitted for every mention that missed exact alignment.
//! - `OverlapConflict` is emitted for every candidate rejected by the span
//!   layer, naming the existing span it collided with.
//! - `InsertRejection` is what `SpanLayer::try_insert` hands back.

use crate::{AnnotatedSpan, Boundary, ResolvedRange};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostics {
    /// Spans inserted into the layer.
    pub accepted: usize,
    /// Candidates rejected because they share a token with an accepted span.
    pub rejected_overlap: usize,
    /// Mentions whose offsets did not resolve exactly (recovered or dropped).
    pub offset_errors: usize,
    /// Mentions for which no usable token range exists.
    pub dropped: usize,
    /// Mentions removed by the subtype filter before resolution.
    pub skipped: usize,
}

impl Diagnostics {
    /// Mentions that reached the resolver.
    pub fn considered(&self) -> usize {
        self.accepted + self.rejected_overlap + self.dropped
    }
}

/// Record of a mention that failed exact alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetReport {
    /// Source text at the mention's raw offsets (empty if out of bounds).
    pub raw: String,
    /// Surface text recorded by the annotator.
    pub surface: Option<String>,
    pub offset: usize,
    pub end: usize,
    /// The side that missed first.
    pub boundary: Boundary,
    /// Nearest-token range, if the fallback produced a usable one.
    pub fallback: Option<ResolvedRange>,
    /// Up to two tokens either side of the fallback range, with the range
    /// itself marked by `:`, e.g. `the :big dog: ran`.
    pub window: String,
}

impl OffsetReport {
    pub fn recovered(&self) -> bool {
        self.fallback.is_some()
    }
}

/// A rejected candidate and the accepted span it overlapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapConflict {
    pub candidate: AnnotatedSpan,
    pub existing: AnnotatedSpan,
}

/// Why the span layer refused a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertRejection {
    /// The candidate covers no token (`start >= end`).
    Empty(AnnotatedSpan),
    /// The candidate shares a token with an accepted span.
    Overlap(OverlapConflict),
}
