//! Mention offset resolution.
//!
//! A mention's `(offset, offset + length)` is mapped onto an inclusive token
//! range in two stages:
//!
//! ```text
//! exact:    starts[i] == offset        ends[j] == end
//!             └─ miss: START_CHAIN       └─ miss: END_CHAIN     (slack.rs)
//!                 │                          │
//!                 └──── either fails ────────┘
//!                              v
//! nearest:  first starts[i] >= offset
//!           first ends[j] >= end, or j - 1 when that end is strictly closer
//!                              │
//!                              v
//!           Recovered (range + OffsetReport)  or  Dropped (report + error)
//! ```
//!
//! The resolver holds only shared references, so resolving the same mention
//! twice always yields the same result.

use super::diagnostics::OffsetReport;
use super::slack::{END_CHAIN, NearMiss, START_CHAIN, Slack, SlackMask, not_exact, recover};
use super::token_index::TokenIndex;
use crate::{AlignError, Boundary, Mention, ResolvedRange};
use tracing::debug;

/// Number of context tokens shown on each side of a range in an `OffsetReport`.
const WINDOW_CONTEXT: usize = 2;

/// Outcome of resolving one mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Both boundaries resolved exactly (possibly via an enabled slack).
    Exact(ResolvedRange),
    /// Exact resolution failed; the nearest-token range is used instead.
    Recovered { range: ResolvedRange, report: OffsetReport },
    /// No usable range; the mention is dropped.
    Dropped { report: OffsetReport, error: AlignError },
}

impl Resolution {
    pub fn range(&self) -> Option<ResolvedRange> {
        match self {
            Resolution::Exact(range) | Resolution::Recovered { range, .. } => Some(*range),
            Resolution::Dropped { .. } => None,
        }
    }

    pub fn report(&self) -> Option<&OffsetReport> {
        match self {
            Resolution::Exact(_) => None,
            Resolution::Recovered { report, .. } | Resolution::Dropped { report, .. } => Some(report),
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Resolution::Exact(_))
    }
}

/// Resolves mention offsets against one document's tokens.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    index: &'a TokenIndex,
    text: &'a str,
    slack: SlackMask,
}

impl<'a> Resolver<'a> {
    pub fn new(index: &'a TokenIndex, text: &'a str, slack: SlackMask) -> Self {
        Resolver { index, text, slack }
    }

    pub fn index(&self) -> &'a TokenIndex {
        self.index
    }

    pub fn slack(&self) -> SlackMask {
        self.slack
    }

    // --- Exact ---------------------------------------------------------------

    /// Token starting exactly at `offset`, or repaired by the start chain.
    pub fn resolve_start_exact(&self, offset: usize) -> Result<usize, AlignError> {
        let starts = self.index.starts();
        let i = starts.partition_point(|&s| s < offset);
        match starts.get(i) {
            Some(&start) if start == offset => Ok(i),
            Some(&start) => {
                let miss = NearMiss {
                    offset,
                    next: i,
                    next_boundary: start,
                    prev_end: i.checked_sub(1).map(|p| self.index.ends()[p]),
                    text: self.text,
                };
                self.recover_with(START_CHAIN, &miss).ok_or_else(|| not_exact(Boundary::Start, offset))
            }
            None => Err(not_exact(Boundary::Start, offset)),
        }
    }

    /// Token ending exactly at `end` (exclusive), or repaired by the end chain.
    pub fn resolve_end_exact(&self, end: usize) -> Result<usize, AlignError> {
        let ends = self.index.ends();
        let i = ends.partition_point(|&e| e < end);
        match ends.get(i) {
            Some(&token_end) if token_end == end => Ok(i),
            Some(&token_end) => {
                let miss = NearMiss {
                    offset: end,
                    next: i,
                    next_boundary: token_end,
                    prev_end: i.checked_sub(1).map(|p| ends[p]),
                    text: self.text,
                };
                self.recover_with(END_CHAIN, &miss).ok_or_else(|| not_exact(Boundary::End, end))
            }
            None => Err(not_exact(Boundary::End, end)),
        }
    }

    fn recover_with(&self, chain: &[Slack], miss: &NearMiss<'_>) -> Option<usize> {
        let (index, slack) = recover(chain, self.slack, miss)?;
        debug!(slack = %slack, offset = miss.offset, token = index, "offset recovered by slack");
        Some(index)
    }

    // --- Nearest -------------------------------------------------------------

    /// First token starting at or after `offset`.
    pub fn resolve_start_nearest(&self, offset: usize) -> Result<usize, AlignError> {
        self.index
            .first_start_at_or_after(offset)
            .ok_or(AlignError::OffsetOutOfRange { offset, limit: self.index.limit() })
    }

    /// Token whose end is closest to `end`, among the first end at or after
    /// `end` and the one before it. Ties go to the later token.
    pub fn resolve_end_nearest(&self, end: usize) -> Result<usize, AlignError> {
        let i = self
            .index
            .first_end_at_or_after(end)
            .ok_or(AlignError::OffsetOutOfRange { offset: end, limit: self.index.limit() })?;
        let ends = self.index.ends();
        if i > 0 && end.abs_diff(ends[i]) > end.abs_diff(ends[i - 1]) {
            return Ok(i - 1);
        }
        Ok(i)
    }

    // --- Protocol ------------------------------------------------------------

    /// Resolve `mention` exactly, falling back to the nearest tokens.
    pub fn resolve(&self, mention: &Mention) -> Resolution {
        let offset = mention.offset;
        let Some(end) = mention.checked_end() else {
            return Resolution::Dropped {
                report: self.report(mention, Boundary::End, None),
                error: AlignError::OffsetOutOfRange { offset: mention.end(), limit: self.index.limit() },
            };
        };

        let boundary = match (self.resolve_start_exact(offset), self.resolve_end_exact(end)) {
            (Ok(start), Ok(last)) if start <= last => return Resolution::Exact(ResolvedRange::new(start, last)),
            (Err(_), _) => Boundary::Start,
            // Either the end missed, or both sides landed but crossed over
            // (a zero-width mention in a gap).
            (Ok(_), _) => Boundary::End,
        };

        let fallback =
            self.resolve_start_nearest(offset).and_then(|start| self.resolve_end_nearest(end).map(|last| (start, last)));
        match fallback {
            Ok((start, last)) if start <= last => {
                let range = ResolvedRange::new(start, last);
                Resolution::Recovered { range, report: self.report(mention, boundary, Some(range)) }
            }
            Ok(_) => Resolution::Dropped {
                report: self.report(mention, boundary, None),
                error: AlignError::EmptyRange { offset, end },
            },
            Err(error) => Resolution::Dropped { report: self.report(mention, boundary, None), error },
        }
    }

    fn report(&self, mention: &Mention, boundary: Boundary, fallback: Option<ResolvedRange>) -> OffsetReport {
        OffsetReport {
            raw: self.text.get(mention.offset..mention.end()).unwrap_or("").to_string(),
            surface: mention.text.clone(),
            offset: mention.offset,
            end: mention.end(),
            boundary,
            fallback,
            window: self.window(fallback, mention.offset),
        }
    }

    /// Render the tokens around `range` (or around `offset` when there is no
    /// range), marking the range with `:`.
    fn window(&self, range: Option<ResolvedRange>, offset: usize) -> String {
        let Some(last) = self.index.len().checked_sub(1) else {
            return String::new();
        };
        let (lo, hi) = match range {
            Some(r) => (r.start, r.end),
            None => {
                let center = self.index.first_start_at_or_after(offset).unwrap_or(last);
                (center, center)
            }
        };
        let lo = lo.saturating_sub(WINDOW_CONTEXT);
        let hi = (hi + WINDOW_CONTEXT).min(last);

        (lo..=hi)
            .map(|i| {
                let mut piece = String::new();
                if range.is_some_and(|r| r.start == i) {
                    piece.push(':');
                }
                piece.push_str(self.index.token_text(self.text, i));
                if range.is_some_and(|r| r.end == i) {
                    piece.push(':');
                }
                piece
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
