//! Token offset table.
//!
//! `TokenIndex` stores the character spans of a document's tokens as two
//! parallel arrays (`starts`, `ends`). It is built once per document and never
//! mutated afterwards.
//!
//! ## Invariants
//!
//! Checked by [`TokenIndex::build`]:
//!
//! - every token is non-empty (`start < end`);
//! - tokens are ordered and disjoint (`ends[i] <= starts[i + 1]`).
//!
//! Together these make both `starts` and `ends` strictly increasing, which is
//! what lets every lookup below be a `partition_point` binary search.

use crate::AlignError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenIndex {
    starts: Vec<usize>,
    ends: Vec<usize>,
}

impl TokenIndex {
    /// Build the index from `(start, end)` token spans in document order.
    pub fn build<I>(spans: I) -> Result<Self, AlignError>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let spans = spans.into_iter();
        let (lower, _) = spans.size_hint();
        let mut starts = Vec::with_capacity(lower);
        let mut ends: Vec<usize> = Vec::with_capacity(lower);

        for (index, (start, end)) in spans.enumerate() {
            if start >= end {
                return Err(AlignError::InvalidTokenization {
                    index,
                    reason: format!("empty or inverted span {start}..{end}"),
                });
            }
            if let Some(&prev_end) = ends.last() {
                if start < prev_end {
                    return Err(AlignError::InvalidTokenization {
                        index,
                        reason: format!("span {start}..{end} overlaps or precedes previous token ending at {prev_end}"),
                    });
                }
            }
            starts.push(start);
            ends.push(end);
        }

        Ok(TokenIndex { starts, ends })
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    pub fn starts(&self) -> &[usize] {
        &self.starts
    }

    pub fn ends(&self) -> &[usize] {
        &self.ends
    }

    /// `(start, end)` of token `i`, if it exists.
    pub fn span(&self, i: usize) -> Option<(usize, usize)> {
        Some((*self.starts.get(i)?, *self.ends.get(i)?))
    }

    /// End offset of the last token, or 0 for an empty index.
    pub fn limit(&self) -> usize {
        self.ends.last().copied().unwrap_or(0)
    }

    /// Index of the first token whose start is `>= offset`.
    pub fn first_start_at_or_after(&self, offset: usize) -> Option<usize> {
        let i = self.starts.partition_point(|&s| s < offset);
        (i < self.starts.len()).then_some(i)
    }

    /// Index of the first token whose end is `>= offset`.
    pub fn first_end_at_or_after(&self, offset: usize) -> Option<usize> {
        let i = self.ends.partition_point(|&e| e < offset);
        (i < self.ends.len()).then_some(i)
    }

    /// Slice of `text` covered by token `i`; empty if the token lies outside
    /// `text` or off a char boundary.
    pub fn token_text<'t>(&self, text: &'t str, i: usize) -> &'t str {
        self.span(i).and_then(|(start, end)| text.get(start..end)).unwrap_or("")
    }
}
