//! Error types for alignment.
//!
//! Only [`AlignError::InvalidTokenization`] ever escapes a document pass. The
//! offset variants are produced by the resolver and recovered locally by the
//! ingester (fallback resolution, or dropping the mention).

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlignError {
    #[error("invalid tokenization at token {index}: {reason}")]
    InvalidTokenization { index: usize, reason: String },

    #[error("start offset {offset} does not fall on a token boundary")]
    StartOffsetNotExact { offset: usize },

    #[error("end offset {offset} does not fall on a token boundary")]
    EndOffsetNotExact { offset: usize },

    #[error("offset {offset} is beyond the last token boundary ({limit})")]
    OffsetOutOfRange { offset: usize, limit: usize },

    #[error("mention {offset}..{end} covers no token")]
    EmptyRange { offset: usize, end: usize },

    #[error("unknown mention kind '{code}' (expected NAM, NOM or PRO)")]
    UnknownMentionKind { code: String },
}

impl AlignError {
    /// True for the per-mention offset failures the ingester recovers from.
    pub fn is_offset_error(&self) -> bool {
        matches!(
            self,
            AlignError::StartOffsetNotExact { .. }
                | AlignError::EndOffsetNotExact { .. }
                | AlignError::OffsetOutOfRange { .. }
                | AlignError::EmptyRange { .. }
        )
    }
}
