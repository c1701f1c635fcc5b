//! Slack tolerances for near-miss offsets.
//!
//! Annotation offsets are expected to land exactly on token boundaries. A few
//! recurring artifacts make them miss by a single character; each artifact
//! has its own named strategy here, rather than one generic fuzzy match.
//!
//! ```text
//! start chain:  LeadingDelimiter
//! end chain:    SubwordEnd -> TrailingDelimiter
//! ```
//!
//! Strategies only run when the exact lookup missed, and each sees the same
//! [`NearMiss`]: the offset, the first token boundary past it, and (for ends)
//! the end of the token before that. Chains are tried in order; the first
//! strategy that is enabled in the [`SlackMask`] and matches wins.

use crate::{AlignError, Boundary};
use std::fmt;
use std::str::FromStr;

bitflags::bitflags! {
    /// Enabled slack strategies.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SlackMask: u8 {
        const LEADING_DELIMITER  = 1 << 0;
        const SUBWORD_END        = 1 << 1;
        const TRAILING_DELIMITER = 1 << 2;
    }
}

impl Default for SlackMask {
    fn default() -> Self {
        SlackMask::all()
    }
}

/// A named tolerance strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slack {
    /// The mention starts one character before a token (a leading delimiter
    /// was included). Resolves to that token.
    LeadingDelimiter,
    /// The mention ends one character short of a token end (e.g. a clipped
    /// possessive suffix). Resolves to that token.
    SubwordEnd,
    /// The mention ends one whitespace character past a token end. Resolves
    /// to the token before the whitespace.
    TrailingDelimiter,
}

pub(crate) const START_CHAIN: &[Slack] = &[Slack::LeadingDelimiter];
pub(crate) const END_CHAIN: &[Slack] = &[Slack::SubwordEnd, Slack::TrailingDelimiter];

/// Context handed to a strategy when an exact lookup misses.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NearMiss<'a> {
    /// The offset that missed.
    pub offset: usize,
    /// Index of the first token whose boundary lies past `offset`.
    pub next: usize,
    /// That token's boundary (start for the start chain, end for the end chain).
    pub next_boundary: usize,
    /// End of token `next - 1`, if there is one.
    pub prev_end: Option<usize>,
    pub text: &'a str,
}

impl Slack {
    pub const ALL: [Slack; 3] = [Slack::LeadingDelimiter, Slack::SubwordEnd, Slack::TrailingDelimiter];

    pub fn flag(self) -> SlackMask {
        match self {
            Slack::LeadingDelimiter => SlackMask::LEADING_DELIMITER,
            Slack::SubwordEnd => SlackMask::SUBWORD_END,
            Slack::TrailingDelimiter => SlackMask::TRAILING_DELIMITER,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Slack::LeadingDelimiter => "leading-delimiter",
            Slack::SubwordEnd => "subword-end",
            Slack::TrailingDelimiter => "trailing-delimiter",
        }
    }

    /// Which mention boundary this strategy repairs.
    pub fn boundary(self) -> Boundary {
        match self {
            Slack::LeadingDelimiter => Boundary::Start,
            Slack::SubwordEnd | Slack::TrailingDelimiter => Boundary::End,
        }
    }

    pub(crate) fn recover(self, miss: &NearMiss<'_>) -> Option<usize> {
        match self {
            Slack::LeadingDelimiter | Slack::SubwordEnd => (miss.offset + 1 == miss.next_boundary).then_some(miss.next),
            Slack::TrailingDelimiter => {
                let prev_end = miss.prev_end?;
                if miss.offset != prev_end + 1 {
                    return None;
                }
                let gap = miss.text.get(prev_end..miss.offset)?;
                gap.chars().all(char::is_whitespace).then(|| miss.next - 1)
            }
        }
    }
}

impl fmt::Display for Slack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Slack {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Slack::ALL.into_iter().find(|slack| slack.name() == s).ok_or_else(|| {
            let names: Vec<&str> = Slack::ALL.iter().map(|slack| slack.name()).collect();
            format!("unknown slack '{s}' (expected one of: {})", names.join(", "))
        })
    }
}

/// Run `chain` against `miss`, skipping strategies disabled in `mask`.
pub(crate) fn recover(chain: &[Slack], mask: SlackMask, miss: &NearMiss<'_>) -> Option<(usize, Slack)> {
    chain
        .iter()
        .filter(|slack| mask.contains(slack.flag()))
        .find_map(|&slack| slack.recover(miss).map(|index| (index, slack)))
}

/// Error for a miss that no enabled strategy could repair.
pub(crate) fn not_exact(boundary: Boundary, offset: usize) -> AlignError {
    match boundary {
        Boundary::Start => AlignError::StartOffsetNotExact { offset },
        Boundary::End => AlignError::EndOffsetNotExact { offset },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn miss(offset: usize, next: usize, next_boundary: usize, prev_end: Option<usize>, text: &str) -> NearMiss<'_> {
        NearMiss { offset, next, next_boundary, prev_end, text }
    }

    #[test]
    fn chains_only_hold_strategies_for_their_boundary() {
        assert!(START_CHAIN.iter().all(|s| s.boundary() == Boundary::Start));
        assert!(END_CHAIN.iter().all(|s| s.boundary() == Boundary::End));
    }

    #[test]
    fn subword_end_wins_over_trailing_delimiter() {
        // "ab c": token 1 ends at 4, prev token ends at 2; offset 3 is both
        // one short of token 1 and one past a space after token 0.
        let m = miss(3, 1, 4, Some(2), "ab c");
        assert_eq!(recover(END_CHAIN, SlackMask::all(), &m), Some((1, Slack::SubwordEnd)));
        assert_eq!(recover(END_CHAIN, SlackMask::TRAILING_DELIMITER, &m), Some((0, Slack::TrailingDelimiter)));
        assert_eq!(recover(END_CHAIN, SlackMask::empty(), &m), None);
    }

    #[test]
    fn trailing_delimiter_requires_whitespace() {
        let m = miss(3, 1, 7, Some(2), "ab,cdef");
        assert_eq!(Slack::TrailingDelimiter.recover(&m), None);
        let m = miss(3, 1, 7, Some(2), "ab\tcdef");
        assert_eq!(Slack::TrailingDelimiter.recover(&m), Some(0));
    }

    #[test]
    fn trailing_delimiter_needs_a_previous_token() {
        let m = miss(1, 0, 5, None, " abcd");
        assert_eq!(Slack::TrailingDelimiter.recover(&m), None);
    }

    #[test]
    fn slack_names_parse_back() {
        for slack in Slack::ALL {
            assert_eq!(slack.name().parse::<Slack>(), Ok(slack));
        }
        assert!("fuzzy".parse::<Slack>().is_err());
    }
}
