use std::fmt;
use std::str::FromStr;

mod macros;
mod api;
mod engine;
mod error;

pub use api::{AlignOptions, Alignment, MENTION_LAYER, NER_LAYER, align, align_with};
pub use engine::{
    Diagnostics, InsertRejection, OffsetReport, OverlapConflict, Resolution, Resolver, Slack, SlackMask, SpanLayer, TokenIndex,
};
pub use error::AlignError;

/// Attribute name under which an [`AnnotatedSpan`] records its mention kind.
pub const MENTION_TYPE_ATTRIBUTE: &str = "EntityMentionType";

// --- Input types ------------------------------------------------------------

/// ERE noun type of a mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MentionKind {
    /// `NAM`: a proper name.
    Named,
    /// `NOM`: a common noun phrase.
    Nominal,
    /// `PRO`: a pronoun.
    Pronominal,
}

impl MentionKind {
    /// The ERE markup code for this kind.
    pub fn code(self) -> &'static str {
        match self {
            MentionKind::Named => "NAM",
            MentionKind::Nominal => "NOM",
            MentionKind::Pronominal => "PRO",
        }
    }

    /// Nominal and pronominal mentions only appear in the full mention layer.
    pub fn is_named(self) -> bool {
        self == MentionKind::Named
    }
}

impl FromStr for MentionKind {
    type Err = AlignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NAM" => Ok(MentionKind::Named),
            "NOM" => Ok(MentionKind::Nominal),
            "PRO" => Ok(MentionKind::Pronominal),
            other => Err(AlignError::UnknownMentionKind { code: other.to_string() }),
        }
    }
}

impl fmt::Display for MentionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A single annotated mention, located by byte offset and length in the
/// source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    pub label: String,
    pub kind: MentionKind,
    /// Start byte offset.
    pub offset: usize,
    /// Length in bytes.
    pub length: usize,
    /// Surface text as recorded by the annotator, if any.
    pub text: Option<String>,
}

impl Mention {
    pub fn new(label: impl Into<String>, kind: MentionKind, offset: usize, length: usize) -> Self {
        Mention { label: label.into(), kind, offset, length, text: None }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// End byte offset (exclusive), saturating at `usize::MAX`.
    pub fn end(&self) -> usize {
        self.offset.saturating_add(self.length)
    }

    /// End byte offset (exclusive), or `None` when `offset + length` overflows.
    pub fn checked_end(&self) -> Option<usize> {
        self.offset.checked_add(self.length)
    }
}

/// An annotated entity: an opaque id plus its mentions in document order.
///
/// The id only groups mentions; alignment never looks at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: String,
    pub label: String,
    pub mentions: Vec<Mention>,
}

impl Entity {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Entity { id: id.into(), label: label.into(), mentions: Vec::new() }
    }

    /// Append a mention carrying this entity's label.
    pub fn mention(mut self, kind: MentionKind, offset: usize, length: usize) -> Self {
        let mention = Mention::new(self.label.clone(), kind, offset, length);
        self.mentions.push(mention);
        self
    }

    /// Append a fully specified mention.
    pub fn push(&mut self, mention: Mention) {
        self.mentions.push(mention);
    }
}

// --- Output types -----------------------------------------------------------

/// Inclusive token interval a mention resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedRange {
    pub start: usize,
    pub end: usize,
}

impl ResolvedRange {
    pub fn new(start: usize, end: usize) -> Self {
        ResolvedRange { start, end }
    }
}

impl fmt::Display for ResolvedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Which side of a mention failed exact resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Boundary {
    Start,
    End,
}

/// A labeled span over tokens `start..end` (end exclusive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedSpan {
    pub label: String,
    pub start: usize,
    pub end: usize,
    /// Value of the [`MENTION_TYPE_ATTRIBUTE`] attribute.
    pub kind: MentionKind,
}

impl AnnotatedSpan {
    pub fn from_range(label: impl Into<String>, range: ResolvedRange, kind: MentionKind) -> Self {
        AnnotatedSpan { label: label.into(), start: range.start, end: range.end + 1, kind }
    }

    /// Number of tokens covered.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// True if both spans cover at least one common token.
    pub fn overlaps(&self, other: &AnnotatedSpan) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for AnnotatedSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}..{}] ({})", self.label, self.start, self.end, self.kind)
    }
}
