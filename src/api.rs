use crate::engine::{self, Diagnostics, OffsetReport, OverlapConflict, Resolver, SlackMask, SpanLayer, TokenIndex};
use crate::{AlignError, Entity};
use std::time::{Duration, Instant};
use tracing::{info, info_span};

/// Layer produced when only named mentions are kept.
pub const NER_LAYER: &str = "NER_ERE";
/// Layer produced when nominal and pronominal mentions are kept too.
pub const MENTION_LAYER: &str = "MENTION_ERE";

/// Options that affect alignment.
///
/// The default builds the named-entity layer with every slack enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignOptions {
    /// Keep `NOM` and `PRO` mentions. When false they are skipped before
    /// resolution and never produce offset diagnostics.
    pub include_nominal_and_pronominal: bool,
    /// Enabled slack tolerances.
    pub slack: SlackMask,
}

impl Default for AlignOptions {
    fn default() -> Self {
        Self::named_entities()
    }
}

impl AlignOptions {
    /// Named mentions only.
    pub fn named_entities() -> Self {
        AlignOptions { include_nominal_and_pronominal: false, slack: SlackMask::all() }
    }

    /// Named, nominal and pronominal mentions.
    pub fn all_mentions() -> Self {
        AlignOptions { include_nominal_and_pronominal: true, slack: SlackMask::all() }
    }

    pub fn with_slack(mut self, slack: SlackMask) -> Self {
        self.slack = slack;
        self
    }

    /// Name of the span layer these options produce.
    pub fn layer_name(&self) -> &'static str {
        if self.include_nominal_and_pronominal { MENTION_LAYER } else { NER_LAYER }
    }
}

/// Result from [`align`] and [`align_with`].
#[derive(Debug, Clone)]
pub struct Alignment {
    /// Accepted spans.
    pub layer: SpanLayer,
    pub diagnostics: Diagnostics,
    /// One report per mention that missed exact alignment.
    pub reports: Vec<OffsetReport>,
    /// One record per candidate rejected for overlap.
    pub conflicts: Vec<OverlapConflict>,
    /// Total elapsed time for the pass.
    pub elapsed: Duration,
}

/// Align `entities` onto `tokens` with the default [`AlignOptions`].
///
/// # Example
/// ```
/// use tokalign::{Entity, MentionKind, align};
///
/// let text = "Ada Lovelace wrote notes";
/// let tokens = [(0, 3), (4, 12), (13, 18), (19, 24)];
/// let people = Entity::new("e1", "PER").mention(MentionKind::Named, 0, 12);
///
/// let out = align(text, tokens, &[people]).unwrap();
/// assert_eq!(out.layer.spans()[0].start, 0);
/// assert_eq!(out.layer.spans()[0].end, 2);
/// ```
pub fn align<I>(text: &str, tokens: I, entities: &[Entity]) -> Result<Alignment, AlignError>
where
    I: IntoIterator<Item = (usize, usize)>,
{
    align_with(text, tokens, entities, &AlignOptions::default())
}

/// Align `entities` onto `tokens` using `options`.
///
/// Fails only if `tokens` is not an ordered, non-overlapping segmentation.
/// Every per-mention problem is recovered and reported in the result.
pub fn align_with<I>(text: &str, tokens: I, entities: &[Entity], options: &AlignOptions) -> Result<Alignment, AlignError>
where
    I: IntoIterator<Item = (usize, usize)>,
{
    let started = Instant::now();
    let index = TokenIndex::build(tokens)?;

    let span = info_span!("align", layer = options.layer_name(), tokens = index.len(), entities = entities.len());
    let _guard = span.enter();

    let resolver = Resolver::new(&index, text, options.slack);
    let run = engine::ingest(&resolver, entities, options);

    info!(
        accepted = run.diagnostics.accepted,
        rejected_overlap = run.diagnostics.rejected_overlap,
        offset_errors = run.diagnostics.offset_errors,
        dropped = run.diagnostics.dropped,
        skipped = run.diagnostics.skipped,
        "alignment finished"
    );

    Ok(Alignment {
        layer: run.layer,
        diagnostics: run.diagnostics,
        reports: run.reports,
        conflicts: run.conflicts,
        elapsed: started.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MentionKind;

    #[test]
    fn layer_name_follows_subtype_flag() {
        assert_eq!(AlignOptions::default().layer_name(), "NER_ERE");
        assert_eq!(AlignOptions::all_mentions().layer_name(), "MENTION_ERE");
    }

    #[test]
    fn align_with_returns_layer_and_counts() {
        let text = "Alice met Bob";
        let entities = [
            Entity::new("e1", "PER").mention(MentionKind::Named, 0, 5),
            Entity::new("e2", "PER").mention(MentionKind::Named, 10, 3),
        ];
        let out = align_with(text, [(0, 5), (6, 9), (10, 13)], &entities, &AlignOptions::all_mentions()).unwrap();

        assert_eq!(out.layer.name(), "MENTION_ERE");
        assert_eq!(out.layer.len(), 2);
        assert_eq!(out.diagnostics, Diagnostics { accepted: 2, ..Diagnostics::default() });
        assert!(out.reports.is_empty());
        assert!(out.elapsed >= Duration::ZERO);
    }

    #[test]
    fn disabled_slack_turns_near_miss_into_offset_error() {
        let text = " Bob ran";
        let entities = [Entity::new("e1", "PER").mention(MentionKind::Named, 0, 4)];
        let tokens = [(1, 4), (5, 8)];

        let lenient = align(text, tokens, &entities).unwrap();
        assert_eq!(lenient.diagnostics.offset_errors, 0);
        assert_eq!(lenient.layer.spans()[0].end, 1);

        let strict = AlignOptions::default().with_slack(SlackMask::empty());
        let out = align_with(text, tokens, &entities, &strict).unwrap();
        assert_eq!(out.diagnostics.offset_errors, 1);
        assert_eq!(out.diagnostics.accepted, 1);
        assert_eq!(out.reports[0].fallback, Some(crate::ResolvedRange::new(0, 0)));
    }

    #[test]
    fn invalid_tokenization_aborts_the_document() {
        let entities = [Entity::new("e1", "PER").mention(MentionKind::Named, 0, 5)];
        let err = align("Alice met", [(0, 5), (3, 9)], &entities).unwrap_err();
        assert!(matches!(err, AlignError::InvalidTokenization { index: 1, .. }));
    }
}
