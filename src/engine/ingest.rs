//! Mention ingestion.
//!
//! One pass walks entities in document order and, within each entity, its
//! mentions in document order:
//!
//! ```text
//! mention ─┬─ filtered by kind? ──▶ skipped (never resolved)
//!          v
//!      Resolver::resolve ─┬─ Dropped ──▶ dropped + report
//!                         v
//!      AnnotatedSpan { start, end + 1 }
//!                         v
//!      SpanLayer::try_insert ─┬─ overlap ──▶ rejected + OverlapConflict
//!                             v
//!                          accepted
//! ```
//!
//! The first span to claim a token keeps it, so iteration order decides which
//! of two overlapping mentions survives. All counters and records are
//! returned in an `IngestRun`; the pass keeps no state of its own.

use super::diagnostics::{Diagnostics, InsertRejection, OffsetReport, OverlapConflict};
use super::resolver::{Resolution, Resolver};
use crate::{AlignOptions, AnnotatedSpan, Entity};
use tracing::{debug, warn};

/// Spans accepted for one document, keyed by the tokens they occupy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanLayer {
    name: String,
    spans: Vec<AnnotatedSpan>,
    /// For each token, the index in `spans` of the span covering it.
    owners: Vec<Option<usize>>,
}

impl SpanLayer {
    pub fn new(name: impl Into<String>, token_count: usize) -> Self {
        SpanLayer { name: name.into(), spans: Vec::new(), owners: vec![None; token_count] }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert `span` unless it is empty or one of its tokens is already
    /// covered.
    ///
    /// On overlap the candidate is handed back together with a copy of the
    /// first existing span it shares a token with. The layer is left
    /// untouched whenever an insert is refused.
    pub fn try_insert(&mut self, span: AnnotatedSpan) -> Result<(), InsertRejection> {
        if span.is_empty() {
            return Err(InsertRejection::Empty(span));
        }
        let clash = (span.start..span.end).find_map(|token| self.owners.get(token).copied().flatten());
        if let Some(existing) = clash {
            let existing = self.spans[existing].clone();
            return Err(InsertRejection::Overlap(OverlapConflict { candidate: span, existing }));
        }

        if span.end > self.owners.len() {
            self.owners.resize(span.end, None);
        }
        let id = self.spans.len();
        for owner in &mut self.owners[span.start..span.end] {
            *owner = Some(id);
        }
        self.spans.push(span);
        Ok(())
    }

    /// Span covering `token`, if any.
    pub fn covering(&self, token: usize) -> Option<&AnnotatedSpan> {
        self.owners.get(token).copied().flatten().map(|id| &self.spans[id])
    }

    /// Spans in insertion order.
    pub fn spans(&self) -> &[AnnotatedSpan] {
        &self.spans
    }

    /// Spans in token order.
    pub fn sorted(&self) -> Vec<&AnnotatedSpan> {
        let mut v: Vec<&AnnotatedSpan> = self.spans.iter().collect();
        v.sort_by_key(|s| (s.start, s.end));
        v
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn into_spans(self) -> Vec<AnnotatedSpan> {
        self.spans
    }
}

/// Everything one ingestion pass produced.
#[derive(Debug, Clone)]
pub(crate) struct IngestRun {
    pub layer: SpanLayer,
    pub diagnostics: Diagnostics,
    pub reports: Vec<OffsetReport>,
    pub conflicts: Vec<OverlapConflict>,
}

/// Resolve and insert every mention of `entities` into a fresh layer.
pub(crate) fn ingest(resolver: &Resolver<'_>, entities: &[Entity], options: &AlignOptions) -> IngestRun {
    let mut layer = SpanLayer::new(options.layer_name(), resolver.index().len());
    let mut diagnostics = Diagnostics::default();
    let mut reports = Vec::new();
    let mut conflicts = Vec::new();

    for entity in entities {
        for mention in &entity.mentions {
            if !mention.kind.is_named() && !options.include_nominal_and_pronominal {
                diagnostics.skipped += 1;
                continue;
            }

            let range = match resolver.resolve(mention) {
                Resolution::Exact(range) => range,
                Resolution::Recovered { range, report } => {
                    diagnostics.offset_errors += 1;
                    warn!(
                        entity = %entity.id,
                        raw = %report.raw,
                        text = ?report.surface,
                        boundary = ?report.boundary,
                        offset = report.offset,
                        end = report.end,
                        window = %report.window,
                        "mention offsets not on token boundaries; using nearest tokens"
                    );
                    reports.push(report);
                    range
                }
                Resolution::Dropped { report, error } => {
                    diagnostics.offset_errors += 1;
                    diagnostics.dropped += 1;
                    warn!(
                        entity = %entity.id,
                        raw = %report.raw,
                        text = ?report.surface,
                        boundary = ?report.boundary,
                        window = %report.window,
                        %error,
                        "dropping mention"
                    );
                    reports.push(report);
                    continue;
                }
            };

            let candidate = AnnotatedSpan::from_range(mention.label.clone(), range, mention.kind);
            match layer.try_insert(candidate) {
                Ok(()) => diagnostics.accepted += 1,
                Err(InsertRejection::Overlap(conflict)) => {
                    diagnostics.rejected_overlap += 1;
                    debug!(
                        entity = %entity.id,
                        candidate = %conflict.candidate,
                        existing = %conflict.existing,
                        "mention overlaps an accepted span"
                    );
                    conflicts.push(conflict);
                }
                Err(InsertRejection::Empty(span)) => {
                    diagnostics.dropped += 1;
                    debug!(entity = %entity.id, candidate = %span, "empty span not inserted");
                }
            }
        }
    }

    IngestRun { layer, diagnostics, reports, conflicts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MentionKind, ResolvedRange};

    fn span(label: &str, start: usize, last: usize) -> AnnotatedSpan {
        AnnotatedSpan::from_range(label, ResolvedRange::new(start, last), MentionKind::Named)
    }

    #[test]
    fn overlapping_insert_is_rejected_and_first_span_kept() {
        let mut layer = SpanLayer::new("NER_ERE", 6);
        layer.try_insert(span("PER", 2, 3)).unwrap();

        let Err(InsertRejection::Overlap(conflict)) = layer.try_insert(span("ORG", 3, 4)) else {
            panic!("expected overlap");
        };
        assert_eq!(conflict.existing, span("PER", 2, 3));
        assert_eq!(conflict.candidate, span("ORG", 3, 4));
        assert_eq!(layer.spans(), &[span("PER", 2, 3)]);
        assert!(layer.covering(4).is_none());
    }

    #[test]
    fn duplicate_range_is_rejected() {
        let mut layer = SpanLayer::new("NER_ERE", 4);
        layer.try_insert(span("PER", 1, 1)).unwrap();
        assert!(layer.try_insert(span("PER", 1, 1)).is_err());
        assert_eq!(layer.len(), 1);
    }

    #[test]
    fn zero_width_span_is_never_inserted() {
        let mut layer = SpanLayer::new("NER_ERE", 4);
        let empty = AnnotatedSpan { label: "PER".to_string(), start: 2, end: 2, kind: MentionKind::Named };

        assert_eq!(layer.try_insert(empty.clone()), Err(InsertRejection::Empty(empty.clone())));
        assert_eq!(layer.try_insert(empty.clone()), Err(InsertRejection::Empty(empty)));
        assert!(layer.is_empty());
    }

    #[test]
    fn inverted_span_is_refused_without_touching_the_layer() {
        let mut layer = SpanLayer::new("NER_ERE", 6);
        layer.try_insert(span("ORG", 3, 3)).unwrap();
        let inverted = AnnotatedSpan { label: "PER".to_string(), start: 5, end: 3, kind: MentionKind::Named };

        assert!(matches!(layer.try_insert(inverted), Err(InsertRejection::Empty(_))));
        assert_eq!(layer.spans(), &[span("ORG", 3, 3)]);
        assert!(layer.covering(4).is_none());
    }

    #[test]
    fn adjacent_spans_coexist_and_sort_by_token() {
        let mut layer = SpanLayer::new("MENTION_ERE", 5);
        layer.try_insert(span("LOC", 3, 4)).unwrap();
        layer.try_insert(span("PER", 0, 2)).unwrap();

        assert_eq!(layer.covering(2).map(|s| s.label.as_str()), Some("PER"));
        assert_eq!(layer.covering(3).map(|s| s.label.as_str()), Some("LOC"));
        let order: Vec<&str> = layer.sorted().iter().map(|s| s.label.as_str()).collect();
        assert_eq!(order, ["PER", "LOC"]);
    }
}
