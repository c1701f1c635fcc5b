//! Alignment engine.
//!
//! The engine maps character-offset mentions onto an existing token
//! segmentation. It is split into focused submodules under `src/engine/`:
//!
//! ```text
//! token spans ── TokenIndex::build          (token_index.rs)
//!                     │   validate ordering + non-overlap
//!                     v
//! mention ───── Resolver::resolve           (resolver.rs)
//!                 - exact start / end lookup (binary search)
//!                 - slack chain on near misses  (slack.rs)
//!                 - nearest-token fallback + OffsetReport
//!                     │
//!                     v
//!               ingest                      (ingest.rs)
//!                 - subtype filter
//!                 - SpanLayer::try_insert (first inserted wins)
//!                 - Diagnostics counters     (diagnostics.rs)
//!                     │
//!                     v
//!               SpanLayer + Diagnostics
//! ```
//!
//! ## Responsibilities by module
//!
//! - `token_index.rs`: immutable table of token starts/ends with the lookups
//!   the resolver needs.
//! - `slack.rs`: the named tolerance strategies and the `SlackMask` that
//!   toggles them.
//! - `resolver.rs`: exact resolution, fallback resolution and the offset-error
//!   report.
//! - `ingest.rs`: the per-document pass; owns the conflict-checked `SpanLayer`.
//! - `diagnostics.rs`: counters and per-mention records produced by a pass.
//!
//! ## Adding a tolerance
//!
//! Add a `Slack` variant, give it a `SlackMask` bit, and place it in the
//! start or end chain in `slack.rs`. Chains are tried in order and the first
//! strategy that matches wins.
//!
//! Each pass logs through `tracing`; set `RUST_LOG=tokalign=debug` to see
//! overlap rejections as well as offset errors.

#[path = "engine/diagnostics.rs"]
mod diagnostics;
#[path = "engine/ingest.rs"]
mod ingest;
#[path = "engine/resolver.rs"]
mod resolver;
#[path = "engine/slack.rs"]
mod slack;
#[path = "engine/token_index.rs"]
mod token_index;


pub use diagnostics::{Diagnostics, InsertRejection, OffsetReport, OverlapConflict};
pub(crate) use ingest::ingest;
pub use ingest::SpanLayer;
pub use resolver::{Resolution, Resolver};
pub use slack::{Slack, SlackMask};
pub use token_index::TokenIndex;
