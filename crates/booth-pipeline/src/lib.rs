//! Voice reply pipeline: one inbound audio clip plus a character selector in,
//! a spoken character-voiced reply out.
//!
//! Stages run strictly in order, each consuming the previous stage's artifact
//! inside a request-scoped scratch directory. Recognition, completion, and
//! synthesis failures are fatal; voice conversion degrades to the synthesized
//! audio instead of failing the run. Callers receive at most two records —
//! a progress `stt` record and a terminal `final` record — or a single
//! terminal `error` record.

mod record;
mod run;

pub use record::ReplyRecord;
pub use run::{ConversionOutcome, ReplyPipeline, ReplyRequest, ReplyStage};
