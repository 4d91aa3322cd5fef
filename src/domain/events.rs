//! View events.
//!
//! Broadcast by the query orchestrator whenever view state changes or a
//! background trending write completes, and streamed to browsers over SSE.

use serde::Serialize;

use super::Generation;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum ViewEvent {
    InputChanged {
        value: String,
    },

    SearchStarted {
        generation: Generation,
        term: String,
    },
    SearchFinished {
        generation: Generation,
        term: String,
        results: usize,
    },
    SearchFailed {
        generation: Generation,
        term: String,
        message: String,
    },
    /// A completion arrived after a newer request was issued and was dropped.
    StaleResponseDropped {
        generation: Generation,
        latest: Generation,
    },

    TrendingRecorded {
        term: String,
        count: i64,
    },
    TrendingRecordFailed {
        term: String,
        message: String,
    },

    TrendingLoaded {
        count: usize,
    },
    TrendingFailed {
        message: String,
    },
}
