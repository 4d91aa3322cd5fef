use serde::Serialize;

use super::{Movie, TrendingRecord};
use crate::domain::Generation;

/// Everything the front-end renders. Mutated only by the orchestrator.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ViewState {
    pub search_term: String,
    pub movies: Vec<Movie>,
    pub loading: bool,
    pub error: Option<String>,
    pub trending: Vec<TrendingRecord>,
    pub trending_loading: bool,
    pub trending_error: Option<String>,
    /// Sequence number of the search whose outcome is displayed.
    pub generation: Generation,
}
