pub mod debounce;

pub mod orchestrator;
pub use orchestrator::{OrchestratorError, QueryOrchestrator};

pub mod search;
pub use search::{MovieCatalog, SearchError, SearchService};

pub mod trending;
pub use trending::{RecordOutcome, TrendingError, TrendingService};
