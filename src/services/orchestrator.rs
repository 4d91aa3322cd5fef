//! Query orchestrator.
//!
//! Owns the view state and drives it from three sources: settled input values
//! coming out of the debouncer, direct search calls, and the one-time
//! leaderboard load at startup. Every search takes a generation from the
//! sequencer and may only touch the view if it is still the newest when it
//! completes, so a slow response can never overwrite a faster, newer one.
//!
//! Trending writes are handed to a dedicated worker over a channel. Their
//! outcome is logged and broadcast, and never reaches the search error state.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{RwLock, broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::constants::{limits, messages};
use crate::domain::{Generation, RequestSequencer, ViewEvent};
use crate::models::{Movie, TrendingRecord, ViewState};
use crate::services::debounce::debounce;
use crate::services::search::{SearchError, SearchService};
use crate::services::trending::TrendingService;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("orchestrator already started")]
    AlreadyStarted,

    #[error("input loop is not running")]
    Stopped,
}

/// A request to count `term` as having led to `movie`.
#[derive(Debug, Clone)]
pub struct TrendingCommand {
    pub term: String,
    pub movie: Movie,
}

struct Receivers {
    input: mpsc::Receiver<String>,
    recorder: mpsc::UnboundedReceiver<TrendingCommand>,
}

struct Inner {
    search: SearchService,
    trending: Arc<TrendingService>,
    state: RwLock<ViewState>,
    sequencer: RequestSequencer,
    events: broadcast::Sender<ViewEvent>,
    input: mpsc::Sender<String>,
    recorder: mpsc::UnboundedSender<TrendingCommand>,
    receivers: Mutex<Option<Receivers>>,
    debounce: Duration,
}

#[derive(Clone)]
pub struct QueryOrchestrator {
    inner: Arc<Inner>,
}

/// Background tasks spawned by [`QueryOrchestrator::start`].
pub struct OrchestratorTasks {
    handles: Vec<JoinHandle<()>>,
}

impl OrchestratorTasks {
    pub fn abort(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

impl QueryOrchestrator {
    #[must_use]
    pub fn new(
        search: SearchService,
        trending: Arc<TrendingService>,
        debounce: Duration,
        event_buffer: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(event_buffer.max(1));
        let (input, input_rx) = mpsc::channel(limits::INPUT_BUFFER);
        let (recorder, recorder_rx) = mpsc::unbounded_channel();

        Self {
            inner: Arc::new(Inner {
                search,
                trending,
                state: RwLock::new(ViewState::default()),
                sequencer: RequestSequencer::new(),
                events,
                input,
                recorder,
                receivers: Mutex::new(Some(Receivers {
                    input: input_rx,
                    recorder: recorder_rx,
                })),
                debounce,
            }),
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.inner.events.subscribe()
    }

    pub async fn snapshot(&self) -> ViewState {
        self.inner.state.read().await.clone()
    }

    fn emit(&self, event: ViewEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }

    /// Spawns the trending worker and the input pipeline, issues the initial
    /// popular listing and loads the leaderboard once.
    pub async fn start(&self) -> Result<OrchestratorTasks, OrchestratorError> {
        let receivers = self
            .inner
            .receivers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(OrchestratorError::AlreadyStarted)?;

        let (settled_tx, settled_rx) = mpsc::channel(limits::INPUT_BUFFER);

        // The initial empty term settles without waiting out the debounce.
        settled_tx
            .send(String::new())
            .await
            .map_err(|_| OrchestratorError::Stopped)?;

        let recorder = tokio::spawn(run_recorder(
            self.inner.trending.clone(),
            receivers.recorder,
            self.inner.events.clone(),
        ));
        let debouncer = tokio::spawn(debounce(receivers.input, settled_tx, self.inner.debounce));
        let settled = tokio::spawn(self.clone().run_settled(settled_rx));

        let this = self.clone();
        let trending = tokio::spawn(async move {
            this.load_trending().await;
        });

        info!(debounce = ?self.inner.debounce, "Query orchestrator started");

        Ok(OrchestratorTasks {
            handles: vec![recorder, debouncer, settled, trending],
        })
    }

    /// Records a raw input value. The search runs once input settles.
    pub async fn input(&self, value: impl Into<String>) -> Result<(), OrchestratorError> {
        let value = value.into();

        self.inner.state.write().await.search_term = value.clone();
        self.emit(ViewEvent::InputChanged {
            value: value.clone(),
        });

        self.inner
            .input
            .send(value)
            .await
            .map_err(|_| OrchestratorError::Stopped)
    }

    async fn run_settled(self, mut settled: mpsc::Receiver<String>) {
        let mut last: Option<String> = None;

        while let Some(term) = settled.recv().await {
            if last.as_deref() == Some(term.as_str()) {
                debug!(term = %term, "Settled value unchanged, skipping search");
                continue;
            }
            last = Some(term.clone());

            let this = self.clone();
            tokio::spawn(async move {
                // Failures are already reflected in view state.
                let _ = this.search(&term).await;
            });
        }

        debug!("Settled input loop stopped");
    }

    /// Looks up movies for `term` and updates the view if this request is
    /// still the newest one. A non-empty term with results is queued for the
    /// trending counter.
    pub async fn search(&self, term: &str) -> Result<Vec<Movie>, SearchError> {
        // Issued under the lock so an older request cannot mark the view
        // as loading after a newer one has completed.
        let generation = {
            let mut state = self.inner.state.write().await;
            state.loading = true;
            state.error = None;
            self.inner.sequencer.issue()
        };
        self.emit(ViewEvent::SearchStarted {
            generation,
            term: term.to_string(),
        });

        let result = self.inner.search.search(term).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.outcome(),
        };
        metrics::counter!("movie_searches_total", "outcome" => outcome).increment(1);

        if let Ok(movies) = &result
            && !term.is_empty()
            && let Some(first) = movies.first()
        {
            self.record_in_background(term, first);
        }

        self.apply(generation, term, &result).await;
        result
    }

    fn record_in_background(&self, term: &str, movie: &Movie) {
        let command = TrendingCommand {
            term: term.to_string(),
            movie: movie.clone(),
        };

        if self.inner.recorder.send(command).is_err() {
            warn!(term, "Trending worker is gone, search not counted");
        }
    }

    async fn apply(
        &self,
        generation: Generation,
        term: &str,
        result: &Result<Vec<Movie>, SearchError>,
    ) {
        let mut state = self.inner.state.write().await;

        if !self.inner.sequencer.is_current(generation) {
            let latest = self.inner.sequencer.latest();
            debug!(%generation, %latest, term, "Dropping stale search response");
            metrics::counter!("stale_responses_total").increment(1);
            self.emit(ViewEvent::StaleResponseDropped { generation, latest });
            return;
        }

        state.loading = false;
        state.generation = generation;

        match result {
            Ok(movies) => {
                state.movies.clone_from(movies);
                state.error = None;
                self.emit(ViewEvent::SearchFinished {
                    generation,
                    term: term.to_string(),
                    results: movies.len(),
                });
            }
            Err(e) => {
                if let SearchError::Fetch(source) = e {
                    error!(term, "Error fetching movies: {}", source);
                }
                state.movies.clear();
                state.error = Some(e.user_message().to_string());
                self.emit(ViewEvent::SearchFailed {
                    generation,
                    term: term.to_string(),
                    message: e.user_message().to_string(),
                });
            }
        }
    }

    /// Refreshes the leaderboard in view state and returns it.
    pub async fn load_trending(&self) -> Vec<TrendingRecord> {
        {
            let mut state = self.inner.state.write().await;
            state.trending_loading = true;
            state.trending_error = None;
        }

        let result = self.inner.trending.fetch_top_trending().await;

        let mut state = self.inner.state.write().await;
        state.trending_loading = false;

        match result {
            Ok(records) => {
                if records.is_empty() {
                    state.trending_error = Some(messages::NO_TRENDING_FOUND.to_string());
                }
                state.trending = records;
                self.emit(ViewEvent::TrendingLoaded {
                    count: state.trending.len(),
                });
            }
            Err(e) => {
                error!("Failed to load trending movies: {}", e);
                state.trending.clear();
                state.trending_error = Some(messages::FETCH_TRENDING_FAILED.to_string());
                self.emit(ViewEvent::TrendingFailed {
                    message: messages::FETCH_TRENDING_FAILED.to_string(),
                });
            }
        }

        state.trending.clone()
    }
}

async fn run_recorder(
    trending: Arc<TrendingService>,
    mut commands: mpsc::UnboundedReceiver<TrendingCommand>,
    events: broadcast::Sender<ViewEvent>,
) {
    while let Some(TrendingCommand { term, movie }) = commands.recv().await {
        let event = match trending.record_selection(&term, &movie).await {
            Ok(outcome) => {
                metrics::counter!("trending_records_total", "outcome" => "success").increment(1);
                ViewEvent::TrendingRecorded {
                    term,
                    count: outcome.count(),
                }
            }
            Err(e) => {
                error!(term = %term, "Error updating trending: {}", e);
                metrics::counter!("trending_records_total", "outcome" => "error").increment(1);
                ViewEvent::TrendingRecordFailed {
                    term,
                    message: e.to_string(),
                }
            }
        };
        let _ = events.send(event);
    }

    debug!("Trending worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::tmdb::TmdbError;
    use crate::db::{MemoryTrendingRepository, StoreError, StoreResult, TrendingRepository};
    use crate::models::{NewTrendingRecord, PosterUri};
    use crate::services::search::tests::FakeCatalog;
    use async_trait::async_trait;

    struct UnavailableRepository;

    #[async_trait]
    impl TrendingRepository for UnavailableRepository {
        async fn find_by_term(&self, _term: &str) -> StoreResult<Vec<TrendingRecord>> {
            Err(StoreError::Unavailable("offline".to_string()))
        }

        async fn list_top(&self, _limit: usize) -> StoreResult<Vec<TrendingRecord>> {
            Err(StoreError::Unavailable("offline".to_string()))
        }

        async fn create(&self, _record: NewTrendingRecord) -> StoreResult<TrendingRecord> {
            Err(StoreError::Unavailable("offline".to_string()))
        }

        async fn update_count(&self, _id: &str, _count: i64) -> StoreResult<TrendingRecord> {
            Err(StoreError::Unavailable("offline".to_string()))
        }
    }

    fn orchestrator(
        catalog: &Arc<FakeCatalog>,
        repository: Arc<dyn TrendingRepository>,
    ) -> QueryOrchestrator {
        QueryOrchestrator::new(
            SearchService::new(catalog.clone()),
            Arc::new(TrendingService::new(repository, PosterUri::default())),
            Duration::from_millis(500),
            64,
        )
    }

    async fn wait_for<F>(events: &mut broadcast::Receiver<ViewEvent>, matches: F) -> ViewEvent
    where
        F: Fn(&ViewEvent) -> bool,
    {
        tokio::time::timeout(Duration::from_secs(30), async {
            loop {
                let event = events.recv().await.expect("event bus closed");
                if matches(&event) {
                    return event;
                }
            }
        })
        .await
        .expect("timed out waiting for event")
    }

    /// Starts the background tasks and waits for the initial popular listing
    /// to land, so later searches are not raced by it.
    async fn start_settled(
        orchestrator: &QueryOrchestrator,
        events: &mut broadcast::Receiver<ViewEvent>,
    ) -> OrchestratorTasks {
        let tasks = orchestrator.start().await.unwrap();
        wait_for(events, |e| {
            matches!(
                e,
                ViewEvent::SearchFinished { term, .. } | ViewEvent::SearchFailed { term, .. }
                    if term.is_empty()
            )
        })
        .await;
        tasks
    }

    fn batman() -> Movie {
        Movie::new(414906, "The Batman").with_poster("/poster.jpg")
    }

    #[tokio::test]
    async fn test_search_records_first_result() {
        let catalog = Arc::new(FakeCatalog::default());
        catalog.respond("batman", Ok(vec![batman(), Movie::new(268, "Batman")]));
        let repository = Arc::new(MemoryTrendingRepository::new());
        let orchestrator = orchestrator(&catalog, repository.clone());
        let mut events = orchestrator.subscribe();
        let _tasks = start_settled(&orchestrator, &mut events).await;

        let movies = orchestrator.search("batman").await.unwrap();
        assert_eq!(movies.len(), 2);

        let recorded = wait_for(&mut events, |e| {
            matches!(e, ViewEvent::TrendingRecorded { .. })
        })
        .await;
        assert_eq!(
            recorded,
            ViewEvent::TrendingRecorded {
                term: "batman".to_string(),
                count: 1
            }
        );

        let records = repository.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].movie_id, 414906);
        assert_eq!(
            records[0].poster_uri.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/poster.jpg")
        );

        orchestrator.search("batman").await.unwrap();
        let recorded = wait_for(&mut events, |e| {
            matches!(e, ViewEvent::TrendingRecorded { .. })
        })
        .await;
        assert_eq!(
            recorded,
            ViewEvent::TrendingRecorded {
                term: "batman".to_string(),
                count: 2
            }
        );
        assert_eq!(repository.records().await.len(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_clears_results_and_skips_recording() {
        let catalog = Arc::new(FakeCatalog::default());
        catalog.respond("batman", Ok(vec![batman()]));
        catalog.respond("broken", Err(500));
        catalog.respond("heat", Ok(vec![Movie::new(949, "Heat")]));
        let repository = Arc::new(MemoryTrendingRepository::new());
        let orchestrator = orchestrator(&catalog, repository.clone());
        let mut events = orchestrator.subscribe();
        let _tasks = start_settled(&orchestrator, &mut events).await;

        orchestrator.search("batman").await.unwrap();
        let err = orchestrator.search("broken").await.unwrap_err();
        assert!(matches!(
            err,
            SearchError::Fetch(TmdbError::Api { status: 500, .. })
        ));

        let state = orchestrator.snapshot().await;
        assert!(state.movies.is_empty());
        assert_eq!(state.error.as_deref(), Some("Error fetching movies"));
        assert!(!state.loading);

        orchestrator.search("heat").await.unwrap();

        let first = wait_for(&mut events, |e| {
            matches!(e, ViewEvent::TrendingRecorded { .. })
        })
        .await;
        let second = wait_for(&mut events, |e| {
            matches!(e, ViewEvent::TrendingRecorded { .. })
        })
        .await;
        assert!(matches!(first, ViewEvent::TrendingRecorded { term, .. } if term == "batman"));
        assert!(matches!(second, ViewEvent::TrendingRecorded { term, .. } if term == "heat"));
        assert_eq!(repository.records().await.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_results_show_distinct_message() {
        let catalog = Arc::new(FakeCatalog::default());
        catalog.respond("zzzz", Ok(vec![]));
        let orchestrator = orchestrator(&catalog, Arc::new(MemoryTrendingRepository::new()));

        let err = orchestrator.search("zzzz").await.unwrap_err();
        assert!(matches!(err, SearchError::NoResults));

        let state = orchestrator.snapshot().await;
        assert!(state.movies.is_empty());
        assert_eq!(state.error.as_deref(), Some("No movies found"));
    }

    #[tokio::test]
    async fn test_trending_write_failure_leaves_search_state_alone() {
        let catalog = Arc::new(FakeCatalog::default());
        catalog.respond("batman", Ok(vec![batman()]));
        let orchestrator = orchestrator(&catalog, Arc::new(UnavailableRepository));
        let mut events = orchestrator.subscribe();
        let _tasks = start_settled(&orchestrator, &mut events).await;

        orchestrator.search("batman").await.unwrap();

        let failed = wait_for(&mut events, |e| {
            matches!(e, ViewEvent::TrendingRecordFailed { .. })
        })
        .await;
        assert!(matches!(failed, ViewEvent::TrendingRecordFailed { term, .. } if term == "batman"));

        let state = orchestrator.snapshot().await;
        assert_eq!(state.error, None);
        assert_eq!(state.movies, vec![batman()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_dropped() {
        let catalog = Arc::new(FakeCatalog::default());
        catalog.respond("slow", Ok(vec![Movie::new(1, "Slow")]));
        catalog.delay("slow", Duration::from_millis(800));
        catalog.respond("fast", Ok(vec![Movie::new(2, "Fast")]));
        catalog.delay("fast", Duration::from_millis(50));
        let orchestrator = orchestrator(&catalog, Arc::new(MemoryTrendingRepository::new()));
        let mut events = orchestrator.subscribe();

        let (slow, fast) = tokio::join!(orchestrator.search("slow"), orchestrator.search("fast"));
        assert!(slow.is_ok());
        assert!(fast.is_ok());

        let state = orchestrator.snapshot().await;
        assert_eq!(state.movies, vec![Movie::new(2, "Fast")]);
        assert_eq!(state.generation, Generation::new(2));
        assert!(!state.loading);

        let dropped = wait_for(&mut events, |e| {
            matches!(e, ViewEvent::StaleResponseDropped { .. })
        })
        .await;
        assert_eq!(
            dropped,
            ViewEvent::StaleResponseDropped {
                generation: Generation::new(1),
                latest: Generation::new(2),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_searches_settle_not_loading() {
        let catalog = Arc::new(FakeCatalog::default());
        let terms: Vec<String> = (0..8).map(|i| format!("term{i}")).collect();
        for (i, term) in terms.iter().enumerate() {
            catalog.respond(term, Ok(vec![Movie::new(i64::try_from(i).unwrap() + 1, term)]));
            // Later requests finish first.
            catalog.delay(term, Duration::from_millis(400 - 50 * u64::try_from(i).unwrap()));
        }
        let orchestrator = orchestrator(&catalog, Arc::new(MemoryTrendingRepository::new()));

        futures::future::join_all(terms.iter().map(|term| orchestrator.search(term))).await;

        let state = orchestrator.snapshot().await;
        assert!(!state.loading);
        assert_eq!(state.generation, Generation::new(8));
        assert_eq!(state.movies, vec![Movie::new(8, "term7")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_load_and_debounced_input() {
        let catalog = Arc::new(FakeCatalog::default());
        catalog.respond("", Ok(vec![Movie::new(10, "Popular")]));
        catalog.respond("bat", Ok(vec![batman()]));
        let orchestrator = orchestrator(&catalog, Arc::new(MemoryTrendingRepository::new()));
        let mut events = orchestrator.subscribe();
        let _tasks = start_settled(&orchestrator, &mut events).await;
        assert_eq!(
            orchestrator.snapshot().await.movies,
            vec![Movie::new(10, "Popular")]
        );

        for value in ["b", "ba", "bat"] {
            orchestrator.input(value).await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(orchestrator.snapshot().await.search_term, "bat");

        wait_for(&mut events, |e| {
            matches!(e, ViewEvent::SearchFinished { term, .. } if term == "bat")
        })
        .await;

        // Re-settling on the same value does not fetch again.
        orchestrator.input("bat").await.unwrap();
        tokio::time::sleep(Duration::from_millis(1000)).await;

        assert_eq!(
            catalog.requests(),
            vec![
                "/discover/movie?sort_by=popularity.desc".to_string(),
                "/search/movie?query=bat".to_string(),
            ]
        );
        assert_eq!(orchestrator.snapshot().await.movies, vec![batman()]);
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let catalog = Arc::new(FakeCatalog::default());
        let orchestrator = orchestrator(&catalog, Arc::new(MemoryTrendingRepository::new()));

        let tasks = orchestrator.start().await.unwrap();
        assert!(matches!(
            orchestrator.start().await,
            Err(OrchestratorError::AlreadyStarted)
        ));
        tasks.abort();
    }

    #[tokio::test]
    async fn test_leaderboard_states() {
        let catalog = Arc::new(FakeCatalog::default());

        let empty = orchestrator(&catalog, Arc::new(MemoryTrendingRepository::new()));
        assert!(empty.load_trending().await.is_empty());
        let state = empty.snapshot().await;
        assert_eq!(state.trending_error.as_deref(), Some("No trending movies found"));
        assert!(!state.trending_loading);

        let offline = orchestrator(&catalog, Arc::new(UnavailableRepository));
        assert!(offline.load_trending().await.is_empty());
        let state = offline.snapshot().await;
        assert_eq!(
            state.trending_error.as_deref(),
            Some("Error fetching trending movies")
        );

        let populated = orchestrator(
            &catalog,
            Arc::new(MemoryTrendingRepository::with_records(vec![
                TrendingRecord {
                    id: "a".to_string(),
                    search_term: "alien".to_string(),
                    count: 2,
                    movie_id: 348,
                    poster_uri: None,
                },
                TrendingRecord {
                    id: "b".to_string(),
                    search_term: "batman".to_string(),
                    count: 5,
                    movie_id: 414906,
                    poster_uri: None,
                },
            ])),
        );
        let trending = populated.load_trending().await;
        assert_eq!(trending[0].search_term, "batman");
        assert_eq!(populated.snapshot().await.trending_error, None);
    }
}
