//! Per-engine request lifecycle with a suspension circuit breaker.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{timeout, Instant};
use tracing::{debug, warn};

use crate::transport::HttpTransport;
use crate::{
    AnyEngine, EngineCategory, EngineResults, RequestParams, Result, SafeSearch, SearchError,
    SearchQuery,
};

/// Circuit-breaker state of one processor.
///
/// The zero value means active. Every failure re-arms the same fixed
/// cooldown window; only a successful request resets the state.
#[derive(Debug, Clone, Default)]
pub struct SuspendedStatus {
    /// Failures since the last success.
    pub continuous_errors: u32,
    /// End of the current suspension window.
    pub suspended_until: Option<Instant>,
    /// Reason of the last failure.
    pub reason: String,
}

impl SuspendedStatus {
    /// Returns true while the suspension window is open.
    pub fn is_suspended_at(&self, now: Instant) -> bool {
        self.suspended_until.is_some_and(|until| now < until)
    }
}

/// Wraps one engine for its whole lifetime.
pub struct Processor {
    engine: AnyEngine,
    transport: Arc<dyn HttpTransport>,
    cooldown: Duration,
    status: Mutex<SuspendedStatus>,
}

impl Processor {
    /// Creates a processor for an engine.
    pub fn new(engine: AnyEngine, transport: Arc<dyn HttpTransport>, cooldown: Duration) -> Self {
        Self {
            engine,
            transport,
            cooldown,
            status: Mutex::new(SuspendedStatus::default()),
        }
    }

    /// Returns the wrapped engine.
    pub fn engine(&self) -> &AnyEngine {
        &self.engine
    }

    /// Returns the engine name.
    pub fn name(&self) -> &str {
        self.engine.name()
    }

    /// Returns a snapshot of the suspension state.
    pub fn status(&self) -> SuspendedStatus {
        self.status.lock().clone()
    }

    /// Returns the suspension reason if the engine is currently suspended.
    pub fn suspended_reason(&self) -> Option<String> {
        let status = self.status.lock();
        status
            .is_suspended_at(Instant::now())
            .then(|| status.reason.clone())
    }

    /// Returns true if the engine is currently suspended.
    pub fn is_suspended(&self) -> bool {
        self.suspended_reason().is_some()
    }

    /// Builds request parameters, or `None` when the engine cannot serve the
    /// requested page, time range or safe search level.
    ///
    /// `query` must already carry resolved defaults; `deadline` is the
    /// caller's budget and is tightened to the engine's own timeout.
    pub fn get_params(
        &self,
        query: &SearchQuery,
        category: EngineCategory,
        deadline: Duration,
    ) -> Option<RequestParams> {
        let config = self.engine.config();
        let page = query.page.unwrap_or(1).max(1);
        let safesearch = query.safesearch.unwrap_or_default();

        if page > 1 && !config.paging {
            debug!("Skipping {}: no paging support", config.name);
            return None;
        }
        if config.max_page > 0 && page > config.max_page {
            debug!("Skipping {}: page {} beyond {}", config.name, page, config.max_page);
            return None;
        }
        if query.time_range.is_some() && !config.time_range {
            debug!("Skipping {}: no time range support", config.name);
            return None;
        }
        if safesearch == SafeSearch::Strict && !config.safesearch {
            debug!("Skipping {}: no safe search support", config.name);
            return None;
        }

        Some(RequestParams {
            query: query.query.clone(),
            category,
            page,
            page_size: query.page_size.unwrap_or(10).max(1),
            safesearch,
            time_range: query.time_range,
            language: query.language.clone().unwrap_or_else(|| "all".to_string()),
            locale: query.locale.clone().unwrap_or_default(),
            timeout: deadline.min(config.timeout_duration()),
            engine_data: query.engine_data.get(&config.name).cloned().unwrap_or_default(),
            ..Default::default()
        })
    }

    /// Runs the engine. `Ok(None)` means an online engine declined the request.
    pub async fn search(&self, mut params: RequestParams) -> Result<Option<EngineResults>> {
        match &self.engine {
            AnyEngine::Offline(engine) => {
                let query = params.query.clone();
                engine.search(&query, &params).await.map(Some)
            }
            AnyEngine::Online(engine) => {
                let query = params.query.clone();
                engine.request(&query, &mut params)?;
                if params.url.is_empty() {
                    debug!("Engine {} declined the request", self.name());
                    return Ok(None);
                }

                let response = match timeout(params.timeout, self.transport.send(&params)).await {
                    Ok(Ok(response)) => response,
                    Ok(Err(e)) => {
                        self.suspend(e.to_string());
                        return Err(e);
                    }
                    Err(_) => {
                        self.suspend("timeout".to_string());
                        return Err(SearchError::Timeout);
                    }
                };

                if params.raise_for_status && !response.is_success() {
                    self.suspend(format!("HTTP status {}", response.status));
                    return Err(SearchError::HttpStatus {
                        engine: self.name().to_string(),
                        status: response.status,
                    });
                }

                self.reset();
                engine.response(&response, &params).map(Some)
            }
        }
    }

    fn suspend(&self, reason: String) {
        let mut status = self.status.lock();
        status.continuous_errors += 1;
        status.suspended_until = Some(Instant::now() + self.cooldown);
        warn!(
            "Suspending engine {} for {:?} after {} error(s): {}",
            self.name(),
            self.cooldown,
            status.continuous_errors,
            reason
        );
        status.reason = reason;
    }

    fn reset(&self) {
        let mut status = self.status.lock();
        if status.continuous_errors > 0 || status.suspended_until.is_some() {
            debug!("Engine {} is active again", self.name());
            *status = SuspendedStatus::default();
        }
    }
}

impl std::fmt::Debug for Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor")
            .field("engine", &self.engine)
            .field("cooldown", &self.cooldown)
            .field("status", &self.status())
            .finish()
    }
}
