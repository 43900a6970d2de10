use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::cache::SuggestionCache;
use crate::models::{FioRequest, FioSuggestions, SuggestionSource, SuggestionStats};
use crate::provider::SuggestionProvider;

/// How many suggestions are fetched from the provider and cached,
/// independent of the count the caller asked for.
pub const PROVIDER_FETCH_COUNT: usize = 20;

/// Name suggestions: Mongo cache first, then the external service.
/// Never fails; a provider error yields an empty list.
#[derive(Clone)]
pub struct FioSuggestionService {
    cache: Arc<dyn SuggestionCache>,
    provider: Arc<dyn SuggestionProvider>,
}

impl FioSuggestionService {
    pub fn new(cache: Arc<dyn SuggestionCache>, provider: Arc<dyn SuggestionProvider>) -> Self {
        Self { cache, provider }
    }

    pub async fn get_suggestions(&self, request: FioRequest) -> FioSuggestions {
        let started = Instant::now();
        let key = request.cache_key();

        let cached = match self.cache.lookup(&key).await {
            Ok(cached) => cached,
            Err(e) => {
                warn!(collection = %key.collection, error = %e, "Suggestion cache lookup failed");
                None
            }
        };

        let (mut suggestions, src) = match cached {
            Some(suggestions) => (suggestions, SuggestionSource::BackendDb),
            None => {
                let upstream = FioRequest {
                    count: PROVIDER_FETCH_COUNT,
                    ..request.clone()
                };
                match self.provider.fio(&upstream).await {
                    Ok(suggestions) => {
                        if let Err(e) = self.cache.store(&key, &suggestions).await {
                            warn!(collection = %key.collection, error = %e, "Suggestion cache store failed");
                        }
                        (suggestions, SuggestionSource::Dadata)
                    }
                    Err(e) => {
                        warn!(error = %e, "Suggestion service unavailable");
                        (Vec::new(), SuggestionSource::Dadata)
                    }
                }
            }
        };

        suggestions.truncate(request.count);
        let et = started.elapsed().as_millis() as u64;
        debug!(count = suggestions.len(), src = %src, et, "FIO suggestions");

        FioSuggestions {
            suggestions,
            stats: SuggestionStats { et, src },
        }
    }
}
