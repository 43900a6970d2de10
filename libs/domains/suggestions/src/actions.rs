//! The `core` dispatch target.

use api_dispatch::{ActionRegistry, ApiResult, RequestContext};
use serde::Deserialize;
use std::sync::Arc;
use strum::{Display, EnumString};
use validator::Validate;

use crate::models::{DEFAULT_COUNT, FioGender, FioPart, FioRequest, FioSuggestions};
use crate::service::{FioSuggestionService, PROVIDER_FETCH_COUNT};

pub const TARGET: &str = "core";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum CoreAction {
    GetFioSuggestions,
}

pub fn registry(service: Arc<FioSuggestionService>) -> ActionRegistry<CoreAction, FioSuggestionService> {
    ActionRegistry::new(TARGET, service).validated(CoreAction::GetFioSuggestions, get_fio_suggestions)
}

#[derive(Debug, Deserialize, Validate)]
pub struct FioSuggestionsParams {
    #[validate(length(min = 1, max = 300))]
    pub query: String,
    #[validate(range(min = 1, max = 20))]
    pub count: Option<usize>,
    pub gender: Option<FioGender>,
    #[serde(default)]
    pub parts: Vec<FioPart>,
}

async fn get_fio_suggestions(
    service: Arc<FioSuggestionService>,
    p: FioSuggestionsParams,
    _ctx: RequestContext,
) -> ApiResult<FioSuggestions> {
    let request = FioRequest {
        query: p.query,
        count: p.count.unwrap_or(DEFAULT_COUNT).min(PROVIDER_FETCH_COUNT),
        gender: p.gender.unwrap_or_default(),
        parts: p.parts,
    };
    Ok(service.get_suggestions(request).await)
}
