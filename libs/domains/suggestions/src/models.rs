use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

pub const DEFAULT_COUNT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "lowercase")]
pub enum FioPart {
    Surname,
    Name,
    Patronymic,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "lowercase")]
pub enum FioGender {
    Male,
    Female,
    #[default]
    Unknown,
}

/// Request body understood by the external suggestion service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FioRequest {
    pub query: String,
    pub count: usize,
    pub gender: FioGender,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<FioPart>,
}

impl FioRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            count: DEFAULT_COUNT,
            gender: FioGender::default(),
            parts: Vec::new(),
        }
    }

    /// Cached answers are shared between requests that differ only in `count`
    /// and in the letter case of the query.
    pub fn cache_key(&self) -> CacheKey {
        let part = self.parts.first().map_or("fio", |p| p.as_ref());
        CacheKey {
            collection: format!("dadata-cache-{}-{}", part, self.gender.as_ref()),
            query: self.query.to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub collection: String,
    pub query: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FioData {
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub patronymic: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub source: Option<serde_json::Value>,
    #[serde(default)]
    pub qc: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FioSuggestion {
    pub value: String,
    #[serde(default)]
    pub unrestricted_value: String,
    #[serde(default)]
    pub data: FioData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SuggestionSource {
    BackendDb,
    Dadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionStats {
    /// Elapsed milliseconds.
    pub et: u64,
    pub src: SuggestionSource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FioSuggestions {
    pub suggestions: Vec<FioSuggestion>,
    pub stats: SuggestionStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cache_key() {
        let mut request = FioRequest::new("Ива");
        request.parts = vec![FioPart::Name];
        request.gender = FioGender::Male;
        let key = request.cache_key();
        assert_eq!(key.collection, "dadata-cache-name-male");
        assert_eq!(key.query, "ива");

        assert_eq!(FioRequest::new("x").cache_key().collection, "dadata-cache-fio-unknown");
    }

    #[test]
    fn test_request_wire_format() {
        let mut request = FioRequest::new("Ив");
        request.parts = vec![FioPart::Surname];
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "query": "Ив", "count": 10, "gender": "UNKNOWN", "parts": ["SURNAME"] })
        );
    }

    #[test]
    fn test_parses_provider_suggestion() {
        let suggestion: FioSuggestion = serde_json::from_value(json!({
            "value": "Иван",
            "unrestricted_value": "Иван",
            "data": { "surname": null, "name": "Иван", "patronymic": null, "gender": "MALE", "source": null, "qc": "0" }
        }))
        .unwrap();
        assert_eq!(suggestion.data.name.as_deref(), Some("Иван"));
        assert_eq!(suggestion.data.gender.as_deref(), Some("MALE"));
    }
}
