use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

type CheckFn = Box<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Per-action parameter schemas.
///
/// A schema is a Rust type: the raw params must deserialize into it and then pass
/// its `validator` rules. Actions without a registered schema validate as `Ok`.
#[derive(Default)]
pub struct SchemaValidator {
    schemas: HashMap<String, CheckFn>,
}

impl SchemaValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P>(&mut self, action: impl Into<String>)
    where
        P: DeserializeOwned + Validate + 'static,
    {
        self.schemas.insert(action.into(), Box::new(check::<P>));
    }

    pub fn has_schema(&self, action: &str) -> bool {
        self.schemas.contains_key(action)
    }

    /// `Err` carries a message meant for the API client.
    pub fn validate(&self, action: &str, params: &Value) -> Result<(), String> {
        match self.schemas.get(action) {
            Some(check) => check(params),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut actions: Vec<&String> = self.schemas.keys().collect();
        actions.sort();
        f.debug_struct("SchemaValidator")
            .field("actions", &actions)
            .finish()
    }
}

fn check<P>(params: &Value) -> Result<(), String>
where
    P: DeserializeOwned + Validate,
{
    let parsed = P::deserialize(params).map_err(|e| e.to_string())?;
    parsed.validate().map_err(|e| describe_validation_errors(&e))
}

/// Flattens nested validator output into `path: message; path: message`, sorted by path.
pub fn describe_validation_errors(errors: &ValidationErrors) -> String {
    let mut lines = Vec::new();
    collect(errors, "", &mut lines);
    lines.sort();
    lines.join("; ")
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string());
                    out.push(format!("{}: {}", path, message));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect(nested, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}
