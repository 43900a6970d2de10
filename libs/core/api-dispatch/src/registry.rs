use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::future::Future;
use std::hash::Hash;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;
use validator::Validate;

use crate::context::RequestContext;
use crate::error::{ApiError, ApiResult};
use crate::schema::SchemaValidator;

/// Closed set of action names a service accepts. Usually a strum enum.
pub trait ActionId: Copy + Eq + Hash + Debug + Display + FromStr + Send + Sync + 'static {}

impl<T> ActionId for T where T: Copy + Eq + Hash + Debug + Display + FromStr + Send + Sync + 'static
{}

/// Whether an action's params pass through the [`SchemaValidator`] before the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamsSchema {
    Validated,
    Unvalidated,
}

type HandlerFuture = BoxFuture<'static, ApiResult<Map<String, Value>>>;
type Handler<S> = Box<dyn Fn(Arc<S>, Value, RequestContext) -> HandlerFuture + Send + Sync>;

struct Binding<S> {
    schema: ParamsSchema,
    handler: Handler<S>,
}

/// A named service the dispatcher can route to.
#[async_trait]
pub trait ServiceTarget: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(
        &self,
        action: &str,
        params: Value,
        ctx: RequestContext,
    ) -> ApiResult<Map<String, Value>>;
}

/// Maps the actions of one service to their handlers.
///
/// Handlers receive the service state, their typed params and the request context:
///
/// ```ignore
/// let registry = ActionRegistry::new("events", Arc::new(service))
///     .validated(EventsAction::GetEvent, handlers::get_event)
///     .unvalidated(EventsAction::Ping, handlers::ping);
/// ```
pub struct ActionRegistry<A: ActionId, S> {
    name: String,
    state: Arc<S>,
    bindings: HashMap<A, Binding<S>>,
    validator: SchemaValidator,
}

impl<A, S> ActionRegistry<A, S>
where
    A: ActionId,
    S: Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, state: Arc<S>) -> Self {
        Self {
            name: name.into(),
            state,
            bindings: HashMap::new(),
            validator: SchemaValidator::new(),
        }
    }

    /// Bind `action` with `P` as its params schema.
    pub fn validated<P, R, F, Fut>(mut self, action: A, handler: F) -> Self
    where
        P: DeserializeOwned + Validate + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(Arc<S>, P, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<R>> + Send + 'static,
    {
        self.validator.register::<P>(action.to_string());
        self.bind(action, ParamsSchema::Validated, handler)
    }

    /// Bind `action` without a schema. Params still have to deserialize into `P`.
    pub fn unvalidated<P, R, F, Fut>(self, action: A, handler: F) -> Self
    where
        P: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(Arc<S>, P, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<R>> + Send + 'static,
    {
        warn!(
            target_service = %self.name,
            action = %action,
            "Action registered without a params schema"
        );
        self.bind(action, ParamsSchema::Unvalidated, handler)
    }

    fn bind<P, R, F, Fut>(mut self, action: A, schema: ParamsSchema, handler: F) -> Self
    where
        P: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(Arc<S>, P, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<R>> + Send + 'static,
    {
        let handler: Handler<S> = Box::new(move |state: Arc<S>, params: Value, ctx: RequestContext| {
            match serde_json::from_value::<P>(params) {
                Ok(params) => {
                    let fut = handler(state, params, ctx);
                    async move { into_fields(fut.await?) }.boxed()
                }
                Err(e) => {
                    let err = ApiError::bad_request(format!("invalid parameters ({})", e));
                    async move { Err(err) }.boxed()
                }
            }
        });

        self.bindings.insert(action, Binding { schema, handler });
        self
    }

    pub fn actions(&self) -> impl Iterator<Item = A> + '_ {
        self.bindings.keys().copied()
    }

    pub fn schema_of(&self, action: A) -> Option<ParamsSchema> {
        self.bindings.get(&action).map(|b| b.schema)
    }

    fn resolve(&self, action: &str) -> ApiResult<(A, &Binding<S>)> {
        action
            .parse::<A>()
            .ok()
            .and_then(|id| self.bindings.get(&id).map(|binding| (id, binding)))
            .ok_or_else(|| {
                ApiError::bad_request(format!(
                    "unknown action '{}' for target '{}'",
                    action, self.name
                ))
            })
    }
}

#[async_trait]
impl<A, S> ServiceTarget for ActionRegistry<A, S>
where
    A: ActionId,
    S: Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &self,
        action: &str,
        params: Value,
        ctx: RequestContext,
    ) -> ApiResult<Map<String, Value>> {
        let (id, binding) = self.resolve(action)?;

        match binding.schema {
            ParamsSchema::Validated => {
                self.validator
                    .validate(&id.to_string(), &params)
                    .map_err(|msg| {
                        ApiError::bad_request(format!("invalid parameters ({})", msg))
                    })?;
            }
            ParamsSchema::Unvalidated => {
                warn!(
                    cid = %ctx.cid,
                    target_service = %self.name,
                    action,
                    "No params schema for action"
                );
            }
        }

        (binding.handler)(Arc::clone(&self.state), params, ctx).await
    }
}

fn into_fields<R: Serialize>(result: R) -> ApiResult<Map<String, Value>> {
    match serde_json::to_value(result)? {
        Value::Object(fields) => Ok(fields),
        Value::Null => Ok(Map::new()),
        other => Err(ApiError::internal(format!(
            "handler produced a non-object result: {}",
            other
        ))),
    }
}
