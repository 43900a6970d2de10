use metrics::{counter, histogram};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::context::{CallerIdentity, RequestContext, RequestSource, TransportHandle};
use crate::correlation::CorrelationIdGenerator;
use crate::envelope::ActionResult;
use crate::error::{ApiError, ApiResult, ErrorKind};
use crate::registry::ServiceTarget;

/// A transport-agnostic call: `target.action(params)` on behalf of an optional caller.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub source: RequestSource,
    pub target: String,
    pub action: String,
    pub params: Value,
    pub user: Option<CallerIdentity>,
    pub remote_address: Option<String>,
    pub transport: Option<TransportHandle>,
    /// Suppresses the success log line for chatty actions
    pub skip_debug_log: bool,
}

impl ApiRequest {
    pub fn new(
        source: RequestSource,
        target: impl Into<String>,
        action: impl Into<String>,
        params: Value,
    ) -> Self {
        Self {
            source,
            target: target.into(),
            action: action.into(),
            params,
            user: None,
            remote_address: None,
            transport: None,
            skip_debug_log: false,
        }
    }

    pub fn with_user(mut self, user: Option<CallerIdentity>) -> Self {
        self.user = user;
        self
    }

    pub fn with_remote_address(mut self, remote_address: Option<String>) -> Self {
        self.remote_address = remote_address;
        self
    }

    pub fn with_transport(mut self, transport: TransportHandle) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn without_debug_log(mut self) -> Self {
        self.skip_debug_log = true;
        self
    }
}

/// Routes requests to service registries and shapes every outcome into an [`ActionResult`].
///
/// The target table is fixed at construction.
pub struct ApiDispatcher {
    targets: HashMap<String, Arc<dyn ServiceTarget>>,
    ids: CorrelationIdGenerator,
}

impl ApiDispatcher {
    pub fn builder() -> ApiDispatcherBuilder {
        ApiDispatcherBuilder::default()
    }

    pub fn target_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.targets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Runs the request. Errors come back stamped with the request's correlation id.
    pub async fn execute(&self, request: ApiRequest) -> ApiResult<ActionResult> {
        let cid = self.ids.next_id();
        let started = Instant::now();

        let ApiRequest {
            source,
            target,
            action,
            params,
            user,
            remote_address,
            transport,
            skip_debug_log,
        } = request;

        let ctx = RequestContext::new(cid.clone(), source)
            .with_user(user)
            .with_remote_address(remote_address)
            .with_transport(transport);
        let actor = ctx.actor();

        let outcome = match self.targets.get(&target) {
            Some(service) => service.execute(&action, params, ctx).await,
            None => Err(ApiError::bad_request(format!(
                "unknown target '{}'",
                target
            ))),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        histogram!("api_dispatch_duration_seconds").record(started.elapsed().as_secs_f64());

        match outcome {
            Ok(fields) => {
                counter!("api_dispatch_requests_total", "outcome" => "ok").increment(1);
                if !skip_debug_log {
                    info!(
                        %source, service = %target, %action, %cid, %actor, elapsed_ms,
                        "{}|exec|{}|{}|{}: ok", source, target, action, cid
                    );
                }
                Ok(ActionResult::success(fields, cid))
            }
            Err(err) => {
                counter!(
                    "api_dispatch_requests_total",
                    "outcome" => err.kind().as_ref().to_string()
                )
                .increment(1);

                if err.kind() == ErrorKind::Internal {
                    error!(
                        %source, service = %target, %action, %cid, %actor, elapsed_ms, error = %err,
                        "{}|exec|{}|{}|{}: failed", source, target, action, cid
                    );
                } else {
                    warn!(
                        %source, service = %target, %action, %cid, %actor, elapsed_ms,
                        kind = %err.kind(), error = %err,
                        "{}|exec|{}|{}|{}: rejected", source, target, action, cid
                    );
                }

                Err(err.with_cid(cid))
            }
        }
    }

    /// [`execute`](Self::execute) folded into the wire shape: status code plus envelope.
    pub async fn respond(&self, request: ApiRequest) -> (u16, ActionResult) {
        match self.execute(request).await {
            Ok(result) => (200, result),
            Err(err) => (err.status_code(), ActionResult::failure(&err)),
        }
    }
}

/// Collects the service targets before the dispatcher is frozen.
#[derive(Default)]
pub struct ApiDispatcherBuilder {
    targets: HashMap<String, Arc<dyn ServiceTarget>>,
}

impl ApiDispatcherBuilder {
    /// Registers `service` under its own name. A later service with the same name wins.
    pub fn target(mut self, service: impl ServiceTarget + 'static) -> Self {
        let name = service.name().to_string();
        if self.targets.insert(name.clone(), Arc::new(service)).is_some() {
            warn!(target_service = %name, "Service target registered twice, replacing");
        }
        self
    }

    pub fn build(self) -> ApiDispatcher {
        info!(targets = ?self.targets.keys().collect::<Vec<_>>(), "API dispatcher ready");
        ApiDispatcher {
            targets: self.targets,
            ids: CorrelationIdGenerator::new(),
        }
    }
}
