//! Request dispatch for the tickets API
//!
//! ```text
//! transport (HTTP, ...)
//!     │  ApiRequest { target, action, params, user?, remote_address? }
//!     ▼
//! ApiDispatcher ── correlation id ──► RequestContext
//!     │  target lookup (fixed at startup)
//!     ▼
//! ActionRegistry<A, S> ── action lookup ─► SchemaValidator ─► handler(state, params, ctx)
//!     │                                                          │ guards::require_*
//!     ▼                                                          ▼
//! ActionResult { success, errorMsg?, cid, ...fields }  ◄──── ApiResult<R>
//! ```
//!
//! Every failure is an [`ApiError`] with an [`ErrorKind`]; the dispatcher stamps the
//! correlation id on it and the transport turns the kind into a status code.

pub mod context;
pub mod correlation;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod guards;
pub mod registry;
pub mod schema;

pub use context::{CallerIdentity, RequestContext, RequestSource, TransportHandle, UserRole};
pub use correlation::CorrelationIdGenerator;
pub use dispatcher::{ApiDispatcher, ApiDispatcherBuilder, ApiRequest};
pub use envelope::ActionResult;
pub use error::{ApiError, ApiResult, ErrorKind};
pub use guards::{Owned, require_admin, require_authenticated, require_ownership, require_role};
pub use registry::{ActionId, ActionRegistry, ParamsSchema, ServiceTarget};
pub use schema::SchemaValidator;
