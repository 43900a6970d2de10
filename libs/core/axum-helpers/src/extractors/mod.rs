//! Request extractors that reject with envelope responses.

mod caller;
mod json_body;

pub use caller::{Caller, ClientAddress};
pub use json_body::JsonBody;
