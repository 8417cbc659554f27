//! Credential-rotating dispatch of calls to external HTTP services.

pub mod credentials;
pub mod dispatcher;
pub mod endpoint;
pub mod state;

pub use crate::config::InvalidKeyPolicy;
pub use credentials::{preview_key, CredentialSet};
pub use dispatcher::{Dispatcher, KeyProbe, KeyProbeReport};
pub use endpoint::{GenerativeEndpoint, Params, ServiceEndpoint, WeatherEndpoint};
pub use state::DispatcherState;
