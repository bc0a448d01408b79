pub mod activation;
pub mod api;
pub mod config;
pub mod credentials;
pub mod error;
pub mod http_client;
pub mod model;
pub mod poller;

#[cfg(test)]
mod testing;

pub use activation::{ActivationAction, ActivationManager, ActivationStage, ActivationState};
pub use api::ProvisioningApi;
pub use config::ClientConfig;
pub use credentials::{CredentialProvider, SessionCredentials};
pub use error::{AdminApiError, ConfigError, ValidationIssue};
pub use http_client::AdminApiClient;
pub use model::{ActivationConfig, Integration, ProvisioningRecord, ProvisioningStatus};
pub use poller::{PollHandle, PollOutcome, PollerConfig, ProvisioningPoller, StatusView};
