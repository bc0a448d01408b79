#[allow(clippy::module_inception)]
pub mod poller;
pub mod state;
pub mod view;


pub use poller::{PollHandle, ProvisioningPoller};
pub use state::{PollOutcome, PollerConfig, PollerState, StatusView};
pub use view::{progress_bar, website_link};
