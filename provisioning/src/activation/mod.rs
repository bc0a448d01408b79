pub mod actions;
pub mod manager;
pub mod state;
pub mod validation;


pub use actions::ActivationAction;
pub use manager::ActivationManager;
pub use state::{ActivationStage, ActivationState, OptimisticProgress};
pub use validation::{slugify, validate};
