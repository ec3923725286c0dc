pub mod actions;
pub mod checkout;
pub mod draft;
pub mod flow;
pub mod steps;
pub mod validation;

pub use actions::BookingAction;
pub use checkout::{Checkout, CheckoutError};
pub use draft::{BookingDraft, CustomerInfoUpdate};
pub use flow::{BookingFlow, FlowConfig, FlowSnapshot};
pub use steps::{build_steps, BookingStep, StepCapabilities};
pub use validation::{is_valid_email, StepBlocker};
