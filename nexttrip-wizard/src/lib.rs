pub mod manager;
pub mod models;
pub mod pricing;
pub mod session;
pub mod steps;

pub use manager::{CommitClaim, SessionHandle, SessionManager, SessionSlot};
pub use models::{BookingCustomization, CustomizationInput, StepInput, WizardState, WizardStep};
pub use pricing::PriceQuote;
pub use session::{WizardError, WizardSession};
