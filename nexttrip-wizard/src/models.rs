use nexttrip_core::booking::{CabinClass, MealPreference};
use nexttrip_core::payment::PaymentInstrument;
use nexttrip_core::traveler::{ContactInfo, TravelerRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a wizard session is in its lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WizardState {
    /// Flight chosen, itinerary not yet priced.
    Selected,
    /// Customization recorded; may be re-priced until the contact step is submitted.
    Customizing,
    ContactCollected,
    TravelerCollected,
    /// Instrument recorded; ready to commit.
    PaymentPending,
    /// Terminal.
    Submitted,
    /// Last commit was refused. Inputs are intact and commit may be retried.
    Failed,
}

impl WizardState {
    /// The step whose input this state is waiting for. `None` once only a
    /// commit (or nothing) remains.
    pub fn awaiting(&self) -> Option<WizardStep> {
        match self {
            WizardState::Selected => Some(WizardStep::Customization),
            WizardState::Customizing => Some(WizardStep::Contact),
            WizardState::ContactCollected => Some(WizardStep::Travelers),
            WizardState::TravelerCollected => Some(WizardStep::Payment),
            WizardState::PaymentPending | WizardState::Failed | WizardState::Submitted => None,
        }
    }

    pub fn can_commit(&self) -> bool {
        matches!(self, WizardState::PaymentPending | WizardState::Failed)
    }

    pub fn is_terminal(&self) -> bool {
        *self == WizardState::Submitted
    }

    /// The furthest step a customer may reopen from here.
    pub(crate) fn furthest_reopenable(&self) -> WizardStep {
        match self {
            WizardState::Selected | WizardState::Customizing => WizardStep::Customization,
            WizardState::ContactCollected => WizardStep::Contact,
            WizardState::TravelerCollected => WizardStep::Travelers,
            WizardState::PaymentPending | WizardState::Failed | WizardState::Submitted => WizardStep::Payment,
        }
    }
}

impl fmt::Display for WizardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WizardState::Selected => "SELECTED",
            WizardState::Customizing => "CUSTOMIZING",
            WizardState::ContactCollected => "CONTACT_COLLECTED",
            WizardState::TravelerCollected => "TRAVELER_COLLECTED",
            WizardState::PaymentPending => "PAYMENT_PENDING",
            WizardState::Submitted => "SUBMITTED",
            WizardState::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// The four input-collecting pages, in order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Customization,
    Contact,
    Travelers,
    Payment,
}

impl WizardStep {
    /// State a session lands in when this step is reopened for edits.
    pub(crate) fn reopened_state(&self) -> WizardState {
        match self {
            WizardStep::Customization | WizardStep::Contact => WizardState::Customizing,
            WizardStep::Travelers => WizardState::ContactCollected,
            WizardStep::Payment => WizardState::TravelerCollected,
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WizardStep::Customization => "customization",
            WizardStep::Contact => "contact",
            WizardStep::Travelers => "travelers",
            WizardStep::Payment => "payment",
        };
        f.write_str(s)
    }
}

/// Raw itinerary form values. Counts are signed so out-of-range entries can
/// be clamped rather than rejected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomizationInput {
    pub passengers: i64,
    #[serde(default)]
    pub cabin_class: CabinClass,
    #[serde(default)]
    pub extra_baggage: i64,
    #[serde(default)]
    pub meal_preference: MealPreference,
}

/// Itinerary choices after clamping. Frozen once the contact step is submitted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookingCustomization {
    pub passengers: u32,
    pub cabin_class: CabinClass,
    pub extra_baggage: u8,
    pub meal_preference: MealPreference,
}

impl Default for BookingCustomization {
    fn default() -> Self {
        Self {
            passengers: 1,
            cabin_class: CabinClass::Economy,
            extra_baggage: 0,
            meal_preference: MealPreference::Standard,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "step", content = "input", rename_all = "snake_case")]
pub enum StepInput {
    Customization(CustomizationInput),
    Contact(ContactInfo),
    Travelers(Vec<TravelerRecord>),
    Payment(PaymentInstrument),
}

impl StepInput {
    pub fn step(&self) -> WizardStep {
        match self {
            StepInput::Customization(_) => WizardStep::Customization,
            StepInput::Contact(_) => WizardStep::Contact,
            StepInput::Travelers(_) => WizardStep::Travelers,
            StepInput::Payment(_) => WizardStep::Payment,
        }
    }
}
