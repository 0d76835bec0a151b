//! Three-step onboarding wizard state.

use crate::model::validation::is_valid_phone;
use crate::model::validation::ValidationError;
use serde::Serialize;

pub const DEFAULT_CITY: &str = "Chinhoyi";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingStep {
    Welcome,
    PersonalInfo,
    Location,
}

impl OnboardingStep {
    pub const ALL: [OnboardingStep; 3] = [Self::Welcome, Self::PersonalInfo, Self::Location];

    pub fn title(self) -> &'static str {
        match self {
            Self::Welcome => "Welcome",
            Self::PersonalInfo => "Personal Information",
            Self::Location => "Your Location",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Welcome => 0,
            Self::PersonalInfo => 1,
            Self::Location => 2,
        }
    }
}

/// Values collected by the wizard and upserted into the profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnboardingDetails {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub city: String,
    pub address: String,
}

impl Default for OnboardingDetails {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            phone: String::new(),
            city: DEFAULT_CITY.to_string(),
            address: String::new(),
        }
    }
}

impl OnboardingDetails {
    /// Phone is optional but must be well-formed when given.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let phone = self.phone.trim();
        if !phone.is_empty() && !is_valid_phone(phone) {
            return Err(ValidationError::InvalidPhone(phone.to_string()));
        }
        Ok(())
    }
}

/// What `next` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Advanced(OnboardingStep),
    /// Last step passed; the caller should submit the details.
    ReadyToSubmit,
}

#[derive(Debug, Clone, Default)]
pub struct OnboardingFlow {
    step_index: usize,
    pub details: OnboardingDetails,
}

impl OnboardingFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> OnboardingStep {
        OnboardingStep::ALL[self.step_index.min(OnboardingStep::ALL.len() - 1)]
    }

    /// Completed fraction in steps, e.g. `(2, 3)`.
    pub fn progress(&self) -> (usize, usize) {
        (self.current().index() + 1, OnboardingStep::ALL.len())
    }

    pub fn next(&mut self) -> StepOutcome {
        if self.step_index + 1 < OnboardingStep::ALL.len() {
            self.step_index += 1;
            StepOutcome::Advanced(self.current())
        } else {
            StepOutcome::ReadyToSubmit
        }
    }

    /// Moves back one step; stays on the first step.
    pub fn prev(&mut self) -> OnboardingStep {
        self.step_index = self.step_index.saturating_sub(1);
        self.current()
    }
}
