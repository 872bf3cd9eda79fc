//! Onboarding questionnaire preceding account creation.

pub mod wizard;

pub use wizard::{Advance, Answer, OnboardingAnswers, Step, Wizard, QUESTIONS};
