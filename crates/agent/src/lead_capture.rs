//! Interactive lead form.
//!
//! The flow asks for name, email and platform in order and re-asks on invalid
//! input. Nothing is returned as a lead until all three values are valid, so a
//! cancelled form never reaches the repository.

use autostream_core::domain::lead::{validate_field, Lead, LeadField, LeadValidationError};
use tracing::info;

pub const PLATFORM_HINT: &str = "Which platform do you create content for?\n(e.g., YouTube, Instagram, TikTok, Facebook, Twitch, etc.)";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldPrompt {
    pub field: LeadField,
    pub label: &'static str,
    pub hint: Option<&'static str>,
}

impl FieldPrompt {
    pub fn for_field(field: LeadField) -> Self {
        match field {
            LeadField::Name => Self { field, label: "Your name: ", hint: None },
            LeadField::Email => Self { field, label: "Your email: ", hint: None },
            LeadField::Platform => {
                Self { field, label: "Creator Platform: ", hint: Some(PLATFORM_HINT) }
            }
        }
    }
}

/// Source of raw field answers, usually a terminal.
pub trait FieldPrompter {
    /// Called once per field before the first `ask`.
    fn introduce(&mut self, _prompt: &FieldPrompt) {}

    /// `None` means the user interrupted the form (EOF or cancel).
    fn ask(&mut self, prompt: &FieldPrompt) -> Option<String>;

    fn reject(&mut self, prompt: &FieldPrompt, error: &LeadValidationError);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureOutcome {
    Captured(Lead),
    Cancelled { at: LeadField },
}

pub fn collect_lead<P>(prompter: &mut P) -> Result<CaptureOutcome, LeadValidationError>
where
    P: FieldPrompter + ?Sized,
{
    let mut values = Vec::with_capacity(LeadField::ALL.len());

    for field in LeadField::ALL {
        let prompt = FieldPrompt::for_field(field);
        prompter.introduce(&prompt);
        let value = loop {
            let Some(raw) = prompter.ask(&prompt) else {
                info!(
                    event_name = "lead.capture.cancelled",
                    field = field.as_str(),
                    "lead form interrupted"
                );
                return Ok(CaptureOutcome::Cancelled { at: field });
            };
            match validate_field(field, &raw) {
                Ok(value) => break value,
                Err(error) => prompter.reject(&prompt, &error),
            }
        };
        values.push(value);
    }

    let lead = Lead::capture(&values[0], &values[1], &values[2])?;
    Ok(CaptureOutcome::Captured(lead))
}
