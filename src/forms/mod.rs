//! Form controllers.
//!
//! Each form owns its field values and walks the
//! `Idle → Editing → Submitting → (Success | Failed)` machine. Validation is
//! a synchronous required-field presence check; a failed submit keeps the
//! field values and returns the form to editing.

mod eventsub;
mod invite;
mod team;

pub use eventsub::{compose_message, EventSubForm};
pub use invite::InviteForm;
pub use team::TeamForm;

/// Lifecycle of a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormPhase {
    #[default]
    Idle,
    Editing,
    Submitting,
    Success,
    Failed,
}

/// Required-field presence check shared by the forms.
pub(crate) fn require(field: &str, present: bool) -> crate::error::Result<()> {
    if present {
        Ok(())
    } else {
        Err(crate::error::ApiError::MissingField {
            field: field.to_string(),
        })
    }
}
