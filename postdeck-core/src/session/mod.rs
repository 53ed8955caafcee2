//! Ephemeral per-user conversation state.

pub mod model;
mod store;

pub use model::{EditScratch, Expected, ModeFlags, PreviewScratch, Session, WizardState};
pub use store::{SessionGuard, SessionStore};
