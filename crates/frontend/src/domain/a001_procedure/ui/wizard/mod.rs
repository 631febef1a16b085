//! Procedure creation wizard
//!
//! Simplified MVVM pattern implementation:
//! - view_model.rs: wizard controller setup, list editing and commands
//! - steps.rs: one component per wizard step
//! - view.rs: Leptos component (progress, body, navigation)

mod steps;
mod view;
mod view_model;

pub use view::ProcedureWizard;
pub use view_model::ProcedureWizardViewModel;
