/// File creation stage.
pub mod create;
/// Design guideline stage.
pub mod design;
/// Diff-based edit stage.
pub mod edit;
/// Error-recovery stage.
pub mod error_fix;
/// Request planning stage.
pub mod planning;

pub use create::{CreateOutput, CreateStage};
pub use design::{DesignGuidelines, DesignStage};
pub use edit::{EditOutput, EditStage};
pub use error_fix::{ErrorRecoveryStage, FixOutput};
pub use planning::PlanningStage;
