//! # Bootstrapper Workflow
//!
//! The bootstrap package wizard: a flat registry of steps, each with static
//! and dynamically resolved fields, a side-effecting action and a pure
//! transition function. Answers accumulate in a per-session
//! [`WorkflowStore`]; the final step compiles the configuration artifacts and
//! ships them to the package generation service.
//!
//! ```text
//! start -> [cloud_auth] -> panorama_config ------------------------+
//!                       \-> choose_template -> configure_template -+-> include_content
//!                                          \-> upload_template ----+        |
//!                                                                  [download_content]
//!                                                                           |
//!                                  configure_management -> [static] -> complete
//! ```

pub mod compiler;
pub mod engine;
pub mod error;
pub mod field;
pub mod graph;
pub mod session;
pub mod step;
pub mod store;

pub use compiler::{Artifacts, PayloadCompiler, decode, encode};
pub use engine::{EngineSettings, StepView, SubmitOutcome, WorkflowEngine};
pub use error::WorkflowError;
pub use field::{Choice, FieldKind, FieldSpec};
pub use session::{SessionRegistry, WorkflowSession};
pub use step::{StepAction, WorkflowStep};
pub use store::WorkflowStore;
