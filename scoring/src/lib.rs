//! Verification engine — batched quality scoring of group members.
//!
//! Delegated verifiers submit strictly sequential score batches for a
//! round's member roster. A group finalizes exactly when every member has
//! been scored; finalization applies a capacity-reduction factor (a verifier
//! can never weigh in more contribution than their allotted verification
//! capacity) and an optional distrust discount. Distrust votes arriving
//! after finalization retroactively rescale the target owner's stored
//! scores using the frozen reduction factor.

pub mod delegation;
pub mod engine;
pub mod error;
pub mod state;

pub use delegation::Delegation;
pub use engine::{BatchOutcome, VerificationEngine};
pub use error::ScoringError;
pub use state::{DistrustRecord, ScorePhase, ScoreState, MAX_SCORE};
