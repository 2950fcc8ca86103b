//! Move suggestion policies for the automated opponent.

mod error;
mod skill;

pub use error::PolicyError;
pub use skill::SkillPolicy;

use crate::DifficultyConfig;
use std::fmt::Debug;

/// Proposes a move for the side to move.
///
/// Implementations may take as long as they like; the session discards any
/// answer that arrives after the turn has changed.
#[async_trait::async_trait]
pub trait MovePolicy: Send + Sync + Debug {
    /// Returns a move in compact notation (`e2e4`, `e7e8q`) for `position`.
    async fn propose(
        &self,
        position: &str,
        difficulty: &DifficultyConfig,
    ) -> Result<String, PolicyError>;

    /// Display name of this policy.
    fn name(&self) -> &str;
}
