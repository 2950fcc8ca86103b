//! Skill-biased random move policy.

use super::{MovePolicy, PolicyError};
use crate::DifficultyConfig;
use rand::prelude::IndexedRandom;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Mutex;
use strictly_chess_rules::{MoveRequest, RulesOracle, ShakmatyOracle};
use tracing::{debug, instrument};

/// Picks a random legal move after a simulated thinking pause.
///
/// Above skill 10 it draws only from captures and checking moves when any
/// exist.
#[derive(Debug)]
pub struct SkillPolicy {
    rng: Mutex<StdRng>,
}

impl SkillPolicy {
    /// Policy seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Policy with a fixed seed, for reproducible games.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn pick(&self, candidates: &[MoveRequest]) -> Result<MoveRequest, PolicyError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| PolicyError::new("Random source unavailable"))?;
        candidates
            .choose(&mut *rng)
            .copied()
            .ok_or_else(|| PolicyError::new("No legal moves available"))
    }
}

impl Default for SkillPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Captures and moves that give check.
fn forcing_moves(oracle: &ShakmatyOracle, moves: &[MoveRequest]) -> Vec<MoveRequest> {
    moves
        .iter()
        .filter(|m| {
            let mut probe = oracle.clone();
            probe
                .apply_move(m)
                .map(|r| r.is_capture() || r.san.ends_with('+') || r.san.ends_with('#'))
                .unwrap_or(false)
        })
        .copied()
        .collect()
}

#[async_trait::async_trait]
impl MovePolicy for SkillPolicy {
    #[instrument(skip(self, difficulty), fields(level = %difficulty.level()))]
    async fn propose(
        &self,
        position: &str,
        difficulty: &DifficultyConfig,
    ) -> Result<String, PolicyError> {
        tokio::time::sleep(difficulty.move_time()).await;

        let oracle = ShakmatyOracle::from_fen(position)
            .map_err(|e| PolicyError::new(format!("Unreadable position: {}", e)))?;
        let moves = oracle.legal_moves();
        if moves.is_empty() {
            return Err(PolicyError::new("No legal moves available"));
        }

        let forcing = if difficulty.prefers_forcing_moves() {
            forcing_moves(&oracle, &moves)
        } else {
            Vec::new()
        };
        let pool = if forcing.is_empty() { &moves } else { &forcing };
        let choice = self.pick(pool)?;
        debug!(choice = %choice, candidates = pool.len(), "Policy chose move");
        Ok(choice.compact())
    }

    fn name(&self) -> &str {
        "skill"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DifficultyLevel;

    const NO_MOVES: &str = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";

    fn instant(level: DifficultyLevel) -> DifficultyConfig {
        level.config().with_move_time_ms(0)
    }

    #[tokio::test]
    async fn proposes_a_legal_move() {
        let policy = SkillPolicy::with_seed(1);
        let proposal = policy
            .propose(strictly_chess_rules::START_POSITION, &instant(DifficultyLevel::Beginner))
            .await
            .unwrap();
        let request: MoveRequest = proposal.parse().unwrap();
        assert!(ShakmatyOracle::new().legal_moves().contains(&request));
    }

    #[tokio::test]
    async fn strong_levels_take_the_capture() {
        // Only capture available: the king takes the pawn on d2.
        let fen = "4k3/8/8/8/8/8/3p4/4K3 w - - 0 1";
        let policy = SkillPolicy::with_seed(7);
        for _ in 0..10 {
            let proposal = policy
                .propose(fen, &instant(DifficultyLevel::Expert))
                .await
                .unwrap();
            assert_eq!(proposal, "e1d2");
        }
    }

    #[tokio::test]
    async fn fails_without_legal_moves() {
        let policy = SkillPolicy::with_seed(3);
        let err = policy
            .propose(NO_MOVES, &instant(DifficultyLevel::Casual))
            .await
            .unwrap_err();
        assert!(err.message.contains("No legal moves"));
    }

    #[tokio::test]
    async fn rejects_unreadable_position() {
        let policy = SkillPolicy::with_seed(3);
        assert!(
            policy
                .propose("garbage", &instant(DifficultyLevel::Casual))
                .await
                .is_err()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_the_move_time() {
        let policy = SkillPolicy::with_seed(5);
        let start = tokio::time::Instant::now();
        policy
            .propose(
                strictly_chess_rules::START_POSITION,
                &DifficultyLevel::Intermediate.config(),
            )
            .await
            .unwrap();
        assert!(start.elapsed() >= std::time::Duration::from_millis(1_000));
    }
}
