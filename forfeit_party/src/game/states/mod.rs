//! Phase state definitions for the session FSM.
//!
//! Each struct marks one phase of the session lifecycle; the state
//! machine only exposes an action while the session sits in the phase
//! that action is valid in.

use super::entities::{GamePhase, Player};

/// Marker implemented by every phase state.
pub trait PhaseState {
    const PHASE: GamePhase;
}

/// Every player writes exactly one punishment card.
#[derive(Debug, Default)]
pub struct PunishmentCreation {}

/// Players vote on the submitted punishment cards; the winner becomes
/// the end-of-game punishment, the rest the hidden pool.
#[derive(Debug, Default)]
pub struct PunishmentVoting {}

/// Players author their content cards; the pool is topped up to quota
/// from the predefined deck per submission.
#[derive(Debug, Default)]
pub struct CardCreation {}

/// Each player picks one hand card to answer the round's prompt.
#[derive(Debug, Default)]
pub struct CardPlacement {}

/// Players vote on the played cards. The last voter is remembered for
/// the hidden punishment fallback condition.
#[derive(Debug, Default)]
pub struct CardVoting {
    pub(super) last_voter: Option<Player>,
}

/// Round scores are on display; the host decides when to move on.
#[derive(Debug, Default)]
pub struct CardResults {
    pub(super) next_round_requested: bool,
}

/// Terminal state for the session.
#[derive(Debug, Default)]
pub struct Scoreboard {}

impl PhaseState for PunishmentCreation {
    const PHASE: GamePhase = GamePhase::PunishmentCreation;
}

impl PhaseState for PunishmentVoting {
    const PHASE: GamePhase = GamePhase::PunishmentVoting;
}

impl PhaseState for CardCreation {
    const PHASE: GamePhase = GamePhase::CardCreation;
}

impl PhaseState for CardPlacement {
    const PHASE: GamePhase = GamePhase::CardPlacement;
}

impl PhaseState for CardVoting {
    const PHASE: GamePhase = GamePhase::CardVoting;
}

impl PhaseState for CardResults {
    const PHASE: GamePhase = GamePhase::CardResults;
}

impl PhaseState for Scoreboard {
    const PHASE: GamePhase = GamePhase::Scoreboard;
}
