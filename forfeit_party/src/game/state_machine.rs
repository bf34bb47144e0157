//! Session state machine.
//!
//! A session is a typestate FSM: `Game<T>` couples the shared
//! [`SessionData`] with a phase marker, and [`SessionState`] is the
//! enum over all phases. Actions exist only on the phases they are
//! valid in, so the enum front door re-validates the phase once and
//! invalid-phase submissions are rejected before touching any state.
//! Phases advance exclusively through [`SessionState::step`] after an
//! accepted action, never on elapsed time.

use enum_dispatch::enum_dispatch;
use log::{info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

use crate::content;

use super::constants::{CARDS_PER_CATEGORY, CATEGORY_COUNT, ROUNDS_TO_PLAY};
use super::entities::{
    Card, CardDraft, CardId, CardType, GamePhase, GameView, PlayedCard, Player, PlayerId,
    PlayerState, Punishment, PunishmentCondition, Question, Room, RoomId,
};
use super::states::{
    CardCreation, CardPlacement, CardResults, CardVoting, PhaseState, PunishmentCreation,
    PunishmentVoting, Scoreboard,
};

/// Errors produced by session actions. The transport layer logs these
/// and suppresses the state broadcast; nothing is surfaced to the
/// caller beyond the missing update.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum SessionError {
    #[error("{action} is not valid during the {phase} phase")]
    InvalidPhase {
        action: &'static str,
        phase: GamePhase,
    },
    #[error("only the host can do that")]
    NotHost,
    #[error("player is not part of this session")]
    UnknownPlayer,
    #[error("card {0} not found")]
    UnknownCard(CardId),
    #[error("player already submitted a card this phase")]
    DuplicateSubmission,
    #[error("no {0} cards left to draw")]
    EmptyPool(CardType),
    #[error("predefined card pool is exhausted")]
    PoolExhausted,
}

/// The authoritative per-room record, shared across all phases.
/// Exactly one exists per open room; starting a new game for a room id
/// discards and replaces it.
#[derive(Debug)]
pub struct SessionData {
    pub room_id: RoomId,
    pub nsfw: bool,
    pub(super) host: PlayerId,
    /// Monotonic card id counter; never reused within the session.
    pub(super) next_card_id: CardId,
    pub round: u32,
    pub player_states: Vec<PlayerState>,
    pub played_cards: Vec<PlayedCard>,
    /// User-authored cards (plus quota top-ups) awaiting distribution.
    pub(super) card_pool: Vec<Card>,
    /// Loaded content pool, consumed by hand refills.
    pub(super) predefined_cards: Vec<Card>,
    /// Raw prompt lines; resolved into questions once the card pool is
    /// complete.
    pub(super) question_texts: Vec<String>,
    /// Remaining prompts, consumed back-to-front.
    pub(super) questions: Vec<Question>,
    pub question: Option<Question>,
    pub(super) voted_punishment: Option<Card>,
    pub(super) hidden_punishments: VecDeque<Card>,
    /// Punishment currently on display to clients, if any.
    pub punishment: Option<Punishment>,
}

impl SessionData {
    /// Builds fresh session data for `room`. Predefined cards arrive
    /// unstamped from the content loader and receive their ids here,
    /// before they can enter any pool or hand.
    #[must_use]
    pub fn new(room: &Room, predefined: Vec<Card>, question_texts: Vec<String>) -> Self {
        let mut data = Self {
            room_id: room.id.clone(),
            nsfw: room.nsfw,
            host: room.host.id.clone(),
            next_card_id: 0,
            round: 0,
            player_states: room.players.iter().cloned().map(PlayerState::new).collect(),
            played_cards: Vec::new(),
            card_pool: Vec::new(),
            predefined_cards: Vec::with_capacity(predefined.len()),
            question_texts,
            questions: Vec::new(),
            question: None,
            voted_punishment: None,
            hidden_punishments: VecDeque::new(),
            punishment: None,
        };

        for mut card in predefined {
            data.assign_card_metadata(&mut card, None);
            data.predefined_cards.push(card);
        }
        data
    }

    #[must_use]
    pub fn player(&self, player_id: &PlayerId) -> Option<&Player> {
        self.player_states
            .iter()
            .map(|ps| &ps.player)
            .find(|p| &p.id == player_id)
    }

    pub(super) fn require_member(&self, player_id: &PlayerId) -> Result<(), SessionError> {
        if self.player(player_id).is_some() {
            Ok(())
        } else {
            warn!("{player_id} is not part of session {}", self.room_id);
            Err(SessionError::UnknownPlayer)
        }
    }

    #[must_use]
    pub fn voted_punishment_card(&self) -> Option<&Card> {
        self.voted_punishment.as_ref()
    }

    #[must_use]
    pub fn hidden_punishment_count(&self) -> usize {
        self.hidden_punishments.len()
    }

    pub(super) fn all_players_played(&self) -> bool {
        self.played_cards.len() == self.player_states.len()
    }

    pub(super) fn all_votes_in(&self) -> bool {
        self.total_votes() as usize == self.player_states.len()
    }

    /// The aggregate pool is complete once every player's authored
    /// batch (topped up to quota) has been merged in.
    pub(super) fn pool_complete(&self) -> bool {
        self.card_pool.len() >= self.player_states.len() * CARDS_PER_CATEGORY * CATEGORY_COUNT
    }

    /// Round bookkeeping shared by the first deal and every
    /// host-started round: refill hands, pop the next prompt, reset the
    /// played cards, bump the counter.
    pub(super) fn begin_round(&mut self) -> Result<(), SessionError> {
        self.refill_hands()?;
        self.question = self.questions.pop();
        self.played_cards.clear();
        self.round += 1;
        info!("starting round {} in room {}", self.round, self.room_id);
        Ok(())
    }

    pub(super) fn view_with_phase(&self, phase: GamePhase) -> GameView {
        GameView {
            phase,
            round: self.round,
            player_state: self.player_states.clone(),
            played_cards: self.played_cards.clone(),
            question: self.question.clone(),
            punishment: self.punishment.clone(),
        }
    }
}

/// Session data paired with the current phase marker.
#[derive(Debug)]
pub struct Game<T> {
    pub data: SessionData,
    pub state: T,
}

/// Phase-independent read access, dispatched over the phase enum.
#[enum_dispatch]
pub trait SessionSnapshot {
    fn phase(&self) -> GamePhase;
    /// Full-state snapshot broadcast to clients after every mutation.
    #[must_use]
    fn view(&self) -> GameView;
    fn data(&self) -> &SessionData;
}

impl<T: PhaseState> SessionSnapshot for Game<T> {
    fn phase(&self) -> GamePhase {
        T::PHASE
    }

    fn view(&self) -> GameView {
        self.data.view_with_phase(T::PHASE)
    }

    fn data(&self) -> &SessionData {
        &self.data
    }
}

impl Game<PunishmentCreation> {
    fn create_punishment(&mut self, actor: &Player, text: &str) -> Result<(), SessionError> {
        self.data.require_member(&actor.id)?;

        let mut card = Card::punishment(text);
        self.data.assign_card_metadata(&mut card, Some(actor.clone()));
        self.data.add_played_card(card, actor.clone())?;
        info!(
            "{} submitted a punishment in room {}",
            actor.name, self.data.room_id
        );
        Ok(())
    }
}

impl Game<PunishmentVoting> {
    fn vote_punishment(&mut self, actor: &Player, card_id: CardId) -> Result<(), SessionError> {
        self.data.require_member(&actor.id)?;
        self.data.vote_for_card(card_id)
    }
}

impl Game<CardCreation> {
    fn create_cards(&mut self, actor: &Player, drafts: &[CardDraft]) -> Result<(), SessionError> {
        self.data.require_member(&actor.id)?;

        let mut batch = Vec::with_capacity(CARDS_PER_CATEGORY * CATEGORY_COUNT);
        for draft in drafts {
            if !draft.card_type.is_content_category() {
                warn!(
                    "{} submitted a {} card during card creation, skipping",
                    actor.name, draft.card_type
                );
                continue;
            }
            let mut card = Card::new(draft.card_type, draft.text.clone());
            self.data.assign_card_metadata(&mut card, Some(actor.clone()));
            batch.push(card);
        }

        // Pad the batch to the per-category quota from the predefined
        // deck so partial submissions still yield a complete pool.
        self.data.refill_with_predefined(&mut batch)?;
        self.data.card_pool.append(&mut batch);
        Ok(())
    }

    /// Completes card creation: seed player placeholder cards, resolve
    /// the round prompts against the finished pool, deal initial hands
    /// and enter the first round.
    fn advance_to_first_round(mut self) -> Result<Game<CardPlacement>, SessionError> {
        info!(
            "all players in room {} created cards, dealing hands",
            self.data.room_id
        );

        let player_cards = self.data.generate_player_cards();
        self.data.card_pool.extend(player_cards);

        self.data.questions = content::build_questions(
            &self.data.question_texts,
            &self.data.card_pool,
            &self.data.predefined_cards,
        );

        self.data.handout_cards()?;
        self.data.punishment = None;

        let mut data = self.data;
        data.begin_round()?;
        Ok(Game {
            data,
            state: CardPlacement::default(),
        })
    }
}

impl Game<CardPlacement> {
    fn select_card(&mut self, actor: &Player, card_id: CardId) -> Result<(), SessionError> {
        self.data.require_member(&actor.id)?;

        // Check for a duplicate play before touching the hand, so a
        // rejected action leaves the card where it was.
        if self.data.has_played(&actor.id) {
            warn!(
                "{} already placed a card this round in room {}",
                actor.name, self.data.room_id
            );
            return Err(SessionError::DuplicateSubmission);
        }

        let card = self
            .data
            .remove_card_from_hand(card_id)
            .ok_or(SessionError::UnknownCard(card_id))?;
        self.data.add_played_card(card, actor.clone())
    }
}

impl Game<CardVoting> {
    fn vote_card(&mut self, actor: &Player, card_id: CardId) -> Result<(), SessionError> {
        self.data.require_member(&actor.id)?;
        self.data.vote_for_card(card_id)?;
        self.state.last_voter = Some(actor.clone());
        Ok(())
    }
}

impl Game<CardResults> {
    fn start_next_round(&mut self, actor: &PlayerId) -> Result<(), SessionError> {
        if actor != &self.data.host {
            warn!(
                "{actor} is not the host of room {} and cannot advance the round",
                self.data.room_id
            );
            return Err(SessionError::NotHost);
        }
        self.state.next_round_requested = true;
        Ok(())
    }

    fn next_round(self) -> Result<Game<CardPlacement>, SessionError> {
        let mut data = self.data;
        data.begin_round()?;
        Ok(Game {
            data,
            state: CardPlacement::default(),
        })
    }
}

impl From<Game<PunishmentCreation>> for Game<PunishmentVoting> {
    fn from(game: Game<PunishmentCreation>) -> Self {
        info!(
            "all players in room {} submitted punishments",
            game.data.room_id
        );
        Game {
            data: game.data,
            state: PunishmentVoting::default(),
        }
    }
}

impl From<Game<PunishmentVoting>> for Game<CardCreation> {
    /// Splits the ranked punishment cards into the voted winner and the
    /// hidden pool, then clears the table for card creation.
    fn from(game: Game<PunishmentVoting>) -> Self {
        let mut data = game.data;
        let mut ranked: VecDeque<Card> = data.ranked_cards().into();
        let voted = ranked.pop_front();
        data.hidden_punishments = ranked;
        data.played_cards.clear();

        info!(
            "room {}: voted punishment {:?}, {} hidden punishment(s)",
            data.room_id,
            voted.as_ref().map(|c| c.text.as_str()),
            data.hidden_punishments.len()
        );

        // The winner stays on display during card creation.
        data.punishment = voted.clone().map(|card| Punishment {
            card,
            targets: Vec::new(),
            condition: PunishmentCondition::GameFinished,
        });
        data.voted_punishment = voted;

        Game {
            data,
            state: CardCreation::default(),
        }
    }
}

impl From<Game<CardPlacement>> for Game<CardVoting> {
    fn from(game: Game<CardPlacement>) -> Self {
        info!("all players in room {} placed their cards", game.data.room_id);
        let mut data = game.data;
        data.punishment = None;
        Game {
            data,
            state: CardVoting::default(),
        }
    }
}

impl From<Game<CardVoting>> for Game<CardResults> {
    /// All votes are in: score the round and roll the hidden
    /// punishment check.
    fn from(mut game: Game<CardVoting>) -> Self {
        game.data.calculate_scores();

        let roll = rand::rng().random::<f64>();
        let punishment = game
            .state
            .last_voter
            .take()
            .and_then(|last| game.data.hidden_punishment(roll, &last));
        if let Some(p) = &punishment {
            info!(
                "room {}: punishment \"{}\" ({}) for {} player(s)",
                game.data.room_id,
                p.card.text,
                p.condition,
                p.targets.len()
            );
        }
        game.data.punishment = punishment;

        Game {
            data: game.data,
            state: CardResults::default(),
        }
    }
}

impl From<Game<CardResults>> for Game<Scoreboard> {
    fn from(game: Game<CardResults>) -> Self {
        let mut data = game.data;
        data.punishment = data.voted_punishment();
        info!("game finished for room {}", data.room_id);
        Game {
            data,
            state: Scoreboard::default(),
        }
    }
}

/// A session in whatever phase it currently occupies.
#[enum_dispatch(SessionSnapshot)]
#[derive(Debug)]
pub enum SessionState {
    PunishmentCreation(Game<PunishmentCreation>),
    PunishmentVoting(Game<PunishmentVoting>),
    CardCreation(Game<CardCreation>),
    CardPlacement(Game<CardPlacement>),
    CardVoting(Game<CardVoting>),
    CardResults(Game<CardResults>),
    Scoreboard(Game<Scoreboard>),
}

impl SessionState {
    /// Starts a fresh session for `room` in the punishment creation
    /// phase. Scores reset here and never decrease afterwards.
    #[must_use]
    pub fn new(room: &Room, predefined: Vec<Card>, question_texts: Vec<String>) -> Self {
        info!("created new session for room {}", room.id);
        Self::PunishmentCreation(Game {
            data: SessionData::new(room, predefined, question_texts),
            state: PunishmentCreation::default(),
        })
    }

    pub fn create_punishment(&mut self, actor: &Player, text: &str) -> Result<(), SessionError> {
        match self {
            Self::PunishmentCreation(game) => game.create_punishment(actor, text),
            other => Err(other.invalid_phase("punishment creation")),
        }
    }

    pub fn vote_punishment(&mut self, actor: &Player, card_id: CardId) -> Result<(), SessionError> {
        match self {
            Self::PunishmentVoting(game) => game.vote_punishment(actor, card_id),
            other => Err(other.invalid_phase("punishment voting")),
        }
    }

    pub fn create_cards(&mut self, actor: &Player, drafts: &[CardDraft]) -> Result<(), SessionError> {
        match self {
            Self::CardCreation(game) => game.create_cards(actor, drafts),
            other => Err(other.invalid_phase("card creation")),
        }
    }

    pub fn select_card(&mut self, actor: &Player, card_id: CardId) -> Result<(), SessionError> {
        match self {
            Self::CardPlacement(game) => game.select_card(actor, card_id),
            other => Err(other.invalid_phase("card placement")),
        }
    }

    pub fn vote_card(&mut self, actor: &Player, card_id: CardId) -> Result<(), SessionError> {
        match self {
            Self::CardVoting(game) => game.vote_card(actor, card_id),
            other => Err(other.invalid_phase("card voting")),
        }
    }

    /// Host-only. Requests the next round (or the scoreboard after the
    /// final round); the transition happens on the following [`step`].
    ///
    /// [`step`]: Self::step
    pub fn start_next_round(&mut self, actor: &PlayerId) -> Result<(), SessionError> {
        match self {
            Self::CardResults(game) => game.start_next_round(actor),
            other => Err(other.invalid_phase("starting the next round")),
        }
    }

    /// Advances the session if the current phase's completion condition
    /// holds; otherwise returns it unchanged. Draw failures (exhausted
    /// pools) are unrecoverable for the session and bubble up.
    pub fn step(self) -> Result<Self, SessionError> {
        Ok(match self {
            Self::PunishmentCreation(game) if game.data.all_players_played() => {
                Self::PunishmentVoting(game.into())
            }
            Self::PunishmentVoting(game) if game.data.all_votes_in() => {
                Self::CardCreation(game.into())
            }
            Self::CardCreation(game) if game.data.pool_complete() => {
                Self::CardPlacement(game.advance_to_first_round()?)
            }
            Self::CardPlacement(game) if game.data.all_players_played() => {
                Self::CardVoting(game.into())
            }
            Self::CardVoting(game) if game.data.all_votes_in() => {
                Self::CardResults(game.into())
            }
            Self::CardResults(game) if game.state.next_round_requested => {
                if game.data.round >= ROUNDS_TO_PLAY {
                    Self::Scoreboard(game.into())
                } else {
                    Self::CardPlacement(game.next_round()?)
                }
            }
            other => other,
        })
    }

    fn invalid_phase(&self, action: &'static str) -> SessionError {
        let err = SessionError::InvalidPhase {
            action,
            phase: self.phase(),
        };
        warn!("room {}: {err}", self.data().room_id);
        err
    }
}
