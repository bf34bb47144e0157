//! Card pool and dealing engine.
//!
//! Draws are uniform over the eligible candidates at the time of the
//! draw and move ownership of the card into its new container, so a
//! card can never be referenced from two pools at once. Drawing from an
//! empty candidate set is an explicit error instead of a silent miss.

use log::{info, warn};
use rand::Rng;
use rand::seq::{IndexedRandom, index};

use super::constants::{CARDS_PER_CATEGORY, MAX_HAND_SIZE};
use super::entities::{Card, CardId, CardType, PlayedCard, Player, PlayerId};
use super::state_machine::{SessionData, SessionError};

impl SessionData {
    /// Stamps `card` with the next session-unique id and its author.
    /// Called exactly once per card, before the card enters any pool or
    /// hand.
    pub fn assign_card_metadata(&mut self, card: &mut Card, author: Option<Player>) {
        self.next_card_id += 1;
        card.id = self.next_card_id;
        card.author = author;
    }

    #[must_use]
    pub fn has_played(&self, dealer_id: &PlayerId) -> bool {
        self.played_cards.iter().any(|pc| &pc.dealer.id == dealer_id)
    }

    /// Places `card` face-up with zero votes, keyed by its dealer. At
    /// most one played card per player per phase-round; a duplicate is
    /// rejected without mutating.
    pub fn add_played_card(&mut self, card: Card, dealer: Player) -> Result<(), SessionError> {
        if self.has_played(&dealer.id) {
            warn!("played card for {} already exists", dealer.id);
            return Err(SessionError::DuplicateSubmission);
        }

        self.played_cards.push(PlayedCard {
            card,
            dealer,
            votes: 0,
        });
        Ok(())
    }

    /// Tops `pool` up to the per-category quota by cloning distinct
    /// random predefined cards of each content category. The originals
    /// stay in the predefined deck (replacement across calls); each
    /// clone is stamped as a fresh card.
    pub fn refill_with_predefined(&mut self, pool: &mut Vec<Card>) -> Result<(), SessionError> {
        let mut rng = rand::rng();

        for category in CardType::CONTENT_CATEGORIES {
            let have = pool.iter().filter(|c| c.card_type == category).count();
            let need = CARDS_PER_CATEGORY.saturating_sub(have);
            if need == 0 {
                continue;
            }

            let candidates: Vec<usize> = self
                .predefined_cards
                .iter()
                .enumerate()
                .filter(|(_, c)| c.card_type == category)
                .map(|(i, _)| i)
                .collect();
            if candidates.len() < need {
                return Err(SessionError::EmptyPool(category));
            }

            for pick in index::sample(&mut rng, candidates.len(), need) {
                let mut card = self.predefined_cards[candidates[pick]].clone();
                self.assign_card_metadata(&mut card, None);
                pool.push(card);
            }
        }
        Ok(())
    }

    /// One placeholder card per participant, text = display name. Used
    /// to seed prompts that reference players directly.
    pub fn generate_player_cards(&mut self) -> Vec<Card> {
        let names: Vec<String> = self
            .player_states
            .iter()
            .map(|ps| ps.player.name.clone())
            .collect();

        names
            .into_iter()
            .map(|name| {
                let mut card = Card::new(CardType::PlayerPlaceholder, name);
                self.assign_card_metadata(&mut card, None);
                card
            })
            .collect()
    }

    /// Initial deal: two cards of each content category per player,
    /// drawn without replacement from the card pool. Drawn cards leave
    /// the pool, so no card is dealt twice across the whole room.
    pub fn handout_cards(&mut self) -> Result<(), SessionError> {
        info!("dealing initial hands in room {}", self.room_id);

        for player_idx in 0..self.player_states.len() {
            for _ in 0..CARDS_PER_CATEGORY {
                for category in CardType::CONTENT_CATEGORIES {
                    let card = draw_by_category(&mut self.card_pool, category)?;
                    self.player_states[player_idx].hand.push(card);
                }
            }
        }
        Ok(())
    }

    /// Tops every hand back up to the maximum size from the predefined
    /// deck. Draws consume the deck and each drawn card is stamped with
    /// a fresh id on its way into the hand.
    pub fn refill_hands(&mut self) -> Result<(), SessionError> {
        for player_idx in 0..self.player_states.len() {
            while self.player_states[player_idx].hand.len() < MAX_HAND_SIZE {
                if self.predefined_cards.is_empty() {
                    return Err(SessionError::PoolExhausted);
                }
                let pick = rand::rng().random_range(0..self.predefined_cards.len());
                let mut card = self.predefined_cards.remove(pick);
                self.assign_card_metadata(&mut card, None);
                self.player_states[player_idx].hand.push(card);
            }
        }
        Ok(())
    }

    /// Scans every hand for `card_id`, removing and returning the first
    /// match. A miss is recoverable: the caller decides whether to
    /// reject the surrounding action.
    pub fn remove_card_from_hand(&mut self, card_id: CardId) -> Option<Card> {
        for state in &mut self.player_states {
            if let Some(idx) = state.hand.iter().position(|c| c.id == card_id) {
                return Some(state.hand.remove(idx));
            }
        }

        warn!("card {card_id} not found in any hand");
        None
    }
}

/// Uniform draw of one `category` card out of `pool`, transferring
/// ownership to the caller.
fn draw_by_category(pool: &mut Vec<Card>, category: CardType) -> Result<Card, SessionError> {
    let candidates: Vec<usize> = pool
        .iter()
        .enumerate()
        .filter(|(_, c)| c.card_type == category)
        .map(|(i, _)| i)
        .collect();

    let pick = candidates
        .choose(&mut rand::rng())
        .copied()
        .ok_or(SessionError::EmptyPool(category))?;
    Ok(pool.remove(pick))
}
