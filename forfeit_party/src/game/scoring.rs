//! Voting and round scoring.

use log::{info, warn};

use super::entities::{Card, CardId, PlayerId};
use super::state_machine::{SessionData, SessionError};

impl SessionData {
    /// Registers one vote on a played card. Double votes and self votes
    /// are the phase logic's responsibility, not checked here.
    pub fn vote_for_card(&mut self, card_id: CardId) -> Result<(), SessionError> {
        let Some(played) = self
            .played_cards
            .iter_mut()
            .find(|pc| pc.card.id == card_id)
        else {
            warn!("card {card_id} not found for voting");
            return Err(SessionError::UnknownCard(card_id));
        };

        played.votes += 1;
        info!("vote for card {} (votes: {})", played.card, played.votes);
        Ok(())
    }

    /// Sum of all votes cast. Each vote is worth one, so this doubles
    /// as the "has everyone voted" check.
    #[must_use]
    pub fn total_votes(&self) -> u32 {
        self.played_cards.iter().map(|pc| pc.votes).sum()
    }

    /// Played cards ordered by descending vote count; ties keep their
    /// insertion order.
    #[must_use]
    pub fn ranked_cards(&self) -> Vec<Card> {
        let mut ranked: Vec<_> = self.played_cards.iter().collect();
        ranked.sort_by(|a, b| b.votes.cmp(&a.votes));
        ranked.into_iter().map(|pc| pc.card.clone()).collect()
    }

    /// Applies round scores once all votes are in. A unique winner
    /// earns its dealer 3 points and its author (when present and a
    /// different player) 1 point; a tie at the top earns every tied
    /// dealer a flat 2 instead, with no author bonus.
    pub fn calculate_scores(&mut self) {
        let high_score = self
            .played_cards
            .iter()
            .map(|pc| pc.votes)
            .max()
            .unwrap_or(0);

        let winners: Vec<(PlayerId, Option<PlayerId>)> = self
            .played_cards
            .iter()
            .filter(|pc| pc.votes == high_score)
            .map(|pc| {
                (
                    pc.dealer.id.clone(),
                    pc.card.author.as_ref().map(|a| a.id.clone()),
                )
            })
            .collect();

        if let [(dealer, author)] = winners.as_slice() {
            self.update_score(dealer, 3);
            if let Some(author) = author
                && author != dealer
            {
                self.update_score(author, 1);
            }
        } else {
            for (dealer, _) in &winners {
                self.update_score(dealer, 2);
            }
        }
    }

    fn update_score(&mut self, player_id: &PlayerId, points: u32) {
        if let Some(state) = self
            .player_states
            .iter_mut()
            .find(|ps| &ps.player.id == player_id)
        {
            state.score += points;
            info!("{} scored {points} (total: {})", player_id, state.score);
        }
    }
}
