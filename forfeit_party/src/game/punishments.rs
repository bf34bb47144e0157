//! Punishment selection.
//!
//! Two flavors: the voted end-of-game punishment for the lowest
//! scorer(s), and a probabilistic per-round hidden punishment drawn
//! from the cards that lost the punishment vote.

use log::info;
use std::collections::HashMap;

use super::constants::HIDDEN_PUNISHMENT_PROBABILITIES;
use super::entities::{Player, Punishment, PunishmentCondition};
use super::state_machine::SessionData;

impl SessionData {
    /// End-of-game punishment: every player sitting at the minimum
    /// score is a target (ties are all punished). `None` only when no
    /// punishment vote ever concluded.
    #[must_use]
    pub fn voted_punishment(&self) -> Option<Punishment> {
        let card = self.voted_punishment.clone()?;

        let lowest = self
            .player_states
            .iter()
            .map(|ps| ps.score)
            .min()
            .unwrap_or(0);
        let targets: Vec<Player> = self
            .player_states
            .iter()
            .filter(|ps| ps.score == lowest)
            .map(|ps| ps.player.clone())
            .collect();

        Some(Punishment {
            card,
            targets,
            condition: PunishmentCondition::GameFinished,
        })
    }

    /// Per-round hidden punishment, evaluated once the round's voting
    /// completes. `roll` is uniform in [0,1); a roll above the round's
    /// configured probability, a zero-probability round, or an
    /// exhausted hidden pool produces nothing and mutates nothing.
    /// Otherwise exactly one condition fires, in priority order,
    /// consuming one hidden card:
    ///
    /// 1. `AllVotes` - a card drew votes from every other player.
    /// 2. `SameScore` - two or more cards tied on a nonzero count.
    /// 3. `LastToVote` - fallback on whoever voted last.
    #[must_use]
    pub fn hidden_punishment(&mut self, roll: f64, last_voter: &Player) -> Option<Punishment> {
        let index = self.round.saturating_sub(1) as usize;
        let probability = HIDDEN_PUNISHMENT_PROBABILITIES
            .get(index)
            .copied()
            .unwrap_or(0.0);

        if probability <= 0.0 || roll > probability || self.hidden_punishments.is_empty() {
            return None;
        }

        let player_count = self.played_cards.len();
        let unanimous = self
            .played_cards
            .iter()
            .find(|pc| pc.votes as usize + 1 == player_count);
        if let Some(played) = unanimous {
            let targets = vec![played.dealer.clone()];
            return self.pop_hidden(PunishmentCondition::AllVotes, targets);
        }

        let mut groups: HashMap<u32, Vec<Player>> = HashMap::new();
        for played in &self.played_cards {
            groups
                .entry(played.votes)
                .or_default()
                .push(played.dealer.clone());
        }
        let tied: Vec<Player> = groups
            .into_iter()
            .filter(|(votes, dealers)| *votes > 0 && dealers.len() > 1)
            .flat_map(|(_, dealers)| dealers)
            .collect();
        if !tied.is_empty() {
            return self.pop_hidden(PunishmentCondition::SameScore, tied);
        }

        self.pop_hidden(PunishmentCondition::LastToVote, vec![last_voter.clone()])
    }

    fn pop_hidden(
        &mut self,
        condition: PunishmentCondition,
        targets: Vec<Player>,
    ) -> Option<Punishment> {
        let card = self.hidden_punishments.pop_front()?;
        info!(
            "hidden punishment \"{}\" fired ({condition}) in room {}",
            card.text, self.room_id
        );
        Some(Punishment {
            card,
            targets,
            condition,
        })
    }
}
