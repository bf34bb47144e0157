//! Property-based tests for the dealing pipeline and vote ranking.
//!
//! These verify that the pre-round phases produce well-formed hands for
//! any table size and that the punishment vote always promotes a card
//! with the highest vote count.

use proptest::prelude::*;
use std::collections::HashSet;

use forfeit_party::{
    MAX_HAND_SIZE, SessionSnapshot, SessionState,
    constants::CARDS_PER_CATEGORY,
    entities::{Card, CardId, CardType, GamePhase, Player, PlayerId, Room, RoomId},
};

fn room(player_count: usize) -> Room {
    let players: Vec<Player> = (0..player_count)
        .map(|i| Player {
            id: PlayerId::new(format!("conn-{i}")),
            name: format!("player-{i}"),
        })
        .collect();
    Room {
        id: RoomId::new("PROP1"),
        host: players[0].clone(),
        players,
        open: false,
        nsfw: false,
    }
}

fn predefined_deck(per_category: usize) -> Vec<Card> {
    let mut cards = Vec::new();
    for category in CardType::CONTENT_CATEGORIES {
        for i in 0..per_category {
            cards.push(Card::new(category, format!("{category} {i}")));
        }
    }
    cards
}

/// Plays the pre-round phases to completion and returns the session in
/// the first card placement round.
fn deal(player_count: usize, per_category: usize) -> SessionState {
    let room = room(player_count);
    let players = room.players.clone();
    let mut session = SessionState::new(
        &room,
        predefined_deck(per_category),
        vec!["prompt?".to_string()],
    );

    for p in &players {
        session.create_punishment(p, "punishment").unwrap();
    }
    session = session.step().unwrap();

    let card = session.data().played_cards[0].card.id;
    for p in &players {
        session.vote_punishment(p, card).unwrap();
    }
    session = session.step().unwrap();

    for p in &players {
        session.create_cards(p, &[]).unwrap();
    }
    session.step().unwrap()
}

proptest! {
    #[test]
    fn dealt_hands_are_full_and_disjoint(
        player_count in 2usize..=8,
        per_category in 8usize..=16,
    ) {
        let session = deal(player_count, per_category);
        prop_assert_eq!(session.phase(), GamePhase::CardPlacement);

        let mut seen: HashSet<CardId> = HashSet::new();
        for state in &session.data().player_states {
            prop_assert_eq!(state.hand.len(), MAX_HAND_SIZE);
            for category in CardType::CONTENT_CATEGORIES {
                let count = state
                    .hand
                    .iter()
                    .filter(|c| c.card_type == category)
                    .count();
                prop_assert!(
                    count >= CARDS_PER_CATEGORY,
                    "hand short on {} cards: {}",
                    category,
                    count
                );
            }
            for card in &state.hand {
                prop_assert!(card.id > 0, "card {} entered a hand unstamped", card.id);
                prop_assert!(seen.insert(card.id), "card {} dealt twice", card.id);
            }
        }
    }

    #[test]
    fn punishment_vote_promotes_a_most_voted_card(
        player_count in 2usize..=8,
        vote_seed in any::<u64>(),
    ) {
        let room = room(player_count);
        let players = room.players.clone();
        let mut session = SessionState::new(&room, predefined_deck(8), Vec::new());

        for p in &players {
            session
                .create_punishment(p, &format!("{} punishment", p.name))
                .unwrap();
        }
        session = session.step().unwrap();

        // Spread the votes pseudo-randomly over the played cards.
        let cards: Vec<CardId> = session
            .data()
            .played_cards
            .iter()
            .map(|pc| pc.card.id)
            .collect();
        let mut seed = vote_seed;
        let mut tallies = vec![0u32; cards.len()];
        for p in &players {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            let pick = (seed >> 33) as usize % cards.len();
            tallies[pick] += 1;
            session.vote_punishment(p, cards[pick]).unwrap();
        }
        session = session.step().unwrap();
        prop_assert_eq!(session.phase(), GamePhase::CardCreation);

        let data = session.data();
        let voted = data.voted_punishment_card().unwrap();
        let voted_tally = cards
            .iter()
            .position(|&id| id == voted.id)
            .map(|i| tallies[i])
            .unwrap();
        prop_assert!(
            tallies.iter().all(|&t| t <= voted_tally),
            "voted card had {} votes but another card had more",
            voted_tally
        );
        prop_assert_eq!(data.hidden_punishment_count(), player_count - 1);
    }
}
