//! Game constants and tunables.

use super::entities::CardId;

/// Number of content categories players author cards for
/// (person, object, place, activity).
pub const CATEGORY_COUNT: usize = 4;

/// Cards each player contributes per content category.
pub const CARDS_PER_CATEGORY: usize = 2;

/// Hands are topped back up to this size at the start of every round.
pub const MAX_HAND_SIZE: usize = 12;

/// Number of placement/voting rounds before the scoreboard.
pub const ROUNDS_TO_PLAY: u32 = 5;

/// Number of prompts drawn per game.
pub const QUESTION_COUNT: usize = 5;

/// Chance that a hidden punishment fires after a round's voting,
/// indexed by `round - 1`.
pub const HIDDEN_PUNISHMENT_PROBABILITIES: [f64; ROUNDS_TO_PLAY as usize] =
    [0.0, 0.25, 0.5, 0.0, 0.0];

/// Length of generated room identifiers.
pub const ROOM_ID_LENGTH: usize = 5;

/// Alphabet for generated room identifiers.
pub const ROOM_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Sentinel id for cards whose metadata has not been stamped yet.
pub const UNASSIGNED_CARD_ID: CardId = -1;
