//! Core game entities: players, rooms, cards, and the broadcast view.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::constants::UNASSIGNED_CARD_ID;

/// Opaque player identifier derived from the transport session
/// (one per connection). Never persisted beyond process lifetime.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A connected player.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Short uppercase room identifier.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A room of players. `open` is cleared once gameplay starts and no new
/// joins are accepted afterward.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub host: Player,
    pub players: Vec<Player>,
    pub open: bool,
    pub nsfw: bool,
}

impl Room {
    #[must_use]
    pub fn contains(&self, player_id: &PlayerId) -> bool {
        self.players.iter().any(|p| &p.id == player_id)
    }

    #[must_use]
    pub fn player_names(&self) -> Vec<String> {
        self.players.iter().map(|p| p.name.clone()).collect()
    }
}

/// Card identifier, unique and monotonically assigned within a session.
pub type CardId = i64;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum CardType {
    /// Placeholder card carrying a player's display name.
    PlayerPlaceholder,
    Person,
    Object,
    Place,
    Activity,
    Punishment,
}

impl CardType {
    /// The four categories players author cards for and hands are
    /// dealt from.
    pub const CONTENT_CATEGORIES: [Self; 4] =
        [Self::Person, Self::Object, Self::Place, Self::Activity];

    #[must_use]
    pub fn is_content_category(self) -> bool {
        Self::CONTENT_CATEGORIES.contains(&self)
    }

    /// Parses a prompt placeholder name like `Person` or `Player`.
    #[must_use]
    pub fn from_placeholder(name: &str) -> Option<Self> {
        match name {
            "Player" => Some(Self::PlayerPlaceholder),
            "Person" => Some(Self::Person),
            "Object" => Some(Self::Object),
            "Place" => Some(Self::Place),
            "Activity" => Some(Self::Activity),
            _ => None,
        }
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::PlayerPlaceholder => "player",
            Self::Person => "person",
            Self::Object => "object",
            Self::Place => "place",
            Self::Activity => "activity",
            Self::Punishment => "punishment",
        };
        write!(f, "{repr}")
    }
}

/// A single card. Immutable once created except for the one-time
/// metadata stamp that assigns `id` and `author`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    #[serde(rename = "type")]
    pub card_type: CardType,
    pub text: String,
    /// Unset for predefined content-pool cards.
    pub author: Option<Player>,
}

impl Card {
    /// New unstamped card; the caller must assign metadata before the
    /// card enters any pool or hand.
    #[must_use]
    pub fn new(card_type: CardType, text: impl Into<String>) -> Self {
        Self {
            id: UNASSIGNED_CARD_ID,
            card_type,
            text: text.into(),
            author: None,
        }
    }

    #[must_use]
    pub fn punishment(text: impl Into<String>) -> Self {
        Self::new(CardType::Punishment, text)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} \"{}\"", self.id, self.card_type, self.text)
    }
}

/// A user-submitted card draft, as received over the wire.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDraft {
    #[serde(rename = "type")]
    pub card_type: CardType,
    pub text: String,
}

/// A card placed face-up for voting. `dealer` is the player who played
/// it and may differ from `author` for dealt predefined cards.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayedCard {
    pub card: Card,
    pub dealer: Player,
    pub votes: u32,
}

/// Per-participant state within a session.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub player: Player,
    pub score: u32,
    pub hand: Vec<Card>,
    pub connected: bool,
}

impl PlayerState {
    #[must_use]
    pub fn new(player: Player) -> Self {
        Self {
            player,
            score: 0,
            hand: Vec::new(),
            connected: true,
        }
    }
}

/// A round prompt with its placeholders already resolved.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub text: String,
    pub raw_text: String,
}

/// Why a punishment was applied.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum PunishmentCondition {
    GameFinished,
    AllVotes,
    SameScore,
    LastToVote,
}

impl fmt::Display for PunishmentCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::GameFinished => "game finished",
            Self::AllVotes => "all votes on one card",
            Self::SameScore => "same score",
            Self::LastToVote => "last to vote",
        };
        write!(f, "{repr}")
    }
}

/// A punishment card applied to one or more target players.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Punishment {
    pub card: Card,
    pub targets: Vec<Player>,
    pub condition: PunishmentCondition,
}

/// The phases of a game session, in strict linear order. Rounds loop
/// through `CardPlacement..CardResults`; `Scoreboard` is terminal.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum GamePhase {
    PunishmentCreation,
    PunishmentVoting,
    CardCreation,
    CardPlacement,
    CardVoting,
    CardResults,
    Scoreboard,
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::PunishmentCreation => "punishment creation",
            Self::PunishmentVoting => "punishment voting",
            Self::CardCreation => "card creation",
            Self::CardPlacement => "card placement",
            Self::CardVoting => "card voting",
            Self::CardResults => "card results",
            Self::Scoreboard => "scoreboard",
        };
        write!(f, "{repr}")
    }
}

/// Full session snapshot broadcast to every room member after each
/// successful mutation. Clients diff phases themselves.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub phase: GamePhase,
    pub round: u32,
    pub player_state: Vec<PlayerState>,
    pub played_cards: Vec<PlayedCard>,
    pub question: Option<Question>,
    pub punishment: Option<Punishment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_card_is_unstamped() {
        let card = Card::punishment("sing a song");
        assert_eq!(card.id, UNASSIGNED_CARD_ID);
        assert_eq!(card.card_type, CardType::Punishment);
        assert!(card.author.is_none());
    }

    #[test]
    fn placeholder_names_parse() {
        assert_eq!(
            CardType::from_placeholder("Person"),
            Some(CardType::Person)
        );
        assert_eq!(
            CardType::from_placeholder("Player"),
            Some(CardType::PlayerPlaceholder)
        );
        assert_eq!(CardType::from_placeholder("_"), None);
        assert_eq!(CardType::from_placeholder("Punishment"), None);
    }

    #[test]
    fn content_categories_exclude_meta_types() {
        assert!(CardType::Person.is_content_category());
        assert!(!CardType::Punishment.is_content_category());
        assert!(!CardType::PlayerPlaceholder.is_content_category());
    }

    #[test]
    fn room_membership() {
        let host = Player {
            id: PlayerId::new("a"),
            name: "alice".into(),
        };
        let room = Room {
            id: RoomId::new("AB12C"),
            host: host.clone(),
            players: vec![host],
            open: true,
            nsfw: false,
        };
        assert!(room.contains(&PlayerId::new("a")));
        assert!(!room.contains(&PlayerId::new("b")));
        assert_eq!(room.player_names(), vec!["alice".to_string()]);
    }
}
