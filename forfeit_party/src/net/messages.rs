//! Client/server event types, exchanged as tagged JSON text frames.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::game::entities::{CardDraft, CardId, GameView, Player, Room};

/// An inbound player action. Every event is validated against the
/// room's current phase before it mutates anything; a mismatch is
/// dropped with a log entry and no reply.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    CreateRoom {
        player_name: String,
        nsfw: bool,
    },
    JoinRoom {
        player_name: String,
        room_id: String,
    },
    /// Host only.
    StartGame,
    CreatePunishment {
        text: String,
    },
    VotePunishment {
        card_id: CardId,
    },
    CreateCards {
        cards: Vec<CardDraft>,
    },
    SelectCard {
        card_id: CardId,
    },
    VoteCard {
        card_id: CardId,
    },
    /// Host only.
    StartNextRound,
}

impl fmt::Display for ClientEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::CreateRoom { .. } => "createRoom",
            Self::JoinRoom { .. } => "joinRoom",
            Self::StartGame => "startGame",
            Self::CreatePunishment { .. } => "createPunishment",
            Self::VotePunishment { .. } => "votePunishment",
            Self::CreateCards { .. } => "createCards",
            Self::SelectCard { .. } => "selectCard",
            Self::VoteCard { .. } => "voteCard",
            Self::StartNextRound => "startNextRound",
        };
        write!(f, "{repr}")
    }
}

/// An outbound notification, sent to the acting connection and mirrored
/// to the other room members where applicable.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    RoomCreated { room: Room },
    RoomUpdated { room: Room },
    RoomClosed { player: Player },
    RoomNotFound,
    /// Full session snapshot after every successful mutation. Clients
    /// diff phases themselves; a duplicate-phase update is a valid
    /// no-op on their side.
    Update { state: GameView },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::CardType;

    #[test]
    fn client_events_round_trip_as_tagged_json() {
        let event = ClientEvent::CreateCards {
            cards: vec![CardDraft {
                card_type: CardType::Place,
                text: "the moon".into(),
            }],
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"createCards\""));
        let back: ClientEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn join_room_payload_shape() {
        let json = r#"{"type":"joinRoom","playerName":"alice","roomId":"AB12C"}"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            ClientEvent::JoinRoom {
                player_name: "alice".into(),
                room_id: "AB12C".into(),
            }
        );
    }

    #[test]
    fn event_payload_fields_are_camel_case() {
        let json = serde_json::to_string(&ClientEvent::CreateRoom {
            player_name: "alice".into(),
            nsfw: true,
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"type":"createRoom","playerName":"alice","nsfw":true}"#
        );

        let json = serde_json::to_string(&ClientEvent::VoteCard { card_id: 7 }).unwrap();
        assert_eq!(json, r#"{"type":"voteCard","cardId":7}"#);
    }

    #[test]
    fn card_drafts_carry_a_bare_type_field() {
        let json = r#"{"type":"createCards","cards":[{"type":"Object","text":"a rubber duck"}]}"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            ClientEvent::CreateCards {
                cards: vec![CardDraft {
                    card_type: CardType::Object,
                    text: "a rubber duck".into(),
                }],
            }
        );
    }

    #[test]
    fn room_not_found_serializes_bare() {
        let json = serde_json::to_string(&ServerEvent::RoomNotFound).unwrap();
        assert_eq!(json, r#"{"type":"roomNotFound"}"#);
    }
}
