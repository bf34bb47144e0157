//! Player and room registry.
//!
//! An owned store passed into the event handlers by the composition
//! root, rather than process-wide globals, so handlers can be tested
//! against isolated instances. All operations are synchronous; the
//! caller serializes access (one event-processing task).

use log::{info, warn};
use rand::seq::IndexedRandom;
use std::collections::HashMap;

use super::constants::{ROOM_ID_ALPHABET, ROOM_ID_LENGTH};
use super::entities::{Player, PlayerId, Room, RoomId};

/// Outcome of a player joining a room. A closed room and a missing
/// room are distinct on the wire, so the caller needs to tell them
/// apart.
#[derive(Debug, Eq, PartialEq)]
pub enum JoinOutcome {
    Joined,
    /// The room exists but no longer accepts new members.
    RoomClosed,
    UnknownRoom,
}

/// Outcome of a player leaving a room.
#[derive(Debug, Eq, PartialEq)]
pub enum LeaveOutcome {
    /// Player removed, other members remain.
    Left,
    /// Player was the last member; the room was closed.
    RoomClosed,
    /// The room or the membership did not exist.
    NotAMember,
}

#[derive(Debug, Default)]
pub struct Registry {
    players: HashMap<PlayerId, Player>,
    rooms: HashMap<RoomId, Room>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks a player up by connection id, creating and storing one if
    /// absent. Idempotent per connection id, so identity survives
    /// reconnect attempts on the same transport session.
    pub fn create_or_get_player(&mut self, name: &str, connection_id: &PlayerId) -> Player {
        self.players
            .entry(connection_id.clone())
            .or_insert_with(|| {
                info!("new player {name} ({connection_id})");
                Player {
                    id: connection_id.clone(),
                    name: name.to_string(),
                }
            })
            .clone()
    }

    pub fn remove_player(&mut self, player_id: &PlayerId) {
        if let Some(player) = self.players.remove(player_id) {
            info!("removed player {player}");
        }
    }

    /// Creates an open room with `host` as its sole member. Room ids
    /// are short uppercase strings; the id space is small but collision
    /// risk over a process lifetime is negligible, and generation
    /// retries on the off chance anyway.
    pub fn create_room(&mut self, host: Player, nsfw: bool) -> Room {
        let id = loop {
            let candidate = generate_room_id();
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let room = Room {
            id: id.clone(),
            host: host.clone(),
            players: vec![host],
            open: true,
            nsfw,
        };
        info!("created room {id}");
        self.rooms.insert(id, room.clone());
        room
    }

    #[must_use]
    pub fn get_room(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn get_room_mut(&mut self, room_id: &RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(room_id)
    }

    /// Appends `player` to the room. The open check and the append are
    /// one atomic step with respect to the triggering action.
    pub fn join_room(&mut self, room_id: &RoomId, player: Player) -> JoinOutcome {
        let Some(room) = self.rooms.get_mut(room_id) else {
            warn!("join attempt on unknown room {room_id}");
            return JoinOutcome::UnknownRoom;
        };

        if !room.open {
            info!("room {room_id} is closed to new players");
            return JoinOutcome::RoomClosed;
        }

        info!("{player} joined room {room_id}");
        if !room.contains(&player.id) {
            room.players.push(player);
        }
        JoinOutcome::Joined
    }

    /// Removes `player_id` from the room, closing the room when it
    /// would be left with zero members.
    pub fn leave_room(&mut self, room_id: &RoomId, player_id: &PlayerId) -> LeaveOutcome {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return LeaveOutcome::NotAMember;
        };

        let before = room.players.len();
        room.players.retain(|p| &p.id != player_id);
        if room.players.len() == before {
            return LeaveOutcome::NotAMember;
        }

        info!("{player_id} left room {room_id}");
        if room.players.is_empty() {
            self.close_room(room_id);
            LeaveOutcome::RoomClosed
        } else {
            LeaveOutcome::Left
        }
    }

    /// Removes the room from the registry unconditionally.
    pub fn close_room(&mut self, room_id: &RoomId) -> Option<Room> {
        let room = self.rooms.remove(room_id);
        if room.is_some() {
            info!("closed room {room_id}");
        }
        room
    }

    #[must_use]
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}

fn generate_room_id() -> RoomId {
    let mut rng = rand::rng();
    let id: String = (0..ROOM_ID_LENGTH)
        .map(|_| {
            let byte = ROOM_ID_ALPHABET
                .choose(&mut rng)
                .copied()
                .unwrap_or(b'A');
            byte as char
        })
        .collect();
    RoomId::new(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: &str, name: &str) -> Player {
        Player {
            id: PlayerId::new(id),
            name: name.to_string(),
        }
    }

    #[test]
    fn create_or_get_is_idempotent_per_connection() {
        let mut registry = Registry::new();
        let id = PlayerId::new("conn-1");

        let first = registry.create_or_get_player("alice", &id);
        let second = registry.create_or_get_player("not-alice", &id);

        // Same transport id reuses the original identity.
        assert_eq!(first, second);
        assert_eq!(second.name, "alice");
        assert_eq!(registry.player_count(), 1);
    }

    #[test]
    fn room_id_shape() {
        let id = generate_room_id();
        assert_eq!(id.as_str().len(), ROOM_ID_LENGTH);
        assert!(
            id.as_str()
                .bytes()
                .all(|b| ROOM_ID_ALPHABET.contains(&b))
        );
    }

    #[test]
    fn host_is_sole_member_of_new_room() {
        let mut registry = Registry::new();
        let room = registry.create_room(player("a", "alice"), false);
        assert!(room.open);
        assert_eq!(room.players.len(), 1);
        assert_eq!(room.host.name, "alice");
    }

    #[test]
    fn join_rejected_once_closed() {
        let mut registry = Registry::new();
        let room = registry.create_room(player("a", "alice"), false);

        assert_eq!(
            registry.join_room(&room.id, player("b", "bob")),
            JoinOutcome::Joined
        );

        registry.get_room_mut(&room.id).unwrap().open = false;
        assert_eq!(
            registry.join_room(&room.id, player("c", "carol")),
            JoinOutcome::RoomClosed
        );
        assert_eq!(registry.get_room(&room.id).unwrap().players.len(), 2);
    }

    #[test]
    fn closed_and_missing_rooms_are_distinct_join_outcomes() {
        let mut registry = Registry::new();
        assert_eq!(
            registry.join_room(&RoomId::new("ZZZZZ"), player("b", "bob")),
            JoinOutcome::UnknownRoom
        );
    }

    #[test]
    fn last_player_leaving_closes_the_room() {
        let mut registry = Registry::new();
        let room = registry.create_room(player("a", "alice"), false);
        registry.join_room(&room.id, player("b", "bob"));

        assert_eq!(
            registry.leave_room(&room.id, &PlayerId::new("b")),
            LeaveOutcome::Left
        );
        assert_eq!(
            registry.leave_room(&room.id, &PlayerId::new("a")),
            LeaveOutcome::RoomClosed
        );
        assert!(registry.get_room(&room.id).is_none());
        assert_eq!(registry.room_count(), 0);
    }

    #[test]
    fn close_room_is_unconditional() {
        let mut registry = Registry::new();
        let room = registry.create_room(player("a", "alice"), true);
        assert!(registry.close_room(&room.id).is_some());
        assert!(registry.close_room(&room.id).is_none());
    }
}
