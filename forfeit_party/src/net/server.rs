//! Game server actor with async message handling.
//!
//! A single actor owns every room, session, and connection, so all
//! mutations for a room are serialized through one inbox and no game
//! state needs a lock. WebSocket handlers only translate frames into
//! [`ServerCommand`]s and forward [`ServerEvent`]s back out.

use std::collections::HashMap;

use log::{error, info, warn};
use tokio::sync::mpsc;

use crate::content::ContentLibrary;
use crate::game::entities::{Player, PlayerId, Room, RoomId};
use crate::game::registry::{JoinOutcome, Registry};
use crate::game::{SessionError, SessionSnapshot, SessionState};

use super::messages::{ClientEvent, ServerEvent};

/// Commands delivered to the server actor.
#[derive(Debug)]
pub enum ServerCommand {
    /// A new socket connected; `sender` carries its outbound events.
    Connect {
        connection: PlayerId,
        sender: mpsc::Sender<ServerEvent>,
    },
    /// A parsed event arrived from a connection.
    Event {
        connection: PlayerId,
        event: ClientEvent,
    },
    /// The socket closed, cleanly or otherwise.
    Disconnect { connection: PlayerId },
}

/// Server actor handle for sending commands
#[derive(Clone)]
pub struct ServerHandle {
    sender: mpsc::Sender<ServerCommand>,
}

impl ServerHandle {
    /// Send a command to the server actor
    pub async fn send(&self, command: ServerCommand) -> Result<(), String> {
        self.sender
            .send(command)
            .await
            .map_err(|_| "Server is closed".to_string())
    }
}

/// The server actor. Owns the player/room registry, one session per
/// started room, and the outbound channel of every live connection.
pub struct GameServer {
    /// Command inbox
    inbox: mpsc::Receiver<ServerCommand>,

    /// Players and rooms
    registry: Registry,

    /// One running session per started room
    sessions: HashMap<RoomId, SessionState>,

    /// Outbound event channel per connection
    connections: HashMap<PlayerId, mpsc::Sender<ServerEvent>>,

    /// Which room each connection currently sits in
    memberships: HashMap<PlayerId, RoomId>,

    /// Predefined cards and questions, loaded once at startup
    content: ContentLibrary,
}

impl GameServer {
    /// Create a new server actor and a handle for sending commands to
    /// it. The actor does nothing until [`run`](Self::run) is awaited.
    #[must_use]
    pub fn new(content: ContentLibrary) -> (Self, ServerHandle) {
        let (sender, inbox) = mpsc::channel(100);
        let server = Self {
            inbox,
            registry: Registry::new(),
            sessions: HashMap::new(),
            connections: HashMap::new(),
            memberships: HashMap::new(),
            content,
        };
        (server, ServerHandle { sender })
    }

    /// Process commands until every handle is dropped.
    pub async fn run(mut self) {
        info!("game server actor started");
        while let Some(command) = self.inbox.recv().await {
            match command {
                ServerCommand::Connect { connection, sender } => {
                    info!("connection {connection} established");
                    self.connections.insert(connection, sender);
                }
                ServerCommand::Event { connection, event } => {
                    self.handle_event(connection, event).await;
                }
                ServerCommand::Disconnect { connection } => {
                    self.handle_disconnect(connection).await;
                }
            }
        }
        info!("game server actor stopped");
    }

    async fn handle_event(&mut self, connection: PlayerId, event: ClientEvent) {
        match event {
            ClientEvent::CreateRoom { player_name, nsfw } => {
                self.create_room(connection, &player_name, nsfw).await;
            }
            ClientEvent::JoinRoom {
                player_name,
                room_id,
            } => {
                let room_id = RoomId::new(room_id.to_uppercase());
                self.join_room(connection, &player_name, room_id).await;
            }
            ClientEvent::StartGame => self.start_game(connection).await,
            ClientEvent::CreatePunishment { text } => {
                self.session_action(&connection, "createPunishment", |session, player| {
                    session.create_punishment(player, &text)
                })
                .await;
            }
            ClientEvent::VotePunishment { card_id } => {
                self.session_action(&connection, "votePunishment", |session, player| {
                    session.vote_punishment(player, card_id)
                })
                .await;
            }
            ClientEvent::CreateCards { cards } => {
                self.session_action(&connection, "createCards", |session, player| {
                    session.create_cards(player, &cards)
                })
                .await;
            }
            ClientEvent::SelectCard { card_id } => {
                self.session_action(&connection, "selectCard", |session, player| {
                    session.select_card(player, card_id)
                })
                .await;
            }
            ClientEvent::VoteCard { card_id } => {
                self.session_action(&connection, "voteCard", |session, player| {
                    session.vote_card(player, card_id)
                })
                .await;
            }
            ClientEvent::StartNextRound => {
                self.session_action(&connection, "startNextRound", |session, player| {
                    let player_id = player.id.clone();
                    session.start_next_round(&player_id)
                })
                .await;
            }
        }
    }

    async fn create_room(&mut self, connection: PlayerId, player_name: &str, nsfw: bool) {
        // A connection sits in at most one room at a time.
        self.leave_current_room(&connection).await;

        let player = self.registry.create_or_get_player(player_name, &connection);
        let room = self.registry.create_room(player, nsfw);
        self.memberships.insert(connection.clone(), room.id.clone());

        self.send_to(&connection, ServerEvent::RoomCreated { room })
            .await;
    }

    async fn join_room(&mut self, connection: PlayerId, player_name: &str, room_id: RoomId) {
        self.leave_current_room(&connection).await;

        let player = self.registry.create_or_get_player(player_name, &connection);
        match self.registry.join_room(&room_id, player.clone()) {
            JoinOutcome::Joined => {}
            JoinOutcome::RoomClosed => {
                self.send_to(&connection, ServerEvent::RoomClosed { player })
                    .await;
                return;
            }
            JoinOutcome::UnknownRoom => {
                self.send_to(&connection, ServerEvent::RoomNotFound).await;
                return;
            }
        }
        self.memberships.insert(connection, room_id.clone());

        if let Some(room) = self.registry.get_room(&room_id).cloned() {
            self.broadcast(&room, ServerEvent::RoomUpdated { room: room.clone() })
                .await;
        }
    }

    async fn start_game(&mut self, connection: PlayerId) {
        let Some(room_id) = self.memberships.get(&connection).cloned() else {
            warn!("{connection} tried to start a game without a room");
            return;
        };
        let Some(room) = self.registry.get_room_mut(&room_id) else {
            return;
        };
        if room.host.id != connection {
            warn!("{connection} is not the host of room {room_id}");
            return;
        }

        // No late joins once gameplay starts.
        room.open = false;
        let room = room.clone();

        let predefined = self
            .content
            .predefined_cards(room.nsfw, &room.player_names());
        let questions = self.content.question_texts(room.nsfw);
        // Starting again for the same room discards any running session.
        let session = SessionState::new(&room, predefined, questions);

        let view = session.view();
        self.sessions.insert(room_id, session);
        self.broadcast(&room, ServerEvent::RoomUpdated { room: room.clone() })
            .await;
        self.broadcast(&room, ServerEvent::Update { state: view }).await;
    }

    /// Applies one validated player action to the connection's session,
    /// steps the FSM, and broadcasts the resulting state. A rejected
    /// action is logged and produces no broadcast; a failed step is
    /// unrecoverable and tears the room down.
    async fn session_action<F>(&mut self, connection: &PlayerId, action: &str, apply: F)
    where
        F: FnOnce(&mut SessionState, &Player) -> Result<(), SessionError>,
    {
        let Some(room_id) = self.memberships.get(connection).cloned() else {
            warn!("{connection} sent {action} without a room");
            return;
        };
        let Some(mut session) = self.sessions.remove(&room_id) else {
            warn!("{action} for room {room_id} with no running session");
            return;
        };
        let Some(player) = session.data().player(connection).cloned() else {
            warn!("{connection} sent {action} but is not in session {room_id}");
            self.sessions.insert(room_id, session);
            return;
        };

        if let Err(e) = apply(&mut session, &player) {
            // Already logged at the source; drop the action silently.
            warn!("room {room_id}: {action} rejected: {e}");
            self.sessions.insert(room_id, session);
            return;
        }

        match session.step() {
            Ok(next) => {
                let view = next.view();
                self.sessions.insert(room_id.clone(), next);
                if let Some(room) = self.registry.get_room(&room_id).cloned() {
                    self.broadcast(&room, ServerEvent::Update { state: view })
                        .await;
                }
            }
            Err(e) => {
                error!("room {room_id}: session unrecoverable after {action}: {e}");
                self.teardown_room(&room_id, &player).await;
            }
        }
    }

    async fn handle_disconnect(&mut self, connection: PlayerId) {
        info!("connection {connection} closed");
        self.connections.remove(&connection);

        // Mid-game state cannot survive a missing player, so the whole
        // room goes down with the leaver.
        if let Some(room_id) = self.memberships.remove(&connection)
            && let Some(player) = self
                .registry
                .get_room(&room_id)
                .and_then(|room| room.players.iter().find(|p| p.id == connection))
                .cloned()
        {
            self.teardown_room(&room_id, &player).await;
        }
        self.registry.remove_player(&connection);
    }

    /// Closes the room, drops its session, and tells every remaining
    /// member which player took the room down.
    async fn teardown_room(&mut self, room_id: &RoomId, culprit: &Player) {
        self.sessions.remove(room_id);
        let Some(room) = self.registry.close_room(room_id) else {
            return;
        };

        for member in &room.players {
            self.memberships.remove(&member.id);
        }
        self.broadcast(
            &room,
            ServerEvent::RoomClosed {
                player: culprit.clone(),
            },
        )
        .await;
    }

    /// Removes the connection from whatever room it is in. Used when a
    /// still-connected player creates or joins another room.
    async fn leave_current_room(&mut self, connection: &PlayerId) {
        let Some(room_id) = self.memberships.remove(connection) else {
            return;
        };

        // Leaving a room with a running session ends the game for
        // everyone, same as a disconnect.
        if self.sessions.contains_key(&room_id) {
            if let Some(player) = self
                .registry
                .get_room(&room_id)
                .and_then(|room| room.players.iter().find(|p| &p.id == connection))
                .cloned()
            {
                self.teardown_room(&room_id, &player).await;
            }
            return;
        }

        self.registry.leave_room(&room_id, connection);
        if let Some(room) = self.registry.get_room(&room_id).cloned() {
            self.broadcast(&room, ServerEvent::RoomUpdated { room: room.clone() })
                .await;
        }
    }

    async fn broadcast(&self, room: &Room, event: ServerEvent) {
        for member in &room.players {
            self.send_to(&member.id, event.clone()).await;
        }
    }

    async fn send_to(&self, connection: &PlayerId, event: ServerEvent) {
        if let Some(sender) = self.connections.get(connection) {
            if sender.send(event).await.is_err() {
                warn!("dropped event for stale connection {connection}");
            }
        }
    }
}
