//! Integration tests for the server actor.
//!
//! Drives the actor through its command inbox the same way the
//! WebSocket layer does, with channel-backed fake connections, and
//! checks the events broadcast back: room lifecycle, full-state
//! updates, and teardown on disconnect.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use forfeit_party::{
    ContentLibrary, MAX_HAND_SIZE, ROUNDS_TO_PLAY,
    entities::{CardId, GamePhase, GameView, PlayerId},
    messages::{ClientEvent, ServerEvent},
    server::{GameServer, ServerCommand, ServerHandle},
};

fn lines(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{prefix} {i}")).collect()
}

fn content() -> ContentLibrary {
    ContentLibrary::from_lines(
        lines("person", 12),
        lines("object", 12),
        lines("place", 12),
        lines("activity", 12),
        lines("question", 5),
    )
}

struct Client {
    connection: PlayerId,
    handle: ServerHandle,
    events: mpsc::Receiver<ServerEvent>,
}

impl Client {
    async fn connect(handle: &ServerHandle, id: &str) -> Self {
        let connection = PlayerId::new(id);
        let (tx, events) = mpsc::channel(64);
        handle
            .send(ServerCommand::Connect {
                connection: connection.clone(),
                sender: tx,
            })
            .await
            .unwrap();
        Self {
            connection,
            handle: handle.clone(),
            events,
        }
    }

    async fn send(&self, event: ClientEvent) {
        self.handle
            .send(ServerCommand::Event {
                connection: self.connection.clone(),
                event,
            })
            .await
            .unwrap();
    }

    async fn disconnect(&self) {
        self.handle
            .send(ServerCommand::Disconnect {
                connection: self.connection.clone(),
            })
            .await
            .unwrap();
    }

    async fn recv(&mut self) -> ServerEvent {
        timeout(Duration::from_secs(5), self.events.recv())
            .await
            .expect("timed out waiting for a server event")
            .expect("server closed the event channel")
    }

    /// Reads events until the next full-state update, skipping room
    /// lifecycle notifications.
    async fn next_update(&mut self) -> GameView {
        loop {
            if let ServerEvent::Update { state } = self.recv().await {
                return state;
            }
        }
    }

    fn hand_card(&self, view: &GameView) -> CardId {
        view.player_state
            .iter()
            .find(|ps| ps.player.id == self.connection)
            .and_then(|ps| ps.hand.first())
            .map(|c| c.id)
            .expect("client should hold at least one card")
    }
}

fn spawn_server() -> ServerHandle {
    let (server, handle) = GameServer::new(content());
    tokio::spawn(server.run());
    handle
}

#[tokio::test]
async fn test_room_creation_and_case_insensitive_join() {
    let handle = spawn_server();
    let mut alice = Client::connect(&handle, "conn-alice").await;
    let mut bob = Client::connect(&handle, "conn-bob").await;

    alice
        .send(ClientEvent::CreateRoom {
            player_name: "alice".into(),
            nsfw: false,
        })
        .await;
    let room = match alice.recv().await {
        ServerEvent::RoomCreated { room } => room,
        other => panic!("expected RoomCreated, got {other:?}"),
    };
    assert!(room.open);
    assert_eq!(room.host.name, "alice");

    // Joins normalize the room code, so lowercase input still lands.
    bob.send(ClientEvent::JoinRoom {
        player_name: "bob".into(),
        room_id: room.id.as_str().to_lowercase(),
    })
    .await;

    for client in [&mut alice, &mut bob] {
        match client.recv().await {
            ServerEvent::RoomUpdated { room } => {
                assert_eq!(room.players.len(), 2);
            }
            other => panic!("expected RoomUpdated, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_joining_an_unknown_room_reports_not_found() {
    let handle = spawn_server();
    let mut carol = Client::connect(&handle, "conn-carol").await;

    carol
        .send(ClientEvent::JoinRoom {
            player_name: "carol".into(),
            room_id: "ZZZZ9".into(),
        })
        .await;

    assert_eq!(carol.recv().await, ServerEvent::RoomNotFound);
}

#[tokio::test]
async fn test_joining_a_closed_room_reports_room_closed() {
    let handle = spawn_server();
    let mut alice = Client::connect(&handle, "conn-alice").await;
    let mut bob = Client::connect(&handle, "conn-bob").await;
    let mut carol = Client::connect(&handle, "conn-carol").await;

    alice
        .send(ClientEvent::CreateRoom {
            player_name: "alice".into(),
            nsfw: false,
        })
        .await;
    let room = match alice.recv().await {
        ServerEvent::RoomCreated { room } => room,
        other => panic!("expected RoomCreated, got {other:?}"),
    };
    bob.send(ClientEvent::JoinRoom {
        player_name: "bob".into(),
        room_id: room.id.as_str().into(),
    })
    .await;
    alice.recv().await; // RoomUpdated
    bob.recv().await; // RoomUpdated

    // Starting the game closes the room to new joins.
    alice.send(ClientEvent::StartGame).await;

    carol
        .send(ClientEvent::JoinRoom {
            player_name: "carol".into(),
            room_id: room.id.as_str().into(),
        })
        .await;

    match carol.recv().await {
        ServerEvent::RoomClosed { player } => assert_eq!(player.name, "carol"),
        other => panic!("expected RoomClosed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_disconnect_closes_the_whole_room() {
    let handle = spawn_server();
    let mut alice = Client::connect(&handle, "conn-alice").await;
    let mut bob = Client::connect(&handle, "conn-bob").await;

    alice
        .send(ClientEvent::CreateRoom {
            player_name: "alice".into(),
            nsfw: false,
        })
        .await;
    let room = match alice.recv().await {
        ServerEvent::RoomCreated { room } => room,
        other => panic!("expected RoomCreated, got {other:?}"),
    };
    bob.send(ClientEvent::JoinRoom {
        player_name: "bob".into(),
        room_id: room.id.as_str().into(),
    })
    .await;
    alice.recv().await; // RoomUpdated
    bob.recv().await; // RoomUpdated

    bob.disconnect().await;

    match alice.recv().await {
        ServerEvent::RoomClosed { player } => assert_eq!(player.name, "bob"),
        other => panic!("expected RoomClosed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_full_game_over_the_wire() {
    let handle = spawn_server();
    let mut alice = Client::connect(&handle, "conn-alice").await;
    let mut bob = Client::connect(&handle, "conn-bob").await;

    // Lobby.
    alice
        .send(ClientEvent::CreateRoom {
            player_name: "alice".into(),
            nsfw: false,
        })
        .await;
    let room = match alice.recv().await {
        ServerEvent::RoomCreated { room } => room,
        other => panic!("expected RoomCreated, got {other:?}"),
    };
    bob.send(ClientEvent::JoinRoom {
        player_name: "bob".into(),
        room_id: room.id.as_str().into(),
    })
    .await;
    alice.recv().await;
    bob.recv().await;

    // Only the host can start; bob's attempt is dropped without reply.
    bob.send(ClientEvent::StartGame).await;
    alice.send(ClientEvent::StartGame).await;
    let view = alice.next_update().await;
    bob.next_update().await;
    assert_eq!(view.phase, GamePhase::PunishmentCreation);

    // Punishments in.
    for (client, text) in [(&alice, "sing a song"), (&bob, "dance")] {
        client
            .send(ClientEvent::CreatePunishment { text: text.into() })
            .await;
    }
    alice.next_update().await;
    bob.next_update().await;
    let view = alice.next_update().await;
    bob.next_update().await;
    assert_eq!(view.phase, GamePhase::PunishmentVoting);
    assert_eq!(view.played_cards.len(), 2);

    // Everyone votes the first punishment.
    let punishment_card = view.played_cards[0].card.id;
    for client in [&alice, &bob] {
        client
            .send(ClientEvent::VotePunishment {
                card_id: punishment_card,
            })
            .await;
    }
    alice.next_update().await;
    bob.next_update().await;
    let view = alice.next_update().await;
    bob.next_update().await;
    assert_eq!(view.phase, GamePhase::CardCreation);

    // Empty submissions; the predefined pool pads every batch.
    for client in [&alice, &bob] {
        client
            .send(ClientEvent::CreateCards { cards: Vec::new() })
            .await;
    }
    alice.next_update().await;
    bob.next_update().await;
    let mut view = alice.next_update().await;
    bob.next_update().await;
    assert_eq!(view.phase, GamePhase::CardPlacement);
    assert_eq!(view.round, 1);
    for ps in &view.player_state {
        assert_eq!(ps.hand.len(), MAX_HAND_SIZE);
    }

    // The round loop, with alice winning every vote.
    for round in 1..=ROUNDS_TO_PLAY {
        assert_eq!(view.round, round);

        for client in [&mut alice, &mut bob] {
            let card_id = client.hand_card(&view);
            client.send(ClientEvent::SelectCard { card_id }).await;
        }
        alice.next_update().await;
        bob.next_update().await;
        view = alice.next_update().await;
        bob.next_update().await;
        assert_eq!(view.phase, GamePhase::CardVoting);

        let winning_card = view
            .played_cards
            .iter()
            .find(|pc| pc.dealer.name == "alice")
            .map(|pc| pc.card.id)
            .unwrap();
        for client in [&alice, &bob] {
            client
                .send(ClientEvent::VoteCard {
                    card_id: winning_card,
                })
                .await;
        }
        alice.next_update().await;
        bob.next_update().await;
        view = alice.next_update().await;
        bob.next_update().await;
        assert_eq!(view.phase, GamePhase::CardResults);

        alice.send(ClientEvent::StartNextRound).await;
        view = alice.next_update().await;
        bob.next_update().await;
    }

    // Final standings and the voted punishment for the loser.
    assert_eq!(view.phase, GamePhase::Scoreboard);
    let alice_score = view
        .player_state
        .iter()
        .find(|ps| ps.player.name == "alice")
        .map(|ps| ps.score)
        .unwrap();
    assert_eq!(alice_score, 3 * ROUNDS_TO_PLAY);

    let punishment = view.punishment.expect("scoreboard carries the punishment");
    assert_eq!(punishment.card.id, punishment_card);
    assert_eq!(punishment.targets.len(), 1);
    assert_eq!(punishment.targets[0].name, "bob");
}
