//! # Forfeit Party
//!
//! A round-based party game engine using a type-safe finite state machine (FSM) design.
//!
//! This library provides the complete game logic for a card-and-forfeit party game:
//! room management, card dealing, question building, voting, scoring, and punishment
//! selection. The session is implemented as an FSM using `enum_dispatch` for zero-cost
//! trait dispatch, so a phase action simply cannot be called on the wrong phase type.
//!
//! ## Architecture
//!
//! A session moves through 7 distinct phases:
//!
//! - **PunishmentCreation**: Every player submits one punishment
//! - **PunishmentVoting**: Players vote for the punishment that applies at game end
//! - **CardCreation**: Players author custom cards, padded from the predefined pool
//! - **CardPlacement**: Each player plays one card from their hand for the round's question
//! - **CardVoting**: Players vote for the best placed card
//! - **CardResults**: Scores are applied and a hidden punishment may trigger
//! - **Scoreboard**: Final standings, with the voted punishment targeting the losers
//!
//! The placement/voting/results loop repeats for a fixed number of rounds before the
//! scoreboard is reached.
//!
//! ## Core Modules
//!
//! - [`game`]: Session state machine, entities, registry, and game logic
//! - [`content`]: Predefined card and question loading with placeholder substitution
//! - [`net`]: Message protocol exchanged over the socket
//!
//! ## Example
//!
//! ```
//! use forfeit_party::{Registry, SessionState, entities::PlayerId};
//!
//! let mut registry = Registry::new();
//! let host = registry.create_or_get_player("alice", &PlayerId::new("conn-1"));
//! let room = registry.create_room(host, false);
//!
//! // Every session starts in the punishment creation phase.
//! let _session = SessionState::new(&room, Vec::new(), Vec::new());
//! ```

/// Predefined card and question content.
pub mod content;
pub use content::ContentLibrary;

/// Networking components: the message protocol and the server actor.
pub mod net;
pub use net::{messages, server};

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    SessionError, SessionSnapshot, SessionState,
    constants::{self, MAX_HAND_SIZE, ROUNDS_TO_PLAY},
    entities,
    registry::{JoinOutcome, LeaveOutcome, Registry},
};
