//! Game engine: entities, registry, card/vote/punishment logic and the
//! phase state machine.

pub mod constants;
pub mod entities;
pub mod registry;
pub mod states;

mod cards;
mod punishments;
mod scoring;
mod state_machine;

pub use state_machine::{Game, SessionData, SessionError, SessionSnapshot, SessionState};
