//! The action engine and its handlers.
//!
//! [`ActionEngine::execute`] is the single entry point: it routes an
//! [`Action`](agora_types::Action) to its handler, isolates handler
//! panics, and always returns exactly one
//! [`ActionResult`](agora_types::ActionResult).
//!
//! Handlers follow the same shape: validate against the player and the
//! catalog, obtain confirmation from the player's endpoint, then commit.
//! Shared state is only touched while the world lock is held, and a
//! handler never awaits the dispatcher while holding it.
//!
//! # Submodules
//!
//! - [`engine`] -- [`ActionEngine`] and the helpers shared by handlers.
//! - `outcome` -- Mapping of internal errors to result codes.
//! - `movement` -- `move`, plus the implicit moves of other actions.
//! - `consume` -- Eating, drinking, and equipping.
//! - `cook` -- Turning raw inputs into food with a tool and fuel.
//! - `trade` -- Buying from and selling to the market.
//! - `storage` -- Moving items between inventory and home storage.
//! - `fishing` -- Fishing at the river.
//! - `rest` -- `wait` and `sleep`.
//! - `talk` -- Messages between players.

pub mod engine;

mod consume;
mod cook;
mod fishing;
mod movement;
mod outcome;
mod rest;
mod storage;
mod talk;
mod trade;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::ActionEngine;
