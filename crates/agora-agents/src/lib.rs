//! Player state, attributes, and the action engine for the Agora trading
//! simulation.
//!
//! A [`PlayerState`] is owned by exactly one agent loop and mutated
//! without locks. The [`ActionEngine`] validates an [`Action`], obtains
//! external confirmation through the dispatcher, and commits the change
//! to the player and, under the world lock, to shared state.
//!
//! # Modules
//!
//! - [`actions`] -- The engine and one handler per action type.
//! - [`attributes`] -- Survival attributes and their decay.
//! - [`config`] -- Game rules (starting money, decay rates, action costs).
//! - [`error`] -- Error types for player state operations.
//! - [`player`] -- [`PlayerState`]: money, location, inventory, memory.
//!
//! [`Action`]: agora_types::Action

pub mod actions;
pub mod attributes;
pub mod config;
pub mod error;
pub mod player;

pub use actions::ActionEngine;
pub use attributes::{Attribute, AttributeSet};
pub use config::{AttributeRule, RulesConfig};
pub use error::AgentError;
pub use player::{AccessState, PlayerState, Vitality};
