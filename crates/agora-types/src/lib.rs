//! Shared type definitions for the Agora trading simulation.
//!
//! This crate contains the vocabulary every other crate speaks: typed
//! identifiers, the [`Action`] tagged union proposed by planners, the
//! flat [`ActionResult`] record returned by the action engine, and the
//! [`WireMessage`] frames exchanged with the visual frontend.
//!
//! # Modules
//!
//! - [`ids`] -- Identifier newtypes
//! - [`actions`] -- Action variants and their discriminants
//! - [`result`] -- Action outcomes and result codes
//! - [`wire`] -- Dispatch protocol frames

pub mod actions;
pub mod ids;
pub mod result;
pub mod wire;

pub use actions::{Action, ActionKind, TradeMode};
pub use ids::{ActionId, AgentId, ItemId, LocationId};
pub use result::{ActionResult, ResultCode, ResultDelta};
pub use wire::{Command, CommandKind, CommandRequest, CompletionStatus, WireMessage};
