//! Error types for the `agora-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`].

use agora_types::{AgentId, ItemId, LocationId};

/// Errors that can occur during world, container, and market operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The item is not defined in the catalog.
    #[error("unknown item: {item}")]
    UnknownItem {
        /// The missing item.
        item: ItemId,
    },

    /// The location is not part of the world.
    #[error("unknown location: {location}")]
    UnknownLocation {
        /// The missing location.
        location: LocationId,
    },

    /// The player has no home registered.
    #[error("no home registered for {agent}")]
    UnknownHome {
        /// The homeless agent.
        agent: AgentId,
    },

    /// The home has no container with this name.
    #[error("unknown container: {container}")]
    UnknownContainer {
        /// The missing container name.
        container: String,
    },

    /// The source holds fewer units than requested.
    #[error("insufficient {item}: wanted {requested} but only {available} held")]
    Insufficient {
        /// The item being removed.
        item: ItemId,
        /// Units requested.
        requested: u32,
        /// Units actually held.
        available: u32,
    },

    /// The destination cannot hold the requested units.
    #[error("no room for {item} in {container}: needs {required} capacity, {free} free")]
    NoCapacity {
        /// The container that is full.
        container: String,
        /// The item being added.
        item: ItemId,
        /// Capacity units the addition needs.
        required: u32,
        /// Capacity units still free.
        free: u32,
    },

    /// The market does not list this item.
    #[error("{item} is not traded at the market")]
    NotListed {
        /// The unlisted item.
        item: ItemId,
    },

    /// The market holds fewer units than requested.
    #[error("market is out of {item}: wanted {requested} but only {available} in stock")]
    OutOfStock {
        /// The item being bought.
        item: ItemId,
        /// Units requested.
        requested: u32,
        /// Units in stock.
        available: u32,
    },

    /// An arithmetic overflow occurred.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// Description of what was being computed.
        context: String,
    },

    /// Game content references something that does not exist.
    #[error("invalid game content: {reason}")]
    InvalidContent {
        /// Explanation of the inconsistency.
        reason: String,
    },
}
