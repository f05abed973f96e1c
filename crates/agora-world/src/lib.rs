//! Clock, containers, market, and shared world state for the Agora
//! trading simulation.
//!
//! Everything in this crate is either read-only game content or state
//! that several agent loops share. Shared state lives in [`WorldState`]
//! and is only reachable through the single mutex held by [`World`].
//!
//! # Modules
//!
//! - [`clock`] -- Accelerated simulated time derived from real elapsed time.
//! - [`catalog`] -- Read-only item definitions, recipes, tools, fishing rules.
//! - [`container`] -- Capacity-bounded item bags (inventories, home storage).
//! - [`content`] -- Serializable game content and the built-in default set.
//! - [`error`] -- Error types for world operations.
//! - [`location`] -- Location definitions and player homes.
//! - [`market`] -- Stock, prices, and the once-per-day price refresh.
//! - [`world`] -- [`WorldState`] and the lock-owning [`World`] handle.

pub mod catalog;
pub mod clock;
pub mod container;
pub mod content;
pub mod error;
pub mod location;
pub mod market;
pub mod world;

pub use catalog::{Catalog, CookRecipe, CookTool, FishingRules, ItemDef, ItemKind};
pub use clock::{ClockError, WorldClock};
pub use container::ResourceContainer;
pub use content::{GameContent, ListingDef, MarketDef, PlayerSeed};
pub use error::WorldError;
pub use location::{Home, LocationDef, LocationKind};
pub use market::{Listing, Market, MarketSettings};
pub use world::{Mail, World, WorldState};
