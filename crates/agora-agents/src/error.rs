//! Error types for the `agora-agents` crate.

use agora_world::WorldError;
use rust_decimal::Decimal;

/// Errors that can occur during player state operations.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The attribute is not tracked for this player.
    #[error("unknown attribute: {name}")]
    UnknownAttribute {
        /// The missing attribute.
        name: String,
    },

    /// The player cannot pay.
    #[error("insufficient funds: need {required} but only have {available}")]
    InsufficientFunds {
        /// The amount owed.
        required: Decimal,
        /// The player's money.
        available: Decimal,
    },

    /// A negative amount was passed where money must be non-negative.
    #[error("negative amount: {amount}")]
    NegativeAmount {
        /// The rejected amount.
        amount: Decimal,
    },

    /// An arithmetic overflow occurred.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// Description of what was being computed.
        context: String,
    },

    /// A container or catalog operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },
}
