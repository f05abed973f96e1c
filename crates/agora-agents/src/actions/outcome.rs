//! Mapping of internal errors onto result codes.

use agora_dispatch::DispatchError;
use agora_types::{ActionKind, ActionResult, ResultCode};
use agora_world::WorldError;

use crate::error::AgentError;

/// A failed world operation.
pub(crate) fn world_failure(kind: ActionKind, error: &WorldError) -> ActionResult {
    let code = match error {
        WorldError::UnknownItem { .. }
        | WorldError::UnknownLocation { .. }
        | WorldError::UnknownHome { .. }
        | WorldError::UnknownContainer { .. }
        | WorldError::NotListed { .. } => ResultCode::NotFound,
        WorldError::Insufficient { .. } => ResultCode::Insufficient,
        WorldError::NoCapacity { .. } => ResultCode::NoCapacity,
        WorldError::OutOfStock { .. } => ResultCode::OutOfStock,
        WorldError::ArithmeticOverflow { .. } | WorldError::InvalidContent { .. } => {
            ResultCode::Invalid
        }
    };
    ActionResult::failure(kind, code, error.to_string())
}

/// A failed player state operation.
pub(crate) fn agent_failure(kind: ActionKind, error: &AgentError) -> ActionResult {
    match error {
        AgentError::World { source } => world_failure(kind, source),
        AgentError::InsufficientFunds { .. } => {
            ActionResult::failure(kind, ResultCode::NoFunds, error.to_string())
        }
        AgentError::UnknownAttribute { .. }
        | AgentError::NegativeAmount { .. }
        | AgentError::ArithmeticOverflow { .. } => {
            ActionResult::failure(kind, ResultCode::Invalid, error.to_string())
        }
    }
}

/// A command the endpoint did not confirm.
pub(crate) fn dispatch_failure(kind: ActionKind, error: &DispatchError) -> ActionResult {
    let code = if error.is_timeout() {
        ResultCode::Timeout
    } else {
        ResultCode::Rejected
    };
    ActionResult::failure(kind, code, format!("the {kind} was not confirmed: {error}"))
}

/// The player ran out of an attribute while acting.
pub(crate) fn death(kind: ActionKind, cause: &str) -> ActionResult {
    ActionResult::failure(
        kind,
        ResultCode::Dead,
        format!("you collapsed during {kind}: {cause} ran out"),
    )
    .with_event(format!("Collapsed from lack of {cause}"))
}

/// Input the handler refuses outright.
pub(crate) fn invalid(kind: ActionKind, message: impl Into<String>) -> ActionResult {
    ActionResult::failure(kind, ResultCode::Invalid, message)
}

#[cfg(test)]
mod tests {
    use agora_types::{ActionId, AgentId, CompletionStatus, ItemId};

    use super::*;

    #[test]
    fn timeouts_and_rejections_are_distinct() {
        let agent_id = AgentId::from("a");
        let timeout = DispatchError::Timeout {
            agent_id: agent_id.clone(),
            action_id: ActionId::new(),
            timeout_ms: 25_000,
        };
        let rejected = DispatchError::Rejected {
            agent_id,
            action_id: ActionId::new(),
            status: CompletionStatus::Failed,
        };
        assert_eq!(dispatch_failure(ActionKind::Move, &timeout).code, ResultCode::Timeout);
        assert_eq!(dispatch_failure(ActionKind::Move, &rejected).code, ResultCode::Rejected);
        assert_eq!(
            dispatch_failure(ActionKind::Move, &DispatchError::Closed).code,
            ResultCode::Rejected
        );
    }

    #[test]
    fn world_errors_keep_their_meaning() {
        let stock = WorldError::OutOfStock {
            item: ItemId::from("fish"),
            requested: 3,
            available: 1,
        };
        assert_eq!(world_failure(ActionKind::Trade, &stock).code, ResultCode::OutOfStock);
        let funds = AgentError::InsufficientFunds {
            required: 10.into(),
            available: 1.into(),
        };
        assert_eq!(agent_failure(ActionKind::Trade, &funds).code, ResultCode::NoFunds);
    }
}
