//! `talk`: leave a message in another player's mailbox.

use std::time::Duration;

use agora_types::{ActionKind, ActionResult, AgentId, CommandKind, CommandRequest, ResultCode};
use agora_world::Mail;

use super::engine::{ActionEngine, Handled};
use super::outcome::{invalid, world_failure};
use crate::player::PlayerState;

/// Longest message accepted, in characters.
const MAX_MESSAGE_CHARS: usize = 500;

pub(crate) async fn execute(
    engine: &ActionEngine,
    player: &mut PlayerState,
    to: &AgentId,
    content: &str,
) -> Handled {
    let kind = ActionKind::Talk;
    let content = content.trim();
    if content.is_empty() {
        return Err(invalid(kind, "there is nothing to say"));
    }
    if content.chars().count() > MAX_MESSAGE_CHARS {
        return Err(invalid(kind, format!("messages are limited to {MAX_MESSAGE_CHARS} characters")));
    }
    if to == player.id() {
        return Err(invalid(kind, "you cannot talk to yourself"));
    }
    if !engine.world().lock().await.has_player(to) {
        return Err(ActionResult::failure(
            kind,
            ResultCode::NotFound,
            format!("there is nobody called {to}"),
        ));
    }

    let request = CommandRequest::new(CommandKind::Talk, to.as_str(), player.location().clone());
    engine.confirm(player, kind, request).await?;

    let mail = Mail {
        from: player.id().clone(),
        content: content.to_owned(),
        sent_at: engine.world().clock().format_now(),
    };
    engine
        .world()
        .lock()
        .await
        .post(to, mail)
        .map_err(|e| world_failure(kind, &e))?;

    engine.spend(player, kind, Duration::ZERO)?;
    Ok(ActionResult::success(kind, format!("you told {to}: {content}"))
        .with_event(format!("Told {to}: {content}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use agora_types::Action;

    use super::super::testing::Fixture;
    use super::*;

    fn say(to: &str, content: &str) -> Action {
        Action::Talk {
            to: AgentId::from(to),
            content: content.to_owned(),
        }
    }

    #[tokio::test]
    async fn messages_reach_the_mailbox() {
        let fx = Fixture::new().await;
        let mut player = fx.player("agent-1");
        let result = fx
            .engine
            .execute(&mut player, &say("agent-2", "selling paintings cheap"))
            .await;
        assert!(result.ok, "{}", result.message);

        let mail = fx
            .engine
            .world()
            .lock()
            .await
            .take_mail(&AgentId::from("agent-2"));
        assert_eq!(mail.len(), 1);
        assert_eq!(mail[0].from.as_str(), "agent-1");
        assert_eq!(mail[0].content, "selling paintings cheap");
        assert!(mail[0].sent_at.starts_with("Day 1"));
    }

    #[tokio::test]
    async fn bad_recipients_and_empty_messages_are_refused() {
        let fx = Fixture::new().await;
        let mut player = fx.player("agent-1");
        assert_eq!(
            fx.engine.execute(&mut player, &say("ghost", "hi")).await.code,
            ResultCode::NotFound
        );
        assert_eq!(
            fx.engine.execute(&mut player, &say("agent-1", "hi")).await.code,
            ResultCode::Invalid
        );
        assert_eq!(
            fx.engine.execute(&mut player, &say("agent-2", "   ")).await.code,
            ResultCode::Invalid
        );
    }
}
