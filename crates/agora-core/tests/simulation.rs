//! End-to-end runs of the manager against a loopback frontend.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use agora_agents::ActionEngine;
use agora_core::agent_loop::{ExitReason, LoopConfig, LoopOutcome};
use agora_core::bootstrap::Bootstrap;
use agora_core::config::SimulationConfig;
use agora_core::manager::{AgentExit, Manager};
use agora_core::planner::ScriptedPlanner;
use agora_dispatch::{DispatchConfig, Dispatcher, Loopback};
use agora_types::{AgentId, ItemId, LocationId};
use rust_decimal::Decimal;

const DAY_IN_TOWN: [&str; 6] = [
    r#"{"type": "move", "target": "market"}"#,
    r#"{"type": "trade", "mode": "buy", "item": "bread", "qty": 2}"#,
    r#"```json
[{"type": "consume", "item": "bread"}, {"type": "move", "target": "home"}]
```"#,
    r#"{"type": "store", "item": "bread", "qty": 1}"#,
    r#"{"type": "talk", "to": "agent-2", "content": "The bread is good today."}"#,
    r#"{"type": "finish"}"#,
];

fn finished(exit: AgentExit) -> LoopOutcome {
    match exit {
        AgentExit::Finished(outcome) => *outcome,
        other => panic!("loop did not finish cleanly: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn a_scripted_day_changes_the_world() {
    let config = SimulationConfig::default();
    let mut boot = Bootstrap::from_config(&config).unwrap();
    boot.players.truncate(1);
    let world = Arc::clone(&boot.world);

    let dispatcher = Arc::new(Dispatcher::new(DispatchConfig::default()));
    Loopback::confirming()
        .with_delay(Duration::from_millis(500))
        .attach(&dispatcher, AgentId::from("agent-1"))
        .await;
    let engine = Arc::new(ActionEngine::new(Arc::clone(&world), dispatcher, config.rules.clone()));

    let planner = Arc::new(ScriptedPlanner::new(DAY_IN_TOWN));
    let mut manager = Manager::new(engine, Arc::clone(&planner), &config.agents).with_loop_config(LoopConfig {
        action_interval: Duration::from_millis(10),
        idle_interval: Duration::from_secs(1),
        ..config.agents.loop_config()
    });
    manager.spawn_all(boot.players);

    while planner.remaining().await > 0 {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    tokio::time::sleep(Duration::from_secs(5)).await;
    let reports = manager.stop().await;
    let outcome = finished(reports.into_iter().next().unwrap().exit);

    assert_eq!(outcome.exit, ExitReason::Stopped);
    assert_eq!(outcome.steps, 6);
    let player = outcome.player;
    assert_eq!(player.location(), &LocationId::from("agent-1_home"));
    assert!(player.money() < Decimal::from(1000));
    assert_eq!(player.holding(&ItemId::from("bread")), 0);
    assert!(player.memory().any(|line| line.contains("bread")));

    let mut state = world.lock().await;
    assert_eq!(state.market().listing("bread").unwrap().quantity, 18);
    let home = state.home(&AgentId::from("agent-1")).unwrap();
    assert_eq!(home.container("locker").unwrap().quantity("bread"), 1);
    let mail = state.take_mail(&AgentId::from("agent-2"));
    assert_eq!(mail.len(), 1);
    assert_eq!(mail[0].from, AgentId::from("agent-1"));
}

#[tokio::test(start_paused = true)]
async fn a_silent_frontend_never_changes_state() {
    let config = SimulationConfig::default();
    let mut boot = Bootstrap::from_config(&config).unwrap();
    boot.players.truncate(1);
    let world = Arc::clone(&boot.world);

    let dispatcher = Arc::new(Dispatcher::new(DispatchConfig {
        ack_timeout: Duration::from_secs(2),
        ..DispatchConfig::default()
    }));
    Loopback::silent()
        .attach(&dispatcher, AgentId::from("agent-1"))
        .await;
    let engine = Arc::new(ActionEngine::new(Arc::clone(&world), dispatcher, config.rules.clone()));

    let planner = Arc::new(ScriptedPlanner::new(DAY_IN_TOWN));
    let mut manager = Manager::new(engine, Arc::clone(&planner), &config.agents).with_loop_config(LoopConfig {
        action_interval: Duration::from_millis(10),
        idle_interval: Duration::from_secs(1),
        ..config.agents.loop_config()
    });
    manager.spawn_all(boot.players);

    while planner.remaining().await > 0 {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    tokio::time::sleep(Duration::from_secs(10)).await;
    let outcome = finished(manager.stop().await.into_iter().next().unwrap().exit);

    let player = outcome.player;
    assert_eq!(player.money(), Decimal::from(1000));
    assert_eq!(player.location(), &LocationId::from("agent-1_home"));
    assert_eq!(world.lock().await.market().listing("bread").unwrap().quantity, 20);
    assert!(player.memory().any(|line| line.contains("failed")));
}
