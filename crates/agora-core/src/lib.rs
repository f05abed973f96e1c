//! Configuration, planner contract, agent loops, and the manager for the
//! Agora trading simulation.
//!
//! Each player is driven by one [`AgentLoop`]: plan, act through the
//! [`ActionEngine`], reflect, and roll the market over when the simulated
//! day changes. The [`Manager`] spawns the loops, owns the
//! [`StopSignal`], and reaps every task on shutdown.
//!
//! # Modules
//!
//! - [`admission`] -- Semaphores bounding concurrent agents and planner calls.
//! - [`agent_loop`] -- The per-player plan/act/reflect cycle.
//! - [`bootstrap`] -- Building the world and players from configuration.
//! - [`config`] -- Loading `agora-config.yaml` into typed structs.
//! - [`manager`] -- Spawning, stopping, and reaping agent loops.
//! - [`observation`] -- The snapshot a planner decides from.
//! - [`planner`] -- The [`Planner`] trait, proposal parsing, and stubs.
//! - [`stop`] -- [`StopSignal`], the cooperative cancellation flag.
//!
//! [`ActionEngine`]: agora_agents::ActionEngine
//! [`AgentLoop`]: agent_loop::AgentLoop
//! [`Manager`]: manager::Manager
//! [`Planner`]: planner::Planner
//! [`StopSignal`]: stop::StopSignal

pub mod admission;
pub mod agent_loop;
pub mod bootstrap;
pub mod config;
pub mod manager;
pub mod observation;
pub mod planner;
pub mod stop;
