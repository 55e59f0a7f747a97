//! Coin Reactor economy core.
//!
//! Subsystems are flat `*_subsystem.rs` modules owned by `EconomyEngine`.
//! Persistence lives under `store`, time under `clock` and `scheduler`.

pub mod clock;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod rng;
pub mod scheduler;
pub mod snapshot;
pub mod store;
pub mod subsystem;
pub mod types;

pub mod accrual_subsystem;
pub mod achievement_subsystem;
pub mod cosmetic_subsystem;
pub mod daily_streak_subsystem;
pub mod ledger_subsystem;
pub mod minigame_subsystem;
pub mod statistics_subsystem;
pub mod upgrade_subsystem;
