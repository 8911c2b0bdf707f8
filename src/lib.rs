//! Battle Core - turn-based combat engine

pub mod battle;
pub mod core;
