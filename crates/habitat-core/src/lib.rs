//! Physics, scenarios, and the tick loop for the Mars habitat survival engine.
//!
//! This crate owns the deterministic simulation core and the control plane
//! around it. One [`Engine`] holds the live [`HabitatState`]; the tick
//! loop and the command path share it behind a single lock.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `habitat-config.yaml`.
//! - [`physics`] -- Gas, thermal, pressure, power and physiology step.
//! - [`sensory`] -- Numeric state rendered as first-person text.
//! - [`scenario`] -- [`PuzzleLogic`] trait, scenario manager, and puzzles.
//! - [`engine`] -- Composition root and [`SharedEngine`].
//! - [`runner`] -- Fixed-interval tick loop with operator controls.
//! - [`command`] -- Player command path and its collaborator traits.
//!
//! [`Engine`]: engine::Engine
//! [`HabitatState`]: habitat_types::HabitatState
//! [`PuzzleLogic`]: scenario::PuzzleLogic
//! [`SharedEngine`]: engine::SharedEngine

pub mod command;
pub mod config;
pub mod engine;
pub mod physics;
pub mod runner;
pub mod scenario;
pub mod sensory;
