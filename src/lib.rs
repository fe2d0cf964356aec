// Copyright (c) 2026 tododex contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Tododex: a Discord bot for per-server to-do lists.
//!
//! This library contains the core logic for the Tododex bot.

// Public modules that can be used by the binary entrypoint.
pub mod cli;
pub mod config;
pub mod doctor;
pub mod engine;
pub mod error;
pub mod store;
