// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Watchers that turn configuration changes into reload triggers.

pub mod config;

pub use config::ConfigWatcher;
