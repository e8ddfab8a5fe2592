// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Reload triggering for workloads whose configuration changed.

pub mod handler;
pub mod manager;

pub use handler::ReloadHandler;
pub use manager::{ReloadManager, ReloadManagerHandle, Trigger};
