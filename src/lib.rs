// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod config;
pub mod constants;
pub mod error;
pub mod fingerprint;
pub mod health;
pub mod kubernetes;
pub mod metrics;
pub mod reconcilers;
pub mod reload;
pub mod types;
pub mod webhook;

#[cfg(test)]
mod test_utils;
