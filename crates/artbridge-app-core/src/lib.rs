// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared configuration services for ArtBridge hosts (config store, runtime settings).
//! Keeps host adapters thin and storage-agnostic.

pub mod config;
pub mod settings;
