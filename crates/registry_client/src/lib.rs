//! Person registry API client.
//!
//! This crate is the single source of truth for the registry wire contract:
//! auth header, person listing, report PATCH body.
//!
//! Blocking. No retries; the orchestrator owns submission policy.

mod auth;
mod client;
mod wire;

pub use auth::RegistryCredentials;
pub use client::{ClientError, RegistryClient, RegistryOptions};
pub use wire::{wire_status, PatchBody, PatchLocation, PatchPerson, WirePerson};
