//! Platform-agnostic relay core.
//!
//! A [`service::Relay`] ties together the persistence store, the
//! pending-bind cache, and a [`platform::ChatPlatform`] implementation.
//! The pairing negotiation lives in [`bind`], message forwarding in
//! [`forward`], lock backfill in [`pull`], and bulk cleanup in [`clear`].

pub mod bind;
pub mod clear;
pub mod command;
pub mod error;
pub mod forward;
pub mod pending;
pub mod platform;
pub mod pull;
pub mod service;

#[cfg(test)]
pub(crate) mod testsupport;

pub use {
    command::Command,
    error::{Error, Result},
    pending::PendingBinds,
    platform::{ChatPlatform, Marker, PlatformError, PlatformMessage},
    service::Relay,
};
