//! Client library for the TTV tools backend: a Twitch-to-Discord event
//! notification platform. Users log in with Twitch, optionally link a
//! Discord account, organize into teams through invites, and configure
//! event subscriptions that relay Twitch events to a Discord channel.
//!
//! The crate wraps the backend's REST API behind typed accessors, a
//! deduplicating query cache, form controllers and per-page view models.
//! The backend itself is a separate service.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod forms;
pub mod models;
pub mod services;
pub mod session;
pub mod views;
