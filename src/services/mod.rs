//! Resource accessors: one module per backend resource, one async function
//! per REST endpoint. Pass-through only; no validation or merging happens
//! here.

pub mod discord;
pub mod eventsubs;
pub mod invites;
pub mod teams;
pub mod twitch;
pub mod users;
