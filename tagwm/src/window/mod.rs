pub mod actions;
pub mod attach;
pub mod backend;
pub mod client;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod geometry;
pub mod layout;
pub mod manager;
pub mod monitor;
pub mod mouse;
pub mod rules;
pub mod status;
pub mod swallow;
pub mod tags;
pub mod topology;

#[cfg(test)]
pub mod testing;
