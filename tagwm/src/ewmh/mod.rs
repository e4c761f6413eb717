pub mod atoms;
pub mod setup;
pub mod systray;
