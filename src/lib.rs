pub mod config;
pub mod estimate;
pub mod location;
pub mod map;
pub mod picker;
pub mod server;
