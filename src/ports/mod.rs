//! Boundary traits between the composition core and the outside world.

pub mod config_port;
pub mod data_port;
pub mod render_port;
