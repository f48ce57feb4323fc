pub mod config;
pub mod logging;
pub mod macro_system;
