pub mod config;
pub mod grant;
pub mod settings;
pub mod tasks;
pub mod visit;
