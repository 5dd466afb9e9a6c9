pub mod app;
pub mod components;
pub mod config;
pub mod error;
pub mod loaders;
pub mod logging;
pub mod rendering;
pub mod systems;

pub use components::*;
pub use systems::*;
