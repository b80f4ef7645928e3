pub mod app;
pub mod error;
pub mod hotkey;
pub mod human_mouse;
pub mod input;
pub mod logging;
pub mod model;
pub mod runner;
pub mod sampler;
pub mod session;
pub mod settings;
pub mod store;
pub mod window;
