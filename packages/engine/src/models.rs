pub mod catalog;
pub mod config;
pub mod event;
pub mod role;
pub mod state;

pub use catalog::*;
pub use config::*;
pub use event::*;
pub use role::*;
pub use state::*;
