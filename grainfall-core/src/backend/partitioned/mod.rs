mod communication;
mod config;
mod coordinator;
mod partition;
mod worker;

pub use communication::*;
pub use config::*;
pub use coordinator::*;
pub use partition::*;
pub use worker::*;
