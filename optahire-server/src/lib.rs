pub mod auth;
pub mod config;
pub mod error;
pub mod relay;
pub mod room;
pub mod server;
pub mod signaling;

pub use auth::*;
pub use config::*;
pub use error::*;
pub use relay::*;
pub use room::*;
pub use server::*;
pub use signaling::*;
