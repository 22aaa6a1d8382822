pub mod model;
pub mod session;

pub use model::*;
pub use session::{CallPhase, CallSession, ReconnectPolicy, SessionAction, SessionError};
