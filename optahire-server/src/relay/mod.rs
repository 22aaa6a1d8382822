mod relay;
mod relay_command;
mod relay_event;
mod relay_handle;

pub use relay::*;
pub use relay_command::*;
pub(crate) use relay_event::*;
pub use relay_handle::*;
