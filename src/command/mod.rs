pub mod bus;
pub mod types;

pub use bus::{CommandBus, CommandReceiver, CommandSender, Poll};
pub use types::{Command, CommandSource};
