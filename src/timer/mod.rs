//! Host boundary for delayed execution.
//!
//! The engine never owns a thread or a callback. It asks a [`TimerHost`] to arm
//! a deadline and gets back an opaque [`TimerHandle`]; when the deadline passes
//! the host hands that handle to `MetronomeEngine::fire`. Handles the engine no
//! longer owns are ignored there, so a canceled timer can never sound.

mod manual;
mod queue;
mod system;

use std::time::Duration;

pub use manual::ManualTimer;
pub use queue::TimerQueue;
pub use system::SystemTimer;

/// Identifies one armed deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Monotonic clock plus cancelable delayed execution
pub trait TimerHost {
    /// Monotonic time since the host's epoch
    fn now(&self) -> Duration;

    /// Arm a timer that expires `delay` from now. A zero delay is allowed.
    fn arm(&mut self, delay: Duration) -> TimerHandle;

    /// Cancel an armed timer. Unknown, fired or already canceled handles are
    /// ignored.
    fn cancel(&mut self, handle: TimerHandle);
}

/// Lets an engine borrow a host that outlives it
impl<T: TimerHost + ?Sized> TimerHost for &mut T {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn arm(&mut self, delay: Duration) -> TimerHandle {
        (**self).arm(delay)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        (**self).cancel(handle);
    }
}
