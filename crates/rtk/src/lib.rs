//! # rtk
//!
//! A small real-time kit that provides the RTOS services a task-based
//! application expects, hosted on `std` threads:
//!
//! ## Module Overview
//! - [`time`]      – Monotonic tick counter and tick sources.
//! - [`task`]      – Suspend/resume gates and timed delays.
//! - [`queue`]     – Bounded FIFO channel with a non-blocking send.
//! - [`bits`]      – Event groups used as trigger inputs.
//! - [`indicator`] – Discrete on/off outputs (LEDs).
//! - [`kernel`]    – Kernel configuration and task spawning.
//! - [`fault`]     – Fatal fault traps.
//!
//! The modules are loosely coupled so an application can take only the
//! services it needs.

pub mod bits;
pub mod fault;
pub mod indicator;
pub mod kernel;
pub mod queue;
pub mod task;
pub mod time;

pub use bits::EventBits;
pub use fault::Fault;
pub use indicator::{IndicatorBank, IndicatorSink};
pub use kernel::{Kernel, KernelConfig, KernelError, TaskSpec};
pub use queue::{channel, Receiver, RecvError, Sender, TrySendError};
pub use task::{GateState, TaskGate};
pub use time::{ManualClock, SystemClock, Tick, TickSource, TICK_RATE_HZ};
