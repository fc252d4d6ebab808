//! Fatal fault handling.
//!
//! Faults have no recovery path: the system logs the fault once and halts in
//! a trap, which on the host parks the faulting thread forever. A stack
//! overflow on the host is caught by the Rust runtime itself, which aborts
//! the process. Running out of task slots at start-up is reported as a
//! `KernelError` instead, before any task body runs.

use std::panic;
use std::thread;

use log::error;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    /// A task panicked.
    #[error("task `{task}` panicked: {message}")]
    TaskPanicked { task: String, message: String },
}

/// Log `fault` and halt the calling thread.
pub fn trap(fault: &Fault) -> ! {
    error!("fatal fault, halting: {fault}");
    loop {
        thread::park();
    }
}

/// Route task panics into [`trap`].
pub fn install_panic_trap() {
    panic::set_hook(Box::new(|info| {
        let task = thread::current()
            .name()
            .unwrap_or("<unnamed>")
            .to_owned();
        let message = if let Some(msg) = info.payload().downcast_ref::<&str>() {
            (*msg).to_owned()
        } else if let Some(msg) = info.payload().downcast_ref::<String>() {
            msg.clone()
        } else {
            String::from("unknown panic payload")
        };
        let message = match info.location() {
            Some(loc) => format!("{message} at {}:{}", loc.file(), loc.line()),
            None => message,
        };
        trap(&Fault::TaskPanicked { task, message });
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_messages_name_the_cause() {
        let fault = Fault::TaskPanicked {
            task: "score_collector".into(),
            message: "boom".into(),
        };
        assert_eq!(fault.to_string(), "task `score_collector` panicked: boom");
    }
}
