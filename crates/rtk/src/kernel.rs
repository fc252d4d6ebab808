//! Kernel configuration and task spawning.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, info};
use parking_lot::{Condvar, Mutex};
use thiserror::Error;

/// Bytes per stack word on the reference target.
const STACK_WORD_BYTES: usize = 4;

/// Smallest stack handed to a host thread.
const DEFAULT_MIN_STACK_BYTES: usize = 64 * 1024;

const DEFAULT_MAX_TASKS: u8 = 16;

/// Configuration for the kernel.
#[derive(Debug, Clone)]
pub struct KernelConfig {
    pub name: &'static str,
    /// Floor applied to every task stack, since host threads need far more
    /// room than the target's word-sized budgets.
    pub min_stack_bytes: usize,
    /// Task slots; spawning past this fails like an exhausted heap.
    pub max_tasks: u8,
    /// Called by the host runner whenever it has nothing else to do.
    pub idle_callback: Option<fn()>,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            name: "rtk",
            min_stack_bytes: DEFAULT_MIN_STACK_BYTES,
            max_tasks: DEFAULT_MAX_TASKS,
            idle_callback: None,
        }
    }
}

impl KernelConfig {
    /// Creates a new kernel configuration builder.
    pub fn builder() -> KernelConfigBuilder {
        KernelConfigBuilder::default()
    }
}

/// Builder for ergonomic kernel configuration construction.
#[derive(Debug, Clone, Default)]
pub struct KernelConfigBuilder {
    config: KernelConfig,
}

impl KernelConfigBuilder {
    /// Sets the kernel name.
    pub fn name(mut self, name: &'static str) -> Self {
        self.config.name = name;
        self
    }

    /// Sets the minimum stack size for spawned tasks.
    pub fn min_stack_bytes(mut self, bytes: usize) -> Self {
        self.config.min_stack_bytes = bytes;
        self
    }

    /// Sets the maximum number of tasks.
    pub fn max_tasks(mut self, max: u8) -> Self {
        self.config.max_tasks = max;
        self
    }

    /// Sets the idle callback function.
    pub fn idle_callback(mut self, callback: fn()) -> Self {
        self.config.idle_callback = Some(callback);
        self
    }

    /// Builds the kernel configuration.
    pub fn build(self) -> KernelConfig {
        self.config
    }
}

/// Static description of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSpec {
    pub name: &'static str,
    /// Scheduling priority, higher runs first on the target. Host threads
    /// record it for diagnostics only.
    pub priority: u8,
    /// Stack budget in target words.
    pub stack_words: usize,
}

impl TaskSpec {
    pub const fn new(name: &'static str, priority: u8, stack_words: usize) -> Self {
        Self {
            name,
            priority,
            stack_words,
        }
    }

    /// Stack size in bytes, raised to at least `min_bytes`.
    pub fn stack_bytes(&self, min_bytes: usize) -> usize {
        (self.stack_words * STACK_WORD_BYTES).max(min_bytes)
    }
}

#[derive(Debug, Error)]
pub enum KernelError {
    #[error("failed to spawn task `{name}`: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("cannot spawn task `{name}`: all {limit} task slots are in use")]
    TaskLimit { name: &'static str, limit: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LaunchState {
    Held,
    Released,
    Aborted,
}

/// Start latch shared by the tasks of a held kernel.
struct Launch {
    state: Mutex<LaunchState>,
    changed: Condvar,
}

impl Launch {
    fn new(state: LaunchState) -> Self {
        Self {
            state: Mutex::new(state),
            changed: Condvar::new(),
        }
    }

    fn set(&self, state: LaunchState) {
        let mut current = self.state.lock();
        if *current == LaunchState::Held {
            *current = state;
            self.changed.notify_all();
        }
    }

    /// Block while held; `true` once released.
    fn wait(&self) -> bool {
        let mut state = self.state.lock();
        while *state == LaunchState::Held {
            self.changed.wait(&mut state);
        }
        *state == LaunchState::Released
    }
}

struct TaskEntry {
    spec: TaskSpec,
    handle: JoinHandle<()>,
}

/// Owner of the running tasks.
///
/// Tasks run for the lifetime of the process; there is no cancellation.
/// A held kernel keeps every task body from running until [`Kernel::release`],
/// and [`Kernel::abort`] lets the tasks exit without running at all.
pub struct Kernel {
    config: KernelConfig,
    tasks: Mutex<Vec<TaskEntry>>,
    launch: Arc<Launch>,
}

impl Kernel {
    /// Kernel whose tasks start as soon as they are spawned.
    pub fn new(config: KernelConfig) -> Self {
        Self::with_launch(config, LaunchState::Released)
    }

    /// Kernel whose tasks wait for [`Kernel::release`].
    pub fn held(config: KernelConfig) -> Self {
        Self::with_launch(config, LaunchState::Held)
    }

    fn with_launch(config: KernelConfig, state: LaunchState) -> Self {
        Self {
            config,
            tasks: Mutex::new(Vec::new()),
            launch: Arc::new(Launch::new(state)),
        }
    }

    /// Let held tasks run their bodies.
    pub fn release(&self) {
        self.launch.set(LaunchState::Released);
    }

    /// Make held tasks exit without running their bodies.
    pub fn abort(&self) {
        self.launch.set(LaunchState::Aborted);
    }

    /// Returns the kernel configuration.
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Start `body` as a new task described by `spec`.
    pub fn spawn<F>(&self, spec: TaskSpec, body: F) -> Result<(), KernelError>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut tasks = self.tasks.lock();
        if tasks.len() >= usize::from(self.config.max_tasks) {
            return Err(KernelError::TaskLimit {
                name: spec.name,
                limit: self.config.max_tasks,
            });
        }

        let stack = spec.stack_bytes(self.config.min_stack_bytes);
        let launch = Arc::clone(&self.launch);
        let handle = thread::Builder::new()
            .name(spec.name.to_owned())
            .stack_size(stack)
            .spawn(move || {
                if !launch.wait() {
                    debug!("task `{}` aborted before start", spec.name);
                    return;
                }
                info!("task `{}` started (priority {})", spec.name, spec.priority);
                body();
                debug!("task `{}` returned", spec.name);
            })
            .map_err(|source| KernelError::Spawn {
                name: spec.name,
                source,
            })?;

        tasks.push(TaskEntry { spec, handle });
        Ok(())
    }

    /// Specs of every task spawned so far, in spawn order.
    pub fn tasks(&self) -> Vec<TaskSpec> {
        self.tasks.lock().iter().map(|task| task.spec).collect()
    }

    /// Names of the tasks whose body has not returned.
    pub fn running(&self) -> Vec<&'static str> {
        self.tasks
            .lock()
            .iter()
            .filter(|task| !task.handle.is_finished())
            .map(|task| task.spec.name)
            .collect()
    }

    /// Run the idle callback once, if one is configured.
    pub fn idle(&self) {
        if let Some(idle_cb) = self.config.idle_callback {
            idle_cb();
        }
    }
}
