//! Integration tests for kernel tasks talking through rtk primitives.

use std::sync::Arc;
use std::time::Duration;

use rtk::{channel, EventBits, Kernel, KernelConfig, RecvError, TaskGate, TaskSpec};

#[test]
fn kernel_config_builder() {
    fn idle_callback() {}

    let config = KernelConfig::builder()
        .name("TestKernel")
        .min_stack_bytes(128 * 1024)
        .idle_callback(idle_callback)
        .build();

    assert_eq!(config.name, "TestKernel");
    assert_eq!(config.min_stack_bytes, 128 * 1024);
    assert!(config.idle_callback.is_some());

    let kernel = Kernel::new(config);
    kernel.idle();
    assert_eq!(kernel.config().name, "TestKernel");
}

#[test]
fn gated_producer_feeds_consumer() {
    let kernel = Kernel::new(KernelConfig::default());
    let gate = Arc::new(TaskGate::suspended("producer"));
    let (tx, rx) = channel::<u32, 1>();

    let producer_gate = gate.clone();
    kernel
        .spawn(TaskSpec::new("producer", 1, 256), move || {
            for value in 0..3 {
                producer_gate.wait_resumed();
                while tx.try_send(value).is_err() {
                    rtk::task::delay(Duration::from_millis(1));
                }
            }
        })
        .unwrap();

    // Parked producer sends nothing.
    assert_eq!(
        rx.recv_timeout(Duration::from_millis(30)),
        Err(RecvError::Timeout(Duration::from_millis(30)))
    );

    gate.resume();
    let received: Vec<u32> = (0..3)
        .map(|_| rx.recv_timeout(Duration::from_secs(2)).unwrap())
        .collect();
    assert_eq!(received, [0, 1, 2]);
}

#[test]
fn trigger_bits_wake_a_task() {
    let kernel = Kernel::new(KernelConfig::default());
    let bits = Arc::new(EventBits::new());
    let (tx, rx) = channel::<u32, 4>();

    let waiter_bits = bits.clone();
    kernel
        .spawn(TaskSpec::new("waiter", 0, 512), move || {
            let taken = waiter_bits.wait_any(0x7, None);
            tx.try_send(taken).unwrap();
        })
        .unwrap();

    bits.set(0x8);
    bits.set(0x2);

    assert_eq!(rx.recv_timeout(Duration::from_secs(2)), Ok(0x2));
    assert_eq!(bits.get(), 0x8);
}
