use std::thread;
use std::time::{Duration, Instant};

use rtk::IndicatorSink;

use super::Rig;
use crate::feedback::FeedbackSink;

const LANES: u32 = 0b1111;

fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    false
}

#[test]
fn chase_lights_one_lane_at_a_time() {
    let (rig, _rx) = Rig::new();
    rig.ctx.feedback().resume();
    let mut sink = FeedbackSink::new(rig.ctx.clone());

    for expected in [0u8, 1, 2, 3, 0] {
        assert_eq!(sink.position(), expected);
        sink.step();
        assert_eq!(rig.indicators.snapshot() & LANES, 1 << expected);
    }
}

#[test]
fn chase_leaves_the_armed_indicator_alone() {
    let (rig, _rx) = Rig::new();
    rig.indicators.set(4, true);
    rig.ctx.feedback().resume();
    let mut sink = FeedbackSink::new(rig.ctx.clone());

    sink.step();
    sink.step();

    assert_eq!(rig.indicators.snapshot(), (1 << 4) | (1 << 1));
}

#[test]
fn suspended_sink_makes_no_writes() {
    let (rig, _rx) = Rig::new();
    let sink = FeedbackSink::new(rig.ctx.clone());
    thread::spawn(move || sink.run());

    thread::sleep(Duration::from_millis(30));
    assert_eq!(rig.indicators.snapshot(), 0);

    rig.ctx.feedback().resume();
    assert!(wait_for(|| rig.indicators.snapshot() & LANES != 0));

    rig.ctx.feedback().suspend();
    assert_eq!(rig.indicators.snapshot() & LANES, 0);
    thread::sleep(Duration::from_millis(30));
    assert_eq!(rig.indicators.snapshot() & LANES, 0);
}
