use std::sync::Arc;
use std::time::Duration;

use rtk::{channel, EventBits, IndicatorBank, ManualClock};

use crate::config::GameConfig;
use crate::context::GameContext;
use crate::event::{Event, EventReceiver, EventSender};

mod feedback;

/// Millisecond timings so threaded tests stay short.
fn quick_config() -> GameConfig {
    GameConfig::builder()
        .delay_range(Duration::from_millis(1), Duration::from_millis(3))
        .delay_granularity(Duration::from_millis(1))
        .response_window(Duration::from_millis(1))
        .receive_timeout(Duration::from_millis(5))
        .animation_step(Duration::from_millis(1))
        .build()
        .unwrap()
}

struct Rig {
    clock: Arc<ManualClock>,
    indicators: Arc<IndicatorBank>,
    ctx: Arc<GameContext>,
    tx: EventSender,
}

impl Rig {
    /// The rig keeps a sender; the receiver goes to the test.
    fn new() -> (Self, EventReceiver) {
        let config = quick_config();
        let clock = Arc::new(ManualClock::new());
        let indicators = Arc::new(IndicatorBank::new(config.indicator_count));
        let ctx = Arc::new(GameContext::new(
            config,
            clock.clone(),
            indicators.clone(),
            Arc::new(EventBits::new()),
        ));
        let (tx, rx) = channel::<Event, 1>();
        let rig = Self {
            clock,
            indicators,
            ctx,
            tx,
        };
        (rig, rx)
    }
}
