use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use reflex::{
    Average, Event, GameConfig, GameContext, GameError, ReactionGame, Settlement, UserId,
    CHANNEL_CAPACITY, MAX_ROUNDS,
};
use rtk::{channel, EventBits, IndicatorBank, IndicatorSink, KernelConfig, KernelError};

fn test_config() -> GameConfig {
    GameConfig::builder()
        .delay_range(Duration::from_millis(5), Duration::from_millis(15))
        .delay_granularity(Duration::from_millis(5))
        .response_window(Duration::from_millis(40))
        .receive_timeout(Duration::from_millis(10))
        .animation_step(Duration::from_millis(2))
        .build()
        .unwrap()
}

fn start_game() -> (ReactionGame, mpsc::Receiver<Settlement>) {
    let (tx, rx) = mpsc::channel();
    let game = ReactionGame::builder()
        .config(test_config())
        .kernel_config(KernelConfig::builder().name("game-flow").build())
        .seed(0x5eed)
        .on_settlement(Arc::new(move |settlement: &Settlement| {
            tx.send(settlement.clone()).ok();
        }))
        .start()
        .unwrap();
    (game, rx)
}

/// Presses `user`'s button once per lit feedback animation.
fn spawn_bot(ctx: Arc<GameContext>, user: UserId, stop: Arc<AtomicBool>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let lanes = (1u32 << ctx.feedback().lanes()) - 1;
        let bit = ctx.trigger_map().bit_for(user).unwrap();
        let mut pressed = false;
        while !stop.load(Ordering::Relaxed) {
            let lit = ctx.indicators().snapshot() & lanes != 0;
            if lit && !pressed {
                thread::sleep(Duration::from_millis(3));
                ctx.triggers().set(bit);
                pressed = true;
            } else if !lit {
                pressed = false;
            }
            thread::sleep(Duration::from_millis(1));
        }
    })
}

#[test]
fn tasks_start_with_their_priorities() {
    let (game, _settlements) = start_game();

    let tasks: Vec<_> = game
        .kernel()
        .tasks()
        .iter()
        .map(|spec| (spec.name, spec.priority, spec.stack_words))
        .collect();

    assert_eq!(
        tasks,
        [
            ("input_dispatcher", 0, 512),
            ("score_collector", 0, 1000),
            ("round_driver", 1, 512),
            ("feedback_sink", 1, 1000),
        ]
    );
    assert_eq!(game.kernel().running().len(), 4);
    assert!(!game.context().flag().is_armed());
    assert!(game.context().driver_gate().is_suspended());
}

#[test]
fn full_game_settles_resets_and_restarts() {
    let (game, settlements) = start_game();
    let stop = Arc::new(AtomicBool::new(false));
    let bot = spawn_bot(game.context().clone(), UserId::ONE, stop.clone());

    game.press_start();
    let first = settlements.recv_timeout(Duration::from_secs(10)).unwrap();

    assert!(first.rounds_recorded() > 0 && first.rounds_recorded() <= MAX_ROUNDS);
    assert_eq!(first.winner(), Some(UserId::ONE));
    assert!(matches!(first.average(UserId::ONE), Average::Mean(_)));
    assert_eq!(first.average(UserId::TWO), Average::NoData);

    let ctx = game.context();
    assert!(!ctx.flag().is_armed());
    assert!(ctx.driver_gate().is_suspended());
    assert!(ctx.feedback().is_suspended());

    // No new round starts without a start press.
    thread::sleep(Duration::from_millis(100));
    assert!(settlements.try_recv().is_err());

    game.press_start();
    let second = settlements.recv_timeout(Duration::from_secs(10)).unwrap();
    assert_eq!(second.winner(), Some(UserId::ONE));

    stop.store(true, Ordering::Relaxed);
    bot.join().unwrap();
    assert_eq!(game.indicators(), 0);
}

#[test]
fn unpressed_game_has_no_winner() {
    let (game, settlements) = start_game();

    game.press_start();
    let settlement = settlements.recv_timeout(Duration::from_secs(10)).unwrap();

    assert_eq!(settlement.rounds_recorded(), 0);
    assert_eq!(settlement.winner(), None);
    assert!(settlement
        .scores()
        .iter()
        .all(|score| score.average() == Average::NoData));
}

#[test]
fn invalid_config_does_not_start() {
    let config = GameConfig {
        min_delay: Duration::from_secs(2),
        max_delay: Duration::from_secs(1),
        ..GameConfig::default()
    };

    let result = ReactionGame::builder().config(config).start();

    assert!(matches!(result, Err(GameError::Config(_))));
}

#[test]
fn failed_spawn_starts_no_task() {
    let triggers = Arc::new(EventBits::new());
    let indicators = Arc::new(IndicatorBank::new(5));

    let result = ReactionGame::builder()
        .config(test_config())
        .kernel_config(KernelConfig::builder().max_tasks(3).build())
        .triggers(triggers.clone())
        .indicators(indicators.clone())
        .start();

    assert!(matches!(
        result,
        Err(GameError::Kernel(KernelError::TaskLimit {
            name: "feedback_sink",
            limit: 3
        }))
    ));

    // A running dispatcher would take the bit and light the armed indicator.
    triggers.set(0b001);
    thread::sleep(Duration::from_millis(30));
    assert_eq!(triggers.get(), 0b001);
    assert_eq!(indicators.snapshot(), 0);
}

#[test]
fn single_slot_rejects_second_event() {
    let (tx, rx) = channel::<Event, CHANNEL_CAPACITY>();

    tx.try_send(Event::GameStart).unwrap();
    let rejected = tx.try_send(Event::UserResponse(UserId::TWO)).unwrap_err();

    assert_eq!(rejected.into_inner(), Event::UserResponse(UserId::TWO));
    assert_eq!(rx.try_recv(), Some(Event::GameStart));
    assert!(rx.try_recv().is_none());
}
