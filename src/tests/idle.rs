use super::helpers::*;
use crate::animation::IdleBehavior;
use crate::display::DisplayCommand;
use crate::emotion::Emotion;
use std::sync::Arc;
use std::time::Duration;

// ── Foreground priority ─────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_idle_is_silent_while_foreground_is_held() {
    let mock = Arc::new(MockDisplay::confirming(ALL_FACE, &["idle"]));
    let controller = probed_controller(&mock).await;

    let guard = controller.begin_foreground();
    assert!(controller.start_idle_behaviors().await);
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert!(mock.sent().is_empty(), "idle emitted while speaking");

    drop(guard);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(!mock.sent().is_empty(), "idle should resume after speech");

    controller.stop_idle_behaviors().await;
}

#[tokio::test(start_paused = true)]
async fn test_tick_does_nothing_while_speaking() {
    let mock = Arc::new(MockDisplay::confirming(ALL_FACE, &["idle"]));
    let controller = probed_controller(&mock).await;

    let _guard = controller.begin_foreground();
    for _ in 0..20 {
        assert_eq!(controller.idle_tick().await.unwrap(), None);
    }
    assert!(!controller.try_idle_motion().await.unwrap());
    assert!(mock.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_tick_performs_a_behavior() {
    let mock = Arc::new(MockDisplay::confirming(ALL_FACE, &["idle"]));
    let controller = probed_controller(&mock).await;

    let performed = controller.idle_tick().await.unwrap();
    match performed {
        Some(IdleBehavior::LookAround { x, y }) => {
            assert!(x.abs() <= 0.3);
            assert!(y.abs() <= 0.2);
            assert_eq!(mock.count("setParameters"), 1);
        }
        Some(IdleBehavior::IdleMotion) => assert_eq!(mock.count("playRandomMotion"), 1),
        None => panic!("first tick on a capable model should do something"),
    }
}

// ── Motion cooldown ─────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_at_most_one_idle_motion_per_cooldown_window() {
    let mock = Arc::new(MockDisplay::confirming(ALL_FACE, &["idle"]));
    let controller = probed_controller(&mock).await;

    assert!(controller.try_idle_motion().await.unwrap());
    assert!(!controller.try_idle_motion().await.unwrap());

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(!controller.try_idle_motion().await.unwrap());

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(controller.try_idle_motion().await.unwrap());

    assert_eq!(mock.count("playRandomMotion"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_reaction_restarts_the_cooldown() {
    let mock = Arc::new(MockDisplay::confirming(ALL_FACE, &["idle"]));
    let controller = probed_controller(&mock).await;

    assert_eq!(
        controller.play_reaction_adaptive(Emotion::Sad).await.unwrap(),
        Some("idle")
    );
    assert!(!controller.try_idle_motion().await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_no_idle_group_means_no_idle_motion() {
    let mock = Arc::new(MockDisplay::confirming(ALL_FACE, &["motion"]));
    let controller = probed_controller(&mock).await;

    assert!(!controller.try_idle_motion().await.unwrap());
    assert!(mock.sent().is_empty());
}

// ── Task lifecycle ──────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_only_one_idle_task_at_a_time() {
    let mock = Arc::new(MockDisplay::confirming(ALL_FACE, &["idle"]));
    let controller = probed_controller(&mock).await;

    assert!(controller.start_idle_behaviors().await);
    assert!(!controller.start_idle_behaviors().await);
    assert!(controller.idle_running().await);

    controller.stop_idle_behaviors().await;
    assert!(!controller.idle_running().await);

    assert!(controller.start_idle_behaviors().await);
    controller.shutdown().await;
    assert!(!controller.idle_running().await);
}

#[tokio::test(start_paused = true)]
async fn test_loop_survives_link_errors() {
    let mock = Arc::new(MockDisplay::confirming(ALL_FACE, &["idle"]));
    let controller = probed_controller(&mock).await;

    mock.fail_next(3);
    assert!(controller.start_idle_behaviors().await);
    tokio::time::sleep(Duration::from_secs(120)).await;

    assert!(controller.idle_running().await);
    assert!(!mock.sent().is_empty());
    controller.stop_idle_behaviors().await;
}

// ── Exclusion on a multi-threaded runtime ───────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_idle_never_lands_inside_speech() {
    let mock = Arc::new(MockDisplay::confirming(ALL_FACE, &["idle"]));
    let mut config = test_config();
    config.idle.motion_cooldown_secs = 0.0;
    config.probe.parameter_delay_ms = 0;
    config.probe.group_delay_ms = 0;
    let controller = crate::animation::AnimationController::new(mock.clone(), config);
    controller.probe_capabilities().await;
    mock.clear();

    let stop = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let ticker = {
        let controller = controller.clone();
        let stop = stop.clone();
        tokio::spawn(async move {
            while !stop.load(std::sync::atomic::Ordering::SeqCst) {
                let _ = controller.idle_tick().await;
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
    };

    tokio::time::sleep(Duration::from_millis(30)).await;
    for _ in 0..3 {
        controller.speak_for_duration(0.3, 0.7).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    stop.store(true, std::sync::atomic::Ordering::SeqCst);
    ticker.await.unwrap();

    let sent = mock.sent();
    let idle_sends = sent
        .iter()
        .filter(|c| matches!(c.action(), "setParameters" | "playRandomMotion"))
        .count();
    assert!(idle_sends > 0, "idle ticks should have run between speeches");

    let mut inside = false;
    let mut sequences = 0;
    for command in &sent {
        match command {
            DisplayCommand::SetAutoBreath { enabled: false } => inside = true,
            DisplayCommand::SetAutoBreath { enabled: true } => {
                inside = false;
                sequences += 1;
            }
            other if inside => assert!(
                matches!(other, DisplayCommand::SetParameter(_)),
                "idle command inside lip-sync: {:?}",
                other
            ),
            _ => {}
        }
    }
    assert_eq!(sequences, 3);
}

#[tokio::test(start_paused = true)]
async fn test_idle_motion_yields_to_running_speech() {
    let mock = Arc::new(MockDisplay::confirming(ALL_FACE, &["idle"]));
    let controller = probed_controller(&mock).await;

    let speaker = controller.clone();
    let speech = tokio::spawn(async move { speaker.speak_for_duration(0.5, 0.7).await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(!controller.try_idle_motion().await.unwrap());
    assert_eq!(controller.idle_tick().await.unwrap(), None);

    speech.await.unwrap().unwrap();
    assert!(controller.try_idle_motion().await.unwrap());
}
