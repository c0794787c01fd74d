//! Sync task implementation
//!
//! Runs a `SyncDriver` on a tokio task. Commands are handled one at a time
//! in arrival order; between commands the task sleeps until the driver's
//! next deadline (resume-follow, selection pulse expiry).

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tokio::task::JoinHandle;

use super::handle::SyncHandle;
use super::state::SharedSyncState;
use crate::features::lyrics::events::{
    SyncCommand, SyncCommandReceiver, SyncEvent, SyncEventReceiver, SyncEventSender,
    sync_command_channel, sync_event_channel,
};
use crate::features::lyrics::SyncDriver;
use crate::features::settings::SyncSettings;

pub struct SyncTaskHandle {
    pub handle: SyncHandle,
    pub event_rx: Option<SyncEventReceiver>,
    task: Option<JoinHandle<()>>,
}

impl SyncTaskHandle {
    pub fn take_event_rx(&mut self) -> Option<SyncEventReceiver> {
        self.event_rx.take()
    }

    /// Stop the task and wait for it to exit
    pub async fn join(mut self) -> Result<(), tokio::task::JoinError> {
        self.handle.shutdown();
        match self.task.take() {
            Some(task) => task.await,
            None => Ok(()),
        }
    }
}

impl Drop for SyncTaskHandle {
    fn drop(&mut self) {
        self.handle.shutdown();
    }
}

/// Spawn the sync task
///
/// Must be called from within a tokio runtime.
pub fn spawn_sync_task(settings: SyncSettings) -> SyncTaskHandle {
    let (command_tx, command_rx) = sync_command_channel();
    let (event_tx, event_rx) = sync_event_channel();

    let state = SharedSyncState::new();
    let latest_request = Arc::new(AtomicU64::new(0));
    let handle = SyncHandle::new(command_tx, state.clone(), latest_request.clone());

    let driver = SyncDriver::new(settings);
    let task = tokio::spawn(sync_task_main(
        driver,
        command_rx,
        event_tx,
        state,
        latest_request,
    ));

    SyncTaskHandle {
        handle,
        event_rx: Some(event_rx),
        task: Some(task),
    }
}

/// Current instant on tokio's clock, so paused test time drives deadlines too
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

async fn sync_task_main(
    mut driver: SyncDriver,
    mut command_rx: SyncCommandReceiver,
    event_tx: SyncEventSender,
    state: SharedSyncState,
    latest_request: Arc<AtomicU64>,
) {
    state.update_from(&driver);

    loop {
        let command = match driver.next_deadline() {
            Some(deadline) => {
                let sleep = tokio::time::sleep_until(tokio::time::Instant::from_std(deadline));
                tokio::select! {
                    command = command_rx.recv() => command,
                    _ = sleep => {
                        let events = driver.poll_timers(now());
                        publish(&driver, &state, &event_tx, events);
                        continue;
                    }
                }
            }
            None => command_rx.recv().await,
        };

        let Some(command) = command else {
            tracing::debug!("All sync handles dropped, stopping sync task");
            break;
        };

        let now = now();
        // Anything that came due while the command was queued runs first
        let mut events = driver.poll_timers(now);

        match command {
            SyncCommand::UpdateTime { time } => {
                if let Ok(update) = driver.update_time(time) {
                    events.extend(update);
                }
            }
            SyncCommand::GestureStart => events.extend(driver.gesture_start()),
            SyncCommand::GestureEnd => events.extend(driver.gesture_end(now)),
            SyncCommand::TapSelect { index } => events.extend(driver.tap_select(index, now)),
            SyncCommand::Loaded { request_id, result } => {
                let latest = latest_request.load(Ordering::SeqCst);
                if request_id < latest {
                    tracing::warn!(
                        "Dropping stale lyrics result {} (latest {})",
                        request_id,
                        latest
                    );
                } else {
                    match result {
                        Ok(raw) => {
                            if let Ok(replaced) = driver.load(raw) {
                                events.extend(replaced);
                            }
                        }
                        Err(e) => driver.load_failed(&e),
                    }
                }
            }
            SyncCommand::Shutdown => {
                publish(&driver, &state, &event_tx, events);
                tracing::debug!("Sync task shutting down");
                break;
            }
        }

        publish(&driver, &state, &event_tx, events);
    }
}

fn publish(
    driver: &SyncDriver,
    state: &SharedSyncState,
    event_tx: &SyncEventSender,
    events: Vec<SyncEvent>,
) {
    state.update_from(driver);
    for event in events {
        let _ = event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::features::lyrics::{
        AnchorPoint, FollowMode, LoadError, LyricSource, LyricsFormat, RawLine, RawLyrics,
        ScrollAnchor, SourceDescriptor, SourceLocation,
    };

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    fn scenario_lines() -> RawLyrics {
        RawLyrics::Lines(vec![
            RawLine::new(0.0, "a"),
            RawLine::new(2.0, "b"),
            RawLine::new(4.0, "c"),
        ])
    }

    fn drain(rx: &mut SyncEventReceiver) -> Vec<SyncEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    /// Test loader: `remote` locations encode "<delay ms>:<entry count>"
    struct ScriptedSource;

    impl LyricSource for ScriptedSource {
        async fn load(&self, descriptor: &SourceDescriptor) -> Result<RawLyrics, LoadError> {
            let SourceLocation::Remote(script) = &descriptor.location else {
                return Err(LoadError::NotFound(descriptor.to_string()));
            };
            let (delay, count) = script
                .split_once(':')
                .and_then(|(d, c)| Some((d.parse::<u64>().ok()?, c.parse::<usize>().ok()?)))
                .ok_or_else(|| LoadError::Malformed(script.clone()))?;

            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(RawLyrics::Lines(
                (0..count)
                    .map(|i| RawLine::new(i as f64 * 2.0, format!("line {}", i)))
                    .collect(),
            ))
        }
    }

    fn remote(script: &str) -> SourceDescriptor {
        SourceDescriptor::new(LyricsFormat::Lrc, SourceLocation::Remote(script.to_string()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_scrolls_to_current_index() {
        init_tracing();
        let mut task = spawn_sync_task(SyncSettings::default());
        let mut rx = task.take_event_rx().unwrap();
        let handle = task.handle.clone();

        handle.install(scenario_lines());
        handle.update_time(2.5);
        settle().await;
        assert_eq!(handle.state().active_index(), Some(1));
        drain(&mut rx);

        handle.gesture_start();
        handle.gesture_end();
        handle.update_time(4.2);
        settle().await;
        let events = drain(&mut rx);
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, SyncEvent::ScrollTo { .. })),
            "no scrolling while overridden"
        );
        assert_eq!(handle.state().active_index(), Some(2));

        tokio::time::sleep(Duration::from_millis(1100)).await;
        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![
                SyncEvent::FollowModeChanged {
                    mode: FollowMode::Following
                },
                SyncEvent::ScrollTo {
                    target: 1,
                    anchor: ScrollAnchor::Highlight(AnchorPoint::default()),
                    active: 2
                },
            ]
        );
        assert!(handle.state().is_following());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_gesture_delays_resume() {
        let mut task = spawn_sync_task(SyncSettings::default());
        let mut rx = task.take_event_rx().unwrap();
        let handle = task.handle.clone();

        handle.install(scenario_lines());
        handle.gesture_start();
        handle.gesture_end();
        tokio::time::sleep(Duration::from_millis(800)).await;
        handle.gesture_start();
        tokio::time::sleep(Duration::from_millis(800)).await;

        assert_eq!(handle.state().follow_mode(), FollowMode::Overridden);
        handle.gesture_end();
        tokio::time::sleep(Duration::from_millis(1001)).await;
        assert!(handle.state().is_following());

        let resumed = drain(&mut rx)
            .into_iter()
            .filter(|e| {
                matches!(
                    e,
                    SyncEvent::FollowModeChanged {
                        mode: FollowMode::Following
                    }
                )
            })
            .count();
        assert_eq!(resumed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_cancels_pending_resume() {
        let mut task = spawn_sync_task(SyncSettings::default());
        let mut rx = task.take_event_rx().unwrap();
        let handle = task.handle.clone();

        handle.install(scenario_lines());
        handle.update_time(2.5);
        handle.gesture_start();
        handle.gesture_end();
        settle().await;
        drain(&mut rx);

        handle.install(RawLyrics::Lines(vec![RawLine::new(0.0, "x")]));
        tokio::time::sleep(Duration::from_secs(2)).await;

        let events = drain(&mut rx);
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, SyncEvent::ScrollTo { .. }))
        );
        let snapshot = handle.state().snapshot();
        assert_eq!(snapshot.active_index, None);
        assert_eq!(snapshot.entries, 1);
        assert_eq!(snapshot.generation, 2);
        assert_eq!(snapshot.follow_mode, FollowMode::Following);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_load_is_dropped() {
        init_tracing();
        let mut task = spawn_sync_task(SyncSettings::default());
        let mut rx = task.take_event_rx().unwrap();
        let handle = task.handle.clone();
        let source = Arc::new(ScriptedSource);

        let slow = handle.load_from(source.clone(), remote("5000:1"));
        let fast = handle.load_from(source, remote("1000:3"));
        assert!(fast > slow);

        tokio::time::sleep(Duration::from_secs(10)).await;

        let replaced: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e, SyncEvent::TimelineReplaced { .. }))
            .collect();
        assert_eq!(
            replaced,
            vec![SyncEvent::TimelineReplaced {
                len: 3,
                generation: 1
            }]
        );
        assert_eq!(handle.state().snapshot().entries, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_load_keeps_timeline() {
        let mut task = spawn_sync_task(SyncSettings::default());
        let mut rx = task.take_event_rx().unwrap();
        let handle = task.handle.clone();

        handle.install(scenario_lines());
        handle.update_time(2.5);
        settle().await;
        drain(&mut rx);

        let missing = SourceDescriptor::new(
            LyricsFormat::Ttml,
            SourceLocation::Local("missing.ttml".into()),
        );
        handle.load_from(Arc::new(ScriptedSource), missing);
        handle.load_from(Arc::new(ScriptedSource), remote("not a script"));
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(drain(&mut rx).is_empty());
        let snapshot = handle.state().snapshot();
        assert_eq!(snapshot.entries, 3);
        assert_eq!(snapshot.active_index, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_time_is_dropped() {
        let mut task = spawn_sync_task(SyncSettings::default());
        let mut rx = task.take_event_rx().unwrap();
        let handle = task.handle.clone();

        handle.install(scenario_lines());
        handle.update_time(2.5);
        settle().await;
        drain(&mut rx);

        handle.update_time(f64::NAN);
        settle().await;
        assert!(drain(&mut rx).is_empty());
        assert_eq!(handle.state().snapshot().last_playback_time, 2.5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tap_pulse_expires() {
        let mut task = spawn_sync_task(SyncSettings::default());
        let mut rx = task.take_event_rx().unwrap();
        let handle = task.handle.clone();

        handle.install(scenario_lines());
        settle().await;
        drain(&mut rx);

        handle.tap_select(2);
        settle().await;
        assert_eq!(
            drain(&mut rx),
            vec![
                SyncEvent::SeekRequested { index: 2, time: 4.0 },
                SyncEvent::SelectionPulse {
                    index: 2,
                    selected: true
                },
            ]
        );

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(
            drain(&mut rx),
            vec![SyncEvent::SelectionPulse {
                index: 2,
                selected: false
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_stops_task() {
        let task = spawn_sync_task(SyncSettings::default());
        let handle = task.handle.clone();
        task.join().await.unwrap();

        handle.update_time(1.0);
        assert_eq!(handle.state().active_index(), None);
    }
}
