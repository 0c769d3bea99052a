//! Async sampling and playback timers
//!
//! Both loops tick on a fixed period and exit when the cancel channel flips
//! to `true` (or its sender is dropped).

use joint_mapper::JointStateTable;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::player::Player;
use crate::recorder::Recorder;

/// Joint table shared between the mapper task and the timers
pub type Shared<T> = Arc<RwLock<T>>;

async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            return;
        }
    }
}

/// Snapshot `table` into `recorder` every `period` until cancelled or the
/// recorder stops. Returns the number of frames taken.
pub async fn run_sampler(
    recorder: Arc<Mutex<Recorder>>,
    table: Shared<JointStateTable>,
    period: Duration,
    mut cancel: watch::Receiver<bool>,
) -> usize {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut sampled = 0;

    info!("Sampler running every {:?}", period);
    loop {
        tokio::select! {
            _ = cancelled(&mut cancel) => break,
            _ = ticker.tick() => {
                let snapshot = table.read().await.clone();
                if !recorder.lock().await.record_frame(&snapshot, crate::now_ms()) {
                    debug!("Recorder idle, sampler exiting");
                    break;
                }
                sampled += 1;
            }
        }
    }

    info!("Sampler stopped after {} frames", sampled);
    sampled
}

/// Replay `player` into `table` every `period` until the frames run out or
/// playback is cancelled. Returns the number of frames written.
pub async fn run_player(
    mut player: Player,
    table: Shared<JointStateTable>,
    period: Duration,
    mut cancel: watch::Receiver<bool>,
) -> usize {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut played = 0;

    info!("Playing {} frames every {:?}", player.len(), period);
    loop {
        tokio::select! {
            _ = cancelled(&mut cancel) => break,
            _ = ticker.tick() => {
                let mut guard = table.write().await;
                if player.next_frame(&mut guard).is_none() {
                    break;
                }
                played += 1;
            }
        }
    }

    info!("Playback stopped after {} frames", played);
    played
}
