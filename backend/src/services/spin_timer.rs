use serde::Serialize;
use spinwheel_shared::{
    KeyValueStore, SpinOutcome, SpinPlan, SpinResult, UniformSource, WheelGame, WheelStatus,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

pub type DynStore = Box<dyn KeyValueStore + Send>;
pub type DynSource = Box<dyn UniformSource + Send>;
pub type SharedWheel = Arc<Mutex<WheelHost>>;

struct PendingSpin {
    plan: SpinPlan,
    started_at: Instant,
    timer: JoinHandle<()>,
}

/// The wheel plus the timer standing in for its on-screen animation.
pub struct WheelHost {
    game: WheelGame<DynStore>,
    rng: DynSource,
    pending: Option<PendingSpin>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    #[serde(flatten)]
    pub status: WheelStatus,
    /// Where the wheel is drawn right now, mid-animation included.
    pub current_rotation: f64,
}

impl WheelHost {
    pub fn new(game: WheelGame<DynStore>, rng: DynSource) -> Self {
        Self {
            game,
            rng,
            pending: None,
        }
    }

    pub fn shared(self) -> SharedWheel {
        Arc::new(Mutex::new(self))
    }

    pub fn game(&self) -> &WheelGame<DynStore> {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut WheelGame<DynStore> {
        &mut self.game
    }

    pub fn current_rotation(&self) -> f64 {
        match &self.pending {
            Some(pending) => pending.plan.rotation_at(pending.started_at.elapsed()),
            None => self.game.animator().cumulative_rotation(),
        }
    }

    pub fn status(&self) -> StatusResponse {
        StatusResponse {
            status: self.game.status(),
            current_rotation: self.current_rotation(),
        }
    }
}

fn log_finished(result: &Option<SpinResult>, spin_id: u64) {
    match result {
        Some(result) => info!(
            spin_id,
            prize = %result.prize.id,
            total_claimed = result.total_claimed_amount,
            "🎡 wheel stopped"
        ),
        None => debug!(spin_id, "completion for a spin that is no longer in flight"),
    }
}

/// Asks the game for a spin and, if one starts, arms its completion timer.
pub async fn start_spin(wheel: &SharedWheel) -> (SpinOutcome, StatusResponse) {
    let mut guard = wheel.lock().await;
    let host = &mut *guard;

    let outcome = host.game.request_spin(host.rng.as_mut());
    match &outcome {
        SpinOutcome::Started(plan) => {
            info!(
                spin_id = plan.spin_id,
                prize = %plan.prize.id,
                rotation = plan.rotation(),
                "🎡 wheel spinning"
            );
            let timer = tokio::spawn(finish_after(wheel.clone(), plan.spin_id, plan.duration()));
            host.pending = Some(PendingSpin {
                plan: plan.clone(),
                started_at: Instant::now(),
                timer,
            });
        }
        other => debug!("spin request refused: {:?}", other),
    }

    let status = host.status();
    (outcome, status)
}

async fn finish_after(wheel: SharedWheel, spin_id: u64, delay: Duration) {
    tokio::time::sleep(delay).await;
    finish(&wheel, spin_id).await;
}

/// Delivers the end of the animation for `spin_id`. Safe to call more than
/// once; only the first call for an in-flight spin has any effect.
pub async fn finish(wheel: &SharedWheel, spin_id: u64) -> Option<SpinResult> {
    let mut host = wheel.lock().await;
    if host
        .pending
        .as_ref()
        .is_some_and(|pending| pending.plan.spin_id == spin_id)
    {
        host.pending = None;
    }
    let result = host.game.complete_spin(spin_id);
    log_finished(&result, spin_id);
    result
}

/// Cuts the running animation short and completes it on the spot. Used on
/// shutdown so an interrupted spin is still paid out exactly once.
pub async fn settle_now(wheel: &SharedWheel) -> Option<SpinResult> {
    let mut host = wheel.lock().await;
    let pending = host.pending.take()?;
    pending.timer.abort();
    let result = host.game.complete_spin(pending.plan.spin_id);
    log_finished(&result, pending.plan.spin_id);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use spinwheel_shared::{GameRules, MemoryStore, PrizeCatalog, SequenceSource, SpinTuning};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn host(draws: Vec<f64>) -> (SharedWheel, Arc<AtomicUsize>) {
        let store: DynStore = Box::new(MemoryStore::new());
        let mut game = WheelGame::hydrate(
            PrizeCatalog::perunnal(),
            GameRules::default(),
            SpinTuning::default(),
            store,
        );
        let completions = Arc::new(AtomicUsize::new(0));
        let counter = completions.clone();
        game.on_complete(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let rng: DynSource = Box::new(SequenceSource::new(draws));
        (WheelHost::new(game, rng).shared(), completions)
    }

    fn spin_id(outcome: &SpinOutcome) -> u64 {
        match outcome {
            SpinOutcome::Started(plan) => plan.spin_id,
            other => panic!("spin did not start: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_completes_spin_once() {
        let (wheel, completions) = host(vec![0.95, 0.5, 0.0]);
        let (outcome, status) = start_spin(&wheel).await;
        let id = spin_id(&outcome);
        assert!(status.status.is_spinning);

        tokio::time::sleep(Duration::from_millis(6_999)).await;
        assert!(wheel.lock().await.game().animator().is_spinning());
        assert_eq!(completions.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        let host = wheel.lock().await;
        assert!(!host.game().animator().is_spinning());
        assert_eq!(host.game().session().total_claimed_amount, 50.0);
        assert_eq!(completions.load(Ordering::SeqCst), 1);
        drop(host);

        assert!(finish(&wheel, id).await.is_none());
        assert_eq!(completions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_request_while_spinning_is_ignored() {
        let (wheel, completions) = host(vec![0.1, 0.5, 0.0]);
        let (first, _) = start_spin(&wheel).await;
        let (second, status) = start_spin(&wheel).await;
        assert_eq!(second, SpinOutcome::AlreadySpinning);
        assert_eq!(
            status.status.target_prize_id.as_deref(),
            Some("better-luck")
        );

        tokio::time::sleep(Duration::from_secs(8)).await;
        assert_eq!(completions.load(Ordering::SeqCst), 1);
        assert!(finish(&wheel, spin_id(&first)).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_now_completes_exactly_once() {
        let (wheel, completions) = host(vec![0.85, 0.5, 0.0]);
        let (outcome, _) = start_spin(&wheel).await;

        tokio::time::sleep(Duration::from_secs(2)).await;
        let settled = settle_now(&wheel).await.unwrap();
        assert_eq!(settled.spin_id, spin_id(&outcome));
        assert_eq!(settled.prize.id, "10-rupees");

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(completions.load(Ordering::SeqCst), 1);
        assert!(settle_now(&wheel).await.is_none());
        assert_eq!(wheel.lock().await.game().session().total_claimed_amount, 10.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_current_rotation_tracks_animation() {
        let (wheel, _) = host(vec![0.5, 0.5, 0.0]);
        let (outcome, status) = start_spin(&wheel).await;
        let SpinOutcome::Started(plan) = outcome else {
            panic!("spin did not start");
        };
        assert_eq!(status.current_rotation, 0.0);

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        let midway = wheel.lock().await.current_rotation();
        assert!(midway > 0.0 && midway < plan.rotation());

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(wheel.lock().await.current_rotation(), plan.rotation());
    }
}
