use crate::animator::{SpinPlan, SpinTuning, WheelAnimator};
use crate::prize::{Prize, PrizeCatalog};
use crate::random::UniformSource;
use crate::selector::{select_prize, ClaimConstraints};
use crate::session::SpinSession;
use crate::storage::{KeyValueStore, StorageError};
use serde::{Deserialize, Serialize};

/// How long a host should keep celebration effects on screen.
pub const CELEBRATION_MS: u64 = 7000;

/// Optional restrictions layered on top of the plain wheel.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GameRules {
    /// Cash budget across all spins; `None` means uncapped.
    pub max_claimable: Option<f64>,
    /// Once a spin has finished, no further spins are allowed.
    pub one_spin_lock: bool,
    /// Spinning requires the player to have confirmed the channel follow.
    pub require_channel_verification: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpinOutcome {
    Started(SpinPlan),
    AlreadySpinning,
    AlreadySpun,
    VerificationRequired,
}

impl SpinOutcome {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            SpinOutcome::Started(_) => None,
            SpinOutcome::AlreadySpinning => Some("The wheel is already spinning."),
            SpinOutcome::AlreadySpun => Some("You have already used your spin."),
            SpinOutcome::VerificationRequired => {
                Some("Please join the channel before spinning.")
            }
        }
    }
}

/// What a finished spin produced, plus the copy a host shows for it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpinResult {
    pub spin_id: u64,
    pub prize: Prize,
    pub total_claimed_amount: f64,
    pub celebrate: bool,
    pub celebration_ms: u64,
    pub headline: String,
    pub description: String,
    pub toast_title: String,
    pub toast_description: String,
}

impl SpinResult {
    fn new(spin_id: u64, prize: Prize, is_sentinel: bool, total_claimed_amount: f64) -> Self {
        let (headline, description) = if is_sentinel {
            ("😕 Oops! Try Again! 😕", "The wheel landed on:")
        } else {
            ("🎉 Congratulations! 🎉", "You've won:")
        };
        Self {
            spin_id,
            toast_description: format!("You won: {}", prize.name),
            prize,
            total_claimed_amount,
            celebrate: !is_sentinel,
            celebration_ms: if is_sentinel { 0 } else { CELEBRATION_MS },
            headline: headline.to_string(),
            description: description.to_string(),
            toast_title: "Spin Complete!".to_string(),
        }
    }
}

/// Snapshot of the game for status queries.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WheelStatus {
    pub is_spinning: bool,
    pub target_prize_id: Option<String>,
    pub cumulative_rotation: f64,
    pub total_claimed_amount: f64,
    pub max_claimable: Option<f64>,
    pub remaining_claimable: Option<f64>,
    pub has_spun_before: bool,
    pub can_spin: bool,
    pub display_name: Option<String>,
    pub channel_verified: bool,
}

pub type CompletionListener = Box<dyn FnMut(&SpinResult) + Send>;

/// One player's wheel: catalog, rules, durable session and animator, with
/// persistence going through the injected store.
pub struct WheelGame<S> {
    catalog: PrizeCatalog,
    rules: GameRules,
    session: SpinSession,
    animator: WheelAnimator,
    store: S,
    listeners: Vec<CompletionListener>,
}

impl<S: KeyValueStore> WheelGame<S> {
    pub fn hydrate(catalog: PrizeCatalog, rules: GameRules, tuning: SpinTuning, store: S) -> Self {
        let session = SpinSession::hydrate(&store);
        let animator = WheelAnimator::new(&catalog, tuning);
        Self {
            catalog,
            rules,
            session,
            animator,
            store,
            listeners: Vec::new(),
        }
    }

    /// Registers a callback run once per finished spin, after persistence.
    pub fn on_complete(&mut self, listener: impl FnMut(&SpinResult) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn catalog(&self) -> &PrizeCatalog {
        &self.catalog
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn session(&self) -> &SpinSession {
        &self.session
    }

    pub fn animator(&self) -> &WheelAnimator {
        &self.animator
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn constraints(&self) -> ClaimConstraints {
        match self.rules.max_claimable {
            Some(max) => ClaimConstraints::new(self.session.total_claimed_amount, max),
            None => ClaimConstraints {
                total_claimed: self.session.total_claimed_amount,
                ..ClaimConstraints::unlimited()
            },
        }
    }

    fn blocked(&self) -> Option<SpinOutcome> {
        if self.animator.is_spinning() {
            Some(SpinOutcome::AlreadySpinning)
        } else if self.rules.one_spin_lock && self.session.has_spun_before {
            Some(SpinOutcome::AlreadySpun)
        } else if self.rules.require_channel_verification && !self.session.channel_verified {
            Some(SpinOutcome::VerificationRequired)
        } else {
            None
        }
    }

    pub fn can_spin(&self) -> bool {
        self.blocked().is_none()
    }

    /// Picks a winner and starts the wheel toward it. Nothing durable changes
    /// until the matching `complete_spin`.
    pub fn request_spin<R: UniformSource + ?Sized>(&mut self, rng: &mut R) -> SpinOutcome {
        if let Some(outcome) = self.blocked() {
            return outcome;
        }

        let prize = select_prize(&self.catalog, &self.constraints(), rng).clone();
        // The winner always comes from the animator's own catalog, so the
        // only way to get `None` back is an animation already in flight.
        self.animator
            .begin_spin(&prize, rng)
            .map_or(SpinOutcome::AlreadySpinning, SpinOutcome::Started)
    }

    /// Finishes spin `spin_id`, applies its payout and notifies listeners.
    /// Returns `None` for unknown, stale or repeated completions.
    pub fn complete_spin(&mut self, spin_id: u64) -> Option<SpinResult> {
        let prize = self.animator.complete(spin_id)?;

        self.session.total_claimed_amount += prize.cash_value();
        self.session.has_spun_before = true;
        if let Err(e) = self.session.persist_spin(&mut self.store) {
            log::error!("spin {} finished but could not be saved: {}", spin_id, e);
        }

        let is_sentinel = self.catalog.is_sentinel(&prize);
        let result = SpinResult::new(spin_id, prize, is_sentinel, self.session.total_claimed_amount);
        for listener in self.listeners.iter_mut() {
            listener(&result);
        }
        Some(result)
    }

    pub fn set_display_name(&mut self, name: &str) -> Result<(), StorageError> {
        let name = name.trim();
        self.session.display_name = (!name.is_empty()).then(|| name.to_string());
        self.session.persist_profile(&mut self.store)
    }

    pub fn mark_channel_verified(&mut self) -> Result<(), StorageError> {
        self.session.channel_verified = true;
        self.session.persist_profile(&mut self.store)
    }

    pub fn status(&self) -> WheelStatus {
        let constraints = self.constraints();
        WheelStatus {
            is_spinning: self.animator.is_spinning(),
            target_prize_id: self.animator.target_prize().map(|prize| prize.id.clone()),
            cumulative_rotation: self.animator.cumulative_rotation(),
            total_claimed_amount: self.session.total_claimed_amount,
            max_claimable: self.rules.max_claimable,
            remaining_claimable: self.rules.max_claimable.map(|_| constraints.remaining()),
            has_spun_before: self.session.has_spun_before,
            can_spin: self.can_spin(),
            display_name: self.session.display_name.clone(),
            channel_verified: self.session.channel_verified,
        }
    }
}

// === API Types ===

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WheelSpinResponse {
    pub success: bool,
    pub message: Option<String>,
    pub spin: Option<SpinPlan>,
    pub status: WheelStatus,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    pub display_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LayoutQuery {
    pub size: Option<u32>,
    pub viewport: Option<f64>,
}
