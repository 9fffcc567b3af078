use crate::geometry::{segment_angle, segment_span};
use crate::prize::{Prize, PrizeCatalog};
use crate::random::UniformSource;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_JITTER_FRACTION: f64 = 0.6;
pub const DEFAULT_MIN_SPINS: u32 = 5;
pub const DEFAULT_MAX_EXTRA_SPINS: u32 = 2;
pub const DEFAULT_SPIN_DURATION_MS: u64 = 7000;
/// Upper bound on `min_spins + max_extra_spins`.
pub const MAX_TURNS_PER_SPIN: u32 = 100;

/// Knobs that shape how a spin looks. None of them affect who wins.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpinTuning {
    /// Share of a segment's width the stop point may wander from its center.
    pub jitter_fraction: f64,
    pub min_spins: u32,
    pub max_extra_spins: u32,
    pub duration_ms: u64,
}

impl Default for SpinTuning {
    fn default() -> Self {
        Self {
            jitter_fraction: DEFAULT_JITTER_FRACTION,
            min_spins: DEFAULT_MIN_SPINS,
            max_extra_spins: DEFAULT_MAX_EXTRA_SPINS,
            duration_ms: DEFAULT_SPIN_DURATION_MS,
        }
    }
}

impl SpinTuning {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..1.0).contains(&self.jitter_fraction) {
            return Err(format!(
                "jitter fraction must be in [0, 1), got {}",
                self.jitter_fraction
            ));
        }
        if self.min_spins == 0 {
            return Err("minimum spins must be at least 1".to_string());
        }
        if self.min_spins as u64 + self.max_extra_spins as u64 > MAX_TURNS_PER_SPIN as u64 {
            return Err(format!(
                "minimum plus extra spins must not exceed {}, got {} + {}",
                MAX_TURNS_PER_SPIN, self.min_spins, self.max_extra_spins
            ));
        }
        if self.duration_ms == 0 {
            return Err("spin duration must be positive".to_string());
        }
        Ok(())
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Where a spin will stop and how it got there.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RotationTarget {
    pub segment_mid: f64,
    pub jitter: f64,
    pub effective_angle: f64,
    pub extra_spins: u32,
    pub turns: i64,
    pub rotation: f64,
}

/// Computes the next resting rotation for the segment at `index`.
///
/// The result is always `turns * 360 - effective_angle` with `turns` counted
/// up from the current rotation, so successive spins only ever move forward.
pub fn rotation_target<R: UniformSource + ?Sized>(
    index: usize,
    count: usize,
    cumulative_rotation: f64,
    tuning: &SpinTuning,
    rng: &mut R,
) -> RotationTarget {
    let width = segment_angle(count);
    let segment_mid = segment_span(index, count).mid;
    let jitter = (rng.next_unit() - 0.5) * width * tuning.jitter_fraction;
    let effective_angle = segment_mid + jitter;

    let extra_spins = ((rng.next_unit() * (tuning.max_extra_spins as f64 + 1.0)).floor() as u32)
        .min(tuning.max_extra_spins);
    let turns = (cumulative_rotation / 360.0).floor() as i64
        + tuning.min_spins as i64
        + extra_spins as i64;

    RotationTarget {
        segment_mid,
        jitter,
        effective_angle,
        extra_spins,
        turns,
        rotation: turns as f64 * 360.0 - effective_angle,
    }
}

/// Deceleration curve for the visual transition: 1 - (1 - t)^4.
pub fn ease_out_quart(t: f64) -> f64 {
    1.0 - (1.0 - t.clamp(0.0, 1.0)).powi(4)
}

/// Everything the presentation layer needs to run one animation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpinPlan {
    pub spin_id: u64,
    pub prize: Prize,
    pub from_rotation: f64,
    pub target: RotationTarget,
    pub duration_ms: u64,
}

impl SpinPlan {
    pub fn rotation(&self) -> f64 {
        self.target.rotation
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Visual rotation `elapsed` into the animation.
    pub fn rotation_at(&self, elapsed: Duration) -> f64 {
        let progress = elapsed.as_secs_f64() / self.duration().as_secs_f64();
        self.from_rotation + (self.target.rotation - self.from_rotation) * ease_out_quart(progress)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnimatorState {
    Idle,
    Spinning(SpinPlan),
}

/// Two-state machine that owns the wheel's rotation.
///
/// `begin_spin` is ignored while a spin is in flight and `complete` hands the
/// target back exactly once per spin, whatever order the caller's timers or
/// interruptions arrive in.
#[derive(Debug, Clone)]
pub struct WheelAnimator {
    segment_ids: Vec<String>,
    tuning: SpinTuning,
    state: AnimatorState,
    cumulative_rotation: f64,
    next_spin_id: u64,
}

impl WheelAnimator {
    pub fn new(catalog: &PrizeCatalog, tuning: SpinTuning) -> Self {
        Self {
            segment_ids: catalog.prizes().iter().map(|prize| prize.id.clone()).collect(),
            tuning,
            state: AnimatorState::Idle,
            cumulative_rotation: 0.0,
            next_spin_id: 1,
        }
    }

    pub fn tuning(&self) -> &SpinTuning {
        &self.tuning
    }

    pub fn state(&self) -> &AnimatorState {
        &self.state
    }

    pub fn is_spinning(&self) -> bool {
        matches!(self.state, AnimatorState::Spinning(_))
    }

    pub fn active_plan(&self) -> Option<&SpinPlan> {
        match &self.state {
            AnimatorState::Spinning(plan) => Some(plan),
            AnimatorState::Idle => None,
        }
    }

    pub fn target_prize(&self) -> Option<&Prize> {
        self.active_plan().map(|plan| &plan.prize)
    }

    pub fn cumulative_rotation(&self) -> f64 {
        self.cumulative_rotation
    }

    /// Starts spinning toward `prize`. Returns `None` while already spinning
    /// or if the prize has no segment on this wheel.
    pub fn begin_spin<R: UniformSource + ?Sized>(
        &mut self,
        prize: &Prize,
        rng: &mut R,
    ) -> Option<SpinPlan> {
        if self.is_spinning() {
            log::debug!("spin toward '{}' ignored, wheel already spinning", prize.id);
            return None;
        }
        let Some(index) = self.segment_ids.iter().position(|id| *id == prize.id) else {
            log::warn!("prize '{}' has no segment on the wheel", prize.id);
            return None;
        };

        let from_rotation = self.cumulative_rotation;
        let target = rotation_target(
            index,
            self.segment_ids.len(),
            from_rotation,
            &self.tuning,
            rng,
        );
        self.cumulative_rotation = target.rotation;

        let plan = SpinPlan {
            spin_id: self.next_spin_id,
            prize: prize.clone(),
            from_rotation,
            target,
            duration_ms: self.tuning.duration_ms,
        };
        self.next_spin_id += 1;
        log::debug!(
            "spin {} toward '{}': {} -> {} ({} turns)",
            plan.spin_id,
            prize.id,
            from_rotation,
            target.rotation,
            target.turns
        );
        self.state = AnimatorState::Spinning(plan.clone());
        Some(plan)
    }

    /// Ends spin `spin_id` and returns its prize. Any later call for the same
    /// spin, or a call for a spin that is not in flight, returns `None`.
    pub fn complete(&mut self, spin_id: u64) -> Option<Prize> {
        let in_flight = matches!(
            &self.state,
            AnimatorState::Spinning(plan) if plan.spin_id == spin_id
        );
        if !in_flight {
            return None;
        }
        match std::mem::replace(&mut self.state, AnimatorState::Idle) {
            AnimatorState::Spinning(plan) => Some(plan.prize),
            AnimatorState::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{RngSource, SequenceSource};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn four_segment_catalog() -> PrizeCatalog {
        PrizeCatalog::new(vec![
            Prize::new("a", "A", 0.25, "#000000"),
            Prize::new("b", "B", 0.25, "#000000").with_value(10.0),
            Prize::new("c", "C", 0.25, "#000000").with_value(20.0),
            Prize::new("d", "D", 0.25, "#000000").with_value(50.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_rotation_scenario_without_jitter() {
        // u = 0.5 cancels the jitter, u = 0.0 picks zero extra spins.
        let mut rng = SequenceSource::new(vec![0.5, 0.0]);
        let target = rotation_target(0, 4, 720.0, &SpinTuning::default(), &mut rng);
        assert_eq!(target.segment_mid, 45.0);
        assert_eq!(target.jitter, 0.0);
        assert_eq!(target.turns, 7);
        assert_eq!(target.rotation, 2475.0);
    }

    #[test]
    fn test_extra_spins_cover_configured_range() {
        let tuning = SpinTuning::default();
        for (draw, expected) in [(0.0, 0), (0.34, 1), (0.67, 2), (0.999, 2)] {
            let mut rng = SequenceSource::new(vec![0.5, draw]);
            let target = rotation_target(1, 4, 0.0, &tuning, &mut rng);
            assert_eq!(target.extra_spins, expected, "draw {}", draw);
            assert_eq!(target.turns, 5 + expected as i64);
        }
    }

    #[test]
    fn test_jitter_stays_inside_segment() {
        let tuning = SpinTuning::default();
        for draw in [0.0, 0.25, 0.75, 0.999_999] {
            let mut rng = SequenceSource::new(vec![draw, 0.0]);
            let target = rotation_target(2, 6, 0.0, &tuning, &mut rng);
            let span = segment_span(2, 6);
            assert!(target.effective_angle > span.start);
            assert!(target.effective_angle < span.end);
        }
    }

    #[test]
    fn test_begin_then_complete_returns_prize_once() {
        let catalog = four_segment_catalog();
        let mut animator = WheelAnimator::new(&catalog, SpinTuning::default());
        let prize = catalog.get("c").unwrap().clone();
        let mut rng = SequenceSource::new(vec![0.5, 0.0]);

        let plan = animator.begin_spin(&prize, &mut rng).unwrap();
        assert!(animator.is_spinning());
        assert_eq!(animator.target_prize(), Some(&prize));
        assert_eq!(animator.cumulative_rotation(), plan.rotation());

        assert_eq!(animator.complete(plan.spin_id), Some(prize));
        assert_eq!(animator.complete(plan.spin_id), None);
        assert!(!animator.is_spinning());
        assert_eq!(animator.target_prize(), None);
    }

    #[test]
    fn test_begin_while_spinning_is_a_no_op() {
        let catalog = four_segment_catalog();
        let mut animator = WheelAnimator::new(&catalog, SpinTuning::default());
        let mut rng = SequenceSource::new(vec![0.3, 0.9]);
        let first = catalog.get("a").unwrap().clone();
        let second = catalog.get("d").unwrap().clone();

        let plan = animator.begin_spin(&first, &mut rng).unwrap();
        let before = animator.state().clone();
        assert_eq!(animator.begin_spin(&second, &mut rng), None);
        assert_eq!(animator.state(), &before);
        assert_eq!(animator.cumulative_rotation(), plan.rotation());

        assert_eq!(animator.complete(plan.spin_id), Some(first));
        assert_eq!(animator.complete(plan.spin_id), None);
    }

    #[test]
    fn test_stale_completion_is_ignored() {
        let catalog = four_segment_catalog();
        let mut animator = WheelAnimator::new(&catalog, SpinTuning::default());
        let mut rng = SequenceSource::new(vec![0.5, 0.0]);
        let prize = catalog.get("b").unwrap().clone();

        let first = animator.begin_spin(&prize, &mut rng).unwrap();
        animator.complete(first.spin_id);
        let second = animator.begin_spin(&prize, &mut rng).unwrap();
        assert_ne!(first.spin_id, second.spin_id);

        assert_eq!(animator.complete(first.spin_id), None);
        assert!(animator.is_spinning());
        assert_eq!(animator.complete(second.spin_id), Some(prize));
    }

    #[test]
    fn test_unknown_prize_does_not_start_spin() {
        let catalog = four_segment_catalog();
        let mut animator = WheelAnimator::new(&catalog, SpinTuning::default());
        let stranger = Prize::new("zzz", "Stranger", 1.0, "#000000");
        assert_eq!(animator.begin_spin(&stranger, &mut SequenceSource::constant(0.5)), None);
        assert!(!animator.is_spinning());
    }

    #[test]
    fn test_rotation_at_eases_toward_target() {
        let catalog = four_segment_catalog();
        let mut animator = WheelAnimator::new(&catalog, SpinTuning::default());
        let prize = catalog.get("a").unwrap().clone();
        let plan = animator
            .begin_spin(&prize, &mut SequenceSource::new(vec![0.5, 0.0]))
            .unwrap();

        assert_eq!(plan.rotation_at(Duration::ZERO), 0.0);
        let halfway = plan.rotation_at(plan.duration() / 2);
        assert!(halfway > plan.rotation() / 2.0 && halfway < plan.rotation());
        assert_eq!(plan.rotation_at(plan.duration() * 2), plan.rotation());
    }

    #[test]
    fn test_tuning_validation() {
        assert!(SpinTuning::default().validate().is_ok());
        let wide = SpinTuning { jitter_fraction: 1.0, ..SpinTuning::default() };
        assert!(wide.validate().is_err());
        let still = SpinTuning { min_spins: 0, ..SpinTuning::default() };
        assert!(still.validate().is_err());
        let endless = SpinTuning { max_extra_spins: u32::MAX, ..SpinTuning::default() };
        assert!(endless.validate().is_err());
        let busiest = SpinTuning {
            min_spins: 60,
            max_extra_spins: MAX_TURNS_PER_SPIN - 60,
            ..SpinTuning::default()
        };
        assert!(busiest.validate().is_ok());
    }

    #[test]
    fn test_extreme_extra_spins_do_not_overflow() {
        let tuning = SpinTuning { max_extra_spins: u32::MAX, ..SpinTuning::default() };
        let mut rng = SequenceSource::new(vec![0.5, 0.999_999]);
        let target = rotation_target(0, 4, 0.0, &tuning, &mut rng);
        assert!(target.extra_spins > u32::MAX / 2);
        assert_eq!(target.turns, 5 + target.extra_spins as i64);
        assert!(target.rotation > 0.0);
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

        #[test]
        fn spins_always_move_forward(
            seed in any::<u64>(),
            picks in proptest::collection::vec(0usize..6, 1..40),
        ) {
            let catalog = PrizeCatalog::perunnal();
            let tuning = SpinTuning::default();
            let mut animator = WheelAnimator::new(&catalog, tuning);
            let mut rng = RngSource::new(StdRng::seed_from_u64(seed));

            for pick in picks {
                let previous = animator.cumulative_rotation();
                let prize = catalog.prizes()[pick].clone();
                let plan = animator.begin_spin(&prize, &mut rng).unwrap();

                prop_assert!(plan.rotation() > previous);
                let whole_turns = (plan.rotation() / 360.0).ceil() as i64 - (previous / 360.0).floor() as i64;
                prop_assert!(whole_turns >= tuning.min_spins as i64);
                prop_assert!(plan.rotation() - previous > (tuning.min_spins as f64 - 2.0) * 360.0);

                prop_assert_eq!(animator.complete(plan.spin_id), Some(prize));
            }
        }
    }
}
