use crate::prize::{Prize, PrizeCatalog};
use crate::random::UniformSource;

/// Budget a spin is drawn against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClaimConstraints {
    pub total_claimed: f64,
    pub max_claimable: f64,
}

impl ClaimConstraints {
    pub fn new(total_claimed: f64, max_claimable: f64) -> Self {
        Self {
            total_claimed,
            max_claimable,
        }
    }

    /// No cap: every prize stays eligible.
    pub fn unlimited() -> Self {
        Self::new(0.0, f64::INFINITY)
    }

    pub fn allows(&self, prize: &Prize) -> bool {
        !prize.is_cash() || self.total_claimed + prize.cash_value() <= self.max_claimable
    }

    pub fn remaining(&self) -> f64 {
        (self.max_claimable - self.total_claimed).max(0.0)
    }
}

/// Prizes that can be paid out without breaking the budget, in catalog order.
pub fn eligible_prizes<'a>(catalog: &'a PrizeCatalog, constraints: &ClaimConstraints) -> Vec<&'a Prize> {
    catalog
        .prizes()
        .iter()
        .filter(|prize| constraints.allows(prize))
        .collect()
}

/// Draws one prize, renormalizing weights over the eligible subset.
pub fn select_prize<'a, R: UniformSource + ?Sized>(
    catalog: &'a PrizeCatalog,
    constraints: &ClaimConstraints,
    rng: &mut R,
) -> &'a Prize {
    let eligible = eligible_prizes(catalog, constraints);
    let Some(last) = eligible.last().copied() else {
        log::debug!("no eligible prizes, falling back to '{}'", catalog.sentinel().id);
        return catalog.sentinel();
    };

    let total: f64 = eligible.iter().map(|prize| prize.probability).sum();
    let target = rng.next_unit() * total;

    let mut cumulative = 0.0;
    for prize in eligible {
        cumulative += prize.probability;
        if cumulative > target {
            return prize;
        }
    }

    // Rounding left `target` at or past the final cumulative weight.
    last
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{RngSource, SequenceSource};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn two_prize_catalog() -> PrizeCatalog {
        PrizeCatalog::new(vec![
            Prize::new("A", "Nothing", 0.9, "#CFD8DC").with_value(0.0),
            Prize::new("B", "Hundred", 0.1, "#FFF9C4").with_value(100.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_over_budget_prize_is_never_drawn() {
        let catalog = two_prize_catalog();
        let constraints = ClaimConstraints::new(450.0, 500.0);
        let mut rng = SequenceSource::new(vec![0.0, 0.5, 0.95, 0.999_999]);
        for _ in 0..4 {
            assert_eq!(select_prize(&catalog, &constraints, &mut rng).id, "A");
        }
    }

    #[test]
    fn test_exact_budget_is_allowed() {
        let catalog = two_prize_catalog();
        let constraints = ClaimConstraints::new(400.0, 500.0);
        let mut rng = SequenceSource::constant(0.95);
        assert_eq!(select_prize(&catalog, &constraints, &mut rng).id, "B");
    }

    #[test]
    fn test_walk_follows_catalog_order() {
        let catalog = PrizeCatalog::perunnal();
        let constraints = ClaimConstraints::unlimited();
        let cases = [
            (0.0, "better-luck"),
            (0.399, "better-luck"),
            (0.41, "sweets"),
            (0.79, "10-rupees"),
            (0.90, "20-rupees"),
            (0.95, "50-rupees"),
            (0.985, "100-rupees"),
        ];
        for (draw, expected) in cases {
            let mut rng = SequenceSource::constant(draw);
            assert_eq!(select_prize(&catalog, &constraints, &mut rng).id, expected, "draw {}", draw);
        }
    }

    #[test]
    fn test_falls_back_to_sentinel_when_nothing_is_eligible() {
        let catalog = PrizeCatalog::new(vec![
            Prize::new("cash-a", "Cash A", 0.5, "#000000").with_value(10.0),
            Prize::new("nothing", "Nothing", 0.0, "#FFFFFF"),
            Prize::new("cash-b", "Cash B", 0.5, "#000000").with_value(20.0),
        ])
        .unwrap();
        let constraints = ClaimConstraints::new(100.0, 100.0);
        let mut rng = SequenceSource::new(vec![0.0, 0.3, 0.7, 0.99]);
        for _ in 0..4 {
            assert_eq!(select_prize(&catalog, &constraints, &mut rng).id, "nothing");
        }
    }

    #[test]
    fn test_zero_weight_eligible_set_returns_last_eligible() {
        let catalog = PrizeCatalog::new(vec![
            Prize::new("a", "A", 0.0, "#000000"),
            Prize::new("b", "B", 0.0, "#000000"),
        ])
        .unwrap();
        let mut rng = SequenceSource::constant(0.5);
        assert_eq!(
            select_prize(&catalog, &ClaimConstraints::unlimited(), &mut rng).id,
            "b"
        );
    }

    #[test]
    fn test_frequencies_match_normalized_weights() {
        // Weights sum to 2, so each share is probability / 2.
        let catalog = PrizeCatalog::new(vec![
            Prize::new("a", "A", 1.0, "#000000"),
            Prize::new("b", "B", 0.6, "#000000"),
            Prize::new("c", "C", 0.4, "#000000"),
        ])
        .unwrap();
        let constraints = ClaimConstraints::unlimited();
        let mut rng = RngSource::new(StdRng::seed_from_u64(42));
        let trials = 100_000;
        let mut counts = [0usize; 3];
        for _ in 0..trials {
            let prize = select_prize(&catalog, &constraints, &mut rng);
            counts[catalog.position(&prize.id).unwrap()] += 1;
        }
        let expected = [0.5, 0.3, 0.2];
        for (count, share) in counts.iter().zip(expected) {
            let observed = *count as f64 / trials as f64;
            assert!((observed - share).abs() < 0.01, "observed {} expected {}", observed, share);
        }
    }

    #[test]
    fn test_evenly_spaced_draws_hit_exact_shares() {
        let catalog = two_prize_catalog();
        let constraints = ClaimConstraints::unlimited();
        let draws: Vec<f64> = (0..1000).map(|i| i as f64 / 1000.0).collect();
        let mut rng = SequenceSource::new(draws);
        let wins = (0..1000)
            .filter(|_| select_prize(&catalog, &constraints, &mut rng).id == "B")
            .count();
        assert_eq!(wins, 100);
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

        #[test]
        fn repeated_spins_never_exceed_budget(
            max_claimable in 0u32..500,
            draws in proptest::collection::vec(0.0f64..1.0, 1..200),
        ) {
            let catalog = PrizeCatalog::perunnal();
            let max_claimable = max_claimable as f64;
            let mut total = 0.0;
            let mut rng = SequenceSource::new(draws.clone());
            for _ in 0..draws.len() {
                let constraints = ClaimConstraints::new(total, max_claimable);
                let prize = select_prize(&catalog, &constraints, &mut rng);
                prop_assert!(total + prize.cash_value() <= max_claimable);
                total += prize.cash_value();
            }
        }
    }
}
