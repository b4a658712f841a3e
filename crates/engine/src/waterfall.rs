//! Waterfall distribution of an amount across capped buckets.
//!
//! Each round splits what is left proportionally to the weights of the buckets
//! that can still accept money. A bucket whose share exceeds its headroom is
//! filled to its cap and drops out; the part it could not take stays in the
//! remainder and is split again among the others in the next round. The loop
//! runs while more than [`EPSILON`] is left and ends early when no bucket can
//! accept more or a round places less than [`EPSILON`]. A remainder of
//! [`EPSILON`] or less is returned as undistributed.
//!
//! Shares are computed in cents. The cents lost by flooring each share are
//! handed out one at a time, largest fractional part first (ties broken by
//! category name), so a round that caps nobody places the whole remainder.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{AllocationPolicy, Money};

/// Precision floor: remainders up to this are not distributed, and a round
/// that places less than this ends the loop.
pub const EPSILON: Money = Money::CENT;

/// Result of a distribution, before anything is persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    /// Amount per policy category, zero entries included.
    pub credited: BTreeMap<String, Money>,
    /// What no bucket could accept.
    pub undistributed: Money,
    pub rounds: usize,
}

impl Distribution {
    pub fn total(&self) -> Money {
        self.credited.values().sum()
    }
}

struct Slot<'a> {
    category: &'a str,
    weight: f64,
    /// `None` when uncapped.
    space: Option<Money>,
}

/// Splits `amount` across the policy categories given the current balances.
///
/// Balances missing from `balances` count as zero. Pure: nothing is written.
pub fn distribute(
    amount: Money,
    policy: &AllocationPolicy,
    balances: &BTreeMap<String, Money>,
) -> Distribution {
    let categories: Vec<&str> = policy.categories().into_iter().collect();
    let mut credited: BTreeMap<String, Money> = categories
        .iter()
        .map(|category| ((*category).to_string(), Money::ZERO))
        .collect();

    // Each round either places the whole remainder or fills at least one
    // bucket, so this bound is only hit on numerically pathological input.
    let max_rounds = categories.len() + 2;
    let mut remaining = amount;
    let mut rounds = 0;

    while remaining > EPSILON {
        if rounds == max_rounds {
            tracing::warn!("waterfall stopped after {rounds} rounds with {remaining} left");
            break;
        }

        let active = active_slots(&categories, policy, balances, &credited);
        if active.is_empty() {
            tracing::debug!("every bucket is full, {remaining} left undistributed");
            break;
        }
        let total_weight: f64 = active.iter().map(|slot| slot.weight).sum();
        if total_weight <= 0.0 {
            break;
        }

        rounds += 1;
        let adds = split_round(remaining, &active, total_weight);

        let mut distributed = Money::ZERO;
        for (slot, add) in active.iter().zip(adds) {
            if let Some(total) = credited.get_mut(slot.category) {
                *total += add;
            }
            distributed += add;
        }
        remaining -= distributed;
        tracing::debug!(
            "waterfall round {rounds}: {} active bucket(s), placed {distributed}, {remaining} left",
            active.len()
        );

        if distributed < EPSILON {
            break;
        }
    }

    Distribution {
        credited,
        undistributed: remaining,
        rounds,
    }
}

fn active_slots<'a>(
    categories: &[&'a str],
    policy: &AllocationPolicy,
    balances: &BTreeMap<String, Money>,
    credited: &BTreeMap<String, Money>,
) -> Vec<Slot<'a>> {
    categories
        .iter()
        .filter_map(|&category| {
            let weight = policy.weight(category);
            if weight <= 0.0 {
                return None;
            }
            let current = balances.get(category).copied().unwrap_or_default()
                + credited.get(category).copied().unwrap_or_default();
            match policy.cap(category) {
                None => Some(Slot {
                    category,
                    weight,
                    space: None,
                }),
                Some(cap) if current < cap => Some(Slot {
                    category,
                    weight,
                    space: Some(cap - current),
                }),
                Some(_) => None,
            }
        })
        .collect()
}

/// One proportional pass over the active slots. The returned amounts never
/// exceed a slot's headroom and never sum above `remaining`.
fn split_round(remaining: Money, active: &[Slot<'_>], total_weight: f64) -> Vec<Money> {
    let mut budget = remaining.cents();
    let mut adds = Vec::with_capacity(active.len());
    let mut fractions = Vec::with_capacity(active.len());

    for slot in active {
        let exact = remaining.cents() as f64 * slot.weight / total_weight;
        let floored = exact.floor();
        let share = (floored as i64).clamp(0, budget);
        let add = match slot.space {
            Some(space) => share.min(space.cents()),
            None => share,
        };
        budget -= add;
        adds.push(add);
        fractions.push(exact - floored);
    }

    let mut order: Vec<usize> = (0..active.len()).collect();
    order.sort_by(|&a, &b| {
        fractions[b]
            .total_cmp(&fractions[a])
            .then_with(|| active[a].category.cmp(active[b].category))
    });

    // `budget` now holds the rounding leftovers plus whatever capped slots
    // refused; only the former is handed out here, one cent per slot.
    let mut leftover = remaining.cents() - active_floor_sum(remaining, active, total_weight);
    for index in order {
        if leftover <= 0 || budget <= 0 {
            break;
        }
        let has_room = match active[index].space {
            Some(space) => adds[index] < space.cents(),
            None => true,
        };
        if has_room {
            adds[index] += 1;
            budget -= 1;
            leftover -= 1;
        }
    }

    adds.into_iter().map(Money::new).collect()
}

fn active_floor_sum(remaining: Money, active: &[Slot<'_>], total_weight: f64) -> i64 {
    active
        .iter()
        .map(|slot| (remaining.cents() as f64 * slot.weight / total_weight).floor() as i64)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(rows: &[(&str, f64, i64)]) -> AllocationPolicy {
        AllocationPolicy::from_rows(
            rows.iter()
                .map(|(name, weight, cap)| (*name, *weight, Money::new(*cap))),
        )
        .unwrap()
    }

    fn balances(rows: &[(&str, i64)]) -> BTreeMap<String, Money> {
        rows.iter()
            .map(|(name, cents)| (name.to_string(), Money::new(*cents)))
            .collect()
    }

    #[test]
    fn overflow_is_redirected_to_buckets_with_room() {
        let policy = policy(&[("A", 0.5, 100_00), ("B", 0.5, 0)]);
        let result = distribute(Money::new(100_00), &policy, &balances(&[("A", 90_00)]));

        assert_eq!(result.credited["A"], Money::new(10_00));
        assert_eq!(result.credited["B"], Money::new(90_00));
        assert_eq!(result.undistributed, Money::ZERO);
        assert_eq!(result.rounds, 2);
    }

    #[test]
    fn uncapped_split_is_proportional_and_exact() {
        let policy = policy(&[("Rent", 0.5, 0), ("Food", 0.3, 0), ("Fun", 0.2, 0)]);
        let result = distribute(Money::new(1000_00), &policy, &BTreeMap::new());

        assert_eq!(result.credited["Rent"], Money::new(500_00));
        assert_eq!(result.credited["Food"], Money::new(300_00));
        assert_eq!(result.credited["Fun"], Money::new(200_00));
        assert_eq!(result.total(), Money::new(1000_00));
        assert_eq!(result.rounds, 1);
    }

    #[test]
    fn weights_are_renormalized() {
        let policy = policy(&[("A", 2.0, 0), ("B", 6.0, 0)]);
        let result = distribute(Money::new(80_00), &policy, &BTreeMap::new());

        assert_eq!(result.credited["A"], Money::new(20_00));
        assert_eq!(result.credited["B"], Money::new(60_00));
    }

    #[test]
    fn rounding_cents_are_not_lost() {
        let policy = policy(&[("A", 1.0, 0), ("B", 1.0, 0), ("C", 1.0, 0)]);
        let result = distribute(Money::new(100), &policy, &BTreeMap::new());

        assert_eq!(result.total(), Money::new(100));
        assert_eq!(result.credited["A"], Money::new(34));
        assert_eq!(result.credited["B"], Money::new(33));
        assert_eq!(result.credited["C"], Money::new(33));
    }

    #[test]
    fn single_cent_is_left_undistributed() {
        let policy = policy(&[("A", 1.0, 0)]);
        let result = distribute(Money::CENT, &policy, &BTreeMap::new());

        assert_eq!(result.credited["A"], Money::ZERO);
        assert_eq!(result.undistributed, Money::CENT);
        assert_eq!(result.rounds, 0);
    }

    #[test]
    fn two_cents_are_split() {
        let policy = policy(&[("A", 1.0, 0), ("B", 1.0, 0)]);
        let result = distribute(Money::new(2), &policy, &BTreeMap::new());

        assert_eq!(result.credited["A"], Money::CENT);
        assert_eq!(result.credited["B"], Money::CENT);
        assert_eq!(result.undistributed, Money::ZERO);
    }

    #[test]
    fn one_cent_overflow_stays_undistributed() {
        // A takes 1 of its 2 cent share, the refused cent is not split again.
        let policy = policy(&[("A", 1.0, 10_00), ("B", 1.0, 0)]);
        let result = distribute(Money::new(4), &policy, &balances(&[("A", 9_99)]));

        assert_eq!(result.credited["A"], Money::CENT);
        assert_eq!(result.credited["B"], Money::new(2));
        assert_eq!(result.undistributed, Money::CENT);
        assert_eq!(result.rounds, 1);
    }

    #[test]
    fn everything_full_leaves_remainder_undistributed() {
        let policy = policy(&[("A", 0.5, 50_00), ("B", 0.5, 20_00)]);
        let result = distribute(
            Money::new(100_00),
            &policy,
            &balances(&[("A", 40_00), ("B", 20_00)]),
        );

        assert_eq!(result.credited["A"], Money::new(10_00));
        assert_eq!(result.credited["B"], Money::ZERO);
        assert_eq!(result.undistributed, Money::new(90_00));
        assert_eq!(result.total() + result.undistributed, Money::new(100_00));
    }

    #[test]
    fn zero_weight_is_never_credited() {
        let policy = policy(&[("Savings", 0.0, 0), ("Food", 1.0, 10_00)]);
        let result = distribute(Money::new(500_00), &policy, &BTreeMap::new());

        assert_eq!(result.credited["Savings"], Money::ZERO);
        assert_eq!(result.credited["Food"], Money::new(10_00));
        assert_eq!(result.undistributed, Money::new(490_00));
    }

    #[test]
    fn bucket_already_over_cap_is_skipped() {
        let policy = policy(&[("A", 0.5, 10_00), ("B", 0.5, 0)]);
        let result = distribute(Money::new(40_00), &policy, &balances(&[("A", 15_00)]));

        assert_eq!(result.credited["A"], Money::ZERO);
        assert_eq!(result.credited["B"], Money::new(40_00));
    }

    #[test]
    fn negative_balance_widens_headroom() {
        let policy = policy(&[("A", 1.0, 10_00)]);
        let result = distribute(Money::new(30_00), &policy, &balances(&[("A", -5_00)]));

        assert_eq!(result.credited["A"], Money::new(15_00));
        assert_eq!(result.undistributed, Money::new(15_00));
    }

    #[test]
    fn categories_only_in_balances_are_ignored() {
        let policy = policy(&[("A", 1.0, 0)]);
        let result = distribute(Money::new(5_00), &policy, &balances(&[("Ghost", 0)]));

        assert_eq!(result.credited.len(), 1);
        assert_eq!(result.credited["A"], Money::new(5_00));
    }

    #[test]
    fn non_positive_amount_places_nothing() {
        let policy = policy(&[("A", 1.0, 0)]);
        let result = distribute(Money::ZERO, &policy, &BTreeMap::new());
        assert_eq!(result.total(), Money::ZERO);
        assert_eq!(result.rounds, 0);
    }

    #[test]
    fn household_policy_places_full_income_when_no_cap_is_hit() {
        let policy = policy(&[
            ("Transporte", 0.05, 150_000_00),
            ("Vivienda", 0.28, 1_200_000_00),
            ("Ocio", 0.09, 400_000_00),
            ("Salud", 0.02, 300_000_00),
            ("Ropa", 0.02, 300_000_00),
            ("Misceláneo", 0.24, 1_000_000_00),
            ("Departamento", 0.05, 700_000_00),
            ("Ahorro", 0.20, 0),
            ("Vacaciones", 0.05, 0),
        ]);
        let result = distribute(Money::new(1_000_000_00), &policy, &BTreeMap::new());

        assert_eq!(result.total(), Money::new(1_000_000_00));
        assert_eq!(result.credited["Vivienda"], Money::new(280_000_00));
        assert_eq!(result.credited["Ahorro"], Money::new(200_000_00));
    }

    #[test]
    fn caps_and_total_hold_across_generated_cases() {
        // Small deterministic LCG so the cases are reproducible.
        let mut seed: u64 = 0x5eed;
        let mut next = |bound: u64| {
            seed = seed
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (seed >> 33) % bound
        };

        for _ in 0..200 {
            let count = 1 + next(6) as usize;
            let mut rows = Vec::new();
            let mut start = BTreeMap::new();
            for i in 0..count {
                let name = format!("c{i}");
                let weight = next(5) as f64 / 4.0;
                let cap = if next(3) == 0 { 0 } else { 1 + next(50_000) as i64 };
                let balance = if cap > 0 { next(cap as u64) as i64 } else { next(10_000) as i64 };
                start.insert(name.clone(), Money::new(balance));
                rows.push((name, weight, Money::new(cap)));
            }
            let policy = AllocationPolicy::from_rows(rows).unwrap();
            let amount = Money::new(1 + next(200_000) as i64);

            let result = distribute(amount, &policy, &start);

            assert!(result.total() <= amount);
            assert_eq!(result.total() + result.undistributed, amount);
            for (category, credit) in &result.credited {
                assert!(!credit.is_negative());
                if policy.weight(category) == 0.0 {
                    assert_eq!(*credit, Money::ZERO);
                }
                if let Some(cap) = policy.cap(category) {
                    assert!(start[category] + *credit <= cap);
                }
            }
            let any_capped = policy.categories().iter().any(|category| {
                policy
                    .cap(category)
                    .is_some_and(|cap| start[*category] + result.credited[*category] >= cap)
            });
            let any_weight = policy.categories().iter().any(|c| policy.weight(c) > 0.0);
            if !any_capped && any_weight && amount > EPSILON {
                assert_eq!(result.total(), amount);
            }
        }
    }
}
