use std::cmp::Ordering;
use std::ops::Add;

/// A search's accumulated cost. `cost` is always physical length in metres, regardless of which
/// mode produced it; comparisons and ordering are on `cost` alone. `seconds` is additive
/// companion data carried for time-budget checks. `init_cost`/`init_seconds` record what a
/// chained search inherited from a previous leg and are *not* summed by `Add`: they are carried
/// from the predecessor label unchanged, so a later phase can recover "cost incurred in this
/// leg alone" via `cost.seconds - cost.init_seconds` (see the isochrone time-budget checks).
#[derive(Debug, Clone, Copy, Default)]
pub struct Cost {
    pub cost: f64,
    pub seconds: f64,
    pub init_cost: f64,
    pub init_seconds: f64,
}

impl Cost {
    pub fn new(cost: f64, seconds: f64) -> Self {
        Cost {
            cost,
            seconds,
            init_cost: 0.0,
            init_seconds: 0.0,
        }
    }

    pub fn with_init(cost: f64, seconds: f64, init_cost: f64, init_seconds: f64) -> Self {
        Cost {
            cost,
            seconds,
            init_cost,
            init_seconds,
        }
    }

    /// Seconds spent in the current leg, excluding whatever a previous chained phase seeded.
    pub fn leg_seconds(&self) -> f64 {
        self.seconds - self.init_seconds
    }
}

impl Add for Cost {
    type Output = Cost;

    fn add(self, rhs: Cost) -> Cost {
        Cost {
            cost: self.cost + rhs.cost,
            seconds: self.seconds + rhs.seconds,
            init_cost: self.init_cost,
            init_seconds: self.init_seconds,
        }
    }
}

impl PartialEq for Cost {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost
    }
}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.cost.partial_cmp(&other.cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sums_cost_and_seconds_but_carries_init() {
        let a = Cost::with_init(10.0, 5.0, 1.0, 1.0);
        let b = Cost::new(4.0, 2.0);
        let sum = a + b;
        assert_eq!(sum.cost, 14.0);
        assert_eq!(sum.seconds, 7.0);
        assert_eq!(sum.init_cost, 1.0);
        assert_eq!(sum.init_seconds, 1.0);
    }

    #[test]
    fn ordering_is_on_cost_only() {
        let cheap = Cost::new(5.0, 1000.0);
        let expensive_but_fast = Cost::new(10.0, 1.0);
        assert!(cheap < expensive_but_fast);
    }
}
