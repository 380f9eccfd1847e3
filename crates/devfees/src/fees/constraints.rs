use super::money::round_currency;

/// Which clamp bound, if any, changed the amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundApplied {
    Minimum(f64),
    Maximum(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constrained {
    pub amount: f64,
    pub bound: Option<BoundApplied>,
}

/// Applies the minimum, then the maximum, then rounds to cents.
///
/// The minimum is applied first, so a malformed schedule with
/// `min_fee > max_fee` always lands on `max_fee`.
pub fn constrain(amount: f64, min_fee: Option<f64>, max_fee: Option<f64>) -> Constrained {
    let mut amount = amount;
    let mut bound = None;

    if let Some(min) = min_fee {
        if amount < min {
            amount = min;
            bound = Some(BoundApplied::Minimum(min));
        }
    }
    if let Some(max) = max_fee {
        if amount > max {
            amount = max;
            bound = Some(BoundApplied::Maximum(max));
        }
    }

    Constrained {
        amount: round_currency(amount),
        bound,
    }
}

pub fn clamp(amount: f64, min_fee: Option<f64>, max_fee: Option<f64>) -> f64 {
    constrain(amount, min_fee, max_fee).amount
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raises_to_minimum_and_caps_at_maximum() {
        assert_eq!(clamp(50.0, Some(100.0), Some(5000.0)), 100.0);
        assert_eq!(clamp(10_000.0, Some(100.0), Some(5000.0)), 5000.0);
        assert_eq!(clamp(750.456, Some(100.0), Some(5000.0)), 750.46);
    }

    #[test]
    fn missing_bounds_leave_amount_untouched() {
        let constrained = constrain(42.424, None, None);
        assert_eq!(constrained.amount, 42.42);
        assert!(constrained.bound.is_none());
    }

    #[test]
    fn inverted_bounds_yield_the_maximum() {
        let constrained = constrain(10.0, Some(500.0), Some(200.0));
        assert_eq!(constrained.amount, 200.0);
        assert_eq!(constrained.bound, Some(BoundApplied::Maximum(200.0)));

        assert_eq!(clamp(10_000.0, Some(500.0), Some(200.0)), 200.0);
    }

    #[test]
    fn clamped_amounts_stay_within_bounds() {
        let (lo, hi) = (125.0, 980.5);
        let mut raw = -250.0;
        while raw < 2_000.0 {
            let amount = clamp(raw, Some(lo), Some(hi));
            assert!(
                (lo..=hi).contains(&amount),
                "{raw} clamped to {amount} outside [{lo}, {hi}]"
            );
            raw += 37.25;
        }
    }
}
