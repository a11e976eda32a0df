use super::next_effective_vote_index;
use crate::blockchain::{ChainContext, NodeId};
use crate::vote::{MAX_MONEY, PARK_RATE_SCALE, ParkRateVote, Unit, money_range, park_duration_range};

/// Premium earned by parking `amount` of `unit` for `duration` blocks.
///
/// Rates between two curve points are interpolated linearly by duration.
/// Anything outside the curve or outside the valid ranges earns nothing.
pub fn premium(amount: i64, duration: i64, unit: Unit, park_rates: &[ParkRateVote]) -> i64 {
    if !money_range(amount) || !park_duration_range(duration) {
        return 0;
    }

    let Some(curve) = park_rates.iter().find(|c| c.unit == unit) else {
        return 0;
    };

    let mut points = curve.rates.clone();
    points.sort();

    for (i, point) in points.iter().enumerate() {
        let point_duration = point.duration();
        if duration == point_duration {
            return clamp_to_money(i128::from(amount) * i128::from(point.rate) / i128::from(PARK_RATE_SCALE));
        }
        if duration < point_duration {
            if i == 0 {
                return 0;
            }
            let lower = &points[i - 1];
            let lower_duration = i128::from(lower.duration());
            let slope_part = (i128::from(duration) - lower_duration)
                * (i128::from(point.rate) - i128::from(lower.rate))
                / (i128::from(point_duration) - lower_duration);
            let rate = i128::from(lower.rate) + slope_part;
            return clamp_to_money(rate * i128::from(amount) / i128::from(PARK_RATE_SCALE));
        }
    }
    0
}

fn clamp_to_money(value: i128) -> i64 {
    if value < 0 || value > i128::from(MAX_MONEY) {
        0
    } else {
        value as i64
    }
}

/// Premium a park transaction in the block after `tip` would earn.
pub fn next_premium<C: ChainContext>(
    ctx: &C,
    tip: NodeId,
    amount: i64,
    duration: i64,
    unit: Unit,
) -> i64 {
    let effective = next_effective_vote_index(ctx, tip);
    let rates = ctx
        .results(effective)
        .map(|r| r.park_rate_results.as_slice())
        .unwrap_or(&[]);
    premium(amount, duration, unit, rates)
}
