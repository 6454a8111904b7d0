//! Exponential erosion toward a floor

/// Share of the initial-to-floor gap left open at `months_to_floor`
pub const RESIDUAL_GAP_AT_FLOOR: f64 = 0.05;

/// Exponential approach from `initial` toward `floor` at `rate_per_month`
///
/// The result never overshoots the floor, whichever side it sits on.
/// Negative `t` is treated as month 0.
pub fn decay_toward(t: f64, initial: f64, floor: f64, rate_per_month: f64) -> f64 {
    let t = t.max(0.0);
    if rate_per_month <= 0.0 || t == 0.0 {
        return initial;
    }
    let value = floor + (initial - floor) * (-rate_per_month * t).exp();
    let (lo, hi) = if floor <= initial { (floor, initial) } else { (initial, floor) };
    value.clamp(lo, hi)
}

/// Incumbent share erosion calibrated so ~95% of the gap closes by
/// `months_to_floor` at speed 1.0
///
/// `months_to_floor == 0` returns the floor immediately; a non-positive
/// speed means no erosion at all.
pub fn exponential_erosion(t: f64, initial: f64, floor: f64, months_to_floor: u32, speed: f64) -> f64 {
    if months_to_floor == 0 {
        return floor;
    }
    let rate = -RESIDUAL_GAP_AT_FLOOR.ln() / months_to_floor as f64 * speed;
    decay_toward(t, initial, floor, rate)
}

/// Decay that loses `decline_rate` of `initial` asymptotically, with a time
/// constant chosen so `1 - decline_rate` of the remaining level survives each
/// `decline_months`
///
/// Used for Rx volume after a switch and for disrupted channels that keep a
/// retained fraction.
pub fn retention_decay(t: f64, initial: f64, decline_rate: f64, decline_months: u32) -> f64 {
    let decline_rate = decline_rate.clamp(0.0, 1.0);
    if decline_months == 0 || decline_rate <= 0.0 {
        return initial;
    }
    let floor = initial * (1.0 - decline_rate);
    decay_toward(t, initial, floor, calibrated_rate(decline_rate, decline_months))
}

/// Decay from `initial` toward `initial * retained` at the pace implied by
/// losing `decline_rate` per `decline_months`
///
/// `decline_months == 0` jumps straight to the retained level.
pub fn disruption_decay(
    t: f64,
    initial: f64,
    decline_rate: f64,
    decline_months: u32,
    retained: f64,
) -> f64 {
    let floor = initial * retained.clamp(0.0, 1.0);
    if decline_months == 0 {
        return floor;
    }
    decay_toward(t, initial, floor, calibrated_rate(decline_rate, decline_months))
}

/// `-ln(1 - gap_closed) / months`, with `gap_closed` kept strictly below 1
fn calibrated_rate(gap_closed: f64, months: u32) -> f64 {
    let gap_closed = gap_closed.clamp(0.0, 1.0 - 1e-9);
    -(1.0 - gap_closed).ln() / months as f64
}
