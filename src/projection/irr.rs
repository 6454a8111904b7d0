//! Internal rate of return of a monthly profit stream
//!
//! Newton-Raphson on the periodic rate with a bisection fallback.

const TOLERANCE: f64 = 1e-10;
const MAX_ITERATIONS: usize = 1000;
const MIN_PERIODIC_RATE: f64 = -0.99;
const MAX_PERIODIC_RATE: f64 = 10.0;

/// Annualized IRR of `cashflows` (index = period)
///
/// Returns `None` when the stream never changes sign, since no rate can
/// zero its NPV, or when neither solver converges.
pub fn annual_irr(cashflows: &[f64], periods_per_year: u32) -> Option<f64> {
    if cashflows.is_empty() {
        return None;
    }
    if cashflows.iter().all(|cf| cf.abs() < TOLERANCE) {
        return Some(0.0);
    }
    let has_inflow = cashflows.iter().any(|&cf| cf > TOLERANCE);
    let has_outflow = cashflows.iter().any(|&cf| cf < -TOLERANCE);
    if !has_inflow || !has_outflow {
        return None;
    }

    let annualize = |periodic: f64| (1.0 + periodic).powi(periods_per_year as i32) - 1.0;

    let mut rate = 0.10 / periods_per_year as f64;
    for _ in 0..MAX_ITERATIONS {
        let (npv, slope) = npv_with_slope(cashflows, rate);
        if slope.abs() < 1e-20 {
            break;
        }
        let next = (rate - npv / slope).clamp(MIN_PERIODIC_RATE, MAX_PERIODIC_RATE);
        if (next - rate).abs() < TOLERANCE {
            return Some(annualize(next));
        }
        rate = next;
    }

    bisect(cashflows).map(annualize)
}

/// IRR of a monthly operating-profit stream, as an annual rate
pub fn monthly_irr(profits: &[f64]) -> Option<f64> {
    annual_irr(profits, 12)
}

fn npv_with_slope(cashflows: &[f64], rate: f64) -> (f64, f64) {
    cashflows
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(npv, slope), (t, &cf)| {
            let discount = (1.0 + rate).powi(t as i32);
            let d_slope = if t > 0 {
                -(t as f64) * cf / (discount * (1.0 + rate))
            } else {
                0.0
            };
            (npv + cf / discount, slope + d_slope)
        })
}

fn npv(cashflows: &[f64], rate: f64) -> f64 {
    npv_with_slope(cashflows, rate).0
}

fn bisect(cashflows: &[f64]) -> Option<f64> {
    let (mut low, mut high) = (MIN_PERIODIC_RATE, MAX_PERIODIC_RATE);
    let mut npv_low = npv(cashflows, low);
    if npv_low * npv(cashflows, high) > 0.0 {
        return None;
    }
    for _ in 0..MAX_ITERATIONS {
        let mid = 0.5 * (low + high);
        let npv_mid = npv(cashflows, mid);
        if npv_mid.abs() < TOLERANCE || 0.5 * (high - low) < TOLERANCE {
            return Some(mid);
        }
        if npv_mid * npv_low < 0.0 {
            high = mid;
        } else {
            low = mid;
            npv_low = npv_mid;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_investment_paid_back_in_a_year() {
        let mut profits = vec![-1000.0];
        profits.extend(vec![0.0; 11]);
        profits.push(1100.0);

        let irr = monthly_irr(&profits).unwrap();
        assert!((irr - 0.10).abs() < 0.001, "Expected ~10% IRR, got {}", irr);
    }

    #[test]
    fn test_no_sign_change_has_no_irr() {
        assert_eq!(monthly_irr(&[100.0, 200.0, 300.0]), None);
        assert_eq!(monthly_irr(&[-100.0, -200.0]), None);
        assert_eq!(monthly_irr(&[]), None);
        assert_eq!(monthly_irr(&[0.0, 0.0]), Some(0.0));
    }

    #[test]
    fn test_losses_then_profits() {
        let mut profits = vec![-500_000.0; 6];
        profits.extend(vec![150_000.0; 30]);
        let irr = monthly_irr(&profits).unwrap();
        assert!(irr > 0.0);
    }
}
