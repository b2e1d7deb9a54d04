//! Human-scaled magnitudes (base-1024, capped at G).

const STEP: f64 = 1024.0;

/// Scale step applied to a magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Base,
    Kilo,
    Mega,
    Giga,
}

impl Tier {
    pub fn prefix(self) -> &'static str {
        match self {
            Tier::Base => "",
            Tier::Kilo => "K",
            Tier::Mega => "M",
            Tier::Giga => "G",
        }
    }

    fn next(self) -> Option<Tier> {
        match self {
            Tier::Base => Some(Tier::Kilo),
            Tier::Kilo => Some(Tier::Mega),
            Tier::Mega => Some(Tier::Giga),
            Tier::Giga => None,
        }
    }
}

/// Divides `magnitude` by 1024 until it drops below 1024 in absolute value
/// or the G tier is reached. The sign is carried through.
pub fn scale(magnitude: f64) -> (f64, Tier) {
    let mut value = magnitude;
    let mut tier = Tier::Base;
    while value.abs() >= STEP {
        let Some(next) = tier.next() else { break };
        value /= STEP;
        tier = next;
    }
    (value, tier)
}

/// Formats a magnitude as `"<value:.2> <prefix><suffix>"`, e.g. `"3.13 Kbps"`.
///
/// Halves round away from zero (3.125 -> "3.13"), unlike `{:.2}` alone.
pub fn format_magnitude(magnitude: f64, suffix: &str) -> String {
    let (value, tier) = scale(magnitude);
    format!("{:.2} {}{suffix}", round_cents(value), tier.prefix())
}

fn round_cents(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    // avoid "-0.00"
    if rounded == 0.0 { 0.0 } else { rounded }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(scale(0.0).1, Tier::Base);
        assert_eq!(scale(1023.99).1, Tier::Base);
        assert_eq!(scale(1024.0).1, Tier::Kilo);
        assert_eq!(scale(1024.0 * 1024.0 - 1.0).1, Tier::Kilo);
        assert_eq!(scale(1024.0 * 1024.0).1, Tier::Mega);
        assert_eq!(scale(1024.0_f64.powi(3)).1, Tier::Giga);
    }

    #[test]
    fn test_never_escalates_past_giga() {
        let (value, tier) = scale(1024.0_f64.powi(5));
        assert_eq!(tier, Tier::Giga);
        assert!((value - 1024.0 * 1024.0).abs() < f64::EPSILON);
        assert_eq!(format_magnitude(1024.0_f64.powi(4), "B"), "1024.00 GB");
    }

    #[test]
    fn test_two_decimals_and_suffix() {
        assert_eq!(format_magnitude(0.0, "bps"), "0.00 bps");
        assert_eq!(format_magnitude(500.0, "B"), "500.00 B");
        assert_eq!(format_magnitude(3200.0, "bps"), "3.13 Kbps");
        assert_eq!(format_magnitude(1536.0 * 1024.0, "B"), "1.50 MB");
    }

    #[test]
    fn test_negative_magnitudes_scale_by_absolute_value() {
        assert_eq!(format_magnitude(-500.0, "B"), "-500.00 B");
        assert_eq!(format_magnitude(-3200.0, "bps"), "-3.13 Kbps");
        assert_eq!(scale(-1024.0_f64.powi(3)).1, Tier::Giga);
        assert_eq!(format_magnitude(-0.001, "bps"), "0.00 bps");
    }

    #[test]
    fn test_halves_round_away_from_zero() {
        assert_eq!(format_magnitude(0.125, "B"), "0.13 B");
        assert_eq!(format_magnitude(2.5 * 1024.0, "B"), "2.50 KB");
    }
}
