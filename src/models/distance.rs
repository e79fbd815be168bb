//! Distance helpers for display.

use bevy::math::DVec3;

const KM_PER_LIGHT_YEAR: f64 = 9.461e12;

/// Straight-line distance between two positions.
pub fn calculate_dist(a: DVec3, b: DVec3) -> f64 {
    a.distance(b)
}

/// Human-readable distance, e.g. `"5.5 million km away"`.
pub fn format_distance(km: f64) -> String {
    if km < 1e6 {
        format!("{} km away", format_num(km))
    } else if km < 1e9 {
        format!("{} million km away", format_num(km / 1e6))
    } else if km < 1e12 {
        format!("{} billion km away", format_num(km / 1e9))
    } else {
        format!("{} light years away", format_num(km / KM_PER_LIGHT_YEAR))
    }
}

/// Three significant digits with thousands separators.
fn format_num(num: f64) -> String {
    if num == 0.0 || !num.is_finite() {
        return "0".to_string();
    }

    let magnitude = num.abs().log10().floor() as i32;
    let scale = 10f64.powi(2 - magnitude);
    let rounded = (num * scale).round() / scale;
    let decimals = (2 - magnitude).max(0) as usize;

    let text = format!("{:.*}", decimals, rounded);
    let text = if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    };

    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_distance_units() {
        assert_eq!(format_distance(384.4), "384 km away");
        assert_eq!(format_distance(123_456.0), "123,000 km away");
        assert_eq!(format_distance(5_500_000.0), "5.5 million km away");
        assert_eq!(format_distance(2.25e9), "2.25 billion km away");
        assert_eq!(format_distance(4.0e13), "4.23 light years away");
    }

    #[test]
    fn test_format_distance_small_values() {
        assert_eq!(format_distance(0.0), "0 km away");
        assert_eq!(format_distance(1.5), "1.5 km away");
    }

    #[test]
    fn test_calculate_dist() {
        let d = calculate_dist(DVec3::ZERO, DVec3::new(3.0, 4.0, 0.0));
        assert_eq!(d, 5.0);
    }
}
