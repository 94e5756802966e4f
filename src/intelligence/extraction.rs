use std::sync::LazyLock;

use regex::Regex;

/// "190/120", "190 / 120". Compiled once.
static RE_BLOOD_PRESSURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{2,3})\s*/\s*(\d{2,3})").unwrap());

/// Every systolic/diastolic pair in the text, in order of appearance.
/// Pairs whose numbers fail to parse are skipped.
pub fn blood_pressure_pairs(text: &str) -> Vec<(f64, f64)> {
    RE_BLOOD_PRESSURE
        .captures_iter(text)
        .filter_map(|caps| {
            let systolic = caps.get(1)?.as_str().parse::<f64>().ok()?;
            let diastolic = caps.get(2)?.as_str().parse::<f64>().ok()?;
            Some((systolic, diastolic))
        })
        .collect()
}

/// Every number following `label` ("glucose 250 mg/dL" -> 250.0).
///
/// `text` and `label` are matched case-insensitively. Captures that do not
/// parse as a number ("1.2.3", a lone ".") are skipped.
pub fn labeled_values(text: &str, label: &str) -> Vec<f64> {
    let pattern = format!(r"(?i){}[^\d]*([\d.]+)", regex::escape(label));
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            tracing::debug!(label, error = %e, "Label pattern rejected");
            return Vec::new();
        }
    };

    re.captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<f64>().ok())
        .collect()
}

/// First value inside the open interval (min, max).
pub fn first_plausible(values: &[f64], min: f64, max: f64) -> Option<f64> {
    values.iter().copied().find(|v| *v > min && *v < max)
}

/// Cut `text` to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Format a reading without a trailing ".0".
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
