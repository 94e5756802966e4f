use chrono::Duration;

use super::types::ClinicalAlert;

/// Same type, same detected phrase, timestamps closer than `window`.
pub fn is_duplicate(alert: &ClinicalAlert, existing: &[ClinicalAlert], window: Duration) -> bool {
    let window_ms = window.num_milliseconds();
    existing.iter().any(|other| {
        other.alert_type() == alert.alert_type()
            && other.detected_phrase().eq_ignore_ascii_case(alert.detected_phrase())
            && (alert.timestamp - other.timestamp).num_milliseconds().abs() < window_ms
    })
}

/// Drop duplicates of stored alerts (any state) and of alerts admitted
/// earlier in the same batch. Returns the admitted alerts and the drop count.
pub fn retain_new(
    batch: Vec<ClinicalAlert>,
    stored: &[ClinicalAlert],
    window: Duration,
) -> (Vec<ClinicalAlert>, usize) {
    let mut admitted: Vec<ClinicalAlert> = Vec::with_capacity(batch.len());
    let mut dropped = 0;

    for alert in batch {
        if is_duplicate(&alert, stored, window) || is_duplicate(&alert, &admitted, window) {
            tracing::debug!(
                alert_type = alert.alert_type().as_str(),
                phrase = alert.detected_phrase(),
                "Duplicate alert dropped"
            );
            dropped += 1;
            continue;
        }
        admitted.push(alert);
    }

    (admitted, dropped)
}
