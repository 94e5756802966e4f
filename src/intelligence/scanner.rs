use super::catalog::{TriggerCatalog, TriggerRule};
use super::types::{AlertCore, CandidateAlert};

/// Excerpt length used when no sentence can be isolated.
const FALLBACK_CONTEXT_CHARS: usize = 100;

const SENTENCE_BOUNDARIES: [char; 3] = ['.', '!', '?'];

/// Scan a transcript against the catalog. One candidate per matched rule,
/// in catalog order. Pure.
pub fn scan(transcript: &str, catalog: &TriggerCatalog) -> Vec<CandidateAlert> {
    if transcript.trim().is_empty() {
        return Vec::new();
    }

    let lowered = transcript.to_lowercase();

    catalog
        .rules()
        .iter()
        .filter_map(|rule| {
            let keyword = first_matching_keyword(rule, &lowered)?;
            Some(CandidateAlert {
                rule_id: rule.id.clone(),
                core: AlertCore {
                    alert_type: rule.alert_type,
                    severity: rule.severity,
                    message: rule.message.clone(),
                    source: rule.source.clone(),
                    source_url: rule.source_url.clone(),
                    detected_phrase: keyword.to_string(),
                    context: extract_context(transcript, keyword),
                },
            })
        })
        .collect()
}

/// Match policy: keywords are tested in table order and the first one
/// contained in the (already lowercased) transcript wins.
pub fn first_matching_keyword<'r>(rule: &'r TriggerRule, lowered: &str) -> Option<&'r str> {
    rule.keywords
        .iter()
        .map(String::as_str)
        .find(|keyword| lowered.contains(keyword))
}

/// First sentence containing `keyword`, trimmed, original casing kept.
/// Falls back to the first 100 characters when the transcript has no
/// sentence boundary or the keyword straddles one.
pub fn extract_context(transcript: &str, keyword: &str) -> String {
    if transcript.contains(SENTENCE_BOUNDARIES) {
        let keyword = keyword.to_lowercase();
        let sentence = transcript
            .split(SENTENCE_BOUNDARIES)
            .map(str::trim)
            .find(|s| s.to_lowercase().contains(&keyword));
        if let Some(sentence) = sentence {
            return sentence.to_string();
        }
    }

    transcript.chars().take(FALLBACK_CONTEXT_CHARS).collect()
}
