use crate::domain::assessment::{AssessmentRecord, HitMetadata, YesNo};

/// Keep only the segment between the first and second `=`, trimmed.
///
/// Values without `=` are returned unchanged.
pub fn normalize_duration(raw: &str) -> String {
    if !raw.contains('=') {
        return raw.to_string();
    }
    raw.split('=').nth(1).unwrap_or_default().trim().to_string()
}

/// Map a boolean-like string to [`YesNo`]. Only `"true"` (any case, any
/// surrounding whitespace) is `Yes`.
pub fn normalize_flag(raw: &str) -> YesNo {
    YesNo::from(raw.trim().eq_ignore_ascii_case("true"))
}

/// Build an [`AssessmentRecord`] from chunk metadata.
///
/// Returns `None` when the record has no name.
pub fn normalize_metadata(meta: &HitMetadata) -> Option<AssessmentRecord> {
    if meta.name.is_empty() {
        return None;
    }

    Some(AssessmentRecord {
        name: meta.name.clone(),
        url: meta.url.clone(),
        remote_testing: normalize_flag(&meta.remote_testing),
        adaptive_irt: normalize_flag(&meta.adaptive_irt),
        duration: normalize_duration(&meta.duration),
        test_type: meta.test_type.clone(),
    })
}
