//! Address formatting policy.
//!
//! Geocoders sometimes return a bare house number or postal code in the
//! `name` field. The label therefore only uses `name` when it contains
//! at least one alphabetic character, then falls back through
//! street → district → city → empty.

use crate::providers::RawAddress;

use super::types::ResolvedAddress;

/// True if the string contains at least one alphabetic character.
fn has_alpha(s: &str) -> bool {
    s.chars().any(|c| c.is_alphabetic())
}

/// Pick the display label for one raw result.
fn select_label(raw: &RawAddress) -> String {
    if let Some(name) = &raw.name {
        if has_alpha(name) {
            return name.clone();
        }
    }
    raw.street
        .clone()
        .or_else(|| raw.district.clone())
        .or_else(|| raw.city.clone())
        .unwrap_or_default()
}

/// Format the first geocode result into a `ResolvedAddress`.
///
/// Returns `None` on an empty result list; the caller keeps whatever
/// address it already had.
pub fn format_address(results: &[RawAddress]) -> Option<ResolvedAddress> {
    let first = results.first()?;
    Some(ResolvedAddress {
        label: select_label(first),
        city: first.city.clone().unwrap_or_default(),
        postal_code: first.postal_code.clone().unwrap_or_default(),
    })
}
