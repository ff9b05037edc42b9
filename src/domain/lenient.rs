// Forgiving deserializers for documents written by older versions of the
// tool, or by the remote store (which returns `null` for empty columns).

use serde::{Deserialize, Deserializer};

use crate::domain::RecordId;

/// `null` or a missing value becomes the empty string.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// `null` becomes an empty list.
pub fn ids<'de, D>(deserializer: D) -> Result<Vec<RecordId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<RecordId>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Integer(i64),
    Float(f64),
    Text(String),
}

/// A stored duration: a number, a numeric string, an empty string or `null`.
///
/// Values that do not describe a positive number of minutes are dropped.
pub fn minutes<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawDuration>::deserialize(deserializer)?;
    Ok(match raw {
        None => None,
        Some(RawDuration::Integer(n)) => u32::try_from(n).ok(),
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Some(RawDuration::Float(f)) => (f.is_finite() && f >= 0.0 && f <= f64::from(u32::MAX))
            .then_some(f.trunc() as u32),
        Some(RawDuration::Text(s)) => s.trim().parse().ok(),
    }
    .filter(|&n| n > 0))
}

/// A duration as entered: kept as text so that validation can reject
/// non-numeric input. Numbers are rendered back to text.
pub fn duration_input<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawDuration>::deserialize(deserializer)?;
    Ok(match raw {
        None => None,
        Some(RawDuration::Integer(n)) => Some(n.to_string()),
        Some(RawDuration::Float(f)) => Some(f.to_string()),
        Some(RawDuration::Text(s)) => Some(s),
    }
    .filter(|s| !s.trim().is_empty()))
}
