//! Quantity parsing and the string wire form used by snapshots and ledgers.
//!
//! Counted quantities travel as strings on disk (`"actualQty": "3"`), while
//! expected quantities are plain JSON numbers. Spreadsheet exports regularly
//! render integers as `3.0`, so parsing accepts float-formatted integers.

/// Parses a quantity cell.
///
/// Accepts `"3"`, `" 3 "`, `"3.0"` and `"2.9999"` (rounded to the nearest
/// integer when within 0.01 of it). Returns `None` for blanks and for values
/// that are not an integral count.
pub fn parse_quantity(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(v) = trimmed.parse::<i64>() {
        return Some(v);
    }

    let v: f64 = trimmed.parse().ok()?;
    if !v.is_finite() {
        return None;
    }
    let rounded = v.round();
    if (v - rounded).abs() <= 0.01 {
        Some(rounded as i64)
    } else {
        None
    }
}

/// Formats an optional quantity for the wire; `None` is the empty string.
pub fn format_quantity(qty: Option<i64>) -> String {
    qty.map(|q| q.to_string()).unwrap_or_default()
}

/// Serde adapter: `i64` stored as a JSON string.
pub mod as_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(qty: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&qty.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_quantity(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid quantity '{}'", raw)))
    }
}

/// Serde adapter: `Option<i64>` stored as a JSON string, `""` meaning `None`.
pub mod opt_as_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(qty: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_quantity(*qty))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<i64>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.trim().is_empty() {
            return Ok(None);
        }
        super::parse_quantity(&raw)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid quantity '{}'", raw)))
    }
}

/// Serde adapter: a JSON number that may have been written as a float.
pub mod number {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(qty: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(*qty)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let v = f64::deserialize(deserializer)?;
        let rounded = v.round();
        if v.is_finite() && (v - rounded).abs() <= 0.01 {
            Ok(rounded as i64)
        } else {
            Err(de::Error::custom(format!("invalid expected quantity {}", v)))
        }
    }
}
