//! Static title rating table.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// Sentinel returned for unknown title ids.
pub const NOT_AVAILABLE: &str = "not available";

/// Title id → rating. Ids are unique.
static RATINGS: [(&str, &str); 22] = [
    ("aws123123", "6.25"),
    ("aws234234", "7.52"),
    ("aws234567", "8.61"),
    ("aws234890", "7.51"),
    ("aws567234", "8.46"),
    ("aws567567", "7.91"),
    ("aws567890", "8.91"),
    ("aws890234", "9.58"),
    ("aws890567", "7.96"),
    ("aws890890", "8.75"),
    ("aws345345", "7.48"),
    ("aws123456", "6.91"),
    ("aws345678", "7.28"),
    ("aws345901", "8.49"),
    ("aws456456", "7.54"),
    ("aws456789", "8.29"),
    ("aws456012", "8.54"),
    ("aws456123", "6.98"),
    ("aws123789", "6.58"),
    ("aws789123", "7.86"),
    ("aws789456", "9.01"),
    ("aws789789", "9.08"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RatingLookup {
    Found {
        title_id: String,
        rating: &'static str,
    },
    Unavailable,
}

/// Look a title up. Never fails; unknown ids yield [`RatingLookup::Unavailable`].
pub fn lookup_rating(title_id: &str) -> RatingLookup {
    let title_id = title_id.trim();
    RATINGS
        .iter()
        .find(|(id, _)| *id == title_id)
        .map(|&(_, rating)| RatingLookup::Found {
            title_id: title_id.to_string(),
            rating,
        })
        .unwrap_or(RatingLookup::Unavailable)
}

impl RatingLookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    /// `{"title_id", "rating"}` or the `"not available"` string.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::String(NOT_AVAILABLE.into()))
    }
}

impl Serialize for RatingLookup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Found { title_id, rating } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("title_id", title_id)?;
                map.serialize_entry("rating", rating)?;
                map.end()
            }
            Self::Unavailable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

/// Renders like a Python dict literal, single-quoted, as the action-group
/// response body has always shown it.
impl std::fmt::Display for RatingLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Found { title_id, rating } => {
                write!(f, "{{'title_id': '{title_id}', 'rating': '{rating}'}}")
            }
            Self::Unavailable => f.write_str(NOT_AVAILABLE),
        }
    }
}
