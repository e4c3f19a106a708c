//! Per-order drink customization.
//!
//! Stored on the order as JSON of the form `{"sweetness": "5", "iceLevel": "less"}`,
//! where either field may be `null`.

use core::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Sugar level in tenths: 0, 3, 5, 7 or 10.
///
/// Serialized as the decimal string (`"0"`, `"3"`, ...). Deserialization also
/// accepts the bare number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sweetness {
    None,
    Light,
    Half,
    Most,
    Full,
}

impl Sweetness {
    /// All levels in ascending order.
    pub const ALL: [Self; 5] = [Self::None, Self::Light, Self::Half, Self::Most, Self::Full];

    /// Numeric level out of ten.
    #[must_use]
    pub const fn level(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Light => 3,
            Self::Half => 5,
            Self::Most => 7,
            Self::Full => 10,
        }
    }

    /// Look up a level by its number out of ten.
    #[must_use]
    pub const fn from_level(level: u64) -> Option<Self> {
        match level {
            0 => Some(Self::None),
            3 => Some(Self::Light),
            5 => Some(Self::Half),
            7 => Some(Self::Most),
            10 => Some(Self::Full),
            _ => None,
        }
    }
}

impl fmt::Display for Sweetness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}

impl std::str::FromStr for Sweetness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .ok()
            .and_then(Self::from_level)
            .ok_or_else(|| format!("invalid sweetness: {s}"))
    }
}

impl Serialize for Sweetness {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct SweetnessVisitor;

impl Visitor<'_> for SweetnessVisitor {
    type Value = Sweetness;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("one of 0, 3, 5, 7 or 10")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Sweetness::from_level(v).ok_or_else(|| E::custom(format!("invalid sweetness: {v}")))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        u64::try_from(v)
            .ok()
            .and_then(Sweetness::from_level)
            .ok_or_else(|| E::custom(format!("invalid sweetness: {v}")))
    }
}

impl<'de> Deserialize<'de> for Sweetness {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SweetnessVisitor)
    }
}

/// Amount of ice in a cold drink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IceLevel {
    None,
    Less,
    Normal,
}

impl fmt::Display for IceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Less => write!(f, "less"),
            Self::Normal => write!(f, "normal"),
        }
    }
}

/// A customer's choices for one order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customization {
    #[serde(default)]
    pub sweetness: Option<Sweetness>,
    #[serde(default)]
    pub ice_level: Option<IceLevel>,
}

impl Customization {
    /// Whether no option was chosen.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.sweetness.is_none() && self.ice_level.is_none()
    }

    /// Keep only the choices the product offers.
    ///
    /// Clients may send both fields regardless of the product, so an
    /// unsupported choice is dropped rather than rejected.
    #[must_use]
    pub const fn restrict_to(self, has_sweetness: bool, has_ice_level: bool) -> Self {
        Self {
            sweetness: if has_sweetness { self.sweetness } else { None },
            ice_level: if has_ice_level { self.ice_level } else { None },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sweetness_accepts_string_and_number() {
        let s: Sweetness = serde_json::from_str("\"7\"").unwrap();
        assert_eq!(s, Sweetness::Most);
        let s: Sweetness = serde_json::from_str("10").unwrap();
        assert_eq!(s, Sweetness::Full);
        assert!(serde_json::from_str::<Sweetness>("\"4\"").is_err());
        assert!(serde_json::from_str::<Sweetness>("-3").is_err());
    }

    #[test]
    fn test_sweetness_serializes_as_string() {
        for s in Sweetness::ALL {
            let json = serde_json::to_string(&s).unwrap();
            assert_eq!(json, format!("\"{}\"", s.level()));
        }
    }

    #[test]
    fn test_customization_json_shape() {
        let c: Customization =
            serde_json::from_str(r#"{"sweetness":"3","iceLevel":"less"}"#).unwrap();
        assert_eq!(c.sweetness, Some(Sweetness::Light));
        assert_eq!(c.ice_level, Some(IceLevel::Less));

        let value = serde_json::to_value(Customization::default()).unwrap();
        assert_eq!(value, serde_json::json!({"sweetness": null, "iceLevel": null}));
    }

    #[test]
    fn test_customization_missing_fields_default_to_none() {
        let c: Customization = serde_json::from_str("{}").unwrap();
        assert!(c.is_empty());
    }

    #[test]
    fn test_invalid_ice_level_rejected() {
        assert!(serde_json::from_str::<Customization>(r#"{"iceLevel":"extra"}"#).is_err());
    }

    #[test]
    fn test_restrict_to_ice_only_product() {
        let c: Customization =
            serde_json::from_str(r#"{"sweetness":"3","iceLevel":"normal"}"#).unwrap();

        let kept = c.restrict_to(false, true);
        assert_eq!(kept.sweetness, None);
        assert_eq!(kept.ice_level, Some(IceLevel::Normal));
    }

    #[test]
    fn test_restrict_to_product_options() {
        let c = Customization {
            sweetness: Some(Sweetness::Half),
            ice_level: Some(IceLevel::Less),
        };
        assert_eq!(c.restrict_to(true, true), c);
        assert_eq!(c.restrict_to(true, false).ice_level, None);
        assert!(c.restrict_to(false, false).is_empty());
    }
}
