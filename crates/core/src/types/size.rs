//! T-shirt sizes and per-size stock.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// A garment size offered by the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Size {
    #[serde(rename = "Small")]
    Small,
    #[serde(rename = "Large")]
    Large,
    #[serde(rename = "Extra Large")]
    ExtraLarge,
}

impl Size {
    /// Every size, in display order.
    pub const ALL: [Self; 3] = [Self::Small, Self::Large, Self::ExtraLarge];

    /// The label the backend uses for this size.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Small => "Small",
            Self::Large => "Large",
            Self::ExtraLarge => "Extra Large",
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a size label is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown size '{0}' (expected Small, Large or Extra Large)")]
pub struct ParseSizeError(pub String);

impl FromStr for Size {
    type Err = ParseSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "small" | "s" => Ok(Self::Small),
            "large" | "l" => Ok(Self::Large),
            "extra large" | "extralarge" | "xl" => Ok(Self::ExtraLarge),
            _ => Err(ParseSizeError(s.to_owned())),
        }
    }
}

/// Stock on hand for one size of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeStock {
    pub size: Size,
    pub stock: u32,
}

impl SizeStock {
    /// A size can be bought only while it has stock left.
    #[must_use]
    pub const fn is_purchasable(&self) -> bool {
        self.stock > 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_labels() {
        let json = serde_json::to_string(&Size::ExtraLarge).unwrap();
        assert_eq!(json, "\"Extra Large\"");

        let size: Size = serde_json::from_str("\"Small\"").unwrap();
        assert_eq!(size, Size::Small);
    }

    #[test]
    fn test_parse_is_lenient() {
        assert_eq!("xl".parse::<Size>().unwrap(), Size::ExtraLarge);
        assert_eq!("extra-large".parse::<Size>().unwrap(), Size::ExtraLarge);
        assert_eq!(" LARGE ".parse::<Size>().unwrap(), Size::Large);
        assert_eq!("S".parse::<Size>().unwrap(), Size::Small);
        assert!("medium".parse::<Size>().is_err());
    }

    #[test]
    fn test_purchasable() {
        let in_stock = SizeStock {
            size: Size::Large,
            stock: 2,
        };
        let sold_out = SizeStock {
            size: Size::Small,
            stock: 0,
        };
        assert!(in_stock.is_purchasable());
        assert!(!sold_out.is_purchasable());
    }
}
