use serde::{Deserialize, Serialize};

pub const MID_RANGE_THRESHOLD: f64 = 3_000_000.0;
pub const PREMIUM_THRESHOLD: f64 = 5_000_000.0;

/// Coarse price bucket derived from a continuous predicted price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum PriceClass {
    Budget,
    MidRange,
    Premium,
}

impl PriceClass {
    pub fn tier(self) -> u8 {
        match self {
            Self::Budget => 1,
            Self::MidRange => 2,
            Self::Premium => 3,
        }
    }
}

impl From<PriceClass> for u8 {
    fn from(value: PriceClass) -> Self {
        value.tier()
    }
}

impl TryFrom<u8> for PriceClass {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Budget),
            2 => Ok(Self::MidRange),
            3 => Ok(Self::Premium),
            other => Err(format!("price class tier must be 1, 2 or 3, got {other}")),
        }
    }
}

pub fn classify_price(price: f64) -> PriceClass {
    if price < MID_RANGE_THRESHOLD {
        PriceClass::Budget
    } else if price < PREMIUM_THRESHOLD {
        PriceClass::MidRange
    } else {
        PriceClass::Premium
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_threshold_boundaries() {
        assert_eq!(classify_price(2_999_999.0).tier(), 1);
        assert_eq!(classify_price(3_000_000.0).tier(), 2);
        assert_eq!(classify_price(4_999_999.0).tier(), 2);
        assert_eq!(classify_price(5_000_000.0).tier(), 3);
    }

    #[test]
    fn classifies_extremes() {
        assert_eq!(classify_price(0.0), PriceClass::Budget);
        assert_eq!(classify_price(-12.5), PriceClass::Budget);
        assert_eq!(classify_price(2_999_999.99), PriceClass::Budget);
        assert_eq!(classify_price(1.0e12), PriceClass::Premium);
    }

    #[test]
    fn serializes_as_integer_tier() {
        let encoded = serde_json::to_string(&PriceClass::MidRange).expect("class should serialize");
        assert_eq!(encoded, "2");

        let decoded: PriceClass = serde_json::from_str("3").expect("tier should parse");
        assert_eq!(decoded, PriceClass::Premium);
        assert!(serde_json::from_str::<PriceClass>("4").is_err());
    }
}
