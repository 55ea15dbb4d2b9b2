use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Authorization level required to execute a metric, ordered lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, EnumString, IntoStaticStr, Deserialize, Serialize)]
pub enum Tier {
    #[strum(serialize = "TIER_1")]
    #[serde(rename = "TIER_1")]
    Tier1,

    #[strum(serialize = "TIER_2")]
    #[serde(rename = "TIER_2")]
    Tier2,

    #[strum(serialize = "TIER_3")]
    #[serde(rename = "TIER_3")]
    Tier3,
}

impl Tier {
    /// Rank of this tier, starting at 1 for the lowest tier
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Tier1 => 1,
            Self::Tier2 => 2,
            Self::Tier3 => 3,
        }
    }

    /// Rank of a tier name supplied by a caller. Unrecognized names rank 0, below every tier.
    #[must_use]
    pub fn rank_of(name: &str) -> u8 {
        name.trim().parse::<Self>().map_or(0, Self::rank)
    }

    /// Whether a caller holding `requested` may execute a metric that requires `self`
    #[must_use]
    pub fn admits(self, requested: &str) -> bool {
        Self::rank_of(requested) >= self.rank()
    }

    #[must_use]
    pub const fn highest() -> Self {
        Self::Tier3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_three_ordered_levels() {
        let tiers: Vec<_> = Tier::iter().collect();
        assert_eq!(tiers, vec![Tier::Tier1, Tier::Tier2, Tier::Tier3]);
        assert!(Tier::Tier1 < Tier::Tier2 && Tier::Tier2 < Tier::Tier3);
        assert_eq!(Tier::highest(), Tier::Tier3);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("TIER_2".parse::<Tier>().unwrap(), Tier::Tier2);
        assert_eq!(Tier::Tier3.to_string(), "TIER_3");
        let name: &'static str = Tier::Tier1.into();
        assert_eq!(name, "TIER_1");
    }

    #[test]
    fn test_unknown_tier_ranks_zero() {
        assert_eq!(Tier::rank_of("TIER_9"), 0);
        assert_eq!(Tier::rank_of(""), 0);
        assert_eq!(Tier::rank_of("tier_1"), 0);
        assert_eq!(Tier::rank_of(" TIER_1 "), 1);
    }

    #[test]
    fn test_authorization_is_monotonic() {
        for required in Tier::iter() {
            for requested in Tier::iter() {
                let admitted = required.admits(requested.into());
                assert_eq!(admitted, requested >= required, "{requested} for {required}");

                if admitted {
                    for higher in Tier::iter().filter(|t| *t >= requested) {
                        assert!(required.admits(higher.into()));
                    }
                }
            }
            assert!(!required.admits("UNKNOWN"));
        }
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Tier::Tier2).unwrap();
        assert_eq!(json, "\"TIER_2\"");
        let tier: Tier = serde_json::from_str("\"TIER_3\"").unwrap();
        assert_eq!(tier, Tier::Tier3);
    }
}
