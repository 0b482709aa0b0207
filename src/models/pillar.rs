use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the six Well-Architected Framework pillars used to tag notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pillar {
    CostOptimization,
    PerformanceEfficiency,
    Reliability,
    Security,
    OperationalExcellence,
    Sustainability,
}

impl Pillar {
    /// All pillars in declaration order.
    pub const ALL: [Pillar; 6] = [
        Pillar::CostOptimization,
        Pillar::PerformanceEfficiency,
        Pillar::Reliability,
        Pillar::Security,
        Pillar::OperationalExcellence,
        Pillar::Sustainability,
    ];

    /// Returns the canonical slug stored in the category tag set.
    pub fn slug(self) -> &'static str {
        match self {
            Self::CostOptimization => "cost-optimization",
            Self::PerformanceEfficiency => "performance-efficiency",
            Self::Reliability => "reliability",
            Self::Security => "security",
            Self::OperationalExcellence => "operational-excellence",
            Self::Sustainability => "sustainability",
        }
    }

    /// Returns the human-readable title-case name.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::CostOptimization => "Cost Optimization",
            Self::PerformanceEfficiency => "Performance Efficiency",
            Self::Reliability => "Reliability",
            Self::Security => "Security",
            Self::OperationalExcellence => "Operational Excellence",
            Self::Sustainability => "Sustainability",
        }
    }

    /// Looks up a pillar by its canonical slug. Exact match only.
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.slug() == slug)
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_round_trip_through_from_slug() {
        for pillar in Pillar::ALL {
            assert_eq!(Pillar::from_slug(pillar.slug()), Some(pillar));
        }
    }

    #[test]
    fn from_slug_rejects_display_names() {
        assert_eq!(Pillar::from_slug("Cost Optimization"), None);
        assert_eq!(Pillar::from_slug("cost optimization"), None);
    }

    #[test]
    fn serde_uses_kebab_case_slugs() {
        let json = serde_json::to_string(&Pillar::OperationalExcellence).unwrap();
        assert_eq!(json, "\"operational-excellence\"");

        let back: Pillar = serde_json::from_str("\"performance-efficiency\"").unwrap();
        assert_eq!(back, Pillar::PerformanceEfficiency);
    }

    #[test]
    fn display_writes_slug() {
        assert_eq!(Pillar::Security.to_string(), "security");
    }
}
