//! Canonicalization of free-form category labels into pillar slugs.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use crate::models::Pillar;

/// Lower-cased label variants for every pillar: the slug itself, the
/// spaced display name and the display name with spaces removed.
static PILLAR_ALIASES: LazyLock<HashMap<String, Pillar>> = LazyLock::new(|| {
    let mut table = HashMap::new();
    for pillar in Pillar::ALL {
        let spaced = pillar.display_name().to_lowercase();
        table.insert(spaced.replace(' ', ""), pillar);
        table.insert(spaced, pillar);
        table.insert(pillar.slug().to_string(), pillar);
    }
    table
});

/// Maps category labels produced by people or models onto pillar slugs.
pub struct PillarNormalizer;

impl PillarNormalizer {
    /// Normalizes a single label.
    ///
    /// Known variants of the six pillars map to their canonical slug. Any
    /// other label is lower-cased with each whitespace run replaced by one
    /// hyphen; that result is not guaranteed to be a pillar.
    ///
    /// # Examples
    ///
    /// ```
    /// use quiznote::PillarNormalizer;
    ///
    /// assert_eq!(PillarNormalizer::normalize("Cost Optimization"), "cost-optimization");
    /// assert_eq!(PillarNormalizer::normalize("cost-optimization"), "cost-optimization");
    /// assert_eq!(PillarNormalizer::normalize("Data  Governance"), "data-governance");
    /// ```
    #[must_use]
    pub fn normalize(label: &str) -> String {
        let lowered = label.trim().to_lowercase();
        if let Some(pillar) = PILLAR_ALIASES.get(&lowered) {
            return pillar.slug().to_string();
        }

        lowered.split_whitespace().collect::<Vec<_>>().join("-")
    }

    /// Normalizes the label and resolves it to a `Pillar` when it is one.
    pub fn pillar(label: &str) -> Option<Pillar> {
        Pillar::from_slug(&Self::normalize(label))
    }

    /// Normalizes a collection of labels, dropping empties and duplicates.
    pub fn normalize_all<I, S>(labels: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        labels
            .into_iter()
            .map(|label| Self::normalize(label.as_ref()))
            .filter(|slug| !slug.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_slugs_are_unchanged() {
        for pillar in Pillar::ALL {
            assert_eq!(PillarNormalizer::normalize(pillar.slug()), pillar.slug());
        }
    }

    #[test]
    fn title_case_names_map_to_slugs() {
        assert_eq!(
            PillarNormalizer::normalize("Cost Optimization"),
            "cost-optimization"
        );
        assert_eq!(
            PillarNormalizer::normalize("Performance Efficiency"),
            "performance-efficiency"
        );
        assert_eq!(
            PillarNormalizer::normalize("Operational Excellence"),
            "operational-excellence"
        );
        assert_eq!(PillarNormalizer::normalize("Reliability"), "reliability");
        assert_eq!(PillarNormalizer::normalize("Security"), "security");
        assert_eq!(
            PillarNormalizer::normalize("Sustainability"),
            "sustainability"
        );
    }

    #[test]
    fn lookup_is_case_insensitive_with_or_without_spaces() {
        assert_eq!(
            PillarNormalizer::normalize("cost optimization"),
            "cost-optimization"
        );
        assert_eq!(
            PillarNormalizer::normalize("COST OPTIMIZATION"),
            "cost-optimization"
        );
        assert_eq!(
            PillarNormalizer::normalize("CostOptimization"),
            "cost-optimization"
        );
        assert_eq!(
            PillarNormalizer::normalize("  Security  "),
            "security"
        );
    }

    #[test]
    fn unknown_labels_fall_back_to_hyphenated_lowercase() {
        assert_eq!(
            PillarNormalizer::normalize("Data Governance"),
            "data-governance"
        );
        assert_eq!(
            PillarNormalizer::normalize("High \t Availability\nZone"),
            "high-availability-zone"
        );
        assert_eq!(PillarNormalizer::normalize(""), "");
    }

    #[test]
    fn surrounding_whitespace_never_becomes_hyphens() {
        assert_eq!(
            PillarNormalizer::normalize(" Data Governance "),
            "data-governance"
        );
        assert_eq!(PillarNormalizer::normalize("\tedge caching\n"), "edge-caching");
        assert_eq!(PillarNormalizer::normalize("   "), "");
    }

    #[test]
    fn irregular_spacing_still_reaches_a_pillar() {
        assert_eq!(
            PillarNormalizer::normalize("Cost   Optimization"),
            "cost-optimization"
        );
        assert_eq!(
            PillarNormalizer::pillar("Cost   Optimization"),
            Some(Pillar::CostOptimization)
        );
    }

    #[test]
    fn normalize_is_idempotent() {
        let inputs = [
            "Cost Optimization",
            "cost-optimization",
            "CostOptimization",
            "Data  Governance",
            "  mixed Case\tlabel ",
            "already-hyphen-ated",
            "性能 効率",
            "",
        ];
        for input in inputs {
            let once = PillarNormalizer::normalize(input);
            assert_eq!(PillarNormalizer::normalize(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn normalize_all_deduplicates_and_drops_empties() {
        let slugs = PillarNormalizer::normalize_all([
            "Security",
            "security",
            "   ",
            "Reliability",
        ]);
        assert_eq!(
            slugs.into_iter().collect::<Vec<_>>(),
            vec!["reliability".to_string(), "security".to_string()]
        );
    }

    #[test]
    fn pillar_returns_none_for_unknown_labels() {
        assert_eq!(PillarNormalizer::pillar("Data Governance"), None);
        assert_eq!(
            PillarNormalizer::pillar("operational excellence"),
            Some(Pillar::OperationalExcellence)
        );
    }
}
