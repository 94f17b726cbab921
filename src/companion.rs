//! Companion and conflict resolution
//!
//! Pure set algebra over an immutable `RuleStore`:
//!
//! - companions = (∪ companions of selected) − selected
//! - conflicts  = (∪ avoid of selected) ∩ selected
//!
//! Unknown plants contribute nothing to either union but stay in the
//! selection, so another plant's avoid list can still flag them. Conflicts
//! are not symmetric: A avoiding B flags B only.

use crate::explanation::Language;
use crate::rules::{PlantLookup, RuleStore};
use crate::utils::canonicalize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// "`plant`'s rule says to keep it away from `avoids`"
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConflictPair {
    pub plant: String,
    pub avoids: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantNote {
    pub plant: String,
    pub note: String,
}

/// Outcome of a multi-plant compatibility check; all names canonical
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityReport {
    pub selected: BTreeSet<String>,
    /// Suggested additions, never in `selected`
    pub companions: BTreeSet<String>,
    /// Selected plants flagged by some selected plant's avoid list
    pub conflicts: BTreeSet<String>,
    /// Which rule produced each conflict
    pub conflict_pairs: Vec<ConflictPair>,
    /// Selected plants without a rule entry
    pub unknown: BTreeSet<String>,
    /// Notes of the known selected plants, in name order
    pub notes: Vec<PlantNote>,
}

impl CompatibilityReport {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CompanionResolver<'a> {
    rules: &'a RuleStore,
}

impl<'a> CompanionResolver<'a> {
    pub fn new(rules: &'a RuleStore) -> Self {
        Self { rules }
    }

    /// Rule for a single crop (e.g. the predicted one)
    pub fn lookup(&self, crop: &str) -> PlantLookup<'a> {
        self.rules.lookup(crop)
    }

    /// Companions and conflicts for a selection of plants
    pub fn check<I, S>(&self, selected: I, language: Language) -> CompatibilityReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let selected: BTreeSet<String> = selected
            .into_iter()
            .map(|name| canonicalize(name.as_ref()))
            .filter(|name| !name.is_empty())
            .collect();

        let mut report = CompatibilityReport::default();

        for name in &selected {
            let rule = match self.rules.lookup(name) {
                PlantLookup::Found(rule) => rule,
                PlantLookup::NotFound => {
                    report.unknown.insert(name.clone());
                    continue;
                }
            };

            report.companions.extend(
                rule.companions
                    .iter()
                    .filter(|c| !selected.contains(*c))
                    .cloned(),
            );

            for avoided in rule.avoid.iter().filter(|a| selected.contains(*a)) {
                report.conflicts.insert(avoided.clone());
                report.conflict_pairs.push(ConflictPair {
                    plant: name.clone(),
                    avoids: avoided.clone(),
                });
            }

            let note = rule.notes_in(language);
            if !note.is_empty() {
                report.notes.push(PlantNote {
                    plant: name.clone(),
                    note: note.to_string(),
                });
            }
        }

        if !report.unknown.is_empty() {
            tracing::warn!("Compatibility check: no rules for {:?}", report.unknown);
        }

        report.selected = selected;
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn store() -> RuleStore {
        RuleStore::from_json_str(
            r#"[
                {"plant": "tomato", "companions": ["basil", "carrot", "onion"], "avoid": ["cabbage", "potato"], "notes": "Stake early."},
                {"plant": "cabbage", "companions": ["onion", "celery"], "avoid": ["strawberry"], "notes": "Heavy feeder."},
                {"plant": "carrot", "companions": ["onion", "tomato"], "avoid": ["dill"]},
                {"plant": "onion", "companions": ["carrot"], "avoid": ["beans", "peas"]},
                {"plant": "beans", "companions": ["corn", "carrot"], "avoid": ["onion", "garlic"]}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_empty_selection() {
        let rules = store();
        let report = CompanionResolver::new(&rules).check(Vec::<String>::new(), Language::English);
        assert!(report.companions.is_empty());
        assert!(report.conflicts.is_empty());
        assert!(report.notes.is_empty());
    }

    #[test]
    fn test_one_way_conflict() {
        let rules = store();
        let report = CompanionResolver::new(&rules).check(["Tomato", "cabbage"], Language::English);
        // tomato avoids cabbage; cabbage does not avoid tomato
        assert_eq!(report.conflicts, BTreeSet::from(["cabbage".to_string()]));
        assert_eq!(
            report.conflict_pairs,
            vec![ConflictPair {
                plant: "tomato".into(),
                avoids: "cabbage".into()
            }]
        );
        assert!(report.companions.contains("onion"));
        assert!(report.companions.contains("basil"));
        assert_eq!(report.notes.len(), 2);
    }

    #[test]
    fn test_mutual_conflict() {
        let rules = store();
        let report = CompanionResolver::new(&rules).check(["onion", "beans"], Language::English);
        assert_eq!(
            report.conflicts,
            BTreeSet::from(["beans".to_string(), "onion".to_string()])
        );
        assert_eq!(report.conflict_pairs.len(), 2);
    }

    #[test]
    fn test_unknown_plant_can_be_flagged_but_declares_nothing() {
        let rules = store();
        let resolver = CompanionResolver::new(&rules);
        // potato has no entry, tomato's avoid list names it
        let report = resolver.check(["potato", "tomato"], Language::English);
        assert!(report.conflicts.contains("potato"));
        assert_eq!(report.unknown, BTreeSet::from(["potato".to_string()]));

        let alone = resolver.check(["potato"], Language::English);
        assert!(alone.companions.is_empty());
        assert!(alone.conflicts.is_empty());
    }

    #[test]
    fn test_companions_exclude_selection() {
        let rules = store();
        let report = CompanionResolver::new(&rules).check(["carrot", "onion"], Language::English);
        assert!(!report.companions.contains("onion"));
        assert!(!report.companions.contains("carrot"));
        assert!(report.companions.contains("tomato"));
    }

    const POOL: &[&str] = &[
        "tomato", "cabbage", "carrot", "onion", "beans", "potato", "basil", "garlic", "unicorn-fruit",
    ];

    proptest! {
        #[test]
        fn prop_conflicts_subset_companions_disjoint(
            picks in proptest::sample::subsequence(POOL.to_vec(), 0..POOL.len()),
            upper in any::<bool>(),
        ) {
            let rules = store();
            let names: Vec<String> = picks
                .iter()
                .map(|p| if upper { p.to_uppercase() } else { p.to_string() })
                .collect();
            let report = CompanionResolver::new(&rules).check(&names, Language::English);

            prop_assert!(report.conflicts.is_subset(&report.selected));
            prop_assert!(report.companions.is_disjoint(&report.selected));
            for pair in &report.conflict_pairs {
                prop_assert!(report.selected.contains(&pair.plant));
                prop_assert!(report.conflicts.contains(&pair.avoids));
            }
        }

        #[test]
        fn prop_order_and_case_do_not_matter(
            picks in proptest::sample::subsequence(POOL.to_vec(), 0..POOL.len()),
        ) {
            let rules = store();
            let resolver = CompanionResolver::new(&rules);
            let forward = resolver.check(picks.iter().copied(), Language::English);
            let reversed: Vec<String> = picks.iter().rev().map(|p| format!(" {} ", p.to_uppercase())).collect();
            let backward = resolver.check(&reversed, Language::English);
            prop_assert_eq!(forward, backward);
        }
    }
}
