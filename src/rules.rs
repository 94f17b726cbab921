//! Plant companion/conflict rule database
//!
//! One entry per plant: companions, plants to avoid, suggested sensors and
//! notes (optionally localised). Loaded once at startup, validated, and
//! indexed by canonical (trimmed, lower-case) name. Read-only afterwards.

use crate::error::{AdvisorError, AdvisorResult};
use crate::explanation::Language;
use crate::utils::{canonicalize, display_name};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// Entry as written in the rule file
#[derive(Debug, Clone, Deserialize)]
struct RawPlantRule {
    plant: String,
    #[serde(default)]
    companions: Vec<String>,
    #[serde(default)]
    avoid: Vec<String>,
    #[serde(default)]
    sensors: Vec<String>,
    #[serde(default)]
    notes: String,
    /// Language name → note, e.g. {"French": "..."}
    #[serde(default, alias = "notes_translations")]
    notes_i18n: BTreeMap<String, String>,
}

/// Validated rule for one plant; all names canonical
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantRule {
    pub plant: String,
    pub companions: BTreeSet<String>,
    pub avoid: BTreeSet<String>,
    /// Kept in file order
    pub sensors: Vec<String>,
    pub notes: String,
    pub notes_i18n: BTreeMap<String, String>,
}

impl PlantRule {
    /// Notes in `language`, falling back to the default notes
    pub fn notes_in(&self, language: Language) -> &str {
        self.notes_i18n
            .get(language.name())
            .map(String::as_str)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.notes)
    }

    pub fn display_name(&self) -> String {
        display_name(&self.plant)
    }

    fn from_raw(raw: RawPlantRule, index: usize) -> AdvisorResult<Self> {
        let plant = canonicalize(&raw.plant);
        if plant.is_empty() {
            return Err(AdvisorError::configuration(format!(
                "rule entry {} has an empty plant name",
                index
            )));
        }

        let companions = canonical_set(&plant, "companions", raw.companions)?;
        let avoid = canonical_set(&plant, "avoid", raw.avoid)?;

        Ok(Self {
            plant,
            companions,
            avoid,
            sensors: raw
                .sensors
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            notes: raw.notes.trim().to_string(),
            notes_i18n: raw.notes_i18n,
        })
    }
}

fn canonical_set(plant: &str, field: &str, names: Vec<String>) -> AdvisorResult<BTreeSet<String>> {
    let mut set = BTreeSet::new();
    for name in names {
        let name = canonicalize(&name);
        if name.is_empty() {
            continue;
        }
        if name == plant {
            return Err(AdvisorError::configuration(format!(
                "plant '{}' lists itself in {}",
                plant, field
            )));
        }
        set.insert(name);
    }
    Ok(set)
}

/// Result of a single-plant lookup
///
/// `NotFound` means there is no rule entry at all; a found rule can still have
/// empty companion and avoid sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlantLookup<'a> {
    Found(&'a PlantRule),
    NotFound,
}

impl<'a> PlantLookup<'a> {
    pub fn rule(self) -> Option<&'a PlantRule> {
        match self {
            PlantLookup::Found(rule) => Some(rule),
            PlantLookup::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, PlantLookup::Found(_))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    rules: FxHashMap<String, PlantRule>,
}

impl RuleStore {
    /// Load and validate the rule file (JSON array of entries)
    pub fn load(path: &Path) -> AdvisorResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            AdvisorError::configuration(format!("failed to read rule database {:?}: {}", path, e))
        })?;
        let store = Self::from_json_str(&contents).map_err(|e| match e {
            AdvisorError::Configuration(msg) => {
                AdvisorError::configuration(format!("{:?}: {}", path, msg))
            }
            other => other,
        })?;
        tracing::info!("Loaded {} plant rules from {:?}", store.len(), path);
        Ok(store)
    }

    pub fn from_json_str(contents: &str) -> AdvisorResult<Self> {
        let raw: Vec<RawPlantRule> = serde_json::from_str(contents)
            .map_err(|e| AdvisorError::configuration(format!("invalid rule database: {}", e)))?;
        let rules = raw
            .into_iter()
            .enumerate()
            .map(|(idx, r)| PlantRule::from_raw(r, idx))
            .collect::<AdvisorResult<Vec<_>>>()?;
        Self::from_rules(rules)
    }

    /// Index already-built rules; duplicate plant names are rejected
    pub fn from_rules(rules: Vec<PlantRule>) -> AdvisorResult<Self> {
        let mut index = FxHashMap::default();
        for rule in rules {
            let key = canonicalize(&rule.plant);
            if index.contains_key(&key) {
                return Err(AdvisorError::configuration(format!(
                    "plant '{}' appears more than once",
                    key
                )));
            }
            index.insert(key, rule);
        }

        let store = Self { rules: index };
        let dangling = store.dangling_references();
        if !dangling.is_empty() {
            tracing::warn!(
                "Rule database references {} plants without their own entry: {:?}",
                dangling.len(),
                dangling
            );
        }
        Ok(store)
    }

    /// Case-insensitive lookup
    pub fn lookup(&self, name: &str) -> PlantLookup<'_> {
        match self.rules.get(&canonicalize(name)) {
            Some(rule) => PlantLookup::Found(rule),
            None => PlantLookup::NotFound,
        }
    }

    /// Lookup as a `Result`, for callers that propagate absence
    pub fn get(&self, name: &str) -> AdvisorResult<&PlantRule> {
        self.lookup(name)
            .rule()
            .ok_or_else(|| AdvisorError::NotFound(name.trim().to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_found()
    }

    /// Canonical names, sorted
    pub fn plant_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Capitalised names for selection lists, sorted
    pub fn display_names(&self) -> Vec<String> {
        self.plant_names().into_iter().map(display_name).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlantRule> {
        self.rules.values()
    }

    /// Names mentioned in companion/avoid sets that have no entry of their own
    pub fn dangling_references(&self) -> BTreeSet<String> {
        self.rules
            .values()
            .flat_map(|r| r.companions.iter().chain(r.avoid.iter()))
            .filter(|name| !self.rules.contains_key(*name))
            .cloned()
            .collect()
    }
}
