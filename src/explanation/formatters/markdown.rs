use crate::engine::{RecommendationResult, ResultKind, RuleStatus};
use crate::explanation::phrasing::influence_sentence;
use crate::explanation::Language;
use crate::utils::display_name;

/// Section headings per language
struct Headings {
    recommended: &'static str,
    reasons: &'static str,
    companions: &'static str,
    avoid: &'static str,
    sensors: &'static str,
    notes: &'static str,
    not_found: &'static str,
    compatibility: &'static str,
    conflict: &'static str,
    no_conflict: &'static str,
    suggestions: &'static str,
    unknown: &'static str,
    range: &'static str,
}

const ENGLISH: Headings = Headings {
    recommended: "Recommended crop",
    reasons: "Why this crop?",
    companions: "Companion plants",
    avoid: "Avoid planting near",
    sensors: "Suggested sensors",
    notes: "Notes",
    not_found: "No companion data for this crop.",
    compatibility: "Compatibility check",
    conflict: "Conflict detected! These plants shouldn't be planted together",
    no_conflict: "No conflicts found between your selected plants.",
    suggestions: "Good companion options to consider",
    unknown: "No rule entry for",
    range: "Outside the usual range",
};

const FRENCH: Headings = Headings {
    recommended: "Culture recommandée",
    reasons: "Pourquoi cette culture ?",
    companions: "Plantes compagnes",
    avoid: "À éviter à proximité",
    sensors: "Capteurs suggérés",
    notes: "Remarques",
    not_found: "Aucune donnée de compagnonnage pour cette culture.",
    compatibility: "Vérification de compatibilité",
    conflict: "Conflit détecté ! Ces plantes ne doivent pas être cultivées ensemble",
    no_conflict: "Aucun conflit entre les plantes sélectionnées.",
    suggestions: "Bonnes plantes compagnes à envisager",
    unknown: "Aucune règle pour",
    range: "Hors de la plage habituelle",
};

fn headings(language: Language) -> &'static Headings {
    match language {
        Language::English => &ENGLISH,
        Language::French => &FRENCH,
    }
}

fn join_display<'a>(names: impl IntoIterator<Item = &'a String>) -> String {
    names
        .into_iter()
        .map(|n| display_name(n))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Markdown formatter for recommendation results
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    /// Format result as markdown
    pub fn format(result: &RecommendationResult) -> String {
        let mut md = String::with_capacity(1024);
        match result.kind {
            ResultKind::Recommendation => Self::format_recommendation(&mut md, result),
            ResultKind::Compatibility => Self::format_compatibility(&mut md, result),
        }
        md
    }

    fn format_recommendation(md: &mut String, result: &RecommendationResult) {
        let h = headings(result.language);
        let crop = result.crop().unwrap_or_default();

        md.push_str(&format!("# {}: {}\n\n", h.recommended, display_name(crop)));
        if let Some(p) = result.probabilities.get(crop) {
            md.push_str(&format!("**Confidence:** {:.0}%\n\n", p * 100.0));
        }

        if !result.range_warnings.is_empty() {
            md.push_str(&format!("> **{}:** ", h.range));
            let parts: Vec<String> = result
                .range_warnings
                .iter()
                .map(|w| format!("{} = {}", w.feature.code(), w.value))
                .collect();
            md.push_str(&parts.join(", "));
            md.push_str("\n\n");
        }

        if let Some(explanation) = &result.explanation {
            md.push_str(&format!("## {}\n\n", h.reasons));
            for influence in &explanation.influences {
                md.push_str(&format!(
                    "- {} *({:+.3})*\n",
                    influence_sentence(&influence.description, influence.direction, result.language),
                    influence.weight
                ));
            }
            md.push('\n');
        }

        if let Some(text) = &result.justification {
            md.push_str(&format!("> {}\n\n", text));
        }

        if result.rule_status == RuleStatus::NotFound {
            md.push_str(&format!("_{}_\n", h.not_found));
            return;
        }

        md.push_str(&format!("### {}\n\n{}\n\n", h.companions, join_display(&result.companions)));
        md.push_str(&format!("### {}\n\n{}\n\n", h.avoid, join_display(&result.conflicts)));
        if !result.sensors.is_empty() {
            md.push_str(&format!("### {}\n\n{}\n\n", h.sensors, result.sensors.join(", ")));
        }
        Self::format_notes(md, result, h);
    }

    fn format_compatibility(md: &mut String, result: &RecommendationResult) {
        let h = headings(result.language);
        md.push_str(&format!("# {}\n\n", h.compatibility));

        if result.conflicts.is_empty() {
            md.push_str(&format!("✅ {}\n\n", h.no_conflict));
        } else {
            md.push_str(&format!("⚠️ {}: {}\n\n", h.conflict, join_display(&result.conflicts)));
            for pair in &result.conflict_pairs {
                md.push_str(&format!(
                    "- {} → {}\n",
                    display_name(&pair.plant),
                    display_name(&pair.avoids)
                ));
            }
            md.push('\n');
        }

        if !result.companions.is_empty() {
            md.push_str(&format!("👍 {}: {}\n\n", h.suggestions, join_display(&result.companions)));
        }

        if !result.unknown_plants.is_empty() {
            md.push_str(&format!("_{}: {}_\n\n", h.unknown, join_display(&result.unknown_plants)));
        }

        Self::format_notes(md, result, h);
    }

    fn format_notes(md: &mut String, result: &RecommendationResult, h: &Headings) {
        if result.notes.is_empty() {
            return;
        }
        md.push_str(&format!("### {}\n\n", h.notes));
        for note in &result.notes {
            md.push_str(&format!("**{}**: {}\n\n", display_name(&note.plant), note.note));
        }
    }
}
