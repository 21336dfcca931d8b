use regex::Regex;
use std::sync::OnceLock;

use crate::error::AnalysisError;
use crate::models::{parse_localized_number, ExtractedAnalysis, Macros, StructuredAnalysis};

/// Remove Markdown code fences (```json and ```) wherever they appear.
pub fn strip_code_fences(content: &str) -> String {
    content.replace("```json", "").replace("```", "").trim().to_string()
}

/// Strict-JSON strategy. Fails when the content is not JSON or does not
/// match the report contract; the upstream call itself succeeded.
pub fn parse_structured(content: &str) -> Result<StructuredAnalysis, AnalysisError> {
    let cleaned = strip_code_fences(content);
    serde_json::from_str::<StructuredAnalysis>(&cleaned)
        .map(StructuredAnalysis::normalize)
        .map_err(|e| {
            log::error!("❌ Model output is not a valid report: {}", e);
            log::debug!("📄 Received content: {}", content);
            AnalysisError::UnparseableResponse(e.to_string())
        })
}

struct Patterns {
    calories: Regex,
    protein: Regex,
    carbs: Regex,
    fats: Regex,
}

// "1.200" (thousands), "450,5" (decimal) or a plain run of digits.
const NUMBER: &str = r"(\d{1,3}(?:\.\d{3})+|\d+(?:,\d+)?)";

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let labelled = |label: &str| {
            Regex::new(&format!(r"(?i){}\s*:?\s*{}", label, NUMBER))
                .expect("macro pattern is valid")
        };
        Patterns {
            // "450 kcal", "450 calorias" or "Calorias: 450"
            calories: Regex::new(&format!(
                r"(?i){n}\s*(?:kcal|calorias)|calorias\s*:?\s*{n}",
                n = NUMBER
            ))
            .expect("calorie pattern is valid"),
            protein: labelled(r"(?:prote[ií]nas?|protein)"),
            carbs: labelled(r"(?:carboidratos?|carbs?)"),
            fats: labelled(r"(?:gorduras?|fats?)"),
        }
    })
}

/// First number captured by `pattern`, rounded, or 0.
fn first_number(pattern: &Regex, text: &str) -> u32 {
    pattern
        .captures(text)
        .and_then(|caps| caps.iter().skip(1).flatten().next())
        .and_then(|m| parse_localized_number(m.as_str()))
        .map(|n| n.round() as u32)
        .unwrap_or(0)
}

/// Free-text strategy. Never fails: anything not found is 0.
pub fn extract_nutrition(text: &str) -> ExtractedAnalysis {
    let p = patterns();
    let calories = first_number(&p.calories, text);
    let macros = Macros {
        protein: first_number(&p.protein, text),
        carbs: first_number(&p.carbs, text),
        fats: first_number(&p.fats, text),
    };

    if calories == 0 {
        log::warn!("Could not find a calorie count in model output, reporting 0");
    }

    ExtractedAnalysis {
        full_text: text.to_string(),
        calories,
        macros,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}
