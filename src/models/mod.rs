use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Full nutrition report returned by the strict-JSON strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredAnalysis {
    pub food_name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub confidence: f64,
    #[serde(default, deserialize_with = "lenient_meal_type", skip_serializing_if = "Option::is_none")]
    pub meal_type: Option<MealType>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub portion_size: String,
    pub nutrition: Nutrition,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ingredients: Vec<Ingredient>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scores: Scores,
    #[serde(default, deserialize_with = "null_as_default")]
    pub quality: Quality,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_impact: Option<GoalImpact>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub health_benefits: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommendations: Vec<Recommendation>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub improvements: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_goals_comparison: Option<DailyGoalsComparison>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_meal_suggestion: Option<NextMealSuggestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glycemic_info: Option<GlycemicInfo>,
}

impl StructuredAnalysis {
    /// Clamp every 0-100 field into range. Models occasionally drift outside it.
    pub fn normalize(mut self) -> Self {
        self.confidence = clamp_percent(self.confidence);
        let s = &mut self.scores;
        for score in [
            &mut s.overall,
            &mut s.protein,
            &mut s.carbs,
            &mut s.fat,
            &mut s.micronutrients,
            &mut s.balance,
        ] {
            *score = clamp_percent(*score);
        }
        if let Some(impact) = self.goal_impact.as_mut() {
            impact.alignment = clamp_percent(impact.alignment);
        }
        self
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nutrition {
    #[serde(deserialize_with = "lenient_f64")]
    pub calories: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub protein: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub carbs: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fat: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fiber: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub sugar: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub sodium: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub cholesterol: f64,
    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    pub potassium: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    pub calcium: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    pub iron: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    pub vitamin_c: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub amount: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub calories: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub benefits: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub overall: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub protein: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub carbs: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fat: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub micronutrients: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub balance: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quality {
    #[serde(default, deserialize_with = "lenient_quality_level", skip_serializing_if = "Option::is_none")]
    pub level: Option<QualityLevel>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub color: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalImpact {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub alignment: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub calories_fit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein_bonus: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub icon: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub consumed: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub goal: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyGoalsComparison {
    pub calories: GoalProgress,
    pub protein: GoalProgress,
    pub carbs: GoalProgress,
    pub fat: GoalProgress,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextMealSuggestion {
    #[serde(default, deserialize_with = "lenient_string")]
    pub time: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlycemicInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub index: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub impact: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl std::fmt::Display for MealType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MealType::Breakfast => "Café da Manhã",
            MealType::Lunch => "Almoço",
            MealType::Dinner => "Jantar",
            MealType::Snack => "Lanche",
        };
        write!(f, "{}", s)
    }
}

impl MealType {
    pub fn from_string(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "café da manhã" | "cafe da manha" | "breakfast" => Some(MealType::Breakfast),
            "almoço" | "almoco" | "lunch" => Some(MealType::Lunch),
            "jantar" | "dinner" => Some(MealType::Dinner),
            "lanche" | "snack" => Some(MealType::Snack),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityLevel {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl QualityLevel {
    pub fn from_string(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "excelente" | "excellent" => Some(QualityLevel::Excellent),
            "boa" | "bom" | "good" => Some(QualityLevel::Good),
            "regular" | "fair" => Some(QualityLevel::Fair),
            "ruim" | "poor" => Some(QualityLevel::Poor),
            _ => None,
        }
    }
}

// The model echoes the labels it was prompted with, sometimes as
// "Almoço/Jantar". Anything unrecognised becomes None instead of failing
// the whole report.
fn lenient_meal_type<'de, D>(deserializer: D) -> Result<Option<MealType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(MealType::from_string))
}

fn lenient_quality_level<'de, D>(deserializer: D) -> Result<Option<QualityLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(QualityLevel::from_string))
}

// Models answer `null` or "120" for figures they cannot estimate. Those
// become 0 (or absent) instead of rejecting an otherwise valid report.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number_from_value(&Value::deserialize(deserializer)?).unwrap_or(0.0))
}

fn lenient_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number_from_value(&Value::deserialize(deserializer)?))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_localized_number(s),
        _ => None,
    }
}

/// Parse a number written either way the model tends to write it:
/// `1200`, `12.5`, Portuguese `1.200` (thousands) or `12,5` (decimal).
/// Trailing units such as `g` or `kcal` are ignored.
pub fn parse_localized_number(raw: &str) -> Option<f64> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',' || *c == '-')
        .collect();
    if digits.is_empty() {
        return None;
    }

    let normalized = if digits.contains(',') {
        // 1.234,5
        digits.replace('.', "").replace(',', ".")
    } else if is_thousands_grouped(&digits) {
        digits.replace('.', "")
    } else {
        digits
    };

    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// `1.200` or `12.345.678`: every group after the first has three digits.
fn is_thousands_grouped(digits: &str) -> bool {
    let mut groups = digits.trim_start_matches('-').split('.');
    let head = groups.next().unwrap_or_default();
    let tail: Vec<&str> = groups.collect();
    !tail.is_empty()
        && (1..=3).contains(&head.len())
        && tail.iter().all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()))
}

/// Result of the free-text strategy. Zero means "not found", never a
/// measured zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedAnalysis {
    pub full_text: String,
    pub calories: u32,
    pub macros: Macros,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Macros {
    pub protein: u32,
    pub carbs: u32,
    pub fats: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResponse {
    pub success: bool,
    pub analysis: ExtractedAnalysis,
}

/// Body of `POST /api/analyze-food` under the structured strategy.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StructuredRequest {
    #[serde(default)]
    pub image: Option<String>,
}

/// Body of `POST /api/analyze-food` under the extraction strategy.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRequest {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub user_goals: Option<String>,
}
