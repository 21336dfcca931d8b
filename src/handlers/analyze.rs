use axum::{
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::config::{AnalysisStrategy, AnalyzerConfig};
use crate::error::AnalysisError;
use crate::models::{
    ExtractedAnalysis, ExtractionRequest, ExtractionResponse, StructuredAnalysis, StructuredRequest,
};
use crate::services::image::ImageEncoder;
use crate::services::presentation::{DailyGoals, HealthLabel, MacroBreakdown, MacroTargets};
use crate::services::{interpreter, prompts, VisionModel};

/// What one analysis request asks for, whichever body shape it came in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisInput {
    pub image: Option<String>,
    pub user_goals: Option<String>,
}

impl AnalysisInput {
    /// Parse the body shape belonging to `strategy`. A body that is not
    /// JSON at all counts as missing input.
    pub fn from_body(strategy: AnalysisStrategy, body: &str) -> Result<Self, AnalysisError> {
        let input = match strategy {
            AnalysisStrategy::Structured => {
                let req: StructuredRequest = serde_json::from_str(body).map_err(|e| {
                    log::warn!("⚠️ Rejecting malformed analysis body: {}", e);
                    AnalysisError::MissingInput
                })?;
                AnalysisInput {
                    image: req.image,
                    user_goals: None,
                }
            }
            AnalysisStrategy::Extraction => {
                let req: ExtractionRequest = serde_json::from_str(body).map_err(|e| {
                    log::warn!("⚠️ Rejecting malformed analysis body: {}", e);
                    AnalysisError::MissingInput
                })?;
                AnalysisInput {
                    image: req.image_url,
                    user_goals: req.user_goals,
                }
            }
        };
        Ok(input)
    }
}

#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    Structured(StructuredAnalysis),
    Extracted(ExtractedAnalysis),
}

impl IntoResponse for AnalysisOutcome {
    fn into_response(self) -> Response {
        match self {
            AnalysisOutcome::Structured(report) => Json(report).into_response(),
            AnalysisOutcome::Extracted(analysis) => Json(ExtractionResponse {
                success: true,
                analysis,
            })
            .into_response(),
        }
    }
}

/// Runs one photo through validation, the vision model and the response
/// interpreter. Holds no per-request state.
pub struct FoodAnalyzer {
    config: AnalyzerConfig,
    model: Arc<dyn VisionModel>,
    encoder: ImageEncoder,
}

impl FoodAnalyzer {
    pub fn new(config: AnalyzerConfig, model: Arc<dyn VisionModel>) -> Self {
        let encoder = ImageEncoder::new(config.max_image_bytes);
        Self {
            config,
            model,
            encoder,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Checks run in a fixed order: image present, credential present,
    /// image acceptable. Only then is the model called, exactly once.
    pub async fn analyze(
        &self,
        input: AnalysisInput,
        credential: Option<String>,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        let image = input
            .image
            .filter(|image| !image.trim().is_empty())
            .ok_or(AnalysisError::MissingInput)?;

        let api_key = credential.ok_or_else(|| {
            log::error!("❌ {} is not configured", self.config.api_key_var);
            AnalysisError::MissingCredential
        })?;

        let data_url = self.encoder.inspect(&image)?;
        log::info!(
            "📸 Analyzing {} image ({} bytes) with {} strategy",
            data_url.mime_type,
            data_url.decoded_len(),
            self.config.strategy
        );

        let request = prompts::build_request(&self.config, &image, input.user_goals.as_deref());
        let content = self.model.complete(&api_key, &request).await?;

        match self.config.strategy {
            AnalysisStrategy::Structured => {
                let mut report = interpreter::parse_structured(&content)?;
                if report.daily_goals_comparison.is_none() {
                    report.daily_goals_comparison =
                        Some(DailyGoals::default().progress(&report.nutrition));
                }
                log::info!(
                    "✅ Identified '{}' as {} ({} kcal, confidence {})",
                    report.food_name,
                    report
                        .meal_type
                        .map(|meal| meal.to_string())
                        .unwrap_or_else(|| "refeição".to_string()),
                    report.nutrition.calories,
                    report.confidence
                );
                Ok(AnalysisOutcome::Structured(report))
            }
            AnalysisStrategy::Extraction => {
                let analysis = interpreter::extract_nutrition(&content);
                let label = HealthLabel::for_calories(analysis.calories);
                let bars = MacroBreakdown::compute(&analysis.macros, &MacroTargets::DISPLAY);
                log::info!(
                    "✅ Extracted {} kcal ({}, score {}, {}), macros P {:.0}% C {:.0}% G {:.0}%",
                    analysis.calories,
                    label,
                    label.score(),
                    label.color(),
                    bars.protein,
                    bars.carbs,
                    bars.fats
                );
                Ok(AnalysisOutcome::Extracted(analysis))
            }
        }
    }
}
