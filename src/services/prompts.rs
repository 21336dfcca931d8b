use crate::config::{AnalysisStrategy, AnalyzerConfig};
use crate::services::openai::{ChatMessage, ChatRequest, ContentPart, ImageData};
use crate::services::presentation::DailyGoals;

const STRUCTURED_USER_TEXT: &str =
    "Analise esta refeição em detalhes e forneça informações nutricionais completas e precisas.";

const EXTRACTION_USER_TEXT: &str =
    "Analise esta foto de refeição e informe calorias e macronutrientes.";

/// System instruction for the strict-JSON strategy: the full report schema.
pub fn structured_system_prompt(goals: &DailyGoals) -> String {
    format!(
        r#"Você é um nutricionista especializado em análise de refeições por foto, apoiando um programa de emagrecimento.
Examine a imagem e responda SOMENTE com um objeto JSON válido neste formato:

{{
  "foodName": "nome descritivo do prato",
  "confidence": 0-100,
  "mealType": "Café da Manhã" | "Almoço" | "Jantar" | "Lanche",
  "portionSize": "Pequena/Média/Grande com estimativa em gramas",
  "nutrition": {{
    "calories": kcal, "protein": g, "carbs": g, "fat": g, "fiber": g, "sugar": g,
    "sodium": mg, "cholesterol": mg,
    "potassium": mg (opcional), "calcium": mg (opcional), "iron": mg (opcional), "vitaminC": mg (opcional)
  }},
  "ingredients": [{{ "name": "...", "amount": "...", "calories": kcal, "benefits": "..." }}],
  "scores": {{ "overall": 0-100, "protein": 0-100, "carbs": 0-100, "fat": 0-100, "micronutrients": 0-100, "balance": 0-100 }},
  "quality": {{ "level": "Excelente" | "Boa" | "Regular" | "Ruim", "color": "emerald" | "blue" | "yellow" | "red", "description": "..." }},
  "goalImpact": {{ "alignment": 0-100, "message": "...", "caloriesFit": "...", "proteinBonus": "... (opcional)" }},
  "healthBenefits": ["..."],
  "recommendations": [{{ "type": "positive" | "tip" | "timing" | "hydration", "icon": "emoji", "text": "..." }}],
  "improvements": ["..."],
  "dailyGoalsComparison": {{
    "calories": {{ "consumed": kcal, "goal": {calories}, "percentage": % }},
    "protein": {{ "consumed": g, "goal": {protein}, "percentage": % }},
    "carbs": {{ "consumed": g, "goal": {carbs}, "percentage": % }},
    "fat": {{ "consumed": g, "goal": {fat}, "percentage": % }}
  }},
  "nextMealSuggestion": {{ "time": "...", "type": "...", "suggestion": "..." }},
  "glycemicInfo": {{ "index": "Alto" | "Médio" | "Baixo", "impact": "..." }}
}}

Regras:
- Identifique todos os ingredientes visíveis e estime porções de forma realista.
- Calcule os valores nutricionais a partir dos ingredientes identificados.
- Considere o objetivo de emagrecimento nas recomendações.
- Em recomendações de hidratação, use a meta diária de {water} L de água.
- Não escreva nenhum texto fora do JSON."#,
        calories = goals.calories,
        protein = goals.protein,
        carbs = goals.carbs,
        fat = goals.fat,
        water = goals.water,
    )
}

/// System instruction for the free-text strategy. The labels must match
/// what the extraction patterns look for.
pub fn extraction_system_prompt() -> &'static str {
    "Você é um nutricionista que analisa fotos de refeições. Responda em português seguindo estes pontos:\n\
     1. Identifique os alimentos presentes no prato e a porção aproximada.\n\
     2. Informe o total estimado no formato \"Calorias: <número> kcal\".\n\
     3. Informe os macronutrientes em gramas no formato \"Proteínas: <número>g\", \"Carboidratos: <número>g\" e \"Gorduras: <número>g\".\n\
     4. Avalie se a refeição está alinhada aos objetivos do usuário.\n\
     5. Sugira ajustes práticos para tornar a refeição mais saudável."
}

/// Build the single chat-completion request for one analysis.
pub fn build_request(config: &AnalyzerConfig, image_url: &str, user_goals: Option<&str>) -> ChatRequest {
    let (system, mut text) = match config.strategy {
        AnalysisStrategy::Structured => (
            structured_system_prompt(&DailyGoals::default()),
            STRUCTURED_USER_TEXT.to_string(),
        ),
        AnalysisStrategy::Extraction => (
            extraction_system_prompt().to_string(),
            EXTRACTION_USER_TEXT.to_string(),
        ),
    };

    if let Some(goals) = user_goals.map(str::trim).filter(|g| !g.is_empty()) {
        text.push_str("\nObjetivos do usuário: ");
        text.push_str(goals);
    }

    ChatRequest {
        model: config.model.clone(),
        messages: vec![
            ChatMessage::system(system),
            ChatMessage::user(vec![
                ContentPart::Text { text },
                ContentPart::ImageUrl {
                    image_url: ImageData {
                        url: image_url.to_string(),
                    },
                },
            ]),
        ],
        max_tokens: config.max_tokens,
        temperature: config.temperature,
    }
}
