use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Rejections raised while taking in a meal photo.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("Por favor, selecione uma imagem válida")]
    InvalidType,

    #[error("Imagem muito grande ({size} bytes). Máximo {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("Imagem em formato inválido: {0}")]
    Malformed(String),
}

/// Everything that can go wrong between receiving a photo and returning a
/// nutrition report. None of these are fatal to the process.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Imagem não fornecida")]
    MissingInput,

    #[error("Configuração da API ausente. Configure a chave OpenAI.")]
    MissingCredential,

    #[error("Chave API inválida. Verifique sua configuração.")]
    InvalidCredential,

    #[error("Limite de requisições atingido. Tente novamente em alguns instantes.")]
    RateLimited,

    #[error("Erro ao analisar imagem: {message}")]
    UpstreamError { status: u16, message: String },

    #[error("Resposta vazia da IA. Tente novamente.")]
    EmptyResponse,

    #[error("Erro ao processar resposta da IA. A imagem pode não conter alimentos reconhecíveis.")]
    UnparseableResponse(String),

    #[error("Erro de conexão com o servidor. Verifique sua internet.")]
    NetworkFailure(String),

    #[error("{0}")]
    InvalidImage(#[from] ImageError),

    #[error("Erro interno ao processar análise. Tente novamente.")]
    Internal(String),
}

impl AnalysisError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AnalysisError::MissingInput => StatusCode::BAD_REQUEST,
            AnalysisError::MissingCredential => StatusCode::INTERNAL_SERVER_ERROR,
            AnalysisError::InvalidCredential => StatusCode::UNAUTHORIZED,
            AnalysisError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AnalysisError::UpstreamError { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AnalysisError::EmptyResponse => StatusCode::INTERNAL_SERVER_ERROR,
            AnalysisError::UnparseableResponse(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AnalysisError::NetworkFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
            AnalysisError::InvalidImage(ImageError::TooLarge { .. }) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            AnalysisError::InvalidImage(_) => StatusCode::BAD_REQUEST,
            AnalysisError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable kind, sent next to the user-facing text.
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::MissingInput => "missing_input",
            AnalysisError::MissingCredential => "missing_credential",
            AnalysisError::InvalidCredential => "invalid_credential",
            AnalysisError::RateLimited => "rate_limited",
            AnalysisError::UpstreamError { .. } => "upstream_error",
            AnalysisError::EmptyResponse => "empty_response",
            AnalysisError::UnparseableResponse(_) => "unparseable_response",
            AnalysisError::NetworkFailure(_) => "network_failure",
            AnalysisError::InvalidImage(ImageError::InvalidType) => "invalid_type",
            AnalysisError::InvalidImage(ImageError::TooLarge { .. }) => "too_large",
            AnalysisError::InvalidImage(ImageError::Malformed(_)) => "malformed_image",
            AnalysisError::Internal(_) => "internal",
        }
    }

    /// Guidance shown to the user instead of the raw failure.
    pub fn hint(&self) -> &'static str {
        match self {
            AnalysisError::MissingInput | AnalysisError::InvalidImage(_) => {
                "Envie uma foto da refeição em JPG ou PNG, dentro do tamanho máximo aceito."
            }
            AnalysisError::MissingCredential | AnalysisError::InvalidCredential => {
                "O serviço de análise não está configurado. Contate o suporte."
            }
            AnalysisError::RateLimited => "Aguarde alguns instantes antes de analisar outra foto.",
            AnalysisError::EmptyResponse | AnalysisError::UnparseableResponse(_) => {
                "Tente uma foto com boa iluminação, com o prato inteiro visível e sem obstruções."
            }
            AnalysisError::NetworkFailure(_) => "Verifique sua conexão com a internet e tente novamente.",
            AnalysisError::UpstreamError { .. } | AnalysisError::Internal(_) => {
                "Tente novamente em alguns instantes."
            }
        }
    }
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.to_string(),
            "code": self.code(),
            "hint": self.hint(),
        });
        (self.status_code(), Json(body)).into_response()
    }
}

/// Failures from the sign-in and subscription providers.
#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Preencha todos os campos")]
    MissingFields,

    #[error("Senha deve ter no mínimo 6 caracteres")]
    WeakPassword,

    #[error("{0}")]
    Rejected(String),

    #[error("Serviço indisponível: {0}")]
    Unavailable(String),
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let status = match self {
            AccountError::MissingFields | AccountError::WeakPassword => StatusCode::BAD_REQUEST,
            AccountError::Rejected(_) => StatusCode::UNAUTHORIZED,
            AccountError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
