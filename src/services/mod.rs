pub mod ai_service;
pub mod identity;
pub mod image;
pub mod interpreter;
pub mod openai; // OpenAI-compatible vision API
pub mod payment;
pub mod presentation;
pub mod prompts;

pub use ai_service::VisionModel;
pub use identity::{GatewayIdentity, IdentityProvider, SimulatedIdentity};
pub use image::ImageEncoder;
pub use openai::OpenAiVisionClient;
pub use payment::{GatewayPayment, PaymentProvider, SimulatedPayment};
