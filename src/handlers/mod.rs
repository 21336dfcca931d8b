pub mod account;
pub mod analyze;

pub use analyze::{AnalysisInput, AnalysisOutcome, FoodAnalyzer};
