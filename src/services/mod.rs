//! Service layer: pricing rules, the keyword chatbot and the Gemini client.

pub mod chatbot;
pub mod gemini;
pub mod pricing;

pub use gemini::GeminiClient;
