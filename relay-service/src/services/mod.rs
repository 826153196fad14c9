pub mod metrics;
pub mod places;
pub mod providers;

pub use metrics::{init_metrics, render_metrics};
pub use places::PlacesClient;
pub use providers::{gemini::GeminiClient, openai::OpenAiClient, ProviderChain};
