pub mod extractor;
pub mod format;
pub mod prompt;
pub mod provider;

pub use extractor::{
    extract_with, parse_insights, prompt_only, Extraction, ExtractionOutcome, InsightExtractor,
    LlmSettings,
};
pub use format::{format_for_llm, format_records, truncate_to_budget, PROMPT_TEXT_BUDGET};
pub use prompt::{analysis_prompt, preview_prompt, SYSTEM_MESSAGE};
pub use provider::{ChatMessage, ChatRequest, ChatResponse, LlmProvider, OpenAiProvider};
