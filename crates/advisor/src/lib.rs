//! chainscope-advisor: AI-assisted integration analysis.
//!
//! Builds a prompt from the rule-based assessment and any integration
//! history, streams the model's answer, extracts a structured verdict (or
//! substitutes a fixed fallback), and renders integration scaffolding.

pub mod analyst;
pub mod extract;
pub mod llm;
pub mod prompt;
pub mod scaffold;

pub use analyst::{AnalysisEvent, Analyst};
pub use extract::{extract_analysis, first_json_block, AiAnalysis};
pub use llm::{ChatMessage, LlmClient, LlmError, OpenAiClient, OpenAiConfig, Role};
pub use prompt::{already_supported_prompt, analysis_prompt, build_messages, enhanced_prompt};
pub use scaffold::{scaffold, GeneratedCode};
