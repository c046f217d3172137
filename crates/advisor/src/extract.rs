//! Structured analysis extraction from free-form model output.

use chainscope_core::ComplexityLevel;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const FALLBACK_TIMEFRAME: &str = "6-8 weeks";
pub const FALLBACK_CONFIDENCE: u32 = 75;
pub const FALLBACK_REASONING: &str = "AI analysis completed. Based on the latest information about this blockchain, the integration presents moderate complexity.";

const FALLBACK_CHECKLIST: [&str; 6] = [
    "Research blockchain documentation and specifications",
    "Implement core transaction signing",
    "Add token standard support",
    "Integrate with the wallet application",
    "Conduct security audit",
    "Test with mainnet and testnets",
];

const FALLBACK_RED_FLAGS: [&str; 2] = [
    "Limited documentation may slow development",
    "Custom consensus mechanism requires extensive testing",
];

const FALLBACK_RECOMMENDATIONS: [&str; 3] = [
    "Start with basic functionality",
    "Gradually add advanced features",
    "Consider phased rollout approach",
];

/// The model's structured verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysis {
    pub complexity: String,
    #[serde(default)]
    pub estimated_timeframe: String,
    #[serde(default)]
    pub technical_reasoning: String,
    #[serde(default)]
    pub action_checklist: Vec<String>,
    #[serde(default)]
    pub red_flags: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub confidence: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_comparison: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risk_factors: Vec<String>,
}

impl AiAnalysis {
    /// Canned analysis used when the model's answer cannot be parsed.
    pub fn fallback(raw: &str) -> Self {
        let reasoning = if raw.trim().is_empty() {
            FALLBACK_REASONING.to_string()
        } else {
            raw.to_string()
        };
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        AiAnalysis {
            complexity: ComplexityLevel::Medium.as_str().to_string(),
            estimated_timeframe: FALLBACK_TIMEFRAME.to_string(),
            technical_reasoning: reasoning,
            action_checklist: owned(&FALLBACK_CHECKLIST),
            red_flags: owned(&FALLBACK_RED_FLAGS),
            recommendations: owned(&FALLBACK_RECOMMENDATIONS),
            confidence: FALLBACK_CONFIDENCE,
            historical_comparison: None,
            risk_factors: Vec::new(),
        }
    }

    /// The complexity as a category, when the model used one of ours.
    pub fn level(&self) -> Option<ComplexityLevel> {
        ComplexityLevel::parse(&self.complexity)
    }
}

/// The first balanced `{ ... }` block in `text`. Braces inside JSON string
/// literals do not count.
pub fn first_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse the first JSON block as an analysis, if there is a valid one.
pub fn parse_analysis(text: &str) -> Option<AiAnalysis> {
    let block = first_json_block(text)?;
    match serde_json::from_str(block) {
        Ok(analysis) => Some(analysis),
        Err(e) => {
            warn!(error = %e, "model output contained malformed analysis JSON");
            None
        }
    }
}

/// Parsed analysis, or the fallback carrying the raw text as reasoning.
pub fn extract_analysis(text: &str) -> AiAnalysis {
    parse_analysis(text).unwrap_or_else(|| AiAnalysis::fallback(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_is_balanced_and_string_aware() {
        let text = r#"Here you go: {"a": "brace } inside", "b": {"c": 1}} trailing {"x": 2}"#;
        assert_eq!(
            first_json_block(text),
            Some(r#"{"a": "brace } inside", "b": {"c": 1}}"#)
        );
        assert_eq!(first_json_block(r#"{"q": "say \"}\" now"}"#), Some(r#"{"q": "say \"}\" now"}"#));
        assert_eq!(first_json_block("no json here"), None);
        assert_eq!(first_json_block("{ unterminated"), None);
    }

    #[test]
    fn parses_fenced_answer() {
        let text = "```json\n{\"complexity\":\"HIGH\",\"estimatedTimeframe\":\"12-16 weeks\",\"technicalReasoning\":\"Custom VM\",\"actionChecklist\":[\"Write signer\"],\"redFlags\":[],\"recommendations\":[\"Phase it\"],\"confidence\":82}\n```";
        let analysis = extract_analysis(text);
        assert_eq!(analysis.level(), Some(ComplexityLevel::High));
        assert_eq!(analysis.estimated_timeframe, "12-16 weeks");
        assert_eq!(analysis.confidence, 82);
        assert_eq!(analysis.action_checklist, vec!["Write signer"]);
        assert!(analysis.historical_comparison.is_none());
    }

    #[test]
    fn optional_history_fields() {
        let text = r#"{"complexity":"MEDIUM","historicalComparison":"Like Solana","riskFactors":["Validator churn"]}"#;
        let analysis = extract_analysis(text);
        assert_eq!(analysis.historical_comparison.as_deref(), Some("Like Solana"));
        assert_eq!(analysis.risk_factors, vec!["Validator churn"]);
    }

    #[test]
    fn fallback_on_prose() {
        let analysis = extract_analysis("The chain looks fine to integrate.");
        assert_eq!(analysis.complexity, "MEDIUM");
        assert_eq!(analysis.estimated_timeframe, FALLBACK_TIMEFRAME);
        assert_eq!(analysis.technical_reasoning, "The chain looks fine to integrate.");
        assert_eq!(analysis.action_checklist.len(), 6);
        assert_eq!(analysis.red_flags.len(), 2);
        assert_eq!(analysis.recommendations.len(), 3);
        assert_eq!(analysis.confidence, 75);
    }

    #[test]
    fn fallback_on_malformed_json_and_empty_text() {
        let analysis = extract_analysis("{\"complexity\": HIGH}");
        assert_eq!(analysis.confidence, FALLBACK_CONFIDENCE);
        assert_eq!(analysis.technical_reasoning, "{\"complexity\": HIGH}");

        let empty = extract_analysis("   ");
        assert_eq!(empty.technical_reasoning, FALLBACK_REASONING);
    }

    #[test]
    fn block_without_complexity_is_not_an_analysis() {
        let analysis = extract_analysis(r#"{"note": "nothing useful"}"#);
        assert_eq!(analysis.estimated_timeframe, FALLBACK_TIMEFRAME);
    }
}
