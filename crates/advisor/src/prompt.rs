//! Prompt construction for the analysis model.
//!
//! Three prompt shapes: a plain analysis prompt, an enhanced prompt carrying
//! historical context from past integrations, and a reference-only prompt
//! for chains that are already integrated.

use chainscope_core::{Assessment, ChainFamily, HistorySource, IntegrationRecord};
use chainscope_sources::ChainProfile;

use crate::llm::ChatMessage;

pub const SYSTEM_PROMPT: &str = "You are an expert blockchain integration specialist for a hardware wallet provider. Provide detailed, actionable assessments for blockchain integration complexity. Use your knowledge to provide accurate assessments.";

const INTEGRATION_REQUIREMENTS: &str = "\
## INTEGRATION REQUIREMENTS:
- Hardware wallet compatibility and security requirements
- Wallet application integration complexity
- Transaction signing mechanisms and key management
- Multi-signature and account recovery support
- Token standard compliance (ERC-20, ERC-721, SPL, etc.)
- Network reliability and uptime requirements
- Developer documentation and community support
- Testing and auditing requirements
";

const BASE_JSON_SHAPE: &str = r#"{
  "complexity": "LOW|MEDIUM|HIGH",
  "estimatedTimeframe": "X weeks/months",
  "technicalReasoning": "Detailed explanation of complexity factors",
  "actionChecklist": ["Specific tasks for integration"],
  "redFlags": ["Potential issues or concerns"],
  "recommendations": ["Suggested next steps"],
  "confidence": 85
}"#;

const ENHANCED_JSON_SHAPE: &str = r#"{
  "complexity": "LOW|MEDIUM|HIGH",
  "estimatedTimeframe": "X weeks/months",
  "technicalReasoning": "Comprehensive analysis that references historical data and lessons learned from similar integrations",
  "actionChecklist": ["Specific, actionable tasks - consider past blockers"],
  "redFlags": ["Critical issues - reference similar past blockers"],
  "recommendations": ["Strategic recommendations - apply lessons learned"],
  "confidence": 85,
  "historicalComparison": "How this compares to similar past integrations",
  "riskFactors": ["Risks based on past blockers and challenges"]
}"#;

/// Technology family implied by a rule's chain type.
pub fn family_hint(chain_type: &str) -> Option<ChainFamily> {
    match chain_type {
        "base" | "polygon" => Some(ChainFamily::Evm),
        "litecoin" => Some(ChainFamily::Bitcoin),
        "cosmos" => Some(ChainFamily::Cosmos),
        "solana" => Some(ChainFamily::Solana),
        "aptos" => Some(ChainFamily::Move),
        "polkadot" => Some(ChainFamily::Substrate),
        _ => None,
    }
}

fn bullets(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {}\n", item))
        .collect()
}

fn or_na<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "N/A".to_string())
}

fn assessment_summary(assessment: &Assessment) -> String {
    let mut out = String::new();
    out.push_str("## CURRENT ASSESSMENT SUMMARY:\n");
    out.push_str(&format!(
        "- Complexity: {} ({}/100)\n",
        assessment.complexity, assessment.complexity_score
    ));
    out.push_str(&format!(
        "- Estimated Timeline: {} weeks\n",
        assessment.estimated_weeks
    ));
    out.push_str(&format!("- Estimated Cost: {}\n", assessment.estimated_cost));
    out.push_str(&format!(
        "- Market Opportunity: {}\n",
        assessment.market_opportunity
    ));
    out.push_str(&format!("- Priority: {}\n\n", assessment.recommended_priority));
    out.push_str("## TECHNICAL FACTORS:\n");
    out.push_str(&bullets(&assessment.narrative.key_technical_factors));
    out.push_str("\n## BUSINESS OPPORTUNITY:\n");
    out.push_str(&bullets(&assessment.narrative.business_opportunity));
    out
}

fn profile_section(profile: &ChainProfile) -> String {
    let mut out = String::new();
    out.push_str("## DISCOVERED CHAIN DATA:\n");
    out.push_str(&format!("- Name: {}\n", profile.name));
    out.push_str(&format!("- Ticker: {}\n", profile.ticker));
    out.push_str(&format!("- Chain Type: {}\n", profile.chain_type));
    out.push_str(&format!("- Chain ID: {}\n", profile.chain_id));
    out.push_str(&format!("- RPC: {}\n", profile.rpc_url));
    out.push_str(&format!("- Explorer: {}\n", profile.explorer_url));
    out.push_str(&format!("- Repository: {}\n", profile.github_repo));
    if let Some(tvl) = &profile.tvl_formatted {
        out.push_str(&format!("- TVL: {}\n", tvl));
    }
    if let Some(rank) = profile.chain_rank {
        match profile.total_chains {
            Some(total) => out.push_str(&format!("- TVL Rank: #{} of {}\n", rank, total)),
            None => out.push_str(&format!("- TVL Rank: #{}\n", rank)),
        }
    }
    if let Some(protocols) = profile.protocols {
        out.push_str(&format!("- DeFi Protocols: {}\n", protocols));
    }
    out
}

/// Analysis prompt with whatever rule-based and discovered context exists.
pub fn analysis_prompt(
    chain: &str,
    assessment: Option<&Assessment>,
    profile: Option<&ChainProfile>,
) -> String {
    let mut out = format!(
        "Analyze the integration complexity of the {} blockchain for a hardware wallet and its companion application.\n\n",
        chain
    );
    if let Some(assessment) = assessment {
        out.push_str(&assessment_summary(assessment));
        out.push('\n');
    }
    if let Some(profile) = profile {
        out.push_str(&profile_section(profile));
        out.push('\n');
    }
    out.push_str(INTEGRATION_REQUIREMENTS);
    out.push_str("\n## COMPLEXITY CRITERIA:\n");
    out.push_str("- LOW: Established chains with excellent documentation, mature tooling, proven security\n");
    out.push_str("- MEDIUM: Growing chains with good documentation, some custom features, moderate complexity\n");
    out.push_str("- HIGH: New or experimental chains, poor documentation, custom consensus, security concerns\n\n");
    out.push_str("Provide a comprehensive assessment in the following JSON format:\n");
    out.push_str(BASE_JSON_SHAPE);
    out.push_str("\n\nBe specific and actionable in your recommendations.");
    out
}

fn historical_context(chain: &str, assessment: &Assessment, history: &HistorySource) -> String {
    let mut out = String::new();

    let similar = history.similar_integrations(chain, family_hint(&assessment.chain_type), None);
    if !similar.is_empty() {
        out.push_str("## HISTORICAL CONTEXT FROM PAST INTEGRATIONS:\n\n");
        for integration in &similar {
            out.push_str(&format!(
                "### {} ({} {}):\n",
                integration.chain_name,
                integration.family.as_str(),
                integration.architecture
            ));
            out.push_str(&format!(
                "- Estimated: {} complexity ({} weeks)\n",
                or_na(integration.initial_complexity_estimate),
                or_na(integration.estimated_weeks)
            ));
            out.push_str(&format!(
                "- Actual: {} complexity ({} weeks)\n",
                or_na(integration.resolved_complexity()),
                or_na(integration.integration_duration)
            ));
            match integration.schedule_drift().unwrap_or(0) {
                drift if drift > 0 => {
                    out.push_str(&format!("- TOOK {} WEEKS LONGER THAN EXPECTED\n", drift))
                }
                drift if drift < 0 => {
                    out.push_str(&format!("- COMPLETED {} WEEKS EARLIER\n", -drift))
                }
                _ => out.push_str("- ON TIME\n"),
            }
            if !integration.lessons_learned.is_empty() {
                out.push_str(&format!(
                    "- Key Lessons: {}\n",
                    integration.lessons_learned.join("; ")
                ));
            }
            if !integration.blockers.is_empty() {
                out.push_str(&format!("- Blockers: {}\n", integration.blockers.join("; ")));
            }
            if !integration.key_challenges.is_empty() {
                out.push_str(&format!(
                    "- Challenges: {}\n",
                    integration.key_challenges.join("; ")
                ));
            }
            out.push('\n');
        }
    }

    let lessons = history.lessons_learned(chain);
    if !lessons.is_empty() {
        out.push_str("## LESSONS LEARNED FROM SIMILAR INTEGRATIONS:\n");
        out.push_str(&bullets(&lessons));
        out.push('\n');
    }

    let blockers = history.common_blockers(chain);
    if !blockers.is_empty() {
        out.push_str("## COMMON BLOCKERS TO WATCH FOR:\n");
        out.push_str(&bullets(&blockers));
        out.push('\n');
    }

    let average = history.average_integration_weeks(assessment.complexity);
    let estimate = assessment.estimated_weeks as f64;
    out.push_str("## AVERAGE INTEGRATION TIME:\n");
    out.push_str(&format!(
        "- Similar {} complexity integrations average: {} weeks\n",
        assessment.complexity, average
    ));
    out.push_str(&format!("- Your estimate: {} weeks\n", assessment.estimated_weeks));
    if estimate < average {
        out.push_str(&format!(
            "- WARNING: Your estimate is {:.1} weeks below average. Consider padding.\n",
            average - estimate
        ));
    } else if estimate > average * 1.2 {
        out.push_str(&format!(
            "- NOTE: Your estimate is {:.1} weeks above average. May be conservative.\n",
            estimate - average
        ));
    }
    out
}

/// Prompt enriched with past integrations. Chains the history marks as
/// supported get the reference-only prompt instead.
pub fn enhanced_prompt(chain: &str, assessment: &Assessment, history: &HistorySource) -> String {
    if let Some(record) = history.supported_record(chain) {
        return already_supported_prompt(chain, &record);
    }

    let mut out = format!(
        "You are a senior blockchain integration specialist with 10+ years of experience. Analyze the integration complexity for the {} blockchain.\n\n",
        chain
    );
    out.push_str(&assessment_summary(assessment));
    out.push('\n');
    out.push_str(&historical_context(chain, assessment, history));
    out.push('\n');
    out.push_str(INTEGRATION_REQUIREMENTS);
    out.push_str("\n## ANALYSIS REQUIREMENTS:\n");
    out.push_str("1. Compare with historical data: how does this compare to similar past integrations?\n");
    out.push_str("2. Identify risks: based on past blockers, what could go wrong?\n");
    out.push_str("3. Apply lessons learned: which patterns from similar integrations apply here?\n");
    out.push_str(&format!(
        "4. Validate estimate: is the {}-week estimate realistic given historical data?\n\n",
        assessment.estimated_weeks
    ));
    out.push_str("Provide a detailed assessment in this exact JSON format:\n");
    out.push_str(ENHANCED_JSON_SHAPE);
    out.push_str("\n\nBe thorough, specific, and reference historical data in your analysis.");
    out
}

/// Reference-only prompt for a chain that is already integrated.
pub fn already_supported_prompt(chain: &str, record: &IntegrationRecord) -> String {
    let mut out = format!("You are analyzing {} for wallet integration.\n\n", chain);
    out.push_str("## IMPORTANT: This chain is already SUPPORTED in production.\n\n");

    out.push_str("Integration Details:\n");
    out.push_str(&format!("- Status: {}\n", record.status.as_str()));
    out.push_str(&format!("- Launch Date: {}\n", or_na(record.launch_date.as_deref())));
    out.push_str(&format!(
        "- App Version: {}\n",
        or_na(record.ledger_live_version.as_deref())
    ));
    let hardware = if record.hardware_support.is_empty() {
        "N/A".to_string()
    } else {
        record.hardware_support.join(", ")
    };
    out.push_str(&format!("- Hardware Support: {}\n", hardware));
    out.push_str(&format!(
        "- Repository: {}\n\n",
        or_na(record.repository_url.as_deref())
    ));

    out.push_str("Historical Data:\n");
    out.push_str(&format!(
        "- Initial Estimate: {} complexity ({} weeks)\n",
        or_na(record.initial_complexity_estimate),
        or_na(record.estimated_weeks)
    ));
    out.push_str(&format!(
        "- Actual Result: {} complexity ({} weeks)\n",
        or_na(record.resolved_complexity()),
        or_na(record.integration_duration)
    ));
    out.push_str(&format!("- Engineers: {}\n", or_na(record.engineers_assigned)));
    let cost = record
        .actual_cost
        .or(record.estimated_cost)
        .map(|c| format!("${}", chainscope_core::format::group_digits(c)));
    out.push_str(&format!("- Cost: {}\n\n", or_na(cost)));

    if !record.lessons_learned.is_empty() {
        out.push_str("Lessons Learned:\n");
        out.push_str(&bullets(&record.lessons_learned));
        out.push('\n');
    }
    if !record.blockers.is_empty() {
        out.push_str("Blockers Encountered:\n");
        out.push_str(&bullets(&record.blockers));
        out.push('\n');
    }

    out.push_str("This assessment is for reference only - the chain is already integrated.");
    out
}

/// System and user messages for `chain`, picking the prompt shape from
/// what is known: supported chains get the reference prompt, an available
/// history the enhanced one, otherwise the plain analysis prompt.
pub fn build_messages(
    chain: &str,
    assessment: &Assessment,
    profile: &ChainProfile,
    history: &HistorySource,
) -> Vec<ChatMessage> {
    let user = if history.is_available() {
        let mut prompt = enhanced_prompt(chain, assessment, history);
        if !assessment.is_supported() {
            prompt.push_str("\n\n");
            prompt.push_str(&profile_section(profile));
        }
        prompt
    } else {
        analysis_prompt(chain, Some(assessment), Some(profile))
    };
    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)]
}
