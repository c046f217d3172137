//! Pattern rule table and complexity classifier.
//!
//! Rules are evaluated in declaration order and the first rule with a
//! pattern contained in the normalized chain name wins. Matching is plain
//! substring containment, so `sonic` also matches `sonicscan`.

use serde::{Deserialize, Serialize};

/// Qualitative integration-difficulty category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ComplexityLevel {
    Low,
    Medium,
    High,
}

impl ComplexityLevel {
    pub const ALL: [ComplexityLevel; 3] = [
        ComplexityLevel::Low,
        ComplexityLevel::Medium,
        ComplexityLevel::High,
    ];

    /// Wire string (`LOW`, `MEDIUM`, `HIGH`).
    pub fn as_str(self) -> &'static str {
        match self {
            ComplexityLevel::Low => "LOW",
            ComplexityLevel::Medium => "MEDIUM",
            ComplexityLevel::High => "HIGH",
        }
    }

    /// Parse a wire string, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Some(ComplexityLevel::Low),
            "MEDIUM" => Some(ComplexityLevel::Medium),
            "HIGH" => Some(ComplexityLevel::High),
            _ => None,
        }
    }

    /// Fixed 0-100 complexity score. Not derived from the priority sub-scores.
    pub fn complexity_score(self) -> u32 {
        match self {
            ComplexityLevel::Low => 25,
            ComplexityLevel::Medium => 55,
            ComplexityLevel::High => 85,
        }
    }

    /// Engineers allocated to an integration of this level.
    pub fn engineers(self) -> u32 {
        match self {
            ComplexityLevel::Low => 1,
            ComplexityLevel::Medium => 2,
            ComplexityLevel::High => 3,
        }
    }
}

impl std::fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplexityRule {
    /// Lowercase name fragments; any one of them matching selects the rule.
    pub patterns: &'static [&'static str],
    pub level: ComplexityLevel,
    pub base_weeks: u32,
    pub reasoning: &'static str,
}

impl ComplexityRule {
    fn matches(&self, normalized_name: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| normalized_name.contains(pattern))
    }
}

/// The rule table. LOW rules, then MEDIUM, then HIGH; order is significant.
static COMPLEXITY_RULES: &[ComplexityRule] = &[
    // ── LOW ──────────────────────────────────────────────────────────────
    ComplexityRule {
        patterns: &[
            "base", "optimism", "arbitrum", "zksync", "linea", "scroll", "blast", "mode", "zora",
            "mantle", "manta", "metis",
        ],
        level: ComplexityLevel::Low,
        base_weeks: 3,
        reasoning: "EVM L2 - Fork existing L2 integration, update RPC/chainId, minimal changes",
    },
    ComplexityRule {
        patterns: &[
            "polygon", "avalanche", "bsc", "bnb", "fantom", "moonbeam", "celo", "gnosis",
            "aurora", "sonic", "flare", "berachain", "monad",
        ],
        level: ComplexityLevel::Low,
        base_weeks: 4,
        reasoning: "EVM L1 - Standard EVM implementation, well-documented, mature tooling",
    },
    ComplexityRule {
        patterns: &["litecoin", "dogecoin", "bitcoin cash", "zcash"],
        level: ComplexityLevel::Low,
        base_weeks: 3,
        reasoning: "Bitcoin fork - Leverage existing Bitcoin integration with minor modifications",
    },
    // ── MEDIUM ───────────────────────────────────────────────────────────
    ComplexityRule {
        patterns: &[
            "cosmos", "osmosis", "juno", "stargaze", "akash", "celestia", "dydx", "injective",
            "sei", "noble",
        ],
        level: ComplexityLevel::Medium,
        base_weeks: 7,
        reasoning: "Cosmos SDK chain - Custom but standardized, IBC support, good documentation",
    },
    ComplexityRule {
        patterns: &["solana", "sol"],
        level: ComplexityLevel::Medium,
        base_weeks: 7,
        reasoning: "Solana VM - Custom runtime, SPL token standard, established SDK",
    },
    ComplexityRule {
        patterns: &["aptos", "sui", "movement"],
        level: ComplexityLevel::Medium,
        base_weeks: 9,
        reasoning: "Move VM - New paradigm but growing ecosystem, moderate documentation",
    },
    ComplexityRule {
        patterns: &["polkadot", "kusama", "moonriver", "astar", "substrate"],
        level: ComplexityLevel::Medium,
        base_weeks: 8,
        reasoning:
            "Substrate framework - Modular but complex, custom runtime, parachain considerations",
    },
    ComplexityRule {
        patterns: &[
            "near", "algorand", "hedera", "iota", "cardano", "tezos", "flow", "hyperliquid", "fuel",
        ],
        level: ComplexityLevel::Medium,
        base_weeks: 7,
        reasoning: "Alt-L1 - Unique architecture, custom transaction model, varying doc quality",
    },
    ComplexityRule {
        patterns: &["starknet", "stark"],
        level: ComplexityLevel::Medium,
        base_weeks: 9,
        reasoning: "Cairo VM - ZK rollup with custom VM, growing but complex ecosystem",
    },
    // ── HIGH ─────────────────────────────────────────────────────────────
    ComplexityRule {
        patterns: &["monero", "zcash", "ironfish", "iron fish", "aleo", "penumbra"],
        level: ComplexityLevel::High,
        base_weeks: 14,
        reasoning:
            "Privacy-focused - Zero-knowledge proofs, shielded transactions, complex cryptography",
    },
    ComplexityRule {
        patterns: &["mina", "fuel", "aztec", "noir"],
        level: ComplexityLevel::High,
        base_weeks: 12,
        reasoning: "Experimental tech - Novel approach, limited tooling, immature ecosystem",
    },
    ComplexityRule {
        patterns: &["hyperledger", "corda", "quorum", "canton"],
        level: ComplexityLevel::High,
        base_weeks: 11,
        reasoning: "Enterprise blockchain - Permissioned, custom architecture, limited public docs",
    },
];

/// Rule used when nothing in the table matches.
pub static FALLBACK_RULE: ComplexityRule = ComplexityRule {
    patterns: &[],
    level: ComplexityLevel::Medium,
    base_weeks: 8,
    reasoning: "Unknown chain type - requires custom analysis. Defaulting to MEDIUM complexity pending technical assessment.",
};

/// The full rule table in evaluation order.
pub fn rules() -> &'static [ComplexityRule] {
    COMPLEXITY_RULES
}

/// Lowercase and trim a chain name for matching.
pub fn normalize(chain_name: &str) -> String {
    chain_name.trim().to_lowercase()
}

/// Result of classifying a chain name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub rule: &'static ComplexityRule,
    /// False when the fallback rule was used.
    pub matched: bool,
    /// First pattern of the matched rule, or the normalized name on fallback.
    pub chain_type: String,
}

impl Classification {
    pub fn level(&self) -> ComplexityLevel {
        self.rule.level
    }

    pub fn weeks(&self) -> u32 {
        self.rule.base_weeks
    }

    pub fn confidence(&self) -> u32 {
        if self.matched {
            90
        } else {
            60
        }
    }
}

/// Classify a chain name against the rule table. Never fails.
pub fn classify(chain_name: &str) -> Classification {
    let normalized = normalize(chain_name);

    match COMPLEXITY_RULES.iter().find(|rule| rule.matches(&normalized)) {
        Some(rule) => Classification {
            rule,
            matched: true,
            chain_type: rule.patterns[0].to_string(),
        },
        None => Classification {
            rule: &FALLBACK_RULE,
            matched: false,
            chain_type: normalized,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evm_l2_matches_first() {
        let c = classify("Arbitrum");
        assert!(c.matched);
        assert_eq!(c.level(), ComplexityLevel::Low);
        assert_eq!(c.weeks(), 3);
        assert!(c.rule.reasoning.starts_with("EVM L2"));
        assert_eq!(c.chain_type, "base");
    }

    #[test]
    fn matching_is_case_insensitive_and_trimmed() {
        assert_eq!(classify("  POLYGON zkEVM ").level(), ComplexityLevel::Low);
        assert_eq!(classify("  POLYGON ").weeks(), 4);
    }

    #[test]
    fn declaration_order_breaks_ties() {
        // "base" (EVM L2) is declared before "polygon" (EVM L1).
        assert_eq!(classify("Base Polygon").weeks(), 3);
        // zcash is listed under Bitcoin forks before the privacy rule.
        let zcash = classify("Zcash");
        assert_eq!(zcash.level(), ComplexityLevel::Low);
        assert!(zcash.rule.reasoning.starts_with("Bitcoin fork"));
        // fuel appears in Alt-L1 (MEDIUM) before Experimental (HIGH).
        assert_eq!(classify("Fuel").level(), ComplexityLevel::Medium);
    }

    #[test]
    fn substring_semantics_over_match() {
        assert!(classify("Sonicscan").rule.reasoning.starts_with("EVM L1"));
        // "sol" is contained in "consolidated"
        assert_eq!(classify("consolidated").level(), ComplexityLevel::Medium);
    }

    #[test]
    fn unknown_chain_falls_back_to_medium() {
        let c = classify("Zanzibarchain");
        assert!(!c.matched);
        assert_eq!(c.level(), ComplexityLevel::Medium);
        assert_eq!(c.weeks(), 8);
        assert_eq!(c.confidence(), 60);
        assert_eq!(c.chain_type, "zanzibarchain");
        assert!(c.rule.reasoning.contains("Unknown chain"));
    }

    #[test]
    fn empty_input_is_tolerated() {
        let c = classify("");
        assert!(!c.matched);
        assert_eq!(c.rule, &FALLBACK_RULE);
    }

    #[test]
    fn privacy_chain_is_high() {
        let c = classify("Monero");
        assert_eq!(c.level(), ComplexityLevel::High);
        assert_eq!(c.weeks(), 14);
        assert_eq!(c.confidence(), 90);
    }

    #[test]
    fn every_low_pattern_alone_classifies_low() {
        for rule in rules().iter().filter(|r| r.level == ComplexityLevel::Low) {
            for pattern in rule.patterns {
                let c = classify(pattern);
                assert_eq!(
                    c.level(),
                    ComplexityLevel::Low,
                    "pattern '{}' did not classify as LOW",
                    pattern
                );
            }
        }
    }

    #[test]
    fn table_is_ordered_low_medium_high() {
        let levels: Vec<_> = rules().iter().map(|r| r.level).collect();
        let mut sorted = levels.clone();
        sorted.sort_by_key(|l| l.complexity_score());
        assert_eq!(levels, sorted);
        assert_eq!(rules().len(), 12);
    }

    #[test]
    fn complexity_scores_are_fixed() {
        assert_eq!(ComplexityLevel::Low.complexity_score(), 25);
        assert_eq!(ComplexityLevel::Medium.complexity_score(), 55);
        assert_eq!(ComplexityLevel::High.complexity_score(), 85);
    }

    #[test]
    fn level_parse_and_display() {
        assert_eq!(ComplexityLevel::parse("medium"), Some(ComplexityLevel::Medium));
        assert_eq!(ComplexityLevel::parse(" HIGH "), Some(ComplexityLevel::High));
        assert_eq!(ComplexityLevel::parse("extreme"), None);
        assert_eq!(ComplexityLevel::Low.to_string(), "LOW");
        assert_eq!(
            serde_json::to_string(&ComplexityLevel::Medium).unwrap(),
            "\"MEDIUM\""
        );
    }
}
