//! Plain-text rendering for terminal output.

use chainscope_core::{format_tvl, rules, Assessment, HistoryStats, IntegrationRecord, PriorityScore};
use chainscope_sources::{
    ChainProfile, FamilyInfo, IntegrationPatterns, IntegrationTimeline, ProtocolSummary,
};

fn section(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push_str(&format!("\n{}:\n", title));
    for item in items {
        out.push_str(&format!("  - {}\n", item));
    }
}

pub(crate) fn assessment_text(chain: &str, a: &Assessment) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", chain));
    out.push_str(&format!(
        "  Complexity:          {} ({}/100)\n",
        a.complexity, a.complexity_score
    ));
    out.push_str(&format!("  Estimated weeks:     {}\n", a.estimated_weeks));
    out.push_str(&format!("  Estimated cost:      {}\n", a.estimated_cost));
    out.push_str(&format!("  Market opportunity:  {}\n", a.market_opportunity));
    out.push_str(&format!("  Priority:            {}\n", a.recommended_priority));
    out.push_str(&format!("  Chain type:          {}\n", a.chain_type));
    out.push_str(&format!("  Confidence:          {}%\n", a.confidence));

    if let Some(score) = &a.priority_score {
        let b = &score.breakdown;
        out.push_str(&format!(
            "  Priority score:      {}/100 ({})\n",
            score.total, score.rating
        ));
        out.push_str(&format!(
            "    market {} / technical {} / strategic {} / urgency {}\n",
            b.market_opportunity, b.technical_feasibility, b.strategic_value, b.urgency
        ));
        out.push_str(&format!("    {}\n", score.recommended_action()));
    }

    let n = &a.narrative;
    section(&mut out, "Why this complexity", &n.why_this_complexity);
    section(&mut out, "Key technical factors", &n.key_technical_factors);
    section(&mut out, "Business opportunity", &n.business_opportunity);
    section(&mut out, "Competitive position", &n.competitive_position);
    section(&mut out, "Next steps", &n.next_steps);
    section(&mut out, "Red flags", &n.red_flags);
    out.push_str(&format!("\nGo-to-market: {}\n", n.go_to_market_strategy));
    out
}

pub(crate) fn profile_text(profile: &ChainProfile) -> String {
    let mut out = String::new();
    out.push_str(&format!("  Ticker:    {}\n", profile.ticker));
    out.push_str(&format!("  Chain ID:  {}\n", profile.chain_id));
    out.push_str(&format!("  RPC:       {}\n", profile.rpc_url));
    out.push_str(&format!("  Explorer:  {}\n", profile.explorer_url));
    if let Some(tvl) = &profile.tvl_formatted {
        out.push_str(&format!("  TVL:       {}\n", tvl));
    }
    if let Some(rank) = profile.chain_rank {
        out.push_str(&format!("  TVL rank:  #{}\n", rank));
    }
    out
}

pub(crate) fn rules_text() -> String {
    let mut out = String::new();
    for (i, rule) in rules().iter().enumerate() {
        out.push_str(&format!(
            "{:>2}. {:<6} {:>2} weeks  {}\n",
            i + 1,
            rule.level.as_str(),
            rule.base_weeks,
            rule.reasoning
        ));
        out.push_str(&format!("    patterns: {}\n", rule.patterns.join(", ")));
    }
    out
}

/// The rule table as JSON objects, in evaluation order.
pub(crate) fn rules_json() -> Vec<serde_json::Value> {
    rules()
        .iter()
        .map(|rule| {
            serde_json::json!({
                "patterns": rule.patterns,
                "complexity": rule.level,
                "baseWeeks": rule.base_weeks,
                "reasoning": rule.reasoning,
            })
        })
        .collect()
}

pub(crate) fn record_text(record: &IntegrationRecord) -> String {
    let or_dash = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
    let mut out = String::new();
    out.push_str(&format!("{} ({})\n", record.chain_name, record.ticker));
    out.push_str(&format!("  Status:        {}\n", record.status.as_str()));
    out.push_str(&format!(
        "  Family:        {} {}\n",
        record.family.as_str(),
        record.architecture
    ));
    out.push_str(&format!(
        "  Launched:      {}\n",
        or_dash(record.launch_date.clone())
    ));
    out.push_str(&format!(
        "  Estimate:      {} ({} weeks)\n",
        or_dash(record.initial_complexity_estimate.map(|c| c.to_string())),
        or_dash(record.estimated_weeks.map(|w| w.to_string()))
    ));
    out.push_str(&format!(
        "  Actual:        {} ({} weeks)\n",
        or_dash(record.actual_complexity.map(|c| c.to_string())),
        or_dash(record.integration_duration.map(|w| w.to_string()))
    ));
    section(&mut out, "Lessons learned", &record.lessons_learned);
    section(&mut out, "Blockers", &record.blockers);
    out
}

pub(crate) fn stats_text(stats: &HistoryStats) -> String {
    let mut out = String::new();
    out.push_str(&format!("Supported:         {}\n", stats.total_supported));
    out.push_str(&format!("In progress:       {}\n", stats.in_progress));
    out.push_str(&format!("Under evaluation:  {}\n", stats.under_evaluation));
    for (family, count) in &stats.by_family {
        out.push_str(&format!("  {:<10} {}\n", family, count));
    }
    out.push_str("Average weeks by complexity:\n");
    for (level, weeks) in &stats.avg_weeks_by_complexity {
        out.push_str(&format!("  {:<7} {:.1}\n", level, weeks));
    }
    out
}

/// One row per chain, then the verdict.
pub(crate) fn comparison_text(rows: &[(&str, &Assessment, &PriorityScore)], verdict: &str) -> String {
    let mut out = String::new();
    for (chain, a, score) in rows {
        out.push_str(&format!(
            "{:<16} {:<6} {:<3} {:>3}/100 ({})\n",
            chain,
            a.complexity.as_str(),
            a.recommended_priority.as_str(),
            score.total,
            score.rating.as_str()
        ));
    }
    out.push_str(&format!("\n{}\n", verdict));
    out
}

pub(crate) fn protocols_text(chain: &str, protocols: &[ProtocolSummary]) -> String {
    if protocols.is_empty() {
        return format!("No protocols found for {}\n", chain);
    }
    let mut out = format!("Top protocols on {}\n", chain);
    for (i, p) in protocols.iter().enumerate() {
        out.push_str(&format!(
            "{:>2}. {:<24} {:<16} {}\n",
            i + 1,
            p.name,
            p.category.as_deref().unwrap_or("-"),
            format_tvl(p.tvl)
        ));
    }
    out
}

// ── Repository analysis ──────────────────────────────────────────────

pub(crate) fn families_text(families: &[FamilyInfo]) -> String {
    let mut out = format!("{} chain families\n", families.len());
    for f in families {
        out.push_str(&format!(
            "  {:<20} {:>4} commits {:>4} PRs {:>3} files\n",
            f.name,
            f.commit_count,
            f.pr_count,
            f.files.len()
        ));
    }
    out
}

pub(crate) fn timeline_text(t: &IntegrationTimeline) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} (family {})\n", t.chain_name, t.family));
    out.push_str(&format!("  First commit:  {}\n", t.first_commit));
    out.push_str(&format!("  Latest:        {}\n", t.release_date));
    if let Some(weeks) = t.weeks_to_release {
        out.push_str(&format!("  Weeks:         {}\n", weeks));
    }
    out.push_str(&format!("  Commits:       {}\n", t.commits));
    out.push_str(&format!("  Pull requests: {}\n", t.prs));
    out
}

pub(crate) fn patterns_text(p: &IntegrationPatterns) -> String {
    let mut out = String::new();
    out.push_str(&format!("Average commits per family:  {}\n", p.avg_commits));
    out.push_str(&format!("Average PRs per family:      {}\n", p.avg_prs));
    section(&mut out, "Common files", &p.common_files);
    out
}
