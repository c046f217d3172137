//! Integration history mined from a wallet repository on GitHub.
//!
//! Every supported chain family is a directory under one path of the
//! repository. Commit and pull request activity on that directory is the
//! closest thing we have to a record of what an integration took.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::error::SourceError;
use crate::http::{blocking, encode_segment, get_json_with_headers};

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_REPOSITORY: &str = "LedgerHQ/ledger-live";
pub const DEFAULT_FAMILIES_PATH: &str = "libs/ledger-live-common/src/families";

/// Files listed in [`IntegrationPatterns::common_files`].
pub const COMMON_FILE_COUNT: usize = 10;

const PAGE_SIZE: u32 = 100;
const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const SECONDS_PER_WEEK: f64 = 7.0 * 24.0 * 60.0 * 60.0;

// ── API shapes ───────────────────────────────────────────────────────

/// One entry of `/repos/{repo}/contents/{path}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Commit {
    #[serde(default)]
    pub sha: String,
    pub commit: CommitDetail,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommitDetail {
    pub author: CommitAuthor,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommitAuthor {
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PullRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
}

// ── Results ──────────────────────────────────────────────────────────

/// Activity on one chain family directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyInfo {
    pub name: String,
    pub path: String,
    pub family: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_commit: Option<String>,
    pub commit_count: usize,
    pub pr_count: usize,
    pub files: Vec<String>,
}

/// First to latest commit on the family a chain maps to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationTimeline {
    pub chain_name: String,
    pub family: String,
    pub first_commit: String,
    pub release_date: String,
    /// Whole weeks, rounded up. `None` when a commit date does not parse.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weeks_to_release: Option<i64>,
    pub commits: usize,
    pub prs: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationPatterns {
    /// File names shared by the most families, most shared first.
    pub common_files: Vec<String>,
    pub avg_commits: u64,
    #[serde(rename = "avgPRs")]
    pub avg_prs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryReport {
    pub families: Vec<FamilyInfo>,
    pub patterns: IntegrationPatterns,
}

// ── Pure analysis over fetched data ──────────────────────────────────

/// Directory names under the families path, hidden ones excluded.
pub fn family_names(entries: &[ContentEntry]) -> Vec<String> {
    entries
        .iter()
        .filter(|e| e.kind == "dir" && !e.name.starts_with('.'))
        .map(|e| e.name.clone())
        .collect()
}

/// Plain files of a directory listing.
pub fn file_names(entries: &[ContentEntry]) -> Vec<String> {
    entries
        .iter()
        .filter(|e| e.kind == "file")
        .map(|e| e.name.clone())
        .collect()
}

/// Pull requests whose title or body mentions `needle`, case-insensitive.
pub fn mentions(prs: &[PullRequest], needle: &str) -> usize {
    let needle = needle.to_lowercase();
    prs.iter()
        .filter(|pr| {
            pr.title.to_lowercase().contains(&needle)
                || pr
                    .body
                    .as_deref()
                    .is_some_and(|body| body.to_lowercase().contains(&needle))
        })
        .count()
}

/// First family whose name contains the chain name, or is contained by it.
pub fn match_family<'a>(families: &'a [String], chain: &str) -> Option<&'a str> {
    let chain = chain.trim().to_lowercase();
    if chain.is_empty() {
        return None;
    }
    families
        .iter()
        .find(|f| {
            let family = f.to_lowercase();
            family.contains(&chain) || chain.contains(&family)
        })
        .map(String::as_str)
}

/// Timeline from a newest-first commit list. `None` without commits.
pub fn timeline(
    chain: &str,
    family: &str,
    commits: &[Commit],
    prs: &[PullRequest],
) -> Option<IntegrationTimeline> {
    let latest = &commits.first()?.commit.author.date;
    let first = &commits.last()?.commit.author.date;

    let weeks = match (
        OffsetDateTime::parse(first, &Rfc3339),
        OffsetDateTime::parse(latest, &Rfc3339),
    ) {
        (Ok(start), Ok(end)) => {
            Some(((end - start).as_seconds_f64() / SECONDS_PER_WEEK).ceil() as i64)
        }
        _ => None,
    };

    Some(IntegrationTimeline {
        chain_name: chain.to_string(),
        family: family.to_string(),
        first_commit: first.clone(),
        release_date: latest.clone(),
        weeks_to_release: weeks,
        commits: commits.len(),
        prs: mentions(prs, chain),
    })
}

/// Common files and average activity across families.
pub fn patterns(families: &[FamilyInfo]) -> IntegrationPatterns {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for file in families.iter().flat_map(|f| &f.files) {
        match counts.iter_mut().find(|(name, _)| *name == file.as_str()) {
            Some((_, n)) => *n += 1,
            None => counts.push((file.as_str(), 1)),
        }
    }
    // stable: ties keep first-seen order
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let average = |total: usize| {
        if families.is_empty() {
            0
        } else {
            (total as f64 / families.len() as f64).round() as u64
        }
    };

    IntegrationPatterns {
        common_files: counts
            .into_iter()
            .take(COMMON_FILE_COUNT)
            .map(|(name, _)| name.to_string())
            .collect(),
        avg_commits: average(families.iter().map(|f| f.commit_count).sum()),
        avg_prs: average(families.iter().map(|f| f.pr_count).sum()),
    }
}

// ── Client ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct GitHubClient {
    api_url: String,
    repository: String,
    families_path: String,
    token: Option<String>,
}

impl Default for GitHubClient {
    fn default() -> Self {
        Self::new(DEFAULT_GITHUB_API_URL)
    }
}

impl GitHubClient {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            repository: DEFAULT_REPOSITORY.to_string(),
            families_path: DEFAULT_FAMILIES_PATH.to_string(),
            token: None,
        }
    }

    /// Analyze `repository` ("owner/name") with families under `families_path`.
    pub fn with_repository(
        mut self,
        repository: impl Into<String>,
        families_path: impl Into<String>,
    ) -> Self {
        self.repository = repository.into();
        self.families_path = families_path.into().trim_matches('/').to_string();
        self
    }

    /// Bearer token. Unauthenticated calls are heavily rate limited.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, SourceError> {
        let url = format!("{}/repos/{}/{}", self.api_url, self.repository, endpoint);
        let auth = self.token.as_ref().map(|t| format!("Bearer {}", t));
        let mut headers = vec![("accept", GITHUB_ACCEPT)];
        if let Some(auth) = &auth {
            headers.push(("authorization", auth.as_str()));
        }
        get_json_with_headers(&url, &headers)
    }

    fn family_path(&self, family: &str) -> String {
        format!("{}/{}", self.families_path, encode_segment(family))
    }

    fn commits(&self, path: &str) -> Result<Vec<Commit>, SourceError> {
        self.get(&format!("commits?path={}&per_page={}", path, PAGE_SIZE))
    }

    fn pull_requests(&self) -> Result<Vec<PullRequest>, SourceError> {
        self.get(&format!("pulls?state=all&per_page={}", PAGE_SIZE))
    }

    pub fn fetch_family_names(&self) -> Result<Vec<String>, SourceError> {
        let entries: Vec<ContentEntry> = self.get(&format!("contents/{}", self.families_path))?;
        Ok(family_names(&entries))
    }

    /// Every family with its activity. The family listing must succeed;
    /// a family whose directory cannot be read is skipped, and missing
    /// commit or pull request data counts as zero.
    pub fn fetch_families(&self) -> Result<Vec<FamilyInfo>, SourceError> {
        let names = self.fetch_family_names()?;
        let prs = self.pull_requests().unwrap_or_else(|e| {
            debug!(error = %e, "pull requests unavailable");
            Vec::new()
        });

        let mut families = Vec::with_capacity(names.len());
        for name in names {
            let path = self.family_path(&name);
            let entries: Vec<ContentEntry> = match self.get(&format!("contents/{}", path)) {
                Ok(entries) => entries,
                Err(e) => {
                    debug!(family = %name, error = %e, "family directory unreadable, skipped");
                    continue;
                }
            };
            let commits = self.commits(&path).unwrap_or_else(|e| {
                debug!(family = %name, error = %e, "commit history unavailable");
                Vec::new()
            });

            families.push(FamilyInfo {
                pr_count: mentions(&prs, &name),
                last_commit: commits.first().map(|c| c.commit.author.date.clone()),
                commit_count: commits.len(),
                files: file_names(&entries),
                family: name.clone(),
                name,
                path,
            });
        }

        info!(
            repository = %self.repository,
            families = families.len(),
            "repository families analyzed"
        );
        Ok(families)
    }

    /// Timeline for the family `chain` maps to, or `None` if no family
    /// matches or it has no commits.
    pub fn fetch_timeline(&self, chain: &str) -> Result<Option<IntegrationTimeline>, SourceError> {
        let names = self.fetch_family_names()?;
        let Some(family) = match_family(&names, chain) else {
            debug!(chain, "no matching family");
            return Ok(None);
        };
        let commits = self.commits(&self.family_path(family))?;
        let prs = self.pull_requests().unwrap_or_else(|e| {
            debug!(error = %e, "pull requests unavailable");
            Vec::new()
        });
        Ok(timeline(chain, family, &commits, &prs))
    }

    pub fn fetch_report(&self) -> Result<RepositoryReport, SourceError> {
        let families = self.fetch_families()?;
        let patterns = patterns(&families);
        Ok(RepositoryReport { families, patterns })
    }

    // Async wrappers over the blocking calls.

    pub async fn families(&self) -> Result<Vec<FamilyInfo>, SourceError> {
        let client = self.clone();
        blocking(move || client.fetch_families()).await
    }

    pub async fn timeline(&self, chain: &str) -> Result<Option<IntegrationTimeline>, SourceError> {
        let client = self.clone();
        let chain = chain.to_string();
        blocking(move || client.fetch_timeline(&chain)).await
    }

    pub async fn report(&self) -> Result<RepositoryReport, SourceError> {
        let client = self.clone();
        blocking(move || client.fetch_report()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(date: &str) -> Commit {
        Commit {
            sha: String::new(),
            commit: CommitDetail {
                author: CommitAuthor {
                    date: date.to_string(),
                },
                message: String::new(),
            },
        }
    }

    fn family(name: &str, files: &[&str], commits: usize, prs: usize) -> FamilyInfo {
        FamilyInfo {
            name: name.to_string(),
            path: format!("src/{}", name),
            family: name.to_string(),
            last_commit: None,
            commit_count: commits,
            pr_count: prs,
            files: files.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn family_match_works_both_ways() {
        let names = vec!["evm".to_string(), "cosmos".to_string(), "solana".to_string()];
        assert_eq!(match_family(&names, "Solana"), Some("solana"));
        // chain name containing the family
        assert_eq!(match_family(&names, "Cosmos Hub"), Some("cosmos"));
        assert_eq!(match_family(&names, "sol"), Some("solana"));
        assert_eq!(match_family(&names, "Monero"), None);
        assert_eq!(match_family(&names, "  "), None);
    }

    #[test]
    fn mentions_are_case_insensitive_and_tolerate_empty_bodies() {
        let prs = vec![
            PullRequest {
                title: "feat(Tezos): baking".to_string(),
                body: None,
            },
            PullRequest {
                title: "chore".to_string(),
                body: Some("bump TEZOS deps".to_string()),
            },
            PullRequest {
                title: "fix".to_string(),
                body: Some(String::new()),
            },
        ];
        assert_eq!(mentions(&prs, "tezos"), 2);
        assert_eq!(mentions(&prs, "near"), 0);
    }

    #[test]
    fn timeline_weeks_round_up() {
        let commits = [
            commit("2024-02-09T00:00:00Z"),
            commit("2024-01-20T10:00:00Z"),
            commit("2024-01-01T00:00:00Z"),
        ];
        let t = timeline("Tron", "tron", &commits, &[]).unwrap();
        assert_eq!(t.first_commit, "2024-01-01T00:00:00Z");
        assert_eq!(t.release_date, "2024-02-09T00:00:00Z");
        // 39 days
        assert_eq!(t.weeks_to_release, Some(6));
        assert_eq!(t.commits, 3);

        let single = timeline("Tron", "tron", &commits[..1], &[]).unwrap();
        assert_eq!(single.weeks_to_release, Some(0));

        let garbled = timeline("Tron", "tron", &[commit("yesterday")], &[]).unwrap();
        assert_eq!(garbled.weeks_to_release, None);

        assert!(timeline("Tron", "tron", &[], &[]).is_none());
    }

    #[test]
    fn patterns_rank_shared_files() {
        let families = vec![
            family("a", &["index.ts", "bridge.ts"], 4, 1),
            family("b", &["bridge.ts", "types.ts"], 3, 0),
            family("c", &["types.ts", "bridge.ts"], 0, 0),
        ];
        let p = patterns(&families);
        assert_eq!(p.common_files, ["bridge.ts", "types.ts", "index.ts"]);
        // 7 / 3 = 2.33
        assert_eq!(p.avg_commits, 2);
        // 1 / 3 = 0.33
        assert_eq!(p.avg_prs, 0);

        let empty = patterns(&[]);
        assert!(empty.common_files.is_empty());
        assert_eq!(empty.avg_commits, 0);
    }

    #[test]
    fn common_files_are_capped() {
        let files: Vec<String> = (0..15).map(|n| format!("f{}.ts", n)).collect();
        let refs: Vec<&str> = files.iter().map(String::as_str).collect();
        let p = patterns(&[family("a", &refs, 0, 0)]);
        assert_eq!(p.common_files.len(), COMMON_FILE_COUNT);
        assert_eq!(p.common_files[0], "f0.ts");
    }

    #[test]
    fn listing_drops_hidden_dirs_and_files() {
        let entries = listing();
        assert_eq!(family_names(&entries), ["evm"]);
        assert_eq!(file_names(&entries), ["README.md"]);
    }

    fn listing() -> Vec<ContentEntry> {
        vec![
            ContentEntry {
                name: "evm".to_string(),
                kind: "dir".to_string(),
                path: "f/evm".to_string(),
            },
            ContentEntry {
                name: ".github".to_string(),
                kind: "dir".to_string(),
                path: "f/.github".to_string(),
            },
            ContentEntry {
                name: "README.md".to_string(),
                kind: "file".to_string(),
                path: "f/README.md".to_string(),
            },
        ]
    }

    #[test]
    fn client_trims_configuration() {
        let client = GitHubClient::new("http://localhost:9/")
            .with_repository("acme/wallet", "/src/families/")
            .with_token(Some(String::new()));
        assert_eq!(client.api_url, "http://localhost:9");
        assert_eq!(client.families_path, "src/families");
        assert!(client.token.is_none());
        assert_eq!(client.family_path("near"), "src/families/near");
    }
}
