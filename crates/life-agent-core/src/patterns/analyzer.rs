//! Completion and avoidance pattern analysis
//!
//! Turns a window of commitment records into per-domain completion rates and
//! trends, an aggregate avoidance rate, and cross-domain effects. Trends
//! compare the recent half of a domain's records against the earlier half:
//! - **Improving**: recent rate above earlier rate by more than the band (default 0.1)
//! - **Declining**: recent rate below earlier rate by more than the band
//! - **Stable**: anything inside the band, or fewer than 4 records

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::context::RequestContext;
use crate::domain::Domain;
use crate::error::Result;
use crate::storage::{AnalysisConfig, Commitment, Database};

/// Direction of a domain's completion rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

/// Completion statistics for one domain over the analysis window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainPatternSummary {
    pub domain: Domain,
    /// Ratio of completed commitments (0.0 to 1.0)
    pub completion_rate: f64,
    pub total_commitments: u32,
    pub trend: Trend,
}

/// Per-domain completion statistics. Domains without data are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionPatterns {
    pub by_domain: BTreeMap<Domain, DomainPatternSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvoidancePatterns {
    /// Ratio of incomplete commitments across all domains (0.0 to 1.0)
    pub total_avoidance_rate: f64,
}

/// A low-performing domain that typically drags another one down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossDomainEffect {
    pub source: Domain,
    pub target: Domain,
    /// How hard the source is failing: `1 - source completion rate`
    pub strength: f64,
    /// Completion rate of the target domain
    pub success_correlation: f64,
}

/// Complete pattern report for one user and window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternReport {
    pub window_days: u32,
    pub completion_patterns: CompletionPatterns,
    pub avoidance_patterns: AvoidancePatterns,
    pub cross_domain_effects: Vec<CrossDomainEffect>,
}

/// Known influences between domains, as (source, target).
const DOMAIN_INFLUENCES: [(Domain, Domain); 3] = [
    (Domain::Health, Domain::Business),
    (Domain::Finance, Domain::Business),
    (Domain::Business, Domain::Health),
];

/// A source domain below this completion rate is considered to affect its target.
const INFLUENCE_THRESHOLD: f64 = 0.5;

/// Analyzer for completion, avoidance and cross-domain patterns
#[derive(Debug, Clone)]
pub struct PatternAnalyzer {
    pub trend_band: f64,
    pub min_trend_records: usize,
}

impl Default for PatternAnalyzer {
    fn default() -> Self {
        Self {
            trend_band: 0.1,
            min_trend_records: 4,
        }
    }
}

impl PatternAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            trend_band: config.trend_band,
            min_trend_records: config.min_trend_records,
        }
    }

    /// Classify a domain's trend from completion flags ordered most recent first.
    ///
    /// The split is by record count: the first `n / 2` records form the recent
    /// half and the rest the earlier half.
    pub fn classify_trend(&self, recent_first: &[bool]) -> Trend {
        if recent_first.len() < self.min_trend_records.max(2) {
            return Trend::Stable;
        }

        let (recent, earlier) = recent_first.split_at(recent_first.len() / 2);
        let recent_rate = rate(recent);
        let earlier_rate = rate(earlier);

        if recent_rate > earlier_rate + self.trend_band {
            Trend::Improving
        } else if recent_rate < earlier_rate - self.trend_band {
            Trend::Declining
        } else {
            Trend::Stable
        }
    }

    /// Analyze commitments already restricted to the window.
    ///
    /// `records` must be ordered most recent first; that order decides the
    /// trend split.
    pub fn analyze_records(&self, records: &[Commitment], window_days: u32) -> PatternReport {
        let mut builders: BTreeMap<Domain, DomainBuilder> = BTreeMap::new();
        let mut incomplete = 0u32;

        for record in records {
            builders
                .entry(record.domain)
                .or_default()
                .record(record.completed);
            if !record.completed {
                incomplete += 1;
            }
        }

        let total_avoidance_rate = if records.is_empty() {
            0.0
        } else {
            f64::from(incomplete) / records.len() as f64
        };

        let by_domain: BTreeMap<Domain, DomainPatternSummary> = builders
            .into_iter()
            .map(|(domain, builder)| (domain, builder.build(domain, self)))
            .collect();

        let cross_domain_effects = cross_domain_effects(&by_domain);

        PatternReport {
            window_days,
            completion_patterns: CompletionPatterns { by_domain },
            avoidance_patterns: AvoidancePatterns {
                total_avoidance_rate,
            },
            cross_domain_effects,
        }
    }

    /// Analyze a user's commitments dated within the last `window_days` days
    /// (today included).
    ///
    /// # Errors
    /// Returns a storage error if the commitments cannot be read. Missing data
    /// is not an error and yields an empty report.
    pub fn analyze(
        &self,
        db: &Database,
        ctx: &RequestContext,
        window_days: u32,
    ) -> Result<PatternReport> {
        let after = ctx.days_back(window_days);
        let records = db.commitments_after(ctx.user_id, None, after)?;
        let report = self.analyze_records(&records, window_days);
        tracing::debug!(
            user_id = ctx.user_id,
            window_days,
            records = records.len(),
            domains = report.completion_patterns.by_domain.len(),
            avoidance_rate = report.avoidance_patterns.total_avoidance_rate,
            "analyzed completion patterns"
        );
        Ok(report)
    }
}

fn rate(flags: &[bool]) -> f64 {
    if flags.is_empty() {
        return 0.0;
    }
    flags.iter().filter(|&&done| done).count() as f64 / flags.len() as f64
}

fn cross_domain_effects(
    by_domain: &BTreeMap<Domain, DomainPatternSummary>,
) -> Vec<CrossDomainEffect> {
    DOMAIN_INFLUENCES
        .iter()
        .filter_map(|&(source, target)| {
            let source_stats = by_domain.get(&source)?;
            let target_stats = by_domain.get(&target)?;
            (source_stats.completion_rate < INFLUENCE_THRESHOLD).then(|| CrossDomainEffect {
                source,
                target,
                strength: 1.0 - source_stats.completion_rate,
                success_correlation: target_stats.completion_rate,
            })
        })
        .collect()
}

/// Helper for building one domain's summary
#[derive(Default)]
struct DomainBuilder {
    flags: Vec<bool>,
}

impl DomainBuilder {
    fn record(&mut self, completed: bool) {
        self.flags.push(completed);
    }

    fn build(self, domain: Domain, analyzer: &PatternAnalyzer) -> DomainPatternSummary {
        DomainPatternSummary {
            domain,
            completion_rate: rate(&self.flags),
            total_commitments: self.flags.len() as u32,
            trend: analyzer.classify_trend(&self.flags),
        }
    }
}
