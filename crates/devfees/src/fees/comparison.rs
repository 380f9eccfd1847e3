use super::aggregate::FeeBreakdown;
use super::money::round_currency;
use super::source::SourceError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A fully calculated jurisdiction, ready to be compared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JurisdictionResult {
    pub jurisdiction: String,
    pub breakdown: FeeBreakdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostMetric {
    OneTimeFees,
    MonthlyFees,
    FirstYearTotal,
}

impl CostMetric {
    pub fn ordered() -> [CostMetric; 3] {
        [
            CostMetric::OneTimeFees,
            CostMetric::MonthlyFees,
            CostMetric::FirstYearTotal,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            CostMetric::OneTimeFees => "One-Time Development Fees",
            CostMetric::MonthlyFees => "Monthly Operating Costs",
            CostMetric::FirstYearTotal => "First-Year Total",
        }
    }

    pub fn value(self, breakdown: &FeeBreakdown) -> f64 {
        match self {
            CostMetric::OneTimeFees => breakdown.one_time_fees,
            CostMetric::MonthlyFees => breakdown.monthly_fees,
            CostMetric::FirstYearTotal => breakdown.first_year_total,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheaperSide {
    Left,
    Right,
    Equal,
}

impl CheaperSide {
    pub fn flipped(self) -> Self {
        match self {
            CheaperSide::Left => CheaperSide::Right,
            CheaperSide::Right => CheaperSide::Left,
            CheaperSide::Equal => CheaperSide::Equal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub metric: CostMetric,
    pub left_value: f64,
    pub right_value: f64,
    /// Always non-negative.
    pub difference: f64,
    pub cheaper: CheaperSide,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cheaper_jurisdiction: Option<String>,
    /// Difference as a percentage of the more expensive side.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub savings_pct: Option<f64>,
}

impl MetricComparison {
    fn between(metric: CostMetric, left: &JurisdictionResult, right: &JurisdictionResult) -> Self {
        // Compare at cent precision so float noise never decides a winner.
        let left_value = round_currency(metric.value(&left.breakdown));
        let right_value = round_currency(metric.value(&right.breakdown));
        let difference = round_currency((left_value - right_value).abs());

        let cheaper = if difference == 0.0 {
            CheaperSide::Equal
        } else if left_value < right_value {
            CheaperSide::Left
        } else {
            CheaperSide::Right
        };

        let cheaper_jurisdiction = match cheaper {
            CheaperSide::Left => Some(left.jurisdiction.clone()),
            CheaperSide::Right => Some(right.jurisdiction.clone()),
            CheaperSide::Equal => None,
        };

        let costlier = left_value.max(right_value);
        let savings_pct = if costlier > 0.0 {
            Some(round_currency(difference / costlier * 100.0))
        } else {
            None
        };

        Self {
            metric,
            left_value,
            right_value,
            difference,
            cheaper,
            cheaper_jurisdiction,
            savings_pct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseComparison {
    pub left: String,
    pub right: String,
    pub metrics: Vec<MetricComparison>,
}

impl PairwiseComparison {
    pub fn metric(&self, metric: CostMetric) -> Option<&MetricComparison> {
        self.metrics.iter().find(|entry| entry.metric == metric)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    /// 1-based; jurisdictions with equal values share a position.
    pub position: usize,
    pub jurisdiction: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRanking {
    pub metric: CostMetric,
    pub entries: Vec<RankingEntry>,
}

impl MetricRanking {
    fn build(metric: CostMetric, results: &[JurisdictionResult]) -> Self {
        let values: Vec<f64> = results
            .iter()
            .map(|result| round_currency(metric.value(&result.breakdown)))
            .collect();

        let mut entries: Vec<RankingEntry> = results
            .iter()
            .zip(&values)
            .map(|(result, value)| RankingEntry {
                position: 1 + values.iter().filter(|other| *other < value).count(),
                jurisdiction: result.jurisdiction.clone(),
                value: *value,
            })
            .collect();
        // Stable sort keeps input order among ties.
        entries.sort_by_key(|entry| entry.position);

        Self { metric, entries }
    }

    pub fn cheapest(&self) -> Option<&RankingEntry> {
        self.entries.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub jurisdictions: Vec<JurisdictionResult>,
    pub pairs: Vec<PairwiseComparison>,
    pub rankings: Vec<MetricRanking>,
}

impl ComparisonReport {
    pub fn pair(&self, left: &str, right: &str) -> Option<&PairwiseComparison> {
        self.pairs
            .iter()
            .find(|pair| pair.left == left && pair.right == right)
    }

    /// Metric comparison of the first two jurisdictions.
    pub fn difference(&self, metric: CostMetric) -> Option<&MetricComparison> {
        self.pairs.first().and_then(|pair| pair.metric(metric))
    }

    pub fn ranking(&self, metric: CostMetric) -> Option<&MetricRanking> {
        self.rankings.iter().find(|ranking| ranking.metric == metric)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ComparisonError {
    #[error("comparison needs at least two jurisdictions, got {found}")]
    NotEnoughJurisdictions { found: usize },
    #[error("failed to load fees for {jurisdiction}: {source}")]
    Fetch {
        jurisdiction: String,
        #[source]
        source: SourceError,
    },
}

/// Compares independently calculated jurisdictions on every cost metric.
pub fn compare(results: &[JurisdictionResult]) -> Result<ComparisonReport, ComparisonError> {
    if results.len() < 2 {
        return Err(ComparisonError::NotEnoughJurisdictions {
            found: results.len(),
        });
    }

    let mut pairs = Vec::new();
    for (i, left) in results.iter().enumerate() {
        for right in &results[i + 1..] {
            pairs.push(PairwiseComparison {
                left: left.jurisdiction.clone(),
                right: right.jurisdiction.clone(),
                metrics: CostMetric::ordered()
                    .into_iter()
                    .map(|metric| MetricComparison::between(metric, left, right))
                    .collect(),
            });
        }
    }

    let rankings = CostMetric::ordered()
        .into_iter()
        .map(|metric| MetricRanking::build(metric, results))
        .collect();

    Ok(ComparisonReport {
        jurisdictions: results.to_vec(),
        pairs,
        rankings,
    })
}
