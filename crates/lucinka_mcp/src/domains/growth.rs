//! Growth measurements aligned against a weight-for-age reference.

use chrono::NaiveDate;
use lucinka_client::DataEntry;
use lucinka_client::utils::parse_api_timestamp;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub const DAYS_PER_MONTH: f64 = 30.44;
pub const DEFAULT_REFERENCE_LIMIT: usize = 7;

const PERCENTILES_JSON: &str = include_str!("../../data/percentiles.json");

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct ReferencePoint {
    #[serde(rename = "Month")]
    pub month: f64,
    #[serde(rename = "P1")]
    pub p1: f64,
    #[serde(rename = "P25")]
    pub p25: f64,
    #[serde(rename = "P50")]
    pub p50: f64,
    #[serde(rename = "P75")]
    pub p75: f64,
    #[serde(rename = "P99")]
    pub p99: f64,
}

/// Bundled reference table, parsed on first use.
pub fn reference() -> &'static [ReferencePoint] {
    static TABLE: OnceLock<Vec<ReferencePoint>> = OnceLock::new();
    TABLE.get_or_init(|| {
        serde_json::from_str(PERCENTILES_JSON).unwrap_or_else(|e| {
            tracing::error!(error = %e, "bundled percentile table is unreadable");
            Vec::new()
        })
    })
}

pub fn age_in_months(birth: NaiveDate, date: NaiveDate) -> f64 {
    (date - birth).num_days() as f64 / DAYS_PER_MONTH
}

/// Chart x-position in tenths of a month, so keys compare exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChartKey(i32);

impl ChartKey {
    pub fn from_months(months: f64) -> Self {
        ChartKey((months * 10.0).round() as i32)
    }

    pub fn months(self) -> f64 {
        f64::from(self.0) / 10.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
}

/// Parse entries into observations sorted by date. Entries with an
/// unreadable date are dropped.
pub fn observations(entries: &[DataEntry]) -> Vec<Observation> {
    let mut out: Vec<Observation> = entries
        .iter()
        .filter_map(|e| {
            let Some(dt) = parse_api_timestamp(&e.date) else {
                tracing::debug!(entry = e.id, date = %e.date, "skipping growth entry with bad date");
                return None;
            };
            Some(Observation {
                date: dt.date_naive(),
                weight_kg: e.weight.filter(|w| *w > 0.0),
                height_cm: e.height.filter(|h| *h > 0.0),
            })
        })
        .collect();
    out.sort_by_key(|o| o.date);
    out
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, JsonSchema)]
pub struct GrowthPoint {
    pub month: f64,
    pub p1: Option<f64>,
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub p99: Option<f64>,
    pub actual_weight: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub struct SeriesMeta {
    pub key: String,
    pub label: String,
    /// Draw a line across points where this series has no value.
    pub connect_gaps: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, JsonSchema)]
pub struct GrowthChart {
    pub points: Vec<GrowthPoint>,
    pub series: Vec<SeriesMeta>,
}

fn series() -> Vec<SeriesMeta> {
    let reference = |key: &str, label: &str| SeriesMeta {
        key: key.to_string(),
        label: label.to_string(),
        connect_gaps: true,
    };
    vec![
        reference("p1", "1st percentile"),
        reference("p25", "25th percentile"),
        reference("p50", "Median"),
        reference("p75", "75th percentile"),
        reference("p99", "99th percentile"),
        SeriesMeta {
            key: "actual_weight".to_string(),
            label: "Weight".to_string(),
            connect_gaps: false,
        },
    ]
}

/// Union of the first `limit` reference points and the weighed observations,
/// sorted by age. When two observations share a key the earlier one wins.
pub fn growth_chart(
    reference: &[ReferencePoint],
    observations: &[Observation],
    birth: NaiveDate,
    limit: usize,
) -> GrowthChart {
    let mut points: BTreeMap<ChartKey, GrowthPoint> = BTreeMap::new();
    for r in reference.iter().take(limit) {
        let key = ChartKey::from_months(r.month);
        let p = points.entry(key).or_default();
        p.p1 = Some(r.p1);
        p.p25 = Some(r.p25);
        p.p50 = Some(r.p50);
        p.p75 = Some(r.p75);
        p.p99 = Some(r.p99);
    }
    for o in observations {
        let Some(weight) = o.weight_kg else {
            continue;
        };
        let key = ChartKey::from_months(age_in_months(birth, o.date));
        let p = points.entry(key).or_default();
        if p.actual_weight.is_none() {
            p.actual_weight = Some(weight);
        }
    }
    GrowthChart {
        points: points
            .into_iter()
            .map(|(key, mut p)| {
                p.month = key.months();
                p
            })
            .collect(),
        series: series(),
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct WeightChange {
    pub total_grams: Option<i64>,
    pub last_grams: Option<i64>,
    /// e.g. `+120g`; `N/A` with fewer than two weighings.
    pub total: String,
    pub last: String,
}

fn format_grams(grams: Option<i64>) -> String {
    match grams {
        Some(g) if g >= 0 => format!("+{g}g"),
        Some(g) => format!("{g}g"),
        None => "N/A".to_string(),
    }
}

pub fn weight_change_summary(observations: &[Observation]) -> WeightChange {
    let weights: Vec<f64> = observations.iter().filter_map(|o| o.weight_kg).collect();
    let grams = |from: f64, to: f64| ((to - from) * 1000.0).round() as i64;
    let (total_grams, last_grams) = match weights.as_slice() {
        [first, .., prev, last] => (Some(grams(*first, *last)), Some(grams(*prev, *last))),
        [first, last] => (Some(grams(*first, *last)), Some(grams(*first, *last))),
        _ => (None, None),
    };
    WeightChange {
        total_grams,
        last_grams,
        total: format_grams(total_grams),
        last: format_grams(last_grams),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, JsonSchema)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

/// Value range padded by 20% of the spread, or `min_padding` when flat.
pub fn axis_range(values: impl IntoIterator<Item = f64>, min_padding: f64) -> Option<AxisRange> {
    let (lo, hi) = values.into_iter().fold((None, None), |(lo, hi): (Option<f64>, Option<f64>), v| {
        (
            Some(lo.map_or(v, |l| l.min(v))),
            Some(hi.map_or(v, |h| h.max(v))),
        )
    });
    let (lo, hi) = (lo?, hi?);
    let spread = (hi - lo) * 0.2;
    let padding = if spread > 0.0 { spread } else { min_padding };
    Some(AxisRange {
        min: (lo - padding).max(0.0),
        max: hi + padding,
    })
}

#[derive(Clone, Debug, PartialEq, Serialize, JsonSchema)]
pub struct GrowthSummary {
    pub birth_date: String,
    pub age_months: f64,
    pub latest_weight_kg: Option<f64>,
    pub latest_height_cm: Option<f64>,
    pub weight_change: WeightChange,
    pub weight_axis: Option<AxisRange>,
    pub height_axis: Option<AxisRange>,
    pub chart: GrowthChart,
}

pub fn summarize(
    entries: &[DataEntry],
    birth: NaiveDate,
    today: NaiveDate,
    reference_limit: usize,
) -> GrowthSummary {
    let obs = observations(entries);
    GrowthSummary {
        birth_date: birth.format("%Y-%m-%d").to_string(),
        age_months: (age_in_months(birth, today) * 10.0).round() / 10.0,
        latest_weight_kg: obs.iter().rev().find_map(|o| o.weight_kg),
        latest_height_cm: obs.iter().rev().find_map(|o| o.height_cm),
        weight_change: weight_change_summary(&obs),
        weight_axis: axis_range(obs.iter().filter_map(|o| o.weight_kg), 0.5),
        height_axis: axis_range(obs.iter().filter_map(|o| o.height_cm), 1.0),
        chart: growth_chart(reference(), &obs, birth, reference_limit),
    }
}
