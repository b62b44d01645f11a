//! Analysis of generated or stored responses.
//!
//! Works on sink rows so the same report runs against an in-memory dry run
//! or against the live data service.

use std::collections::HashMap;
use std::fmt::Write as _;

use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;

use super::catalog::{construct_name, SurveyCatalog};
use super::types::{Section, StakeholderType};

// ─────────────────────────────────────────────────────────────────
// Descriptive Statistics
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DescriptiveStats {
    pub n: usize,
    pub mean: f64,
    /// Sample standard deviation; 0 for fewer than two values
    pub sd: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
}

/// All zeros for an empty slice.
pub fn describe(values: &[f64]) -> DescriptiveStats {
    let n = values.len();
    if n == 0 {
        return DescriptiveStats::default();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mean = values.iter().sum::<f64>() / n as f64;
    let sd = if n > 1 {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    } else {
        0.0
    };
    let median = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    };

    DescriptiveStats {
        n,
        mean,
        sd,
        min: sorted[0],
        max: sorted[n - 1],
        median,
    }
}

/// Counts of each scale point 1..=7; out-of-range values are ignored.
pub fn frequency_distribution(values: &[u8]) -> [usize; 7] {
    let mut dist = [0usize; 7];
    for &v in values {
        if (1..=7).contains(&v) {
            dist[(v - 1) as usize] += 1;
        }
    }
    dist
}

// ─────────────────────────────────────────────────────────────────
// One-Way ANOVA
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnovaResult {
    /// `None` when fewer than two non-empty groups, no within-group df, or
    /// every value is the same. Infinite when groups are constant but differ.
    pub f: Option<f64>,
    pub p: Option<f64>,
    pub df_between: usize,
    pub df_within: usize,
}

/// Compare group means. Empty groups are dropped.
pub fn one_way_anova(groups: &[&[f64]]) -> AnovaResult {
    let groups: Vec<&[f64]> = groups.iter().copied().filter(|g| !g.is_empty()).collect();
    let k = groups.len();
    let none = |df_between, df_within| AnovaResult {
        f: None,
        p: None,
        df_between,
        df_within,
    };

    if k < 2 {
        return none(0, 0);
    }
    let n: usize = groups.iter().map(|g| g.len()).sum();
    if n <= k {
        return none(k - 1, 0);
    }

    let grand_mean = groups.iter().flat_map(|g| g.iter()).sum::<f64>() / n as f64;
    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for g in &groups {
        let mean = g.iter().sum::<f64>() / g.len() as f64;
        ss_between += g.len() as f64 * (mean - grand_mean).powi(2);
        ss_within += g.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    }

    let df_between = k - 1;
    let df_within = n - k;

    // No spread inside any group: identical means are undefined, distinct
    // means are perfectly separated.
    if ss_within == 0.0 {
        if ss_between == 0.0 {
            return none(df_between, df_within);
        }
        return AnovaResult {
            f: Some(f64::INFINITY),
            p: Some(0.0),
            df_between,
            df_within,
        };
    }

    let ms_between = ss_between / df_between as f64;
    let ms_within = ss_within / df_within as f64;
    let f = ms_between / ms_within;
    let p = 1.0 - f_cdf(f, df_between as f64, df_within as f64);

    AnovaResult {
        f: Some(f),
        p: Some(p),
        df_between,
        df_within,
    }
}

/// CDF of the F distribution.
pub fn f_cdf(f: f64, d1: f64, d2: f64) -> f64 {
    if f <= 0.0 {
        return 0.0;
    }
    let x = d1 * f / (d1 * f + d2);
    regularized_beta(x, d1 / 2.0, d2 / 2.0)
}

/// Regularized incomplete beta `I_x(a, b)` by continued fraction.
fn regularized_beta(x: f64, a: f64, b: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();
    // The fraction converges fast on this side of the mean
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_fraction(x, a, b) / a
    } else {
        1.0 - front * beta_fraction(1.0 - x, b, a) / b
    }
}

fn beta_fraction(x: f64, a: f64, b: f64) -> f64 {
    const MAX_ITER: usize = 300;
    const EPS: f64 = 1e-14;
    const TINY: f64 = 1e-300;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < TINY {
        d = TINY;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;
        if (del - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

/// Lanczos approximation (g = 7, n = 9).
fn ln_gamma(x: f64) -> f64 {
    const COEF: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];
    if x < 0.5 {
        // Reflection
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let mut sum = COEF[0];
    for (i, c) in COEF.iter().enumerate().skip(1) {
        sum += c / (x + i as f64);
    }
    let t = x + 7.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + sum.ln()
}

// ─────────────────────────────────────────────────────────────────
// Construct Aggregation
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RespondentRow {
    id: String,
    stakeholder_type: StakeholderType,
}

#[derive(Debug, Deserialize)]
struct RatingRow {
    respondent_id: String,
    item_code: String,
    value: u8,
}

/// Per-respondent construct means, grouped by stakeholder type.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructAggregate {
    pub construct: String,
    /// Indexed by position in [`StakeholderType::all`]
    pub means: [Vec<f64>; 3],
}

impl ConstructAggregate {
    pub fn for_stakeholder(&self, stakeholder: StakeholderType) -> &[f64] {
        &self.means[stakeholder_index(stakeholder)]
    }

    pub fn anova(&self) -> AnovaResult {
        let groups: Vec<&[f64]> = self.means.iter().map(Vec::as_slice).collect();
        one_way_anova(&groups)
    }
}

fn stakeholder_index(stakeholder: StakeholderType) -> usize {
    match stakeholder {
        StakeholderType::Student => 0,
        StakeholderType::Faculty => 1,
        StakeholderType::Practitioner => 2,
    }
}

/// Group rating rows into construct means per respondent.
///
/// A construct's items come from the respondent's own catalog; ratings of
/// unknown respondents are ignored.
pub fn aggregate_by_construct(
    rating_rows: &[Value],
    respondent_rows: &[Value],
    catalog: &SurveyCatalog,
) -> Result<Vec<ConstructAggregate>> {
    let mut type_of: HashMap<String, StakeholderType> = HashMap::new();
    for row in respondent_rows {
        let r: RespondentRow = serde_json::from_value(row.clone())?;
        type_of.insert(r.id, r.stakeholder_type);
    }

    let mut by_respondent: HashMap<String, HashMap<String, u8>> = HashMap::new();
    for row in rating_rows {
        let r: RatingRow = serde_json::from_value(row.clone())?;
        by_respondent
            .entry(r.respondent_id)
            .or_default()
            .insert(r.item_code, r.value);
    }

    let mut aggregates: Vec<ConstructAggregate> = catalog
        .construct_ids()
        .into_iter()
        .map(|id| ConstructAggregate {
            construct: id.to_string(),
            means: [Vec::new(), Vec::new(), Vec::new()],
        })
        .collect();

    // Stable output: iterate respondents in the order the sink returned them
    for row in respondent_rows {
        let Some(id) = row.get("id").and_then(Value::as_str) else {
            continue;
        };
        let (Some(&stakeholder), Some(responses)) = (type_of.get(id), by_respondent.get(id)) else {
            continue;
        };

        for aggregate in aggregates.iter_mut() {
            let items = Section::all()
                .iter()
                .flat_map(|s| catalog.constructs(stakeholder, *s))
                .find(|c| c.id == aggregate.construct)
                .map(|c| c.items.as_slice())
                .unwrap_or(&[]);
            let values: Vec<f64> = items
                .iter()
                .filter_map(|code| responses.get(code))
                .map(|v| *v as f64)
                .collect();
            if !values.is_empty() {
                let mean = values.iter().sum::<f64>() / values.len() as f64;
                aggregate.means[stakeholder_index(stakeholder)].push(mean);
            }
        }
    }

    Ok(aggregates)
}

// ─────────────────────────────────────────────────────────────────
// Report
// ─────────────────────────────────────────────────────────────────

/// Plain-text construct table with per-stakeholder means and ANOVA.
pub fn render_construct_table(aggregates: &[ConstructAggregate]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<6} {:<36} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "ID", "Construct", "Student", "Faculty", "Pract.", "F", "p"
    );
    let _ = writeln!(out, "{}", "─".repeat(88));

    for agg in aggregates {
        let cell = |st| {
            let stats = describe(agg.for_stakeholder(st));
            if stats.n == 0 {
                "—".to_string()
            } else {
                format!("{:.2}", stats.mean)
            }
        };
        let anova = agg.anova();
        let f = anova.f.map_or("—".to_string(), |f| format!("{:.2}", f));
        let p = anova.p.map_or("—".to_string(), |p| {
            if p < 0.001 {
                "<.001".to_string()
            } else {
                format!("{:.3}", p)
            }
        });
        let _ = writeln!(
            out,
            "{:<6} {:<36} {:>8} {:>8} {:>8} {:>8} {:>8}",
            agg.construct,
            construct_name(&agg.construct).unwrap_or(""),
            cell(StakeholderType::Student),
            cell(StakeholderType::Faculty),
            cell(StakeholderType::Practitioner),
            f,
            p
        );
    }
    out
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_describe() {
        let s = describe(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(s.n, 8);
        assert!(close(s.mean, 5.0, 1e-12));
        assert!(close(s.sd, 2.138_089_935, 1e-6));
        assert_eq!(s.min, 2.0);
        assert_eq!(s.max, 9.0);
        assert_eq!(s.median, 4.5);

        assert_eq!(describe(&[]), DescriptiveStats::default());
        assert_eq!(describe(&[3.0]).sd, 0.0);
    }

    #[test]
    fn test_frequency_distribution() {
        let dist = frequency_distribution(&[1, 1, 4, 7, 7, 7, 0, 9]);
        assert_eq!(dist, [2, 0, 0, 1, 0, 0, 3]);
    }

    #[test]
    fn test_ln_gamma() {
        assert!(close(ln_gamma(1.0), 0.0, 1e-10));
        assert!(close(ln_gamma(5.0), 24f64.ln(), 1e-10));
        assert!(close(ln_gamma(0.5), std::f64::consts::PI.sqrt().ln(), 1e-10));
    }

    #[test]
    fn test_f_cdf_known_values() {
        // F(1, d2) with x=1 and d2=1 gives 0.5
        assert!(close(f_cdf(1.0, 1.0, 1.0), 0.5, 1e-9));
        // 95th percentile of F(2, 10) is 4.1028
        assert!(close(f_cdf(4.102_821, 2.0, 10.0), 0.95, 1e-5));
        // 99th percentile of F(3, 20) is 4.9382
        assert!(close(f_cdf(4.938_193, 3.0, 20.0), 0.99, 1e-5));
        assert_eq!(f_cdf(0.0, 2.0, 10.0), 0.0);
    }

    #[test]
    fn test_anova() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 5.0, 6.0];
        let c = [7.0, 8.0, 9.0];
        let r = one_way_anova(&[&a, &b, &c]);
        assert_eq!(r.df_between, 2);
        assert_eq!(r.df_within, 6);
        assert!(close(r.f.unwrap(), 27.0, 1e-9));
        assert!(r.p.unwrap() < 0.001);

        let same = one_way_anova(&[&a, &a]);
        assert!(close(same.f.unwrap(), 0.0, 1e-12));
        assert!(close(same.p.unwrap(), 1.0, 1e-9));
    }

    #[test]
    fn test_anova_degenerate() {
        let a = [1.0, 2.0];
        assert_eq!(one_way_anova(&[&a]).f, None);
        assert_eq!(one_way_anova(&[&a, &[]]).f, None);
        let r = one_way_anova(&[&[1.0], &[2.0]]);
        assert_eq!(r.f, None);
        assert_eq!(r.df_between, 1);
    }

    #[test]
    fn test_anova_constant_groups() {
        let low = [2.0, 2.0, 2.0];
        let high = [6.0, 6.0];
        let r = one_way_anova(&[&low, &high]);
        assert_eq!(r.f, Some(f64::INFINITY));
        assert_eq!(r.p, Some(0.0));
        assert_eq!((r.df_between, r.df_within), (1, 3));

        let r = one_way_anova(&[&low, &low]);
        assert_eq!(r.f, None);
        assert_eq!(r.p, None);

        let table = render_construct_table(&[ConstructAggregate {
            construct: "EJ".into(),
            means: [low.to_vec(), high.to_vec(), vec![]],
        }]);
        assert!(table.contains("<.001"));
    }

    #[test]
    fn test_aggregate_by_construct() {
        let respondents = vec![
            json!({"id": "s1", "stakeholder_type": "student"}),
            json!({"id": "f1", "stakeholder_type": "faculty"}),
        ];
        let ratings = vec![
            json!({"respondent_id": "s1", "section": "A", "item_code": "PU-E1", "value": 4}),
            json!({"respondent_id": "s1", "section": "A", "item_code": "PU-E2", "value": 6}),
            json!({"respondent_id": "f1", "section": "B", "item_code": "GB4", "value": 7}),
            json!({"respondent_id": "ghost", "section": "A", "item_code": "PU-E1", "value": 1}),
        ];
        let aggs = aggregate_by_construct(&ratings, &respondents, &SurveyCatalog::standard()).unwrap();
        assert_eq!(aggs.len(), 13);

        let pu_e = aggs.iter().find(|a| a.construct == "PU-E").unwrap();
        assert_eq!(pu_e.for_stakeholder(StakeholderType::Student), &[5.0]);
        assert!(pu_e.for_stakeholder(StakeholderType::Faculty).is_empty());

        let gb = aggs.iter().find(|a| a.construct == "GB").unwrap();
        assert_eq!(gb.for_stakeholder(StakeholderType::Faculty), &[7.0]);
    }

    #[test]
    fn test_render_table() {
        let aggs = vec![ConstructAggregate {
            construct: "EJ".into(),
            means: [vec![4.0, 5.0], vec![6.0, 6.5], vec![]],
        }];
        let table = render_construct_table(&aggs);
        assert!(table.contains("Epistemic Judgment"));
        assert!(table.contains("4.50"));
        assert!(table.contains("6.25"));
    }
}
