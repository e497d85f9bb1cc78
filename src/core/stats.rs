//! Association statistics between genotype dosage and an environmental value
//!
//! Pearson and Spearman correlations use a two-sided Student's t test with
//! `n - 2` degrees of freedom. Kruskal-Wallis treats the dosage vector and
//! the value vector as two samples and applies the usual tie correction
//! before the χ² approximation.

use crate::core::error::{StatsError, StatsResult};
use statrs::distribution::{ChiSquared, ContinuousCDF, StudentsT};

/// Association measure reported in the correlation plot subtitle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    Pearson,
    Spearman,
    Kruskal,
}

impl Statistic {
    /// All statistics in the order they are run by `--statistic all`
    pub const ALL: [Statistic; 3] = [Statistic::Pearson, Statistic::Spearman, Statistic::Kruskal];

    /// Lowercase name used on the command line and in output file names
    pub fn name(self) -> &'static str {
        match self {
            Statistic::Pearson => "pearson",
            Statistic::Spearman => "spearman",
            Statistic::Kruskal => "kruskal",
        }
    }

    /// Human readable label, e.g. "Pearson correlation"
    pub fn label(self) -> &'static str {
        match self {
            Statistic::Pearson => "Pearson correlation",
            Statistic::Spearman => "Spearman correlation",
            Statistic::Kruskal => "Kruskal statistic",
        }
    }

    /// Compute the statistic over paired (dosage, value) observations
    pub fn compute(self, dosage: &[f64], values: &[f64]) -> StatsResult<TestResult> {
        match self {
            Statistic::Pearson => pearson(dosage, values),
            Statistic::Spearman => spearman(dosage, values),
            Statistic::Kruskal => {
                check_pairs(dosage, values, 0)?;
                kruskal(&[dosage.to_vec(), values.to_vec()])
            }
        }
    }

    /// Subtitle line: `<Label>: <stat>, p-value: <p>` in `%.4e` notation
    pub fn subtitle(self, result: &TestResult) -> String {
        format!(
            "{}: {}, p-value: {}",
            self.label(),
            format_sci(result.statistic),
            format_sci(result.p_value)
        )
    }
}

impl std::fmt::Display for Statistic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A test statistic with its p-value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestResult {
    pub statistic: f64,
    pub p_value: f64,
}

/// Degree-1 least squares fit `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

fn check_pairs(x: &[f64], y: &[f64], needed: usize) -> StatsResult<()> {
    if x.len() != y.len() {
        return Err(StatsError::LengthMismatch { x: x.len(), y: y.len() });
    }
    if x.len() < needed {
        return Err(StatsError::TooFewObservations { needed, found: x.len() });
    }
    Ok(())
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Least squares line through (x, y)
pub fn linear_fit(x: &[f64], y: &[f64]) -> StatsResult<LinearFit> {
    check_pairs(x, y, 2)?;

    let mx = mean(x);
    let my = mean(y);
    let sxx: f64 = x.iter().map(|xi| (xi - mx).powi(2)).sum();
    let sxy: f64 = x.iter().zip(y).map(|(xi, yi)| (xi - mx) * (yi - my)).sum();

    if sxx == 0.0 {
        return Err(StatsError::ConstantInput("slope"));
    }

    let slope = sxy / sxx;
    Ok(LinearFit {
        slope,
        intercept: my - slope * mx,
    })
}

/// Pearson product-moment correlation with two-sided p-value
pub fn pearson(x: &[f64], y: &[f64]) -> StatsResult<TestResult> {
    check_pairs(x, y, 2)?;

    let mx = mean(x);
    let my = mean(y);
    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mx;
        let dy = yi - my;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return Err(StatsError::ConstantInput("correlation"));
    }

    // Rounding can push |r| slightly past 1
    let r = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
    let p_value = correlation_p_value(r, x.len())?;

    Ok(TestResult { statistic: r, p_value })
}

/// Spearman rank correlation with two-sided p-value
pub fn spearman(x: &[f64], y: &[f64]) -> StatsResult<TestResult> {
    check_pairs(x, y, 2)?;
    pearson(&rank_average(x), &rank_average(y))
}

fn correlation_p_value(r: f64, n: usize) -> StatsResult<f64> {
    // Two points always lie on a line
    if n == 2 {
        return Ok(1.0);
    }
    let denom = 1.0 - r * r;
    if denom <= 0.0 {
        return Ok(0.0);
    }

    let df = (n - 2) as f64;
    let t = r * (df / denom).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df).map_err(|e| StatsError::Distribution(e.to_string()))?;
    Ok((2.0 * dist.sf(t.abs())).min(1.0))
}

/// Kruskal-Wallis H test over independent groups.
///
/// Empty groups are ignored; at least two non-empty groups are required.
pub fn kruskal(groups: &[Vec<f64>]) -> StatsResult<TestResult> {
    let groups: Vec<&Vec<f64>> = groups.iter().filter(|g| !g.is_empty()).collect();
    if groups.len() < 2 {
        return Err(StatsError::TooFewGroups(groups.len()));
    }

    let pooled: Vec<f64> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    let n = pooled.len() as f64;
    let ranks = rank_average(&pooled);

    let mut offset = 0;
    let mut sum_term = 0.0;
    for group in &groups {
        let rank_sum: f64 = ranks[offset..offset + group.len()].iter().sum();
        sum_term += rank_sum * rank_sum / group.len() as f64;
        offset += group.len();
    }

    let ties = tie_correction(&pooled);
    if ties == 0.0 {
        return Err(StatsError::ConstantInput("Kruskal-Wallis H"));
    }

    let h = (12.0 / (n * (n + 1.0)) * sum_term - 3.0 * (n + 1.0)) / ties;
    let df = (groups.len() - 1) as f64;
    let dist = ChiSquared::new(df).map_err(|e| StatsError::Distribution(e.to_string()))?;

    Ok(TestResult {
        statistic: h,
        p_value: dist.sf(h),
    })
}

/// Group `values` by the distinct values of `keys`, ordered by key
/// 1-based ranks; tied values share the mean of their ranks
pub fn rank_average(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // positions i..=j hold ranks i+1..=j+1
        let shared = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = shared;
        }
        i = j + 1;
    }
    ranks
}

/// `1 - Σ(t³ - t) / (n³ - n)` over tie groups of size t
fn tie_correction(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if n < 2.0 {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mut tie_sum = 0.0;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i + 1;
        while j < sorted.len() && sorted[j] == sorted[i] {
            j += 1;
        }
        let t = (j - i) as f64;
        tie_sum += t * t * t - t;
        i = j;
    }
    1.0 - tie_sum / (n * n * n - n)
}

/// Format like C's `%.4e`: four decimals and an exponent of at least two digits
pub fn format_sci(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let formatted = format!("{:.4e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exp: i32 = exponent.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        None => formatted,
    }
}

/// Box plot summary with whiskers at the most extreme points within 1.5 IQR
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxSummary {
    pub whisker_low: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_high: f64,
}

impl BoxSummary {
    /// Summarize `values`; `None` when empty
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let q1 = percentile(&sorted, 25.0);
        let median = percentile(&sorted, 50.0);
        let q3 = percentile(&sorted, 75.0);
        let iqr = q3 - q1;
        let low_fence = q1 - 1.5 * iqr;
        let high_fence = q3 + 1.5 * iqr;

        // Whiskers never reach inside the box
        let whisker_low = sorted
            .iter()
            .copied()
            .find(|v| *v >= low_fence)
            .map_or(q1, |v| v.min(q1));
        let whisker_high = sorted
            .iter()
            .rev()
            .copied()
            .find(|v| *v <= high_fence)
            .map_or(q3, |v| v.max(q3));

        Some(Self {
            whisker_low,
            q1,
            median,
            q3,
            whisker_high,
        })
    }
}

/// Linear-interpolated percentile of sorted data
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    let pos = pct / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
