//! Statistics behind the chart views
//!
//! Box plots need a five-number summary with Tukey whiskers, the scatter plot
//! an ordinary-least-squares trend per color group, and the faceted box plot
//! equal-width buckets of a continuous column.

/// Default whisker length in IQRs
pub const DEFAULT_WHISKER_COEF: f64 = 1.5;

/// Box plot statistics for one group
#[derive(Debug, Clone, PartialEq)]
pub struct FiveNumberSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    /// Lower whisker end: smallest value at or above `q1 - coef * iqr`
    pub lower: f64,
    /// Upper whisker end: largest value at or below `q3 + coef * iqr`
    pub upper: f64,
    /// Values beyond the fences
    pub outliers: Vec<f64>,
}

impl FiveNumberSummary {
    /// Summarize `values`, ignoring NaNs; `None` when nothing is left
    pub fn from_values(values: &[f64], coef: f64) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(|a, b| a.total_cmp(b));

        let min = sorted[0];
        let max = sorted[sorted.len() - 1];
        let q1 = quantile_sorted(&sorted, 0.25);
        let median = quantile_sorted(&sorted, 0.5);
        let q3 = quantile_sorted(&sorted, 0.75);
        let iqr = q3 - q1;
        let lower_fence = q1 - coef * iqr;
        let upper_fence = q3 + coef * iqr;
        let (inside, outliers): (Vec<f64>, Vec<f64>) = sorted
            .iter()
            .copied()
            .partition(|v| *v >= lower_fence && *v <= upper_fence);
        // q1..q3 always lies inside the fences, so `inside` is non-empty
        let lower = inside.first().copied().unwrap_or(min);
        let upper = inside.last().copied().unwrap_or(max);

        Some(Self {
            min,
            q1,
            median,
            q3,
            max,
            lower,
            upper,
            outliers,
        })
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// Linearly interpolated quantile of ascending `sorted` (`quantile_cont`)
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let below = position.floor() as usize;
    let above = position.ceil() as usize;
    let weight = position - below as f64;
    sorted[below] + (sorted[above] - sorted[below]) * weight
}

/// Ordinary least squares fit of y on x
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub n: usize,
}

impl LinearFit {
    /// `None` for fewer than two points or when every x is equal
    pub fn ordinary_least_squares(points: &[(f64, f64)]) -> Option<Self> {
        let n = points.len();
        if n < 2 {
            return None;
        }
        let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n as f64;
        let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n as f64;

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        let mut syy = 0.0;
        for (x, y) in points {
            let dx = x - mean_x;
            let dy = y - mean_y;
            sxx += dx * dx;
            sxy += dx * dy;
            syy += dy * dy;
        }
        if sxx == 0.0 {
            return None;
        }

        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;
        // A flat y is fitted exactly
        let r_squared = if syy == 0.0 {
            1.0
        } else {
            (sxy * sxy) / (sxx * syy)
        };

        Some(Self {
            slope,
            intercept,
            r_squared,
            n,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Equal-width buckets over the range of a column, right-closed `(a, b]`
///
/// Edges are spaced evenly between min and max, with the lowest edge pushed
/// down by 0.1% of the range so the minimum falls inside the first bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct EqualWidthBins {
    edges: Vec<f64>,
}

impl EqualWidthBins {
    /// `None` when `values` holds no finite number or `bins` is zero
    pub fn new(values: &[f64], bins: usize) -> Option<Self> {
        if bins == 0 {
            return None;
        }
        let finite = values.iter().copied().filter(|v| v.is_finite());
        let (min, max) = finite.fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;

        let edges = if min == max {
            // Degenerate range: widen by 0.1% on both sides
            let adjust = if min == 0.0 { 0.001 } else { min.abs() * 0.001 };
            linspace(min - adjust, max + adjust, bins + 1)
        } else {
            let mut edges = linspace(min, max, bins + 1);
            edges[0] -= (max - min) * 0.001;
            edges
        };
        Some(Self { edges })
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bucket index of `value`, if it falls in `(edges[0], edges[n]]`
    pub fn index_of(&self, value: f64) -> Option<usize> {
        if !value.is_finite() {
            return None;
        }
        let last = self.edges.len() - 1;
        if value <= self.edges[0] || value > self.edges[last] {
            return None;
        }
        (0..last).find(|&i| value > self.edges[i] && value <= self.edges[i + 1])
    }

    /// Interval labels in bucket order, e.g. `"(15.936, 27.0]"`
    pub fn labels(&self) -> Vec<String> {
        self.edges
            .windows(2)
            .map(|w| format!("({}, {}]", format_edge(w[0]), format_edge(w[1])))
            .collect()
    }

    pub fn label_of(&self, value: f64) -> Option<String> {
        self.index_of(value).map(|i| self.labels()[i].clone())
    }
}

fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    let step = (end - start) / (count - 1) as f64;
    (0..count)
        .map(|i| {
            if i == count - 1 {
                end
            } else {
                start + step * i as f64
            }
        })
        .collect()
}

/// Three decimals, keeping one digit after the point for whole numbers
fn format_edge(edge: f64) -> String {
    let rounded = (edge * 1000.0).round() / 1000.0;
    if rounded.fract() == 0.0 {
        format!("{:.1}", rounded)
    } else {
        format!("{}", rounded)
    }
}
