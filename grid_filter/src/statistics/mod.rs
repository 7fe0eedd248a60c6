//! Order statistics over footprint samples: quantiles, modes, extremes and
//! their area-weighted forms.
//!
//! All functions reorder their input buffer and expect no NaN values.


use crate::config::ModeTieBreak;

/// A sample value and its weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub value: f64,
    pub weight: f64,
}

/// Mode estimate and the number of equally short intervals it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeEstimate {
    pub value: f64,
    pub multiplicity: u32,
}

/// Which extreme to pick and from which samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    Min,
    Max,
    /// Lowest of the samples `>= 0`.
    MinPositive,
    /// Highest of the samples `<= 0`.
    MaxNegative,
}

#[inline]
fn sort(values: &mut [f64]) {
    values.sort_unstable_by(f64::total_cmp);
}

#[inline]
fn sort_observations(data: &mut [Observation]) {
    data.sort_unstable_by(|a, b| a.value.total_cmp(&b.value));
}

/// Quantile `q` in `[0, 1]` with linear interpolation between order statistics.
///
/// `q = 0.5` is the median. Returns NaN for an empty slice.
pub fn quantile(values: &mut [f64], q: f64) -> f64 {
    match values.len() {
        0 => return f64::NAN,
        1 => return values[0],
        _ => {}
    }
    sort(values);

    let pos = q.clamp(0.0, 1.0) * (values.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let frac = pos - lo as f64;
    if frac == 0.0 || lo + 1 >= values.len() {
        values[lo]
    } else {
        values[lo] + frac * (values[lo + 1] - values[lo])
    }
}

/// Mode as the center of the shortest interval holding half of the samples.
///
/// Every window of `n / 2 + 1` consecutive sorted samples is measured; the
/// midpoint of the shortest one is the estimate. Several equally short windows
/// are resolved by `tie_break` and reported through the multiplicity.
pub fn mode(values: &mut [f64], tie_break: ModeTieBreak) -> ModeEstimate {
    match values.len() {
        0 => {
            return ModeEstimate {
                value: f64::NAN,
                multiplicity: 0,
            }
        }
        1 => {
            return ModeEstimate {
                value: values[0],
                multiplicity: 1,
            }
        }
        _ => {}
    }
    sort(values);

    let span = values.len() / 2;
    let mut shortest = f64::MAX;
    let mut multiplicity = 0u32;
    let mut estimate = 0.0;

    for window in values.windows(span + 1) {
        let (lo, hi) = (window[0], window[span]);
        let length = hi - lo;
        let midpoint = 0.5 * (lo + hi);
        if length < shortest {
            shortest = length;
            multiplicity = 1;
            estimate = midpoint;
        } else if length == shortest {
            multiplicity += 1;
            estimate = match tie_break {
                ModeTieBreak::Mean => estimate + midpoint,
                ModeTieBreak::Smallest => estimate.min(midpoint),
                ModeTieBreak::Largest => estimate.max(midpoint),
            };
        }
    }

    if tie_break == ModeTieBreak::Mean && multiplicity > 1 {
        estimate /= multiplicity as f64;
    }
    ModeEstimate {
        value: estimate,
        multiplicity,
    }
}

/// Extreme value; the signed variants fall back to 0 when no sample qualifies.
pub fn extreme(values: &[f64], kind: Extreme) -> f64 {
    let all = values.iter().copied();
    match kind {
        Extreme::Min => all.reduce(f64::min).unwrap_or(f64::NAN),
        Extreme::Max => all.reduce(f64::max).unwrap_or(f64::NAN),
        Extreme::MinPositive => all.filter(|v| *v >= 0.0).reduce(f64::min).unwrap_or(0.0),
        Extreme::MaxNegative => all.filter(|v| *v <= 0.0).reduce(f64::max).unwrap_or(0.0),
    }
}

/// Weighted quantile: the value where the cumulative weight first reaches
/// `q` of the total. Landing exactly on the mark averages with the next value.
pub fn weighted_quantile(data: &mut [Observation], q: f64) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    sort_observations(data);

    let target = q * data.iter().map(|o| o.weight).sum::<f64>();
    let mut k = 0;
    let mut cumulative = data[0].weight;
    while cumulative < target && k + 1 < data.len() {
        k += 1;
        cumulative += data[k].weight;
    }

    if cumulative == target && k + 1 < data.len() {
        0.5 * (data[k].value + data[k + 1].value)
    } else {
        data[k].value
    }
}

/// Weighted mode as the center of the "shortest 50%": the narrowest value
/// range holding half of the total weight.
pub fn weighted_mode(data: &mut [Observation]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    sort_observations(data);

    let half = 0.5 * data.iter().map(|o| o.weight).sum::<f64>();

    // A single sample carrying half the weight wins outright
    if let Some(heavy) = data.iter().find(|o| o.weight >= half) {
        return heavy.value;
    }

    let mut top = 0.0;
    let mut best_density = 0.0;
    let mut estimate = 0.5 * (data[0].value + data[data.len() - 1].value);
    let mut i = 0;
    for j in 0..data.len() {
        top += data[j].weight;
        if top < half {
            continue;
        }
        while top > half && i < j {
            top -= data[i].weight;
            i += 1;
        }
        let width = data[j].value - data[i].value;
        if width == 0.0 {
            return data[i].value;
        }
        let density = top / width;
        if density > best_density {
            best_density = density;
            estimate = 0.5 * (data[i].value + data[j].value);
        }
    }
    estimate
}
