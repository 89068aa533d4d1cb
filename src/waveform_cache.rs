use crate::config::Fidelity;

/// A single envelope entry: min and max sample values for one drawn column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    pub min: f32,
    pub max: f32,
}

impl Peak {
    pub const SILENT: Peak = Peak { min: 0.0, max: 0.0 };

    pub fn amplitude(&self) -> f32 {
        self.max - self.min
    }
}

/// Number of columns that fit in `width` with the given stride.
pub fn column_count(width: f32, stride: f32) -> usize {
    if width <= 0.0 || stride <= 0.0 {
        return 0;
    }
    (width / stride).floor() as usize
}

/// Summarize `samples` into exactly `columns` envelope entries.
///
/// Column `i` covers samples `[i * n / columns, (i + 1) * n / columns)`. The
/// result depends only on the samples and the column count, never on a
/// previously computed envelope.
pub fn build_envelope(samples: &[f32], columns: usize, fidelity: Fidelity) -> Vec<Peak> {
    let n = samples.len();
    (0..columns)
        .map(|i| {
            let start = i * n / columns;
            let end = (i + 1) * n / columns;
            let range = &samples[start..end];
            if range.is_empty() {
                return Peak::SILENT;
            }
            match fidelity {
                Fidelity::Peaks => min_max(range),
                Fidelity::Sampled => {
                    let half = range[0].abs() / 2.0;
                    Peak {
                        min: -half,
                        max: half,
                    }
                }
            }
        })
        .collect()
}

fn min_max(chunk: &[f32]) -> Peak {
    let mut min = f32::MAX;
    let mut max = f32::MIN;
    for &s in chunk {
        if s < min {
            min = s;
        }
        if s > max {
            max = s;
        }
    }
    Peak { min, max }
}
