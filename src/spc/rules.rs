//! Run rules over subgroup statistics.
//!
//! Only the rules that need no zone estimate beyond the limits themselves
//! are screened: points beyond the limits and long one-sided runs.

use super::chart::{Chart, ChartLimits, ChartSignal, RunRule};

/// Length of a one-sided run that signals a shift.
const RUN_LENGTH: usize = 9;

/// Applies both rules to one chart's points.
pub(crate) fn screen(chart: Chart, values: &[f64], limits: &ChartLimits) -> Vec<ChartSignal> {
    let mut signals: Vec<ChartSignal> = beyond_limits(values, limits)
        .into_iter()
        .map(|subgroup| ChartSignal {
            chart,
            subgroup,
            rule: RunRule::BeyondLimits,
        })
        .chain(one_sided_runs(values, limits.cl).into_iter().map(|subgroup| {
            ChartSignal {
                chart,
                subgroup,
                rule: RunRule::NineOneSide,
            }
        }))
        .collect();
    signals.sort_by_key(|s| s.subgroup);
    signals
}

/// Nelson Rule 1: indices of points outside `[lcl, ucl]`.
fn beyond_limits(values: &[f64], limits: &ChartLimits) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, &v)| limits.is_beyond(v))
        .map(|(i, _)| i)
        .collect()
}

/// Nelson Rule 2: indices at which a run of [`RUN_LENGTH`] same-side points
/// is reached or extended. Points exactly on the center line break a run.
fn one_sided_runs(values: &[f64], cl: f64) -> Vec<usize> {
    let mut hits = Vec::new();
    let mut run = 0_usize;
    let mut side = 0_i8;
    for (i, &v) in values.iter().enumerate() {
        let s = if v > cl {
            1
        } else if v < cl {
            -1
        } else {
            0
        };
        if s != 0 && s == side {
            run += 1;
        } else {
            run = usize::from(s != 0);
            side = s;
        }
        if run >= RUN_LENGTH {
            hits.push(i);
        }
    }
    hits
}
