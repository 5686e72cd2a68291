//! Sampled source-to-target time map.

use serde::Serialize;

/// Slack allowed when checking that the map is non-decreasing.
const MONOTONIC_EPSILON: f64 = 1e-9;

/// One row of the exported time map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeMapRow {
    pub time_from: f64,
    pub time_to: f64,
}

/// Dense mapping from source time to target time.
///
/// `time_from` is a uniform sampling of the source timeline and never changes.
/// `time_to[i]` is the target-time equivalent of `time_from[i]`; it starts as a
/// copy of `time_from` and moves only through [`TimeGrid::shift_from`].
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    time_from: Vec<f64>,
    time_to: Vec<f64>,
}

impl TimeGrid {
    /// Evenly spaced grid from `start` to `end` (both included).
    ///
    /// The sample count is `(ceil(end) - ceil(start)) * samples_per_second`,
    /// with at least two samples whenever `end > start`.
    pub fn new(start: f64, end: f64, samples_per_second: f64) -> Self {
        let end = end.max(start);
        let samples = ((end.ceil() - start.ceil()) * samples_per_second).max(0.0) as usize;
        let time_from = if end > start {
            let samples = samples.max(2);
            let step = (end - start) / (samples - 1) as f64;
            (0..samples)
                .map(|i| if i == samples - 1 { end } else { start + step * i as f64 })
                .collect()
        } else {
            vec![start]
        };
        let time_to = time_from.clone();
        TimeGrid { time_from, time_to }
    }

    /// Grid covering a performance whose onsets run from `first_onset` to `last_onset`.
    ///
    /// The grid extends to `first_onset + last_onset`, which leaves headroom for
    /// resume points that fall after the last onset.
    pub fn for_onsets(first_onset: f64, last_onset: f64, samples_per_second: f64) -> Self {
        TimeGrid::new(first_onset, first_onset + last_onset, samples_per_second)
    }

    pub fn len(&self) -> usize {
        self.time_from.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_from.is_empty()
    }

    pub fn time_from(&self) -> &[f64] {
        &self.time_from
    }

    pub fn time_to(&self) -> &[f64] {
        &self.time_to
    }

    /// Index of the sample whose `time_from` is closest to `source_time`.
    ///
    /// Ties resolve to the lower index. The result may lie after `source_time`.
    pub fn nearest_index(&self, source_time: f64) -> usize {
        let len = self.time_from.len();
        let i = self.time_from.partition_point(|&t| t < source_time);
        if i == 0 {
            return 0;
        }
        if i >= len {
            return len - 1;
        }
        let below = source_time - self.time_from[i - 1];
        let above = self.time_from[i] - source_time;
        if below <= above {
            i - 1
        } else {
            i
        }
    }

    /// Target-time equivalent of `source_time`.
    pub fn to_target(&self, source_time: f64) -> f64 {
        self.time_to[self.nearest_index(source_time)]
    }

    /// Add `delta` to every target sample at or after the sample nearest to
    /// `source_time`. Returns the index the shift started at.
    ///
    /// A negative `delta` removes target time: earlier samples that would end up
    /// after the shift point are pulled back onto it, so `time_to` stays
    /// non-decreasing. Only the map is clamped: notes placed before the shift
    /// point keep their target onsets, so after a large negative shift the map
    /// and those notes disagree (a shift of -1.0 at 1.5 maps 1.0 to about 0.5
    /// while a note played at 1.0 stays at 1.0).
    pub fn shift_from(&mut self, source_time: f64, delta: f64) -> usize {
        let idx = self.nearest_index(source_time);
        for t in &mut self.time_to[idx..] {
            *t += delta;
        }
        if delta < 0.0 {
            let floor = self.time_to[idx];
            for t in &mut self.time_to[..idx] {
                *t = t.min(floor);
            }
        }
        idx
    }

    /// Copy of the `(time_from, time_to)` samples in `start..end` (sample indices).
    pub fn sub_map(&self, start: usize, end: usize) -> (Vec<f64>, Vec<f64>) {
        let end = end.min(self.len());
        let start = start.min(end);
        (
            self.time_from[start..end].to_vec(),
            self.time_to[start..end].to_vec(),
        )
    }

    pub fn rows(&self) -> Vec<TimeMapRow> {
        self.time_from
            .iter()
            .zip(&self.time_to)
            .map(|(&time_from, &time_to)| TimeMapRow { time_from, time_to })
            .collect()
    }

    pub fn is_monotonic(&self) -> bool {
        self.time_to.windows(2).all(|w| w[0] <= w[1] + MONOTONIC_EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_spans_first_plus_last_onset() {
        let grid = TimeGrid::for_onsets(0.0, 2.0, 20.0);
        assert_eq!(grid.len(), 40);
        assert_eq!(grid.time_from()[0], 0.0);
        assert_eq!(*grid.time_from().last().unwrap(), 2.0);
        assert_eq!(grid.time_from(), grid.time_to());
    }

    #[test]
    fn test_single_point_grid() {
        let grid = TimeGrid::for_onsets(0.0, 0.0, 20.0);
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.to_target(5.0), 0.0);
    }

    #[test]
    fn test_nearest_ties_go_low() {
        let grid = TimeGrid::new(0.0, 1.0, 3.0);
        // samples at 0.0, 0.5, 1.0
        assert_eq!(grid.time_from(), &[0.0, 0.5, 1.0]);
        assert_eq!(grid.nearest_index(0.25), 0);
        assert_eq!(grid.nearest_index(0.26), 1);
        assert_eq!(grid.nearest_index(0.75), 1);
        assert_eq!(grid.nearest_index(-3.0), 0);
        assert_eq!(grid.nearest_index(9.0), 2);
    }

    #[test]
    fn test_shift_from_moves_tail_only() {
        let mut grid = TimeGrid::new(0.0, 1.0, 3.0);
        let idx = grid.shift_from(0.5, 0.25);
        assert_eq!(idx, 1);
        assert_eq!(grid.time_to(), &[0.0, 0.75, 1.25]);
        assert_eq!(grid.time_from(), &[0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_negative_shift_within_one_step() {
        let mut grid = TimeGrid::new(0.0, 1.0, 3.0);
        grid.shift_from(0.5, -0.5);
        assert_eq!(grid.time_to(), &[0.0, 0.0, 0.5]);
        assert!(grid.is_monotonic());
    }

    #[test]
    fn test_negative_shift_pulls_back_overtaken_samples() {
        let mut grid = TimeGrid::new(0.0, 2.0, 2.5);
        // samples at 0.0, 0.5, 1.0, 1.5, 2.0
        grid.shift_from(1.5, -1.25);
        assert_eq!(grid.time_to(), &[0.0, 0.25, 0.25, 0.25, 0.75]);
        assert_eq!(grid.time_from(), &[0.0, 0.5, 1.0, 1.5, 2.0]);
        assert!(grid.is_monotonic());
    }

    #[test]
    fn test_sub_map_clamps() {
        let grid = TimeGrid::new(0.0, 1.0, 3.0);
        let (from, to) = grid.sub_map(1, 10);
        assert_eq!(from, vec![0.5, 1.0]);
        assert_eq!(to, vec![0.5, 1.0]);
    }
}
