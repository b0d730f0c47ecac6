use crate::util::format_str;
use serde_json::{Map, Value};

pub const MIN_FACE: u8 = 1;
pub const MAX_FACE: u8 = 20;
pub const NUM_FACES: usize = (MAX_FACE - MIN_FACE + 1) as usize;

// a tally is one count slot per face, indexed by face - 1
pub type Counts = [u32; NUM_FACES];

/// Running per-face statistics for a twenty-sided die.
///
/// The derived fields (total, expected average, deviations) are recomputed in
/// full after every mutation. That is 20 slots of work per keystroke, and it
/// keeps the invariants impossible to get out of sync.
#[derive(Debug, Clone, PartialEq)]
pub struct RollCounter {
    counts: Counts,
    total: u32,
    expected_average: f64,
    deviations: [f64; NUM_FACES],
}

impl RollCounter {
    pub fn new() -> Self {
        Self {
            counts: [0; NUM_FACES],
            total: 0,
            expected_average: 0.0,
            deviations: [0.0; NUM_FACES],
        }
    }

    fn slot(face: u8) -> usize {
        (face - MIN_FACE) as usize
    }

    /// Tallies one roll. The caller has already validated `face`.
    pub fn record(&mut self, face: u8) {
        self.counts[Self::slot(face)] += 1;
        self.total += 1;
        self.recompute();
    }

    /// Removes one previously tallied roll.
    ///
    /// Callers only ever reach this by popping a real history entry, so the
    /// count being decremented is nonzero.
    pub fn retract(&mut self, face: u8) {
        debug_assert!(
            self.counts[Self::slot(face)] > 0,
            "retracting face {face} which was never recorded"
        );
        self.counts[Self::slot(face)] -= 1;
        self.total -= 1;
        self.recompute();
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn recompute(&mut self) {
        self.expected_average = self.total as f64 / NUM_FACES as f64;
        for (count, deviation) in self.counts.iter().zip(self.deviations.iter_mut()) {
            *deviation = (*count as f64 - self.expected_average).abs();
        }
    }

    pub fn count(&self, face: u8) -> u32 {
        self.counts[Self::slot(face)]
    }

    pub fn deviation(&self, face: u8) -> f64 {
        self.deviations[Self::slot(face)]
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn expected_average(&self) -> f64 {
        self.expected_average
    }

    pub fn max_count(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn greatest_deviation(&self) -> f64 {
        self.deviations.iter().copied().fold(0.0, f64::max)
    }

    /// Faces whose deviation equals `target`, in ascending order.
    ///
    /// Exact float comparison: counts are integers and the average always has
    /// denominator 20, so equal deviations are bit-identical.
    pub fn faces_matching_deviation(&self, target: f64) -> Vec<u8> {
        if self.total == 0 {
            return Vec::new();
        }
        (MIN_FACE..=MAX_FACE)
            .filter(|&face| self.deviations[Self::slot(face)] == target)
            .collect()
    }

    /// Serializes the raw counts as a face -> count object, zero counts omitted.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for face in MIN_FACE..=MAX_FACE {
            let count = self.counts[Self::slot(face)];
            if count > 0 {
                map.insert(face.to_string(), Value::from(count));
            }
        }
        Value::Object(map)
    }

    /// Rebuilds a counter from a stored counts object.
    ///
    /// Only the raw counts are trusted; total, average and deviations are
    /// recomputed from scratch. Keys outside 1..=20 and values that are not
    /// positive integers are dropped.
    pub fn from_json(value: &Value) -> Self {
        let mut counter = Self::new();
        let map = match value {
            Value::Object(map) => map,
            _ => return counter,
        };
        for (key, count) in map {
            let face = match key.parse::<u8>() {
                Ok(face) if (MIN_FACE..=MAX_FACE).contains(&face) => face,
                _ => continue,
            };
            let count = match count.as_u64().and_then(|n| u32::try_from(n).ok()) {
                Some(count) if count > 0 => count,
                _ => continue,
            };
            counter.counts[Self::slot(face)] = count;
        }
        counter.total = counter.counts.iter().sum();
        counter.recompute();
        counter
    }

    /// Builds the roll / count / deviation table shown under the histogram.
    /// Rows sitting at the greatest deviation are colored to match the
    /// histogram's hatching.
    pub fn build_table(&self) -> String {
        let mut table = format!("{:>4} | {:>5} | {:>9}\n", "Roll", "Count", "Deviation");
        let hot = self.faces_matching_deviation(self.greatest_deviation());
        for face in MIN_FACE..=MAX_FACE {
            let count = self.count(face);
            let deviation = count as f64 - self.expected_average;
            let row = format!("{:>4} | {:>5} | {:>9.2}\n", face, count, deviation);
            if hot.contains(&face) {
                table.push_str(&format_str(row, "red"));
            } else {
                table.push_str(&row);
            }
        }
        table
    }
}
