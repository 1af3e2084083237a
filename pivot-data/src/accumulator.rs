//! FILENAME: pivot-data/src/accumulator.rs
//! Incremental accumulation of one cell's aggregate.

use serde::{Deserialize, Serialize};

use crate::definition::AggregationType;

/// Accumulator for computing aggregates incrementally.
/// Stores the intermediate state needed for every aggregation type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateAccumulator {
    pub sum: f64,
    pub count: u64,
    pub count_numbers: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl AggregateAccumulator {
    pub fn new() -> Self {
        AggregateAccumulator::default()
    }

    /// Adds a numeric value to the accumulator.
    pub fn add_number(&mut self, value: f64) {
        self.count += 1;
        self.count_numbers += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    /// Adds a non-numeric value (only increments count).
    pub fn add_non_number(&mut self) {
        self.count += 1;
    }

    /// Adds an optional numeric reading.
    pub fn add(&mut self, value: Option<f64>) {
        match value {
            Some(n) => self.add_number(n),
            None => self.add_non_number(),
        }
    }

    /// Computes the final aggregate value.
    /// Numeric aggregations over no numeric input yield `None` ("no data").
    pub fn compute(&self, aggregation: AggregationType) -> Option<f64> {
        let has_numbers = self.count_numbers > 0;
        match aggregation {
            AggregationType::Count => Some(self.count as f64),
            AggregationType::CountNumbers => Some(self.count_numbers as f64),
            AggregationType::Sum => has_numbers.then_some(self.sum),
            AggregationType::Average => {
                has_numbers.then(|| self.sum / (self.count_numbers as f64))
            }
            AggregationType::Min => self.min,
            AggregationType::Max => self.max,
        }
    }

    /// Merges another accumulator into this one.
    pub fn merge(&mut self, other: &AggregateAccumulator) {
        self.sum += other.sum;
        self.count += other.count;
        self.count_numbers += other.count_numbers;

        if let Some(other_min) = other.min {
            self.min = Some(self.min.map_or(other_min, |m| m.min(other_min)));
        }
        if let Some(other_max) = other.max {
            self.max = Some(self.max.map_or(other_max, |m| m.max(other_max)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_all_types() {
        let mut acc = AggregateAccumulator::new();
        acc.add(Some(10.0));
        acc.add(None);
        acc.add(Some(20.0));

        assert_eq!(acc.compute(AggregationType::Sum), Some(30.0));
        assert_eq!(acc.compute(AggregationType::Count), Some(3.0));
        assert_eq!(acc.compute(AggregationType::CountNumbers), Some(2.0));
        assert_eq!(acc.compute(AggregationType::Average), Some(15.0));
        assert_eq!(acc.compute(AggregationType::Min), Some(10.0));
        assert_eq!(acc.compute(AggregationType::Max), Some(20.0));
    }

    #[test]
    fn test_no_numbers_is_no_data() {
        let mut acc = AggregateAccumulator::new();
        acc.add_non_number();

        assert_eq!(acc.compute(AggregationType::Sum), None);
        assert_eq!(acc.compute(AggregationType::Average), None);
        assert_eq!(acc.compute(AggregationType::Count), Some(1.0));
    }

    #[test]
    fn test_merge() {
        let mut a = AggregateAccumulator::new();
        a.add_number(1.0);
        let mut b = AggregateAccumulator::new();
        b.add_number(5.0);
        b.add_non_number();

        a.merge(&b);
        assert_eq!(a.compute(AggregationType::Sum), Some(6.0));
        assert_eq!(a.compute(AggregationType::Count), Some(3.0));
        assert_eq!(a.compute(AggregationType::Max), Some(5.0));
    }
}
