//! Ordered metric samples.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// One metric sample taken from a monitored element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub element: String,
    pub name: String,
    pub value: f64,
    /// Unix timestamp in seconds.
    #[serde(default)]
    pub timestamp: i64,
}

impl Metric {
    pub fn new(element: impl Into<String>, name: impl Into<String>, value: f64, timestamp: i64) -> Self {
        Self {
            element: element.into(),
            name: name.into(),
            value,
            timestamp,
        }
    }
}

/// Metric samples in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricList {
    samples: Vec<Metric>,
}

impl MetricList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, metric: Metric) {
        self.samples.push(metric);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Metric> {
        self.samples.iter()
    }

    /// All sample values in arrival order.
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|m| m.value).collect()
    }

    /// Most recently pushed sample with the given name.
    pub fn latest(&self, name: &str) -> Option<&Metric> {
        self.samples.iter().rev().find(|m| m.name == name)
    }

    /// Latest value of each named metric, in the order the names are given.
    ///
    /// Fails with [`CoreError::MissingMetric`] on the first name that has
    /// no sample.
    pub fn values_for<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<f64>> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.latest(name)
                    .map(|m| m.value)
                    .ok_or_else(|| CoreError::MissingMetric(name.to_string()))
            })
            .collect()
    }
}

impl FromIterator<Metric> for MetricList {
    fn from_iter<I: IntoIterator<Item = Metric>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a MetricList {
    type Item = &'a Metric;
    type IntoIter = std::slice::Iter<'a, Metric>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_list() -> MetricList {
        vec![
            Metric::new("ups-01", "load", 0.4, 100),
            Metric::new("ups-01", "temperature", 31.0, 100),
            Metric::new("ups-01", "load", 0.9, 160),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn values_keep_arrival_order() {
        assert_eq!(sample_list().values(), vec![0.4, 31.0, 0.9]);
    }

    #[test]
    fn latest_picks_the_last_sample() {
        let list = sample_list();
        let load = list.latest("load").unwrap();
        assert_eq!(load.value, 0.9);
        assert_eq!(load.timestamp, 160);
        assert!(list.latest("humidity").is_none());
    }

    #[test]
    fn values_for_follows_requested_order() {
        let list = sample_list();
        assert_eq!(list.values_for(&["temperature", "load"]).unwrap(), vec![31.0, 0.9]);
    }

    #[test]
    fn values_for_reports_missing_metric() {
        let list = sample_list();
        assert_eq!(
            list.values_for(&["load", "humidity"]),
            Err(CoreError::MissingMetric("humidity".to_string()))
        );
    }

    #[test]
    fn empty_list() {
        let list = MetricList::new();
        assert!(list.is_empty());
        assert!(list.values().is_empty());
        assert_eq!(list.values_for::<&str>(&[]).unwrap(), Vec::<f64>::new());
    }
}
