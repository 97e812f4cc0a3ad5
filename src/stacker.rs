use crate::binner::Bucket;
use chrono::{DateTime, FixedOffset};

/// One category's interval within one bucket's stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackPoint {
    pub bucket: DateTime<FixedOffset>,
    pub low: u32,
    pub high: u32,
}

impl StackPoint {
    /// The category's own magnitude in this bucket
    pub fn count(&self) -> u32 {
        self.high - self.low
    }
}

/// All stack intervals of a single category, one per existing bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackedLayer {
    pub key: String,
    /// Position of `key` in the category order
    pub index: usize,
    pub points: Vec<StackPoint>,
}

/// Stack bucket counts in the given category order.
///
/// Every layer covers every bucket; categories missing from a bucket get a
/// zero-height interval sitting on top of the categories before them.
pub fn stack(buckets: &[Bucket], category_order: &[String]) -> Vec<StackedLayer> {
    let mut layers: Vec<StackedLayer> = category_order
        .iter()
        .enumerate()
        .map(|(index, key)| StackedLayer {
            key: key.clone(),
            index,
            points: Vec::with_capacity(buckets.len()),
        })
        .collect();

    for bucket in buckets {
        let mut offset = 0u32;
        for layer in layers.iter_mut() {
            let low = offset;
            offset += bucket.count(&layer.key);
            layer.points.push(StackPoint {
                bucket: bucket.start,
                low,
                high: offset,
            });
        }
    }

    layers
}

/// Largest bucket total (top of the tallest stack)
pub fn max_total(series: &[StackedLayer]) -> u32 {
    series
        .last()
        .map(|layer| layer.points.iter().map(|p| p.high).max().unwrap_or(0))
        .unwrap_or(0)
}

/// Largest single-category count in any bucket
pub fn max_single(series: &[StackedLayer]) -> u32 {
    series
        .iter()
        .flat_map(|layer| layer.points.iter().map(StackPoint::count))
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binner::{bin, categories, Resolution};
    use crate::event::{parse_timestamp, Event};
    use chrono::{Offset, Utc};

    fn ev(t: &str, c: &str) -> Event {
        Event::new(parse_timestamp(t).unwrap(), c)
    }

    fn sample_buckets() -> Vec<Bucket> {
        let events = vec![
            ev("2024-06-01 21:00:00+0000", "A"),
            ev("2024-06-01 22:00:00+0000", "B"),
            ev("2024-06-01 22:30:00+0000", "B"),
            ev("2024-06-01 23:00:00+0000", "C"),
            ev("2024-06-03 01:00:00+0000", "C"),
            ev("2024-06-03 02:00:00+0000", "A"),
        ];
        bin(&events, Resolution::Day, Utc.fix())
    }

    #[test]
    fn test_stack_prefix_sums() {
        let buckets = sample_buckets();
        let order = categories(&buckets);
        let series = stack(&buckets, &order);

        assert_eq!(series.len(), 3);
        for (b_idx, bucket) in buckets.iter().enumerate() {
            for (c_idx, layer) in series.iter().enumerate() {
                let prefix: u32 = order[..=c_idx].iter().map(|c| bucket.count(c)).sum();
                assert_eq!(layer.points[b_idx].high, prefix);
            }
            assert_eq!(series[0].points[b_idx].low, 0);
            assert_eq!(series[2].points[b_idx].high, bucket.total());
        }
    }

    #[test]
    fn test_stack_includes_zero_entries() {
        let buckets = sample_buckets();
        let order = categories(&buckets);
        let series = stack(&buckets, &order);

        // "B" is absent from the second bucket but still covers it
        let b = &series[1];
        assert_eq!(b.key, "B");
        assert_eq!(b.points.len(), buckets.len());
        assert_eq!(b.points[1].count(), 0);
        assert_eq!(b.points[1].low, 1);
        assert_eq!(b.points[1].high, 1);
    }

    #[test]
    fn test_stack_offsets_monotonic() {
        let buckets = sample_buckets();
        let series = stack(&buckets, &categories(&buckets));
        for b_idx in 0..buckets.len() {
            for pair in series.windows(2) {
                assert!(pair[0].points[b_idx].high <= pair[1].points[b_idx].low);
            }
        }
    }

    #[test]
    fn test_stack_deterministic() {
        let buckets = sample_buckets();
        let order = categories(&buckets);
        assert_eq!(stack(&buckets, &order), stack(&buckets, &order));
    }

    #[test]
    fn test_stack_follows_explicit_order() {
        let buckets = sample_buckets();
        let order = vec!["C".to_string(), "A".to_string(), "B".to_string()];
        let series = stack(&buckets, &order);
        assert_eq!(series[0].key, "C");
        assert_eq!(series[0].points[0].low, 0);
        assert_eq!(series[0].points[0].high, 1);
        assert_eq!(series[1].points[0].low, 1);
    }

    #[test]
    fn test_stack_single_event() {
        let buckets = bin(&[ev("2024-06-01 21:00:00+0000", "A")], Resolution::Day, Utc.fix());
        let series = stack(&buckets, &categories(&buckets));
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].points, vec![StackPoint { bucket: buckets[0].start, low: 0, high: 1 }]);
    }

    #[test]
    fn test_stack_empty() {
        assert!(stack(&[], &[]).is_empty());
        assert_eq!(max_total(&[]), 0);
        assert_eq!(max_single(&[]), 0);
    }

    #[test]
    fn test_max_total_and_single() {
        let buckets = sample_buckets();
        let series = stack(&buckets, &categories(&buckets));
        assert_eq!(max_total(&series), 4);
        assert_eq!(max_single(&series), 2);
    }
}
