//! Group dated records into the calendar years (and months) of an inventory.
//!
//! Two grouping modes exist, matching the two ways records carry dates:
//! span-dated records (management nodes, cycles) belong to every year their
//! `[start_date, end_date]` range touches, while list-valued measurements
//! carry one date per value and are sliced so each year keeps only its own
//! values.

use std::collections::BTreeMap;

use crate::node::{Cycle, Node, NodeValue, PartialDate};

/// Anything with an optional start/end date span.
pub trait DateSpan {
    fn span_start(&self) -> Option<PartialDate>;
    fn span_end(&self) -> Option<PartialDate>;
}

impl DateSpan for Node {
    fn span_start(&self) -> Option<PartialDate> {
        self.start_date
    }

    fn span_end(&self) -> Option<PartialDate> {
        self.end_date
    }
}

impl DateSpan for Cycle {
    fn span_start(&self) -> Option<PartialDate> {
        self.start_date
    }

    fn span_end(&self) -> Option<PartialDate> {
        self.end_date
    }
}

/// Group span-dated items by the calendar years they touch.
///
/// Items missing either date cannot be placed and are skipped.
pub fn group_by_year<T: DateSpan>(items: &[T]) -> BTreeMap<i32, Vec<&T>> {
    let mut grouped: BTreeMap<i32, Vec<&T>> = BTreeMap::new();
    for item in items {
        let (Some(start), Some(end)) = (item.span_start(), item.span_end()) else {
            continue;
        };
        for year in start.year..=end.year {
            grouped.entry(year).or_default().push(item);
        }
    }
    grouped
}

/// Group span-dated nodes by year and calendar month (1-12).
pub fn group_by_year_and_month(nodes: &[Node]) -> BTreeMap<i32, BTreeMap<u32, Vec<&Node>>> {
    let mut grouped: BTreeMap<i32, BTreeMap<u32, Vec<&Node>>> = BTreeMap::new();
    for node in nodes {
        let (Some(start), Some(end)) = (node.span_start(), node.span_end()) else {
            continue;
        };
        for year in start.year..=end.year {
            let first_month = if year == start.year {
                start.month_or(1)
            } else {
                1
            };
            let last_month = if year == end.year { end.month_or(12) } else { 12 };
            let months = grouped.entry(year).or_default();
            for month in first_month..=last_month {
                months.entry(month).or_default().push(node);
            }
        }
    }
    grouped
}

/// Group list-valued measurements by year, slicing the parallel
/// `dates`/`value` arrays so each year keeps only the values dated within it.
pub fn group_measurements_by_year(nodes: &[Node]) -> BTreeMap<i32, Vec<Node>> {
    let mut grouped: BTreeMap<i32, Vec<Node>> = BTreeMap::new();
    for node in nodes {
        let Some(values) = node.list_values() else {
            continue;
        };
        if node.dates.is_empty() {
            continue;
        }

        let mut per_year: BTreeMap<i32, (Vec<f64>, Vec<PartialDate>)> = BTreeMap::new();
        for (date, value) in node.dates.iter().zip(values.iter()) {
            let (year_values, year_dates) = per_year.entry(date.year).or_default();
            year_values.push(*value);
            year_dates.push(*date);
        }

        for (year, (year_values, year_dates)) in per_year {
            let mut sliced = node.clone();
            sliced.value = Some(NodeValue::List(year_values));
            sliced.dates = year_dates;
            grouped.entry(year).or_default().push(sliced);
        }
    }
    grouped
}

/// Whether a sorted list of years has no gaps.
pub fn check_consecutive(years: &[i32]) -> bool {
    years.windows(2).all(|pair| pair[1] - pair[0] == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::TermType;

    fn span_node(term_id: &str, start: &str, end: &str) -> Node {
        Node::new(term_id, TermType::LandCover)
            .with_span(start.parse().unwrap(), end.parse().unwrap())
    }

    #[test]
    fn test_group_by_year_spans_all_touched_years() {
        let nodes = vec![span_node("grassland", "2000", "2002")];
        let grouped = group_by_year(&nodes);
        assert_eq!(
            grouped.keys().copied().collect::<Vec<_>>(),
            vec![2000, 2001, 2002]
        );
    }

    #[test]
    fn test_group_by_year_skips_undated_items() {
        let nodes = vec![Node::new("grassland", TermType::LandCover)];
        assert!(group_by_year(&nodes).is_empty());
    }

    #[test]
    fn test_group_by_year_overlapping_spans() {
        let nodes = vec![
            span_node("grassland", "2000", "2001"),
            span_node("annualCropland", "2001", "2003"),
        ];
        let grouped = group_by_year(&nodes);
        assert_eq!(grouped[&2000].len(), 1);
        assert_eq!(grouped[&2001].len(), 2, "2001 is covered by both spans");
        assert_eq!(grouped[&2003].len(), 1);
    }

    #[test]
    fn test_group_by_year_and_month_respects_partial_years() {
        let nodes = vec![span_node("irrigatedSurfaceIrrigation", "2000-10", "2001-03")];
        let grouped = group_by_year_and_month(&nodes);

        let months_2000: Vec<u32> = grouped[&2000].keys().copied().collect();
        assert_eq!(months_2000, vec![10, 11, 12]);

        let months_2001: Vec<u32> = grouped[&2001].keys().copied().collect();
        assert_eq!(months_2001, vec![1, 2, 3]);
    }

    #[test]
    fn test_group_measurements_by_year_slices_values() {
        let node = Node::new("temperatureMonthly", TermType::Measurement)
            .with_value(NodeValue::List(vec![1.0, 2.0, 3.0]))
            .with_dates(vec![
                "2000-11".parse().unwrap(),
                "2000-12".parse().unwrap(),
                "2001-01".parse().unwrap(),
            ]);

        let grouped = group_measurements_by_year(&[node]);
        assert_eq!(
            grouped[&2000][0].list_values().unwrap(),
            &[1.0, 2.0],
            "2000 keeps only its own values"
        );
        assert_eq!(grouped[&2001][0].list_values().unwrap(), &[3.0]);
    }

    #[test]
    fn test_group_measurements_by_year_skips_undated_nodes() {
        let node = Node::new("sandContent", TermType::Measurement)
            .with_value(NodeValue::List(vec![70.0]));
        assert!(group_measurements_by_year(&[node]).is_empty());
    }

    #[test]
    fn test_check_consecutive() {
        assert!(check_consecutive(&[2000, 2001, 2002]));
        assert!(!check_consecutive(&[2000, 2002]));
        assert!(check_consecutive(&[2000]));
        assert!(check_consecutive(&[]));
    }
}
