//! Cumulative area-share matching.
//!
//! Management records carry the percentage of the site area they apply to.
//! A condition holds for a site when the summed area share of the records
//! satisfying it reaches a threshold: 30% for a plain match, 70% where the
//! guidelines ask for a super-majority.

use std::collections::HashSet;

use crate::node::Node;
use crate::FloatValue;

/// Minimum area share (%) for a condition to count for a site.
pub const MIN_AREA_THRESHOLD: FloatValue = 30.0;

/// Area share (%) required where a super-majority of the site must match.
pub const SUPER_MAJORITY_AREA_THRESHOLD: FloatValue = 100.0 - MIN_AREA_THRESHOLD;

/// Threshold for product-based checks, where any real yield counts.
pub const MIN_YIELD_THRESHOLD: FloatValue = 1.0;

/// Whether the summed value of the nodes satisfying `predicate` reaches
/// `cumulative_threshold`. Nodes without a value contribute nothing.
pub fn cumulative_nodes_match<F>(
    predicate: F,
    nodes: &[&Node],
    cumulative_threshold: FloatValue,
) -> bool
where
    F: Fn(&Node) -> bool,
{
    cumulative_nodes_match_with_default(predicate, nodes, cumulative_threshold, 0.0)
}

/// As [`cumulative_nodes_match`], with nodes that carry no value contributing
/// `default_node_value` instead of nothing. Product checks use this with a
/// default of [`MIN_YIELD_THRESHOLD`] so an undated yield still counts.
pub fn cumulative_nodes_match_with_default<F>(
    predicate: F,
    nodes: &[&Node],
    cumulative_threshold: FloatValue,
    default_node_value: FloatValue,
) -> bool
where
    F: Fn(&Node) -> bool,
{
    let total: FloatValue = nodes
        .iter()
        .filter(|node| predicate(node))
        .map(|node| node.magnitude_or(default_node_value))
        .sum();
    total >= cumulative_threshold
}

/// Whether the nodes carrying one of the target terms cover enough of the
/// site.
pub fn cumulative_nodes_term_match(
    nodes: &[&Node],
    target_term_ids: &HashSet<String>,
    cumulative_threshold: FloatValue,
) -> bool {
    cumulative_nodes_match(
        |node| target_term_ids.contains(&node.term_id),
        nodes,
        cumulative_threshold,
    )
}

/// As [`cumulative_nodes_term_match`] with a default value for value-less
/// nodes.
pub fn cumulative_nodes_term_match_with_default(
    nodes: &[&Node],
    target_term_ids: &HashSet<String>,
    cumulative_threshold: FloatValue,
    default_node_value: FloatValue,
) -> bool {
    cumulative_nodes_match_with_default(
        |node| target_term_ids.contains(&node.term_id),
        nodes,
        cumulative_threshold,
        default_node_value,
    )
}
