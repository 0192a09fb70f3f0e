//! Annual organic carbon inputs for the Tier 2 model.
//!
//! Carbon sources are cycle inputs (organic fertilisers, soil amendments) and
//! products (crop residue left on or incorporated into the field). Each
//! source needs a mass and plausible carbon, nitrogen and lignin contents to
//! take part in the calculation.

use soc_core::lookup::ReferenceData;
use soc_core::node::{
    Cycle, Node, TermType, CARBON_CONTENT_TERM_ID, LIGNIN_CONTENT_TERM_ID,
    NITROGEN_CONTENT_TERM_ID,
};
use soc_core::FloatValue;

/// Term types that always act as carbon sources, regardless of term.
const CARBON_SOURCE_TERM_TYPES: [TermType; 2] =
    [TermType::OrganicFertiliser, TermType::SoilAmendment];

/// A validated carbon source: a mass of dry matter and its composition, all
/// contents as decimal proportions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarbonSource {
    pub mass: FloatValue,
    pub carbon_content: FloatValue,
    pub nitrogen_content: FloatValue,
    pub lignin_content: FloatValue,
}

/// A content property of the node, falling back to the glossary default for
/// its term. Both are stored as percentages.
fn content_of(node: &Node, property_term_id: &str, reference: &ReferenceData) -> Option<FloatValue> {
    node.property_value(property_term_id)
        .or_else(|| reference.term_property(&node.term_id, property_term_id))
        .map(|value| value / 100.0)
}

/// Validate a node as a carbon source. Nodes without a positive mass, or with
/// any content missing or outside (0, 1], are not usable and yield `None`.
pub fn carbon_source_from_node(node: &Node, reference: &ReferenceData) -> Option<CarbonSource> {
    let mass = node.magnitude();
    let carbon_content = content_of(node, CARBON_CONTENT_TERM_ID, reference)?;
    let nitrogen_content = content_of(node, NITROGEN_CONTENT_TERM_ID, reference)?;
    let lignin_content = content_of(node, LIGNIN_CONTENT_TERM_ID, reference)?;

    let is_valid = mass > 0.0
        && [carbon_content, nitrogen_content, lignin_content]
            .iter()
            .all(|content| *content > 0.0 && *content <= 1.0);

    is_valid.then_some(CarbonSource {
        mass,
        carbon_content,
        nitrogen_content,
        lignin_content,
    })
}

/// All valid carbon sources among the inputs and products of `cycles`.
pub fn carbon_sources_from_cycles(
    cycles: &[&Cycle],
    reference: &ReferenceData,
) -> Vec<CarbonSource> {
    cycles
        .iter()
        .flat_map(|cycle| cycle.inputs.iter().chain(cycle.products.iter()))
        .filter(|node| {
            reference
                .residue_incorporated_or_left_terms
                .contains(&node.term_id)
                || CARBON_SOURCE_TERM_TYPES.contains(&node.term_type)
        })
        .filter_map(|node| carbon_source_from_node(node, reference))
        .collect()
}

/// Total organic carbon input, kg C ha-1 (equation 5.0H part 4).
pub fn total_organic_carbon_input(
    carbon_sources: &[CarbonSource],
    default_carbon_content: FloatValue,
) -> FloatValue {
    carbon_sources
        .iter()
        .map(|source| {
            source.mass
                * if source.carbon_content > 0.0 {
                    source.carbon_content
                } else {
                    default_carbon_content
                }
        })
        .sum()
}

fn mass_weighted_average<F>(
    carbon_sources: &[CarbonSource],
    content: F,
    default_content: FloatValue,
) -> FloatValue
where
    F: Fn(&CarbonSource) -> FloatValue,
{
    let total_mass: FloatValue = carbon_sources.iter().map(|source| source.mass).sum();
    if total_mass == 0.0 {
        return 0.0;
    }
    let weighted: FloatValue = carbon_sources
        .iter()
        .map(|source| {
            let value = content(source);
            source.mass * if value > 0.0 { value } else { default_content }
        })
        .sum();
    weighted / total_mass
}

/// Mass-weighted average nitrogen content of the carbon sources, decimal
/// proportion. `0` when there are no sources at all.
pub fn average_nitrogen_content(
    carbon_sources: &[CarbonSource],
    default_nitrogen_content: FloatValue,
) -> FloatValue {
    mass_weighted_average(
        carbon_sources,
        |source| source.nitrogen_content,
        default_nitrogen_content,
    )
}

/// Mass-weighted average lignin content of the carbon sources, decimal
/// proportion. `0` when there are no sources at all.
pub fn average_lignin_content(
    carbon_sources: &[CarbonSource],
    default_lignin_content: FloatValue,
) -> FloatValue {
    mass_weighted_average(
        carbon_sources,
        |source| source.lignin_content,
        default_lignin_content,
    )
}
