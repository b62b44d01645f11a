//! Tool selector.
//!
//! For each of the nine categories: a Bernoulli draw with the persona's
//! usage probability, then a tool count and that many distinct tools from
//! the stakeholder's catalog for the category.

use super::catalog::SurveyCatalog;
use super::rng::SurveyRng;
use super::types::{Category, Persona, ToolResponse};

/// Mean of the tool-count distribution before rounding.
pub const TOOL_COUNT_MEAN: f64 = 2.5;
/// Spread of the tool-count distribution before rounding.
pub const TOOL_COUNT_SD: f64 = 1.2;
/// Most tools a respondent lists for one category.
pub const MAX_TOOLS: usize = 4;

/// `round(N(2.5, 1.2))` clamped to `[1, min(MAX_TOOLS, catalog_len)]`.
///
/// `catalog_len` must be non-zero.
pub fn tool_count(catalog_len: usize, rng: &mut SurveyRng) -> usize {
    let upper = MAX_TOOLS.min(catalog_len).max(1);
    let raw = rng.gaussian(TOOL_COUNT_MEAN, TOOL_COUNT_SD).round_ties_even();
    raw.clamp(1.0, upper as f64) as usize
}

/// Usage flag and selection for one category.
///
/// An empty catalog still consumes the Bernoulli draw and reports the
/// category unused.
pub fn select_category(
    category: Category,
    probability: f64,
    catalog: &[String],
    rng: &mut SurveyRng,
) -> ToolResponse {
    let drawn = rng.bernoulli(probability);
    let uses_category = drawn && !catalog.is_empty();

    let selected_tools = if uses_category {
        let count = tool_count(catalog.len(), rng);
        rng.sample_distinct(catalog.len(), count)
            .into_iter()
            .map(|i| catalog[i].clone())
            .collect()
    } else {
        Vec::new()
    };

    ToolResponse {
        category,
        uses_category,
        selected_tools,
        other_tool: None,
    }
}

/// One response per category, in [`Category::ALL`] order.
pub fn select_tools(
    persona: &Persona,
    catalog: &SurveyCatalog,
    rng: &mut SurveyRng,
) -> Vec<ToolResponse> {
    let stakeholder = persona.stakeholder();
    persona
        .category_probability
        .iter()
        .map(|(category, p)| select_category(category, p, catalog.tools(stakeholder, category), rng))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::population::GenerationPlan;
    use crate::survey::types::StakeholderType;
    use std::collections::HashSet;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("tool-{}", i)).collect()
    }

    #[test]
    fn test_tool_count_bounds() {
        let mut rng = SurveyRng::new(4);
        for len in 1..9 {
            for _ in 0..300 {
                let n = tool_count(len, &mut rng);
                assert!(n >= 1 && n <= MAX_TOOLS.min(len), "len {} got {}", len, n);
            }
        }
    }

    #[test]
    fn test_selection_invariants() {
        let catalog = SurveyCatalog::standard();
        let mut rng = SurveyRng::new(42);
        let personas = GenerationPlan::standard().build_all(&mut rng);

        for p in &personas {
            let rows = select_tools(p, &catalog, &mut rng);
            assert_eq!(rows.len(), 9);
            for row in rows {
                let available = catalog.tools(p.stakeholder(), row.category);
                if row.uses_category {
                    let n = row.selected_tools.len();
                    assert!(n >= 1 && n <= MAX_TOOLS.min(available.len()));
                    let unique: HashSet<&String> = row.selected_tools.iter().collect();
                    assert_eq!(unique.len(), n);
                    assert!(row.selected_tools.iter().all(|t| available.contains(t)));
                } else {
                    assert!(row.selected_tools.is_empty());
                }
                assert!(row.other_tool.is_none());
            }
        }
    }

    #[test]
    fn test_certain_usage_selects_tools() {
        let mut rng = SurveyRng::new(5);
        let tools = names(6);
        for _ in 0..100 {
            let row = select_category(Category::Robotics, 1.0, &tools, &mut rng);
            assert!(row.uses_category);
            assert!(!row.selected_tools.is_empty());
        }
    }

    #[test]
    fn test_single_tool_catalog() {
        let mut rng = SurveyRng::new(6);
        let tools = names(1);
        let row = select_category(Category::Expert, 1.0, &tools, &mut rng);
        assert_eq!(row.selected_tools, tools);
    }

    #[test]
    fn test_empty_catalog_means_unused_but_draws() {
        let mut a = SurveyRng::new(7);
        let mut b = SurveyRng::new(7);
        let row = select_category(Category::Expert, 0.5, &[], &mut a);
        assert!(!row.uses_category);
        assert!(row.selected_tools.is_empty());

        b.bernoulli(0.5);
        assert_eq!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn test_usage_rate_tracks_probability() {
        let mut rng = SurveyRng::new(8);
        let tools = names(5);
        let used = (0..4000)
            .filter(|_| select_category(Category::Generative, 0.7, &tools, &mut rng).uses_category)
            .count();
        let rate = used as f64 / 4000.0;
        assert!((rate - 0.7).abs() < 0.03, "rate {}", rate);
    }

    #[test]
    fn test_student_catalog_respected() {
        let catalog = SurveyCatalog::standard();
        let available = catalog.tools(StakeholderType::Student, Category::Recommender);
        let mut rng = SurveyRng::new(9);
        for _ in 0..200 {
            let row = select_category(Category::Recommender, 1.0, available, &mut rng);
            // three student recommender tools
            assert!((1..=3).contains(&row.selected_tools.len()));
            assert!(row.selected_tools.iter().all(|t| available.contains(t)));
        }
    }
}
