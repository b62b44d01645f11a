//! Rating sampler.
//!
//! Each rating is an independent `N(anchor, σ)` draw, rounded and clamped to
//! the 1–7 scale. Items sharing an anchor co-vary only through that anchor.

use super::catalog::SurveyCatalog;
use super::rng::SurveyRng;
use super::types::{AnchorKind, Persona, RatingResponse, Section};

/// Lowest scale point.
pub const SCALE_MIN: u8 = 1;
/// Highest scale point.
pub const SCALE_MAX: u8 = 7;

/// One bounded rating centred on `anchor`.
///
/// Ties round to even.
pub fn likert(anchor: f64, sd: f64, rng: &mut SurveyRng) -> u8 {
    let v = rng.gaussian(anchor, sd).round_ties_even();
    v.clamp(SCALE_MIN as f64, SCALE_MAX as f64) as u8
}

/// All ratings for a persona: sections A, B, C in catalog order.
///
/// Section C items pick the readiness or career anchor by code prefix.
pub fn sample_ratings(
    persona: &Persona,
    catalog: &SurveyCatalog,
    rng: &mut SurveyRng,
) -> Vec<RatingResponse> {
    let stakeholder = persona.stakeholder();
    let sd = persona.response_variance;
    let mut ratings = Vec::with_capacity(catalog.total_items(stakeholder));

    for &section in Section::all() {
        for code in catalog.items(stakeholder, section) {
            let anchor = persona.anchors.get(AnchorKind::for_item(section, code));
            ratings.push(RatingResponse {
                section,
                item_code: code.to_string(),
                value: likert(anchor, sd, rng),
            });
        }
    }
    ratings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::population::GenerationPlan;
    use crate::survey::types::StakeholderType;

    #[test]
    fn test_likert_bounds() {
        let mut rng = SurveyRng::new(1);
        for anchor in [-3.0, 0.5, 4.0, 6.9, 12.0] {
            for _ in 0..500 {
                let v = likert(anchor, 2.0, &mut rng);
                assert!((SCALE_MIN..=SCALE_MAX).contains(&v));
            }
        }
    }

    #[test]
    fn test_extreme_anchors_saturate() {
        let mut rng = SurveyRng::new(2);
        assert!((0..100).all(|_| likert(50.0, 0.5, &mut rng) == SCALE_MAX));
        assert!((0..100).all(|_| likert(-50.0, 0.5, &mut rng) == SCALE_MIN));
    }

    #[test]
    fn test_rating_cardinality_per_stakeholder() {
        let catalog = SurveyCatalog::standard();
        let mut rng = SurveyRng::new(42);
        let personas = GenerationPlan::standard().build_all(&mut rng);
        for p in &personas {
            let ratings = sample_ratings(p, &catalog, &mut rng);
            let expected = match p.stakeholder() {
                StakeholderType::Student => 45,
                StakeholderType::Faculty => 50,
                StakeholderType::Practitioner => 49,
            };
            assert_eq!(ratings.len(), expected);
            assert!(ratings.iter().all(|r| (1..=7).contains(&r.value)));
        }
    }

    #[test]
    fn test_section_c_uses_prefix_anchor() {
        let catalog = SurveyCatalog::standard();
        let mut rng = SurveyRng::new(8);
        let mut persona = GenerationPlan::standard()
            .build(StakeholderType::Faculty, &mut rng)
            .remove(0);
        persona.anchors.c_ar = 40.0;
        persona.anchors.c_cr = -40.0;

        let ratings = sample_ratings(&persona, &catalog, &mut rng);
        for r in ratings.iter().filter(|r| r.section == Section::C) {
            if r.item_code.starts_with("AR") {
                assert_eq!(r.value, SCALE_MAX);
            } else {
                assert_eq!(r.value, SCALE_MIN);
            }
        }
    }

    #[test]
    fn test_high_anchor_rates_above_low_anchor() {
        // 30+ personas on each side, same catalog and dispersion
        let catalog = SurveyCatalog::standard();
        let mut rng = SurveyRng::new(42);
        let personas = GenerationPlan::standard().build(StakeholderType::Student, &mut rng);

        let mean_for = |anchor: f64, rng: &mut SurveyRng| {
            let mut total = 0u32;
            let mut n = 0u32;
            for p in personas.iter().take(35) {
                let mut p = p.clone();
                p.anchors.a = anchor;
                for r in sample_ratings(&p, &catalog, rng)
                    .into_iter()
                    .filter(|r| r.section == Section::A)
                {
                    total += r.value as u32;
                    n += 1;
                }
            }
            total as f64 / n as f64
        };

        let high = mean_for(5.2, &mut rng);
        let low = mean_for(3.3, &mut rng);
        assert!(high - low > 1.5, "high {} low {}", high, low);
    }
}
