use super::common::*;
use crate::fees::aggregate::{aggregate, InsightSettings};
use crate::fees::domain::{CalcMethod, Fallback};
use crate::fees::engine::FeeEngine;
use crate::fees::relevance::ProjectType;

#[test]
fn totals_split_one_time_and_monthly_fees() {
    let engine = FeeEngine::default();
    let breakdown = engine.recalculate(&springfield_fees(), &project(), None);

    assert_eq!(breakdown.fees.len(), 5);
    assert_eq!(breakdown.one_time_fees, 204_250.0);
    assert_eq!(breakdown.monthly_fees, 985.0);
    assert_eq!(breakdown.annual_operating_costs, 11_820.0);
    assert_eq!(breakdown.first_year_total, 216_070.0);
    assert!(breakdown.diagnostics.is_empty());
}

#[test]
fn aggregation_identities_hold_exactly() {
    let fees = vec![
        calculated("Permit", "Permits", 1_234.57, false),
        calculated("Inspection", "Permits", 89.99, false),
        calculated("Water Service", "Water/Sewer", 18.15, true),
        calculated("Sewer Service", "Water/Sewer", 27.33, true),
        calculated("Trash", "Solid Waste", 0.1, true),
    ];
    let breakdown = aggregate(fees.clone());

    let one_time: f64 = fees
        .iter()
        .filter(|fee| !fee.is_recurring)
        .map(|fee| fee.calculated_amount)
        .sum();
    let monthly: f64 = fees
        .iter()
        .filter(|fee| fee.is_recurring)
        .map(|fee| fee.calculated_amount)
        .sum();

    assert_eq!(breakdown.one_time_fees, 1_324.56);
    assert!((breakdown.one_time_fees - one_time).abs() < 0.005);
    assert!((breakdown.monthly_fees - monthly).abs() < 0.005);
    assert_eq!(
        breakdown.annual_operating_costs,
        breakdown.monthly_fees * 12.0
    );
    assert_eq!(
        breakdown.first_year_total,
        breakdown.one_time_fees + breakdown.annual_operating_costs
    );
}

#[test]
fn zero_amount_fees_are_listed_but_not_summarised() {
    let breakdown = aggregate(vec![
        calculated("Permit", "Permits", 500.0, false),
        calculated("Waived Review", "Reviews", 0.0, false),
        calculated("Unused Service", "Utilities", 0.0, true),
    ]);

    assert_eq!(breakdown.fees.len(), 3);
    assert_eq!(breakdown.applicable_fees().count(), 1);
    assert_eq!(breakdown.one_time_fees, 500.0);
    assert_eq!(breakdown.monthly_fees, 0.0);
    assert!(!breakdown.by_category.contains_key("Reviews"));
    assert!(!breakdown.by_category.contains_key("Utilities"));
}

#[test]
fn groups_by_category_and_agency() {
    let engine = FeeEngine::default();
    let breakdown = engine.recalculate(&springfield_fees(), &project(), None);

    assert_eq!(breakdown.by_category.get("Water/Sewer"), Some(&90_000.0));
    assert_eq!(breakdown.by_category.get("Solid Waste"), Some(&900.0));
    assert_eq!(breakdown.by_agency.get("Parks"), Some(&72_000.0));
    assert_eq!(breakdown.by_agency.get("Utilities"), Some(&90_085.0));
}

#[test]
fn major_cost_drivers_rank_categories_by_amount() {
    let engine = FeeEngine::default();
    let breakdown = engine.recalculate(&springfield_fees(), &project(), None);

    let drivers: Vec<(String, f64)> = breakdown
        .major_cost_drivers(3)
        .into_iter()
        .map(|driver| (driver.category, driver.amount))
        .collect();
    assert_eq!(
        drivers,
        vec![
            ("Water/Sewer".to_string(), 90_000.0),
            ("Impact Fees".to_string(), 72_000.0),
            ("Permits".to_string(), 42_250.0),
        ]
    );
}

#[test]
fn cost_driver_ties_order_by_category_name() {
    let breakdown = aggregate(vec![
        calculated("Sewer Tap", "Sewer", 400.0, false),
        calculated("Grading", "Engineering", 400.0, false),
        calculated("School", "Impact", 900.0, false),
    ]);
    let categories: Vec<String> = breakdown
        .major_cost_drivers(5)
        .into_iter()
        .map(|driver| driver.category)
        .collect();
    assert_eq!(categories, vec!["Impact", "Engineering", "Sewer"]);
}

#[test]
fn projections_accumulate_operating_costs_without_escalation() {
    let engine = FeeEngine::default();
    let breakdown = engine.recalculate(&springfield_fees(), &project(), None);

    let projections = breakdown.projections(10);
    assert_eq!(projections.len(), 10);
    assert_eq!(projections[0].cumulative_total, breakdown.first_year_total);
    assert_eq!(projections[4].cumulative_total, 263_350.0);
    assert_eq!(projections[9].year, 10);
    assert_eq!(projections[9].cumulative_total, 322_450.0);
    assert!(projections
        .iter()
        .all(|row| row.annual_operating == 11_820.0));
}

#[test]
fn per_unit_costs_only_for_multi_unit_projects() {
    let engine = FeeEngine::default();
    let breakdown = engine.recalculate(&springfield_fees(), &project(), None);

    let per_unit = breakdown.per_unit_costs(40).expect("multi-unit project");
    assert_eq!(per_unit.development, 5_106.25);
    assert_eq!(per_unit.first_year, 5_401.75);
    assert!(breakdown.per_unit_costs(1).is_none());
    assert!(breakdown.per_unit_costs(0).is_none());
}

#[test]
fn composition_shares_cover_first_year_spend() {
    let engine = FeeEngine::default();
    let breakdown = engine.recalculate(&springfield_fees(), &project(), None);
    let composition = breakdown.cost_composition();

    assert_eq!(composition.total, 216_070.0);
    assert_eq!(composition.water_sewer.amount, 90_000.0);
    assert_eq!(composition.impact.amount, 72_000.0);
    assert_eq!(composition.other_one_time.amount, 42_250.0);
    assert_eq!(composition.operating_year_one.amount, 11_820.0);
    assert_eq!(composition.water_sewer.share_pct, 41.65);

    let empty = aggregate(Vec::new()).cost_composition();
    assert_eq!(empty.total, 0.0);
    assert_eq!(empty.impact.share_pct, 0.0);
}

#[test]
fn insights_bundle_uses_settings() {
    let engine = FeeEngine::default();
    let breakdown = engine.recalculate(&springfield_fees(), &project(), None);
    let insights = breakdown.insights(
        &InsightSettings {
            projection_years: 5,
            top_cost_drivers: 2,
        },
        40,
    );

    assert_eq!(insights.projections.len(), 5);
    assert_eq!(insights.major_cost_drivers.len(), 2);
    assert!(insights.per_unit.is_some());
}

#[test]
fn one_bad_fee_never_aborts_the_breakdown() {
    let mut broken = fee("bad", "Broken Custom Fee", CalcMethod::Custom, 250.0);
    broken.formula = Some(crate::fees::domain::FeeFormula::Expression {
        expr: "units * (".to_string(),
    });
    let mut unpriced = fee("none", "Unpriced Fee", CalcMethod::Flat, 0.0);
    unpriced.calc_method = None;
    unpriced.base_rate = None;

    let mut fees = springfield_fees();
    fees.push(broken);
    fees.push(unpriced);

    let breakdown = FeeEngine::default().recalculate(&fees, &project(), None);
    assert_eq!(breakdown.fees.len(), 7);
    assert_eq!(breakdown.one_time_fees, 204_500.0);

    let reasons: Vec<(&str, &Fallback)> = breakdown
        .diagnostics
        .iter()
        .map(|diagnostic| (diagnostic.fee_id.as_str(), &diagnostic.fallback))
        .collect();
    assert_eq!(reasons.len(), 2);
    assert_eq!(reasons[0].0, "bad");
    assert!(matches!(reasons[0].1, Fallback::ExpressionFailed { .. }));
    assert_eq!(reasons[1], ("none", &Fallback::MissingCalculationData));
}

#[test]
fn relevance_filter_narrows_before_calculation() {
    let mut fees = springfield_fees();
    fees.push(categorized(
        fee("sp-sfr", "Single Family Park Fee", CalcMethod::Flat, 9_000.0),
        "Impact Fees",
        "Parks",
    ));
    let engine = FeeEngine::default();

    let filtered = engine.recalculate(&fees, &project(), Some(&ProjectType::MultiFamilyResidential));
    assert_eq!(filtered.fees.len(), 5);
    assert_eq!(filtered.one_time_fees, 204_250.0);

    let unfiltered = engine.recalculate(&fees, &project(), None);
    assert_eq!(unfiltered.one_time_fees, 213_250.0);
}

#[test]
fn recalculation_is_deterministic() {
    let engine = FeeEngine::default();
    let first = engine.recalculate(&springfield_fees(), &project(), None);
    let second = engine.recalculate(&springfield_fees(), &project(), None);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).expect("serializes"),
        serde_json::to_string(&second).expect("serializes")
    );
}

#[test]
fn breakdown_serializes_rounded_totals() {
    let breakdown = aggregate(vec![
        calculated("Water Service", "Water/Sewer", 18.15, true),
        calculated("Permit", "Permits", 0.1, false),
        calculated("Review", "Permits", 0.2, false),
    ]);
    let json = serde_json::to_value(&breakdown).expect("serializes");
    assert_eq!(json["annual_operating_costs"], serde_json::json!(217.8));
    assert_eq!(json["one_time_fees"], serde_json::json!(0.3));
    assert_eq!(json["by_category"]["Permits"], serde_json::json!(0.3));
}
