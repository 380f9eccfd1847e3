use devfees::config::EngineConfig;
use devfees::fees::{
    CalculationRequest, CheaperSide, ComparisonError, CostMetric, Fallback, FeeEngine,
    FeeRecordSource, FeeSchedule, JurisdictionCalculation, JurisdictionSelection,
    ProjectParameters, ProjectType, SourceError,
};

fn schedule() -> FeeSchedule {
    let data = include_bytes!("../data/sample_fee_schedule.csv");
    FeeSchedule::from_reader(&data[..]).expect("sample schedule imports")
}

fn apartments() -> ProjectParameters {
    ProjectParameters {
        units: 40,
        square_footage: 36_000.0,
        project_value: 6_500_000.0,
        acreage: 1.2,
        meter_size: "2\"".to_string(),
        trips: None,
    }
}

fn request(jurisdiction: &str) -> CalculationRequest {
    CalculationRequest::new(JurisdictionSelection::new(jurisdiction), apartments())
        .with_project_type(ProjectType::MultiFamilyResidential)
}

#[test]
fn prices_a_multifamily_project_in_springfield() {
    let engine = FeeEngine::default();
    let result = engine
        .calculate_jurisdiction(&schedule(), &request("Springfield"))
        .expect("springfield loads");
    let breakdown = result.breakdown;

    // Single-family and commercial fees are filtered out.
    assert_eq!(breakdown.fees.len(), 8);
    assert!(breakdown
        .fees
        .iter()
        .all(|fee| fee.fee_id != "spr-sfr-park" && fee.fee_id != "spr-com-sign"));

    assert_eq!(breakdown.one_time_fees, 237_270.0);
    assert_eq!(breakdown.monthly_fees, 1_625.0);
    assert_eq!(breakdown.annual_operating_costs, 19_500.0);
    assert_eq!(breakdown.first_year_total, 256_770.0);

    let meter = breakdown
        .fees
        .iter()
        .find(|fee| fee.fee_id == "spr-meter")
        .expect("meter fee present");
    assert_eq!(meter.calculated_amount, 3_900.0);
    assert!(breakdown.diagnostics.is_empty());
}

#[test]
fn selected_service_area_replaces_citywide_fee() {
    let engine = FeeEngine::default();
    let mut downtown = request("Springfield");
    downtown.selection = JurisdictionSelection::new("Springfield").with_service_area("Downtown");

    let breakdown = engine
        .calculate_jurisdiction(&schedule(), &downtown)
        .expect("downtown loads")
        .breakdown;

    let park = breakdown
        .fees
        .iter()
        .find(|fee| fee.fee_name == "Park Impact Fee")
        .expect("park fee present");
    assert_eq!(park.service_area, "Downtown");
    assert_eq!(park.calculated_amount, 96_000.0);
    assert_eq!(breakdown.one_time_fees, 261_270.0);
}

#[test]
fn custom_and_legacy_fees_price_in_shelbyville() {
    let engine = FeeEngine::default();
    let breakdown = engine
        .calculate_jurisdiction(&schedule(), &request("Shelbyville"))
        .expect("shelbyville loads")
        .breakdown;

    let amount_of = |id: &str| {
        breakdown
            .fees
            .iter()
            .find(|fee| fee.fee_id == id)
            .map(|fee| fee.calculated_amount)
    };
    assert_eq!(amount_of("shb-school"), Some(44_000.0));
    assert_eq!(amount_of("shb-conn"), Some(72_600.0));
    assert_eq!(amount_of("shb-arch"), Some(650.0));
    assert_eq!(breakdown.one_time_fees, 173_450.0);
    assert_eq!(breakdown.first_year_total, 174_890.0);
}

#[test]
fn missing_meter_rate_is_reported_as_a_diagnostic() {
    let engine = FeeEngine::default();
    let breakdown = engine
        .calculate_jurisdiction(&schedule(), &request("Ogdenville"))
        .expect("ogdenville loads")
        .breakdown;

    assert_eq!(breakdown.one_time_fees, 212_300.0);
    assert_eq!(breakdown.diagnostics.len(), 1);
    assert_eq!(breakdown.diagnostics[0].fee_id, "ogd-meter");
    assert_eq!(
        breakdown.diagnostics[0].fallback,
        Fallback::MeterRateMissing {
            key: "METER_2IN".to_string()
        }
    );
}

#[test]
fn compares_three_jurisdictions() {
    let engine = FeeEngine::default();
    let report = engine
        .compare_jurisdictions(
            &schedule(),
            &[
                request("Springfield"),
                request("Shelbyville"),
                request("Ogdenville"),
            ],
        )
        .expect("all jurisdictions load");

    assert_eq!(report.pairs.len(), 3);

    let pair = report
        .pair("Springfield", "Shelbyville")
        .expect("springfield vs shelbyville");
    let one_time = pair
        .metric(CostMetric::OneTimeFees)
        .expect("one-time metric");
    assert_eq!(one_time.difference, 63_820.0);
    assert_eq!(one_time.cheaper, CheaperSide::Right);

    let first_year: Vec<&str> = report
        .ranking(CostMetric::FirstYearTotal)
        .expect("first-year ranking")
        .entries
        .iter()
        .map(|entry| entry.jurisdiction.as_str())
        .collect();
    assert_eq!(first_year, vec!["Shelbyville", "Ogdenville", "Springfield"]);

    let monthly = report
        .ranking(CostMetric::MonthlyFees)
        .expect("monthly ranking");
    assert_eq!(
        monthly.cheapest().map(|entry| entry.jurisdiction.as_str()),
        Some("Shelbyville")
    );
}

#[test]
fn unknown_jurisdiction_fails_without_partial_result() {
    let engine = FeeEngine::default();
    let source = schedule();

    let error = engine
        .compare_jurisdictions(&source, &[request("Springfield"), request("Capital City")])
        .expect_err("capital city is not in the schedule");
    assert!(matches!(
        error,
        ComparisonError::Fetch {
            ref jurisdiction,
            source: SourceError::UnknownJurisdiction(_),
        } if jurisdiction == "Capital City"
    ));

    let mut calculation = JurisdictionCalculation::new();
    let state = calculation.run(request("Capital City"), &source, &engine);
    assert_eq!(state.label(), "failed");
    assert!(state.breakdown().is_none());
}

#[test]
fn trip_rate_comes_from_configuration() {
    let engine = FeeEngine::from_config(&EngineConfig {
        trips_per_unit: 6.0,
        ..EngineConfig::default()
    });
    let breakdown = engine
        .calculate_jurisdiction(&schedule(), &request("Springfield"))
        .expect("springfield loads")
        .breakdown;

    let transport = breakdown
        .fees
        .iter()
        .find(|fee| fee.fee_id == "spr-trans")
        .expect("transportation fee present");
    // 310 per trip * 40 units * 6 trips per unit
    assert_eq!(transport.calculated_amount, 74_400.0);
}

#[test]
fn schedule_is_usable_as_a_trait_object() {
    let source: Box<dyn FeeRecordSource> = Box::new(schedule());
    let fees = source
        .fetch_fees(&JurisdictionSelection::new("ogdenville"))
        .expect("lookup is case-insensitive");
    assert_eq!(fees.len(), 4);
}
