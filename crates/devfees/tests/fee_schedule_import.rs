use devfees::fees::{
    CalcMethod, FeeFormula, FeeRecordSource, FeeSchedule, JurisdictionSelection,
    ScheduleImportError, SourceError,
};
use std::path::Path;

fn sample_path() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data/sample_fee_schedule.csv")
}

#[test]
fn loads_the_sample_schedule_from_disk() {
    let schedule = FeeSchedule::from_path(sample_path()).expect("sample schedule loads");

    assert_eq!(
        schedule.jurisdictions(),
        vec!["Ogdenville", "Shelbyville", "Springfield"]
    );
    assert_eq!(schedule.fee_count(), 21);
    assert_eq!(
        schedule.service_areas("Springfield"),
        Some(vec!["Downtown".to_string()])
    );
    assert_eq!(schedule.service_areas("Shelbyville"), Some(Vec::new()));
    assert_eq!(schedule.service_areas("Capital City"), None);
}

#[test]
fn keeps_formula_and_legacy_columns() {
    let schedule = FeeSchedule::from_path(sample_path()).expect("sample schedule loads");
    let fees = schedule
        .fetch_fees(&JurisdictionSelection::new("Shelbyville"))
        .expect("shelbyville fees");

    let school = fees
        .iter()
        .find(|fee| fee.id == "shb-school")
        .expect("school fee");
    assert_eq!(school.calc_method, Some(CalcMethod::Custom));
    match &school.formula {
        Some(FeeFormula::Switch { switch }) => assert_eq!(switch.len(), 2),
        other => panic!("expected switch formula, got {other:?}"),
    }

    let review = fees
        .iter()
        .find(|fee| fee.id == "shb-arch")
        .expect("architectural review");
    assert_eq!(review.calc_method, None);
    assert_eq!(review.base_rate, None);
    assert_eq!(
        review.legacy_rate.as_ref().and_then(|rate| rate.amount()),
        Some(650.0)
    );

    let base_charge = fees
        .iter()
        .find(|fee| fee.id == "shb-util")
        .expect("base charge");
    assert!(base_charge.is_recurring);
}

#[test]
fn missing_file_is_an_io_error() {
    let error = FeeSchedule::from_path(sample_path().with_file_name("missing.csv"))
        .expect_err("missing file");
    assert!(matches!(error, ScheduleImportError::Io(_)));
    assert!(error.to_string().starts_with("failed to read fee schedule"));
}

#[test]
fn rows_without_a_fee_name_are_rejected() {
    let csv = "jurisdiction,calc_method,base_rate\nSpringfield,flat,100\n";
    let error = FeeSchedule::from_reader(csv.as_bytes()).expect_err("fee_name is required");
    assert!(matches!(error, ScheduleImportError::Csv(_)));
}

#[test]
fn jurisdiction_with_only_other_area_fees_reports_no_fees() {
    let csv = "\
jurisdiction,service_area,fee_name,calc_method,base_rate
Cypress Creek,Hammock District,Sewer Extension,flat,900
";
    let schedule = FeeSchedule::from_reader(csv.as_bytes()).expect("schedule parses");
    let error = schedule
        .fetch_fees(&JurisdictionSelection::new("Cypress Creek"))
        .expect_err("no citywide fees and no area selected");
    assert_eq!(error, SourceError::NoFees("Cypress Creek".to_string()));

    let fees = schedule
        .fetch_fees(&JurisdictionSelection::new("Cypress Creek").with_service_area("Hammock District"))
        .expect("selected area has fees");
    assert_eq!(fees.len(), 1);
}
