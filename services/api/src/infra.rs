use chrono::{Local, NaiveDate};
use devfees::config::EngineConfig;
use devfees::error::AppError;
use devfees::fees::{
    resolve_service_areas, Fee, FeeEngine, FeeRecordSource, FeeSchedule, JurisdictionSelection,
    ProjectType, SourceError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) engine: Arc<FeeEngine>,
    pub(crate) schedule: Option<Arc<FeeSchedule>>,
}

/// Loads the CSV schedule named by `FEE_SCHEDULE_PATH`, if any.
pub(crate) fn load_configured_schedule(
    config: &EngineConfig,
) -> Result<Option<FeeSchedule>, AppError> {
    config
        .schedule_path
        .as_deref()
        .map(load_schedule)
        .transpose()
}

pub(crate) fn load_schedule(path: &Path) -> Result<FeeSchedule, AppError> {
    let schedule = FeeSchedule::from_path(path)?;
    info!(
        path = %path.display(),
        jurisdictions = schedule.jurisdictions().len(),
        fees = schedule.fee_count(),
        "fee schedule loaded"
    );
    Ok(schedule)
}

/// Fee records for a single request: fees posted inline take precedence
/// over the configured schedule for the same jurisdiction.
pub(crate) struct RequestSource<'a> {
    inline: Vec<(String, Vec<Fee>)>,
    configured: Option<&'a FeeSchedule>,
}

impl<'a> RequestSource<'a> {
    pub(crate) fn new(configured: Option<&'a FeeSchedule>) -> Self {
        Self {
            inline: Vec::new(),
            configured,
        }
    }

    pub(crate) fn with_inline(mut self, jurisdiction: &str, fees: Vec<Fee>) -> Self {
        self.inline.push((jurisdiction.trim().to_string(), fees));
        self
    }
}

impl FeeRecordSource for RequestSource<'_> {
    fn fetch_fees(&self, selection: &JurisdictionSelection) -> Result<Vec<Fee>, SourceError> {
        let requested = selection.jurisdiction.trim();
        let inline = self
            .inline
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(requested));

        match (inline, self.configured) {
            (Some((name, fees)), _) => {
                let fees = resolve_service_areas(fees.clone(), &selection.service_areas);
                if fees.is_empty() {
                    Err(SourceError::NoFees(name.clone()))
                } else {
                    Ok(fees)
                }
            }
            (None, Some(schedule)) => schedule.fetch_fees(selection),
            (None, None) => Err(SourceError::UnknownJurisdiction(requested.to_string())),
        }
    }
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub(crate) fn parse_project_type(raw: &str) -> Result<ProjectType, String> {
    if raw.trim().is_empty() {
        return Err("project type must not be empty".to_string());
    }
    Ok(ProjectType::parse(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use devfees::fees::CalcMethod;

    fn fee(id: &str, name: &str, area: &str) -> Fee {
        let mut fee = Fee::priced(id, name, CalcMethod::Flat, 100.0);
        fee.service_area = area.to_string();
        fee
    }

    #[test]
    fn inline_fees_shadow_the_configured_schedule() {
        let schedule = FeeSchedule::new()
            .with_jurisdiction("Springfield", vec![fee("s-1", "Permit", "Citywide")]);
        let source = RequestSource::new(Some(&schedule))
            .with_inline("springfield", vec![fee("i-1", "Inline Permit", "")]);

        let fees = source
            .fetch_fees(&JurisdictionSelection::new("Springfield"))
            .expect("inline fees");
        assert_eq!(fees.len(), 1);
        assert_eq!(fees[0].id, "i-1");
    }

    #[test]
    fn falls_back_to_schedule_then_unknown() {
        let schedule = FeeSchedule::new()
            .with_jurisdiction("Springfield", vec![fee("s-1", "Permit", "Citywide")]);
        let source = RequestSource::new(Some(&schedule));
        assert!(source
            .fetch_fees(&JurisdictionSelection::new("Springfield"))
            .is_ok());

        let bare = RequestSource::new(None);
        assert_eq!(
            bare.fetch_fees(&JurisdictionSelection::new("Springfield")),
            Err(SourceError::UnknownJurisdiction("Springfield".into()))
        );
    }

    #[test]
    fn inline_fees_for_other_areas_only_report_no_fees() {
        let source = RequestSource::new(None)
            .with_inline("Cypress Creek", vec![fee("a-1", "Sewer", "Hammock District")]);
        assert_eq!(
            source.fetch_fees(&JurisdictionSelection::new("Cypress Creek")),
            Err(SourceError::NoFees("Cypress Creek".into()))
        );
    }

    #[test]
    fn project_type_arguments_parse_leniently() {
        assert_eq!(
            parse_project_type("mfr"),
            Ok(ProjectType::MultiFamilyResidential)
        );
        assert!(parse_project_type("  ").is_err());
    }
}
