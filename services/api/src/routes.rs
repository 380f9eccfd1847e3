use crate::infra::{today, AppState, RequestSource};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Extension;
use axum::Json;
use chrono::NaiveDate;
use devfees::error::AppError;
use devfees::fees::aggregate::views::BreakdownInsights;
use devfees::fees::{
    CalculationRequest, ComparisonReport, Fee, FeeBreakdown, FeeEngine, JurisdictionSelection,
    ProjectParameters, ProjectType,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

/// Label used when a calculation request carries fees but no jurisdiction.
const INLINE_JURISDICTION: &str = "Inline schedule";

#[derive(Debug, Deserialize)]
pub(crate) struct CalculateFeesRequest {
    #[serde(default)]
    pub(crate) jurisdiction: Option<String>,
    #[serde(default, alias = "serviceAreas")]
    pub(crate) service_areas: Vec<String>,
    #[serde(default, alias = "project")]
    pub(crate) params: ProjectParameters,
    #[serde(default, alias = "projectType")]
    pub(crate) project_type: Option<ProjectType>,
    #[serde(default)]
    pub(crate) fees: Option<Vec<Fee>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CalculateFeesResponse {
    pub(crate) generated_on: NaiveDate,
    pub(crate) jurisdiction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) project_type: Option<ProjectType>,
    pub(crate) breakdown: FeeBreakdown,
    pub(crate) insights: BreakdownInsights,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JurisdictionEntry {
    pub(crate) jurisdiction: String,
    #[serde(default, alias = "serviceAreas")]
    pub(crate) service_areas: Vec<String>,
    #[serde(default)]
    pub(crate) fees: Option<Vec<Fee>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompareFeesRequest {
    #[serde(default, alias = "project")]
    pub(crate) params: ProjectParameters,
    #[serde(default, alias = "projectType")]
    pub(crate) project_type: Option<ProjectType>,
    pub(crate) jurisdictions: Vec<JurisdictionEntry>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CompareFeesResponse {
    pub(crate) generated_on: NaiveDate,
    #[serde(flatten)]
    pub(crate) report: ComparisonReport,
}

#[derive(Debug, Serialize)]
pub(crate) struct JurisdictionListing {
    pub(crate) name: String,
    pub(crate) service_areas: Vec<String>,
}

pub(crate) fn fee_routes() -> axum::Router {
    axum::Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/fees/jurisdictions", get(jurisdictions_endpoint))
        .route("/api/v1/fees/calculate", post(calculate_fees_endpoint))
        .route("/api/v1/fees/compare", post(compare_fees_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn jurisdictions_endpoint(
    Extension(state): Extension<AppState>,
) -> Json<Vec<JurisdictionListing>> {
    let listings: Vec<JurisdictionListing> = state
        .schedule
        .as_deref()
        .map(|schedule| {
            schedule
                .jurisdictions()
                .into_iter()
                .map(|name| JurisdictionListing {
                    name: name.to_string(),
                    service_areas: schedule.service_areas(name).unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default();
    Json(listings)
}

fn require_schedule(state: &AppState, jurisdiction: &str) -> Result<(), AppError> {
    if state.schedule.is_some() {
        Ok(())
    } else {
        Err(AppError::InvalidRequest(format!(
            "no fee schedule is configured; include `fees` for {jurisdiction}"
        )))
    }
}

/// Runs pricing on the blocking pool against the configured schedule plus
/// any fees posted with the request.
async fn price_blocking<T, F>(
    state: AppState,
    inline: Vec<(String, Vec<Fee>)>,
    work: F,
) -> Result<T, AppError>
where
    F: FnOnce(&FeeEngine, &RequestSource<'_>) -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let source = inline.into_iter().fold(
            RequestSource::new(state.schedule.as_deref()),
            |source, (jurisdiction, fees)| source.with_inline(&jurisdiction, fees),
        );
        work(state.engine.as_ref(), &source)
    })
    .await
    .map_err(|err| AppError::TaskFailed(err.to_string()))?
}

pub(crate) async fn calculate_fees_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<CalculateFeesRequest>,
) -> Result<Json<CalculateFeesResponse>, AppError> {
    let CalculateFeesRequest {
        jurisdiction,
        service_areas,
        params,
        project_type,
        fees,
    } = payload;

    let jurisdiction = match (jurisdiction, &fees) {
        (Some(name), _) if !name.trim().is_empty() => name.trim().to_string(),
        (_, Some(_)) => INLINE_JURISDICTION.to_string(),
        _ => {
            return Err(AppError::InvalidRequest(
                "either `jurisdiction` or `fees` is required".to_string(),
            ))
        }
    };

    let mut inline = Vec::new();
    match fees {
        Some(fees) => inline.push((jurisdiction.clone(), fees)),
        None => require_schedule(&state, &jurisdiction)?,
    }

    let request = CalculationRequest {
        selection: JurisdictionSelection {
            jurisdiction,
            service_areas,
        },
        params,
        project_type,
    };
    let (result, insights, request) = price_blocking(state, inline, move |engine, source| {
        let result = engine.calculate_jurisdiction(source, &request)?;
        let insights = result
            .breakdown
            .insights(engine.insight_settings(), request.params.units);
        Ok((result, insights, request))
    })
    .await?;
    debug!(jurisdiction = %result.jurisdiction, "fee calculation served");

    Ok(Json(CalculateFeesResponse {
        generated_on: today(),
        jurisdiction: result.jurisdiction,
        project_type: request.project_type,
        breakdown: result.breakdown,
        insights,
    }))
}

pub(crate) async fn compare_fees_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<CompareFeesRequest>,
) -> Result<Json<CompareFeesResponse>, AppError> {
    let CompareFeesRequest {
        params,
        project_type,
        jurisdictions,
    } = payload;

    let mut inline = Vec::new();
    let mut requests = Vec::with_capacity(jurisdictions.len());
    for entry in jurisdictions {
        let name = entry.jurisdiction.trim().to_string();
        if name.is_empty() {
            return Err(AppError::InvalidRequest(
                "jurisdiction names must not be empty".to_string(),
            ));
        }
        match entry.fees {
            Some(fees) => inline.push((name.clone(), fees)),
            None => require_schedule(&state, &name)?,
        }
        requests.push(CalculationRequest {
            selection: JurisdictionSelection {
                jurisdiction: name,
                service_areas: entry.service_areas,
            },
            params: params.clone(),
            project_type: project_type.clone(),
        });
    }

    let report = price_blocking(state, inline, move |engine, source| {
        Ok(engine.compare_jurisdictions(source, &requests)?)
    })
    .await?;
    Ok(Json(CompareFeesResponse {
        generated_on: today(),
        report,
    }))
}
