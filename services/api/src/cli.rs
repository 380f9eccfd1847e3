use crate::infra::{load_schedule, parse_project_type, today};
use crate::report::{render_breakdown, render_comparison, BreakdownReport};
use crate::server;
use clap::{Args, Parser, Subcommand};
use devfees::config::AppConfig;
use devfees::error::AppError;
use devfees::fees::{
    CalculationRequest, FeeEngine, FeeSchedule, JurisdictionSelection, ProjectParameters,
    ProjectType,
};
use serde_json::json;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Development Fee Engine",
    about = "Calculate and compare jurisdiction development fees from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Price a project against one jurisdiction's fee schedule
    Calculate(CalculateArgs),
    /// Compare a project's fees across two or more jurisdictions
    Compare(CompareArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ProjectArgs {
    /// Fee schedule CSV (defaults to FEE_SCHEDULE_PATH)
    #[arg(long)]
    pub(crate) schedule: Option<PathBuf>,
    /// Number of dwelling units
    #[arg(long, default_value_t = 0)]
    pub(crate) units: u32,
    /// Gross floor area in square feet
    #[arg(long, default_value_t = 0.0)]
    pub(crate) square_footage: f64,
    /// Construction valuation in dollars
    #[arg(long, default_value_t = 0.0)]
    pub(crate) project_value: f64,
    #[arg(long, default_value_t = 0.0)]
    pub(crate) acreage: f64,
    /// Water meter size, e.g. 5/8" or 2"
    #[arg(long, default_value = "")]
    pub(crate) meter_size: String,
    /// Daily vehicle trips (defaults to units x FEE_TRIPS_PER_UNIT)
    #[arg(long)]
    pub(crate) trips: Option<u32>,
    /// Drop fees aimed at other project types, e.g. "Multi-Family Residential"
    #[arg(long, value_parser = parse_project_type)]
    pub(crate) project_type: Option<ProjectType>,
    /// Emit JSON instead of the text summary
    #[arg(long)]
    pub(crate) json: bool,
}

impl ProjectArgs {
    pub(crate) fn params(&self) -> ProjectParameters {
        ProjectParameters {
            units: self.units,
            square_footage: self.square_footage.max(0.0),
            project_value: self.project_value.max(0.0),
            acreage: self.acreage.max(0.0),
            meter_size: self.meter_size.trim().to_string(),
            trips: self.trips,
        }
    }

    fn request(&self, selection: JurisdictionSelection) -> CalculationRequest {
        CalculationRequest {
            selection,
            params: self.params(),
            project_type: self.project_type.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct CalculateArgs {
    /// Jurisdiction name as it appears in the schedule
    #[arg(long)]
    pub(crate) jurisdiction: String,
    /// Service area the project sits in (repeatable)
    #[arg(long = "service-area")]
    pub(crate) service_areas: Vec<String>,
    #[command(flatten)]
    pub(crate) project: ProjectArgs,
}

#[derive(Args, Debug)]
pub(crate) struct CompareArgs {
    /// Jurisdictions to compare (repeatable, at least two)
    #[arg(long = "jurisdiction", required = true)]
    pub(crate) jurisdictions: Vec<String>,
    /// Service area for one jurisdiction as JURISDICTION=AREA (repeatable)
    #[arg(long = "area", value_parser = parse_area)]
    pub(crate) areas: Vec<(String, String)>,
    #[command(flatten)]
    pub(crate) project: ProjectArgs,
}

fn parse_area(raw: &str) -> Result<(String, String), String> {
    let (jurisdiction, area) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected JURISDICTION=AREA, got '{raw}'"))?;
    let (jurisdiction, area) = (jurisdiction.trim(), area.trim());
    if jurisdiction.is_empty() || area.is_empty() {
        return Err(format!("expected JURISDICTION=AREA, got '{raw}'"));
    }
    Ok((jurisdiction.to_string(), area.to_string()))
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Calculate(args) => run_calculate(args),
        Command::Compare(args) => run_compare(args),
    }
}

fn open_schedule(project: &ProjectArgs, config: &AppConfig) -> Result<FeeSchedule, AppError> {
    let path = project
        .schedule
        .as_deref()
        .or(config.engine.schedule_path.as_deref())
        .ok_or_else(|| {
            AppError::InvalidRequest(
                "no fee schedule given; pass --schedule or set FEE_SCHEDULE_PATH".to_string(),
            )
        })?;
    load_schedule(path)
}

pub(crate) fn run_calculate(args: CalculateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let schedule = open_schedule(&args.project, &config)?;
    let engine = FeeEngine::from_config(&config.engine);
    let output = calculate_output(&engine, &schedule, &args)?;
    println!("{output}");
    Ok(())
}

pub(crate) fn calculate_output(
    engine: &FeeEngine,
    schedule: &FeeSchedule,
    args: &CalculateArgs,
) -> Result<String, AppError> {
    let selection = JurisdictionSelection {
        jurisdiction: args.jurisdiction.trim().to_string(),
        service_areas: args.service_areas.clone(),
    };
    let request = args.project.request(selection);
    let result = engine.calculate_jurisdiction(schedule, &request)?;
    let insights = result
        .breakdown
        .insights(engine.insight_settings(), request.params.units);
    let generated_on = today();

    if args.project.json {
        let payload = json!({
            "generated_on": generated_on,
            "jurisdiction": result.jurisdiction,
            "project_type": request.project_type,
            "breakdown": result.breakdown,
            "insights": insights,
        });
        return serde_json::to_string_pretty(&payload)
            .map_err(|err| AppError::Io(err.into()));
    }

    Ok(render_breakdown(&BreakdownReport {
        jurisdiction: &result.jurisdiction,
        project_type: request.project_type.as_ref(),
        params: &request.params,
        breakdown: &result.breakdown,
        insights: &insights,
        generated_on,
    }))
}

pub(crate) fn run_compare(args: CompareArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let schedule = open_schedule(&args.project, &config)?;
    let engine = FeeEngine::from_config(&config.engine);
    let output = compare_output(&engine, &schedule, &args)?;
    println!("{output}");
    Ok(())
}

pub(crate) fn compare_output(
    engine: &FeeEngine,
    schedule: &FeeSchedule,
    args: &CompareArgs,
) -> Result<String, AppError> {
    if let Some((unlisted, _)) = args.areas.iter().find(|(name, _)| {
        !args
            .jurisdictions
            .iter()
            .any(|jurisdiction| jurisdiction.trim().eq_ignore_ascii_case(name))
    }) {
        return Err(AppError::InvalidRequest(format!(
            "--area names {unlisted}, which is not being compared"
        )));
    }

    let requests: Vec<CalculationRequest> = args
        .jurisdictions
        .iter()
        .map(|jurisdiction| {
            let jurisdiction = jurisdiction.trim();
            let service_areas = args
                .areas
                .iter()
                .filter(|(name, _)| name.eq_ignore_ascii_case(jurisdiction))
                .map(|(_, area)| area.clone())
                .collect();
            args.project.request(JurisdictionSelection {
                jurisdiction: jurisdiction.to_string(),
                service_areas,
            })
        })
        .collect();
    let report = engine.compare_jurisdictions(schedule, &requests)?;
    let generated_on = today();

    if args.project.json {
        let payload = json!({
            "generated_on": generated_on,
            "report": report,
        });
        return serde_json::to_string_pretty(&payload)
            .map_err(|err| AppError::Io(err.into()));
    }

    Ok(render_comparison(&report, generated_on))
}
