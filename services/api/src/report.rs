use chrono::NaiveDate;
use devfees::fees::aggregate::views::BreakdownInsights;
use devfees::fees::money::{format_currency, round_currency};
use devfees::fees::{CheaperSide, ComparisonReport, FeeBreakdown, ProjectParameters, ProjectType};
use std::fmt::Write;

pub(crate) struct BreakdownReport<'a> {
    pub(crate) jurisdiction: &'a str,
    pub(crate) project_type: Option<&'a ProjectType>,
    pub(crate) params: &'a ProjectParameters,
    pub(crate) breakdown: &'a FeeBreakdown,
    pub(crate) insights: &'a BreakdownInsights,
    pub(crate) generated_on: NaiveDate,
}

pub(crate) fn render_breakdown(report: &BreakdownReport<'_>) -> String {
    let BreakdownReport {
        jurisdiction,
        project_type,
        params,
        breakdown,
        insights,
        generated_on,
    } = report;
    let mut out = String::new();

    let _ = writeln!(out, "Development fee summary: {jurisdiction} ({generated_on})");
    if let Some(project_type) = project_type {
        let _ = writeln!(out, "Project type: {project_type}");
    }
    let _ = writeln!(
        out,
        "Project: {} units | {} sq ft | valuation {}",
        params.units,
        format_quantity(params.square_footage),
        dollars(params.project_value)
    );

    let _ = writeln!(out, "\nTotals");
    let _ = writeln!(
        out,
        "- One-time development fees: {}",
        dollars(breakdown.one_time_fees)
    );
    let _ = writeln!(
        out,
        "- Monthly operating costs: {}",
        dollars(breakdown.monthly_fees)
    );
    let _ = writeln!(
        out,
        "- Annual operating costs: {}",
        dollars(breakdown.annual_operating_costs)
    );
    let _ = writeln!(
        out,
        "- First-year total: {}",
        dollars(breakdown.first_year_total)
    );

    if !insights.major_cost_drivers.is_empty() {
        let _ = writeln!(out, "\nMajor cost drivers");
        for driver in &insights.major_cost_drivers {
            let _ = writeln!(
                out,
                "- {}: {}",
                driver.category,
                dollars(driver.amount)
            );
        }
    }

    if let Some(per_unit) = &insights.per_unit {
        let _ = writeln!(out, "\nPer-unit costs ({} units)", per_unit.units);
        let _ = writeln!(
            out,
            "- Development: {} | Monthly: {} | First year: {}",
            dollars(per_unit.development),
            dollars(per_unit.monthly),
            dollars(per_unit.first_year)
        );
    }

    let composition = &insights.composition;
    if composition.total > 0.0 {
        let _ = writeln!(out, "\nYear-one composition");
        for (label, share) in [
            ("Water/sewer connection", &composition.water_sewer),
            ("Impact fees", &composition.impact),
            ("Other one-time", &composition.other_one_time),
            ("Operating (year 1)", &composition.operating_year_one),
        ] {
            let _ = writeln!(
                out,
                "- {label}: {} ({:.1}%)",
                dollars(share.amount),
                share.share_pct
            );
        }
    }

    if !insights.projections.is_empty() {
        let _ = writeln!(out, "\nCumulative cost projection");
        for year in &insights.projections {
            let _ = writeln!(
                out,
                "- Year {:>2}: {}",
                year.year,
                dollars(year.cumulative_total)
            );
        }
    }

    let _ = writeln!(out, "\nFees ({})", breakdown.fees.len());
    for fee in &breakdown.fees {
        let recurring = if fee.is_recurring { " [monthly]" } else { "" };
        let _ = writeln!(
            out,
            "- {}{recurring}: {} ({})",
            fee.fee_name,
            dollars(fee.calculated_amount),
            fee.calculation
        );
    }

    if !breakdown.diagnostics.is_empty() {
        let _ = writeln!(out, "\nCalculation warnings");
        for diagnostic in &breakdown.diagnostics {
            let _ = writeln!(out, "- {}: {}", diagnostic.fee_name, diagnostic.fallback);
        }
    }

    out
}

pub(crate) fn render_comparison(report: &ComparisonReport, generated_on: NaiveDate) -> String {
    let mut out = String::new();
    let names: Vec<&str> = report
        .jurisdictions
        .iter()
        .map(|result| result.jurisdiction.as_str())
        .collect();
    let _ = writeln!(
        out,
        "Jurisdiction comparison: {} ({generated_on})",
        names.join(" vs ")
    );

    let _ = writeln!(out, "\nTotals");
    for result in &report.jurisdictions {
        let breakdown = &result.breakdown;
        let _ = writeln!(
            out,
            "- {}: one-time {} | monthly {} | first year {}",
            result.jurisdiction,
            dollars(breakdown.one_time_fees),
            dollars(breakdown.monthly_fees),
            dollars(breakdown.first_year_total)
        );
    }

    for pair in &report.pairs {
        let _ = writeln!(out, "\n{} vs {}", pair.left, pair.right);
        for metric in &pair.metrics {
            let verdict = match (&metric.cheaper, &metric.cheaper_jurisdiction) {
                (CheaperSide::Equal, _) | (_, None) => "no difference".to_string(),
                (_, Some(cheaper)) => match metric.savings_pct {
                    Some(pct) => format!(
                        "{cheaper} is cheaper by {} ({pct:.1}%)",
                        dollars(metric.difference)
                    ),
                    None => format!(
                        "{cheaper} is cheaper by {}",
                        dollars(metric.difference)
                    ),
                },
            };
            let _ = writeln!(
                out,
                "- {}: {} vs {} | {verdict}",
                metric.metric.label(),
                dollars(metric.left_value),
                dollars(metric.right_value)
            );
        }
    }

    let _ = writeln!(out, "\nRankings (cheapest first)");
    for ranking in &report.rankings {
        let entries: Vec<String> = ranking
            .entries
            .iter()
            .map(|entry| {
                format!(
                    "{}. {} {}",
                    entry.position,
                    entry.jurisdiction,
                    dollars(entry.value)
                )
            })
            .collect();
        let _ = writeln!(out, "- {}: {}", ranking.metric.label(), entries.join(", "));
    }

    out
}

fn dollars(amount: f64) -> String {
    format!("${}", format_currency(amount))
}

fn format_quantity(value: f64) -> String {
    let formatted = format_currency(round_currency(value));
    formatted
        .strip_suffix(".00")
        .map(str::to_string)
        .unwrap_or(formatted)
}
