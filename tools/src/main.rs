//! report-runner: headless report generation over a FIR record database.
//!
//! Usage:
//!   report-runner --report district --seed 12345 --incidents 500
//!   report-runner --db records.db --report repeat_offender --json
//!   report-runner --db records.db --report custom --dims district,month --status bailed

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use firdesk_core::{
    config::ReportConfig,
    export::{default_columns, project, Table},
    grouping_engine::Dimension,
    model::AccusedStatus,
    report::{Report, ReportFilter, ReportKind, ReportRequest, SortOrder},
    report_assembler::ReportAssembler,
    seed::{self, SeedPlan},
    store::SqliteStore,
};
use std::env;
use std::path::Path;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let incidents = parse_arg(&args, "--incidents", 200usize);
    let as_json = args.iter().any(|a| a == "--json");
    let db = str_arg(&args, "--db").unwrap_or(":memory:");
    let data_dir = str_arg(&args, "--data-dir").unwrap_or("./data");
    let seed_data = db == ":memory:" || args.iter().any(|a| a == "--seed-data");

    let config = if Path::new(data_dir).join("reports/report_config.json").exists() {
        ReportConfig::load(data_dir)?
    } else {
        log::warn!("no report config under {data_dir}, using defaults");
        ReportConfig::default()
    };

    let store = SqliteStore::open(db)?;
    store.migrate()?;
    if seed_data {
        let plan = SeedPlan {
            incidents,
            ..SeedPlan::default()
        };
        seed::generate(seed, &plan).load_into(&store)?;
        log::info!("seeded {} incidents into {db} (seed {seed})", store.incident_count()?);
    }

    let request = build_request(&args)?;
    let assembler = ReportAssembler::new(&store, config);
    let report = assembler.generate(&request)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report)?;
    }
    Ok(())
}

fn build_request(args: &[String]) -> Result<ReportRequest> {
    let kind = match str_arg(args, "--report").unwrap_or("district") {
        "district" => ReportKind::District,
        "thana" => ReportKind::Thana,
        "district_thana" => ReportKind::DistrictThana,
        "monthly" => ReportKind::Monthly,
        "daily" => ReportKind::Daily,
        "case_status" => ReportKind::CaseStatus,
        "custody" | "custody_status" => ReportKind::CustodyStatus,
        "repeat" | "repeat_offender" => ReportKind::RepeatOffender,
        "custom" => ReportKind::Custom {
            dimensions: parse_dimensions(str_arg(args, "--dims").unwrap_or("district"))?,
        },
        other => bail!("unknown report kind '{other}'"),
    };

    let filter = ReportFilter {
        date_from: date_arg(args, "--from")?,
        date_to: date_arg(args, "--to")?,
        district: str_arg(args, "--district").map(str::to_string),
        thana: str_arg(args, "--thana").map(str::to_string),
        case_status: str_arg(args, "--case-status").map(str::to_string),
        accused_statuses: str_arg(args, "--status")
            .map(parse_statuses)
            .transpose()?
            .unwrap_or_default(),
    };

    let sort = match str_arg(args, "--sort") {
        Some("key") => SortOrder::KeyAscending,
        Some("metric") | None => SortOrder::MetricDescending,
        Some(other) => bail!("unknown sort order '{other}' (expected key or metric)"),
    };

    Ok(ReportRequest::new(kind).with_filter(filter).sorted(sort))
}

fn parse_dimensions(list: &str) -> Result<Vec<Dimension>> {
    list.split(',')
        .map(|d| match d.trim() {
            "district" => Ok(Dimension::District),
            "thana" => Ok(Dimension::Thana),
            "month" => Ok(Dimension::Month),
            "day" => Ok(Dimension::Day),
            "case_status" => Ok(Dimension::CaseStatus),
            other => bail!("unknown dimension '{other}'"),
        })
        .collect()
}

fn parse_statuses(list: &str) -> Result<Vec<AccusedStatus>> {
    list.split(',')
        .map(|s| match AccusedStatus::parse(Some(s)) {
            AccusedStatus::Unknown if !s.trim().eq_ignore_ascii_case("unknown") => {
                bail!("unknown accused status '{s}'")
            }
            status => Ok(status),
        })
        .collect()
}

fn print_report(report: &Report) -> Result<()> {
    let table = project(&report.groups, &default_columns(&report.kind))?;

    println!("=== {} REPORT ===", report.kind.name().to_uppercase());
    if report.is_empty() {
        println!("  (no matching records)");
    } else {
        print_table(&table);
    }

    let s = &report.summary;
    println!();
    println!("=== SUMMARY ===");
    println!("  groups:      {}", s.groups);
    println!("  FIRs:        {}", s.incidents);
    println!("  accused:     {}", s.accused);
    println!("  persons:     {}", s.persons);
    println!("  arrested:    {}", s.statuses.arrested);
    println!("  bailed:      {}", s.statuses.bailed);
    println!("  absconding:  {}", s.statuses.absconding);
    println!("  unknown:     {}", s.statuses.unknown);
    println!("  surety (Rs): {:.0}", s.surety_amount);
    Ok(())
}

fn print_table(table: &Table) {
    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.len()).collect();
    for row in &table.rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }
    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{c:<width$}", width = *w))
            .collect::<Vec<_>>()
            .join(" | ")
    };
    println!("  {}", line(table.headers.as_slice()));
    println!(
        "  {}",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-")
    );
    for row in &table.rows {
        println!("  {}", line(row.as_slice()));
    }
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn date_arg(args: &[String], flag: &str) -> Result<Option<NaiveDate>> {
    str_arg(args, flag)
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("{flag} expects YYYY-MM-DD, got '{s}'"))
        })
        .transpose()
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    str_arg(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
