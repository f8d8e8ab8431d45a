use motifscan::{
    about,
    aggregate::{Batch, ReportStatus, ScanReport},
    engine::MotifScanner,
    parameters::ScanParameters,
    sequence_record::SequenceRecord,
};
use motifscan_render::{
    export_motif_chart_svg, render_report, render_summary, render_text_table, table_to_csv,
};
use serde::Serialize;
use std::{env, fs};

fn usage() {
    eprintln!(
        "Usage:\n  \
  motifscan_cli --version\n  \
  motifscan_cli [-v|-vv] catalog\n  \
  motifscan_cli [-v|-vv] scan [OPTIONS] FILE.fa...\n  \
  motifscan_cli [-v|-vv] scan-seq [OPTIONS] ID SEQUENCE\n\n  \
  Options:\n    \
    --config PATH       JSON scan parameters\n    \
    --threads N         worker threads (default: all cores)\n    \
    --atomic            stop at the first file that fails\n    \
    --format FORMAT     table|csv|json|report|summary (default: table)\n    \
    --output PATH       write the formatted result to PATH\n    \
    --chart PATH        also write an SVG motif chart"
    );
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Table,
    Csv,
    Json,
    Report,
    Summary,
}

impl OutputFormat {
    fn parse(value: &str) -> Result<Self, String> {
        match value {
            "table" => Ok(Self::Table),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "report" => Ok(Self::Report),
            "summary" => Ok(Self::Summary),
            _ => Err(format!(
                "Unknown format '{value}', expected table, csv, json, report or summary"
            )),
        }
    }
}

struct ScanOptions {
    parameters: ScanParameters,
    format: OutputFormat,
    output: Option<String>,
    chart: Option<String>,
    positional: Vec<String>,
}

fn option_value<'a>(args: &'a [String], idx: usize, flag: &str) -> Result<&'a str, String> {
    args.get(idx + 1)
        .map(|s| s.as_str())
        .ok_or_else(|| format!("Missing value for {flag}"))
}

fn parse_scan_options(args: &[String]) -> Result<ScanOptions, String> {
    let mut config: Option<String> = None;
    let mut threads: Option<usize> = None;
    let mut atomic = false;
    let mut format = OutputFormat::Table;
    let mut output = None;
    let mut chart = None;
    let mut positional = vec![];

    let mut idx = 0;
    while idx < args.len() {
        let arg = &args[idx];
        match arg.as_str() {
            "--config" => {
                config = Some(option_value(args, idx, arg)?.to_string());
                idx += 1;
            }
            "--threads" => {
                let value = option_value(args, idx, arg)?;
                let n = value
                    .parse::<usize>()
                    .map_err(|e| format!("Invalid thread count '{value}': {e}"))?;
                threads = Some(n);
                idx += 1;
            }
            "--atomic" => atomic = true,
            "--format" => {
                format = OutputFormat::parse(option_value(args, idx, arg)?)?;
                idx += 1;
            }
            "--output" => {
                output = Some(option_value(args, idx, arg)?.to_string());
                idx += 1;
            }
            "--chart" => {
                chart = Some(option_value(args, idx, arg)?.to_string());
                idx += 1;
            }
            _ if arg.starts_with("--") => return Err(format!("Unknown option '{arg}'")),
            _ => positional.push(arg.clone()),
        }
        idx += 1;
    }

    let mut parameters = match config {
        Some(path) => ScanParameters::load_from_path(&path).map_err(|e| e.to_string())?,
        None => ScanParameters::default(),
    };
    if threads.is_some() {
        parameters.threads = threads;
    }
    if atomic {
        parameters.atomic = true;
    }
    parameters.validate().map_err(|e| e.to_string())?;

    Ok(ScanOptions {
        parameters,
        format,
        output,
        chart,
        positional,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Could not serialize JSON output: {e}"))?;
    println!("{text}");
    Ok(())
}

fn format_report(report: &ScanReport, options: &ScanOptions) -> Result<String, String> {
    let table = &report.table;
    let text = match options.format {
        OutputFormat::Table if report.status() == ReportStatus::NoMotifsFound => {
            "No motifs found\n".to_string()
        }
        OutputFormat::Table => render_text_table(table),
        OutputFormat::Csv => {
            table_to_csv(table).map_err(|e| format!("Could not write CSV output: {e}"))?
        }
        OutputFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| format!("Could not serialize JSON output: {e}"))?,
        OutputFormat::Report => {
            render_report(table, options.parameters.report_rows_per_page)
        }
        OutputFormat::Summary => render_summary(table),
    };
    Ok(text)
}

fn emit(report: &ScanReport, options: &ScanOptions) -> Result<(), String> {
    let text = format_report(report, options)?;
    match &options.output {
        Some(path) => {
            fs::write(path, &text).map_err(|e| format!("Could not write output '{path}': {e}"))?;
            println!("Wrote {} rows to '{path}'", report.table.len());
        }
        None => print!("{text}"),
    }
    if let Some(path) = &options.chart {
        let svg = export_motif_chart_svg(&report.table);
        fs::write(path, svg).map_err(|e| format!("Could not write SVG chart '{path}': {e}"))?;
        println!("Wrote motif chart to '{path}'");
    }
    for failure in &report.failures {
        eprintln!("Skipped '{}': {}", failure.source, failure.error);
    }
    if report.files_scanned == 0 && !report.failures.is_empty() {
        return Err("No input could be scanned".to_string());
    }
    Ok(())
}

fn init_logging(verbosity: usize) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

/// Splits argv into the verbosity from leading `-v`/`-vv` flags, the command
/// and the arguments after it.
fn split_command(args: &[String]) -> (usize, Option<&str>, &[String]) {
    let mut cmd_idx = 1;
    let mut verbosity = 0;
    while let Some(flag) = args.get(cmd_idx).filter(|a| a.as_str() == "-v" || a.as_str() == "-vv")
    {
        verbosity += flag.len() - 1;
        cmd_idx += 1;
    }
    match args.get(cmd_idx) {
        Some(command) => (verbosity, Some(command.as_str()), &args[cmd_idx + 1..]),
        None => (verbosity, None, &[]),
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().collect();
    let (verbosity, command, rest) = split_command(&args);
    let Some(command) = command else {
        usage();
        return Err("Missing command".to_string());
    };
    if command == "--version" || command == "-V" {
        println!("{}", about::version_cli_text());
        return Ok(());
    }
    init_logging(verbosity);

    match command {
        "catalog" | "capabilities" => print_json(&MotifScanner::capabilities()),
        "scan" => {
            let options = parse_scan_options(rest)?;
            if options.positional.is_empty() {
                usage();
                return Err("scan requires at least one FASTA file".to_string());
            }
            let scanner = MotifScanner::new(options.parameters.clone()).map_err(|e| e.to_string())?;
            let report = scanner
                .scan_files(options.positional.as_slice())
                .map_err(|e| e.to_string())?;
            emit(&report, &options)
        }
        "scan-seq" => {
            let options = parse_scan_options(rest)?;
            let [id, sequence] = options.positional.as_slice() else {
                usage();
                return Err("scan-seq requires: ID SEQUENCE".to_string());
            };
            let record = SequenceRecord::new(id.as_str(), sequence.as_bytes());
            let scanner = MotifScanner::new(options.parameters.clone()).map_err(|e| e.to_string())?;
            let report = scanner
                .scan_batches(vec![Batch::new("<inline>", vec![record])])
                .map_err(|e| e.to_string())?;
            emit(&report, &options)
        }
        _ => {
            usage();
            Err(format!("Unknown command '{command}'"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_version_flag_only_as_command() {
        let args = argv(&["motifscan_cli", "scan-seq", "-V", "ACGT"]);
        let (verbosity, command, rest) = split_command(&args);
        assert_eq!(verbosity, 0);
        assert_eq!(command, Some("scan-seq"));
        assert_eq!(rest, &args[2..]);

        let args = argv(&["motifscan_cli", "scan", "reads.fa", "--version"]);
        assert_eq!(split_command(&args).1, Some("scan"));
    }

    #[test]
    fn test_verbosity_before_command() {
        let args = argv(&["motifscan_cli", "-v", "-vv", "--version"]);
        assert_eq!(split_command(&args), (3, Some("--version"), &[][..]));

        let args = argv(&["motifscan_cli", "-vv", "catalog", "-v"]);
        let (verbosity, command, rest) = split_command(&args);
        assert_eq!((verbosity, command), (2, Some("catalog")));
        assert_eq!(rest, &args[3..]);
    }

    #[test]
    fn test_missing_command() {
        assert_eq!(split_command(&argv(&["motifscan_cli"])).1, None);
        assert_eq!(split_command(&argv(&["motifscan_cli", "-v"])).1, None);
        assert_eq!(split_command(&[]).1, None);
    }
}
