use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "lazykit workspace automation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the criterion benchmarks and summarize them
    Bench {
        /// Run quickly (lower sample size/time)
        #[arg(long, default_value_t = false)]
        quick: bool,

        /// Generate report only (skip running benchmarks)
        #[arg(long, default_value_t = false)]
        report_only: bool,

        /// Also build with the `tracing` feature enabled
        #[arg(long, default_value_t = false)]
        tracing: bool,
    },
}

const BENCHES: &[&str] = &["sequence_benchmark", "singleton_benchmark"];

/// One criterion measurement: mean time per iteration and, when the bench
/// declared element throughput, elements per iteration.
struct Estimate {
    mean_ns: f64,
    elements: Option<f64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Bench {
            quick,
            report_only,
            tracing,
        } => {
            if !report_only {
                run_benchmarks(quick, tracing)?;
            }
            generate_report()?;
        }
    }

    Ok(())
}

fn run_benchmarks(quick: bool, tracing: bool) -> Result<()> {
    for bench in BENCHES {
        println!("\n>>> Running {bench}");
        let start = Instant::now();

        let mut cmd = Command::new("cargo");
        cmd.arg("bench").arg("--bench").arg(bench);
        if tracing {
            cmd.arg("--features").arg("tracing");
        }

        // Args for the test runner (Criterion) go after --
        cmd.arg("--");
        if quick {
            cmd.arg("--measurement-time").arg("0.5");
            cmd.arg("--noplot");
            cmd.arg("--sample-size").arg("10");
        }

        let status = cmd
            .status()
            .with_context(|| format!("failed to launch cargo bench for {bench}"))?;
        if !status.success() {
            anyhow::bail!("benchmark {bench} failed");
        }
        println!("Finished {bench} in {:.2?}", start.elapsed());
    }

    Ok(())
}

fn generate_report() -> Result<()> {
    println!("\n>>> Generating Report...");

    let criterion_dir = Path::new("target/criterion");
    if !criterion_dir.exists() {
        eprintln!("No criterion output found at {}", criterion_dir.display());
        return Ok(());
    }

    let mut results = BTreeMap::new();
    collect_results(criterion_dir, &mut results)?;

    let report_path = Path::new("benchmark_results/report.md");
    if let Some(parent) = report_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(report_path)
        .with_context(|| format!("failed to create {}", report_path.display()))?;

    writeln!(file, "# Benchmark Report")?;
    writeln!(file)?;
    writeln!(file, "| Benchmark | Mean | Throughput |")?;
    writeln!(file, "|---|---|---|")?;

    for (name, estimate) in &results {
        let throughput = match estimate.elements {
            Some(elements) => format_rate(elements * 1e9 / estimate.mean_ns, "elem/s"),
            None => format_rate(1e9 / estimate.mean_ns, "iter/s"),
        };
        writeln!(file, "| {name} | {} | {throughput} |", format_time(estimate.mean_ns))?;
    }

    println!("Report written to {}", report_path.display());
    Ok(())
}

/// Walks `target/criterion/<group>/<function>/new/estimates.json`.
fn collect_results(dir: &Path, results: &mut BTreeMap<String, Estimate>) -> Result<()> {
    for entry in fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if path.file_name().and_then(|s| s.to_str()) == Some("report") {
                continue;
            }
            collect_results(&path, results)?;
            continue;
        }
        if path.file_name().and_then(|s| s.to_str()) != Some("estimates.json") {
            continue;
        }

        // Only the latest run; criterion keeps `base` and `change` alongside.
        let Some(run_dir) = path.parent() else { continue };
        if run_dir.file_name().and_then(|s| s.to_str()) != Some("new") {
            continue;
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let estimates: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("malformed {}", path.display()))?;
        let Some(mean_ns) = estimates
            .pointer("/mean/point_estimate")
            .and_then(serde_json::Value::as_f64)
            .filter(|ns| *ns > 0.0)
        else {
            continue;
        };

        let bench_json = run_dir.join("benchmark.json");
        let (name, elements) = match fs::read_to_string(&bench_json) {
            Ok(content) => {
                let meta: serde_json::Value = serde_json::from_str(&content)
                    .with_context(|| format!("malformed {}", bench_json.display()))?;
                let name = meta
                    .get("full_id")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_owned);
                let elements = meta
                    .pointer("/throughput/Elements")
                    .and_then(serde_json::Value::as_f64);
                (name, elements)
            }
            Err(_) => (None, None),
        };

        let name = name.unwrap_or_else(|| fallback_name(run_dir));
        results.insert(name, Estimate { mean_ns, elements });
    }

    Ok(())
}

fn fallback_name(run_dir: &Path) -> String {
    run_dir
        .parent()
        .and_then(|function_dir| {
            let function = function_dir.file_name()?.to_str()?;
            let group = function_dir.parent()?.file_name()?.to_str()?;
            Some(format!("{group}/{function}"))
        })
        .unwrap_or_else(|| run_dir.display().to_string())
}

fn format_time(ns: f64) -> String {
    if ns >= 1_000_000.0 {
        format!("{:.2} ms", ns / 1_000_000.0)
    } else if ns >= 1_000.0 {
        format!("{:.2} µs", ns / 1_000.0)
    } else {
        format!("{ns:.2} ns")
    }
}

fn format_rate(per_sec: f64, unit: &str) -> String {
    if per_sec > 1_000_000.0 {
        format!("{:.2}M {unit}", per_sec / 1_000_000.0)
    } else if per_sec > 1_000.0 {
        format!("{:.2}K {unit}", per_sec / 1_000.0)
    } else {
        format!("{per_sec:.0} {unit}")
    }
}
