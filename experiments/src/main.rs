//! Benchmark-run driver: points the log analyzer at a directory of
//! downloaded node logs and appends the summary to a results file.
//!
//! The provisioning side (spinning instances, running the nodes, pulling
//! the logs down) lives outside this repository; this binary starts where
//! a finished run's logs land on disk.

use std::path::PathBuf;
use std::process::exit;

use bench_analysis::{LogAnalyzer, LogSchema, RunConfig, RunMeta};
use log::error;
use simple_logger::SimpleLogger;

struct Args {
    dir: PathBuf,
    schema: LogSchema,
    protocol: String,
    faults: u64,
    ddos: bool,
    output: PathBuf,
    json: Option<PathBuf>,
    default_config: RunConfig,
}

const USAGE: &str = "\
usage: experiments --dir <logs-dir> [options]

options:
  --dir <path>          directory containing the node log files (required)
  --schema batch|height log grammar to use (default: batch)
  --protocol <name>     protocol name echoed in the report (default: \"\")
  --faults <n>          byzantine node count (default: 0)
  --ddos                set the ddos flag in the report
  --output <path>       results file to append the summary to (default: results.txt)
  --json <path>         also append the metrics as one JSON line
  --tx-size <n>         height schema only: transaction size in bytes (default: 512)
  --batch-size <n>      height schema only: transactions per batch (default: 1000)
  --rate <n>            height schema only: input rate in tx/s (default: 0)
";

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        dir: PathBuf::new(),
        schema: LogSchema::Batch,
        protocol: String::new(),
        faults: 0,
        ddos: false,
        output: PathBuf::from("results.txt"),
        json: None,
        default_config: RunConfig {
            tx_size: 512,
            batch_size: 1000,
            rate: 0,
            faults: 0,
        },
    };

    let mut iter = std::env::args().skip(1);
    while let Some(flag) = iter.next() {
        let mut value = |name: &str| {
            iter.next().ok_or_else(|| format!("{name} expects a value"))
        };
        match flag.as_str() {
            "--dir" => args.dir = PathBuf::from(value("--dir")?),
            "--schema" => {
                args.schema = match value("--schema")?.as_str() {
                    "batch" => LogSchema::Batch,
                    "height" => LogSchema::Height,
                    other => return Err(format!("unknown schema {other:?}")),
                }
            }
            "--protocol" => args.protocol = value("--protocol")?,
            "--faults" => {
                args.faults = value("--faults")?
                    .parse()
                    .map_err(|_| "--faults expects an integer".to_string())?
            }
            "--ddos" => args.ddos = true,
            "--output" => args.output = PathBuf::from(value("--output")?),
            "--json" => args.json = Some(PathBuf::from(value("--json")?)),
            "--tx-size" => {
                args.default_config.tx_size = value("--tx-size")?
                    .parse()
                    .map_err(|_| "--tx-size expects an integer".to_string())?
            }
            "--batch-size" => {
                args.default_config.batch_size = value("--batch-size")?
                    .parse()
                    .map_err(|_| "--batch-size expects an integer".to_string())?
            }
            "--rate" => {
                args.default_config.rate = value("--rate")?
                    .parse()
                    .map_err(|_| "--rate expects an integer".to_string())?
            }
            "--help" | "-h" => return Err(String::new()),
            other => return Err(format!("unknown flag {other:?}")),
        }
    }

    if args.dir.as_os_str().is_empty() {
        return Err("--dir is required".to_string());
    }
    args.default_config.faults = args.faults;
    Ok(args)
}

#[tokio::main]
async fn main() {
    SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()
        .unwrap();

    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            if !msg.is_empty() {
                eprintln!("error: {msg}\n");
            }
            eprintln!("{USAGE}");
            exit(2);
        }
    };

    let mut meta = RunMeta::new(args.protocol, args.ddos, args.faults);
    if args.schema == LogSchema::Height {
        meta.default_config = Some(args.default_config);
    }

    let analyzer = LogAnalyzer::new(args.schema, meta);
    let metrics = match analyzer.process_dir(&args.dir).await {
        Ok(metrics) => metrics,
        Err(err) => {
            error!("analysis failed: {err}");
            exit(1);
        }
    };

    let summary = bench_analysis::report::render_summary(&metrics);
    print!("{summary}");

    if let Err(err) = bench_analysis::report::append_summary(&args.output, &metrics).await {
        error!("could not write results file: {err}");
        exit(1);
    }

    if let Some(json_path) = args.json {
        let line = match serde_json::to_string(&metrics) {
            Ok(line) => line,
            Err(err) => {
                error!("could not serialize metrics: {err}");
                exit(1);
            }
        };
        let appended = tokio::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&json_path)
            .await;
        let result = match appended {
            Ok(mut file) => {
                use tokio::io::AsyncWriteExt;
                file.write_all(format!("{line}\n").as_bytes()).await
            }
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            error!("could not write {}: {err}", json_path.display());
            exit(1);
        }
    }
}
