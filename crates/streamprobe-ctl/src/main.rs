//! streamprobe-ctl: probes each compression mode in turn and reports whether
//! the body streamed or arrived buffered.

use anyhow::{Context, Result, bail};

use streamprobe_core::{CompressionMode, ProbeResult};
use streamprobe_ctl::{Probe, report};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;

struct Options {
    host: String,
    port: u16,
    json: bool,
    modes: Vec<CompressionMode>,
}

fn print_usage() {
    println!("Usage: streamprobe-ctl [--host <host>] [--port <port>] [--json] [mode ...]");
    println!();
    println!("Modes: none gzip deflate brotli zstd (default: all, in that order)");
    println!();
    println!("Options:");
    println!("  --host <host>   Server host (default: {})", DEFAULT_HOST);
    println!("  --port <port>   Server port (default: {})", DEFAULT_PORT);
    println!("  --json          Print one JSON result per mode after the timeline");
}

fn parse_args(args: &[String]) -> Result<Option<Options>> {
    let mut opts = Options {
        host: DEFAULT_HOST.to_string(),
        port: DEFAULT_PORT,
        json: false,
        modes: Vec::new(),
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--host" => {
                i += 1;
                opts.host = args.get(i).context("--host requires a value")?.clone();
            }
            "--port" => {
                i += 1;
                opts.port = args
                    .get(i)
                    .context("--port requires a value")?
                    .parse()
                    .context("--port must be a number")?;
            }
            "--json" => opts.json = true,
            "help" | "--help" | "-h" => return Ok(None),
            token => {
                let mode = token
                    .parse::<CompressionMode>()
                    .with_context(|| format!("unknown mode: {token}"))?;
                opts.modes.push(mode);
            }
        }
        i += 1;
    }

    if opts.modes.is_empty() {
        opts.modes = CompressionMode::ALL.to_vec();
    }
    Ok(Some(opts))
}

/// Probe every mode sequentially; a failed mode never stops the run.
async fn probe_all(probe: &Probe, modes: &[CompressionMode]) -> Vec<Option<ProbeResult>> {
    let mut results = Vec::with_capacity(modes.len());

    for &mode in modes {
        for line in report::section_header(mode) {
            println!("{line}");
        }

        let outcome = probe
            .run(mode, |event| {
                if let Some(line) = report::event_line(event) {
                    println!("{line}");
                }
            })
            .await;

        match outcome {
            Ok(events) => {
                let result = ProbeResult::from_events(mode, &events);
                for line in report::summary_lines(&result) {
                    println!("{line}");
                }
                results.push(Some(result));
            }
            Err(e) => {
                eprintln!("{}", report::failure_line(&e));
                results.push(None);
            }
        }
    }

    results
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let opts = match parse_args(&args) {
        Ok(Some(opts)) => opts,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(e) => {
            eprintln!("{e:#}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    let base_url = format!("http://{}:{}", opts.host, opts.port);
    let probe = Probe::new(&base_url).context("failed to build HTTP client")?;

    println!("Compression streaming probe against {base_url}");
    println!("Server sends paced chunks; we measure when raw bytes arrive at the client");

    let results = probe_all(&probe, &opts.modes).await;

    if opts.json {
        println!();
        for result in results.iter().flatten() {
            println!("{}", serde_json::to_string(result)?);
        }
    }

    if results.iter().all(Option::is_none) {
        bail!("every probe failed; is streamprobed running at {base_url}?");
    }
    Ok(())
}
