use std::path::PathBuf;
use std::process;

use fanin_core::{FanInError, PipelineName};
use fanin_rust::{AppError, Snapshot, CONFIG};
use serde_json::{json, Value};

const USAGE: &str = "uso: fanin-inspect [--snapshot <archivo>] [--graph] [--max <N>] [--depth <N>] [--no-fanin] <pipeline>...";

struct Args {
    snapshot: Option<PathBuf>,
    graph: bool,
    max: Option<usize>,
    depth: Option<usize>,
    no_fanin: bool,
    pipelines: Vec<PipelineName>,
}

fn parse_args(args: &[String]) -> Result<Args, AppError> {
    let mut parsed = Args { snapshot: None,
                            graph: false,
                            max: None,
                            depth: None,
                            no_fanin: false,
                            pipelines: vec![] };
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--snapshot" => {
                i += 1;
                parsed.snapshot = args.get(i).map(PathBuf::from);
            }
            "--max" => {
                i += 1;
                parsed.max = Some(parse_number("--max", args.get(i))?);
            }
            "--depth" => {
                i += 1;
                parsed.depth = Some(parse_number("--depth", args.get(i))?);
            }
            "--graph" => parsed.graph = true,
            "--no-fanin" => parsed.no_fanin = true,
            other if other.starts_with("--") => return Err(AppError::Config(format!("opción desconocida {other}"))),
            name => parsed.pipelines.push(PipelineName::new(name)),
        }
        i += 1;
    }
    Ok(parsed)
}

fn parse_number(flag: &str, value: Option<&String>) -> Result<usize, AppError> {
    value.and_then(|v| v.parse().ok())
         .ok_or_else(|| AppError::Config(format!("{flag} requiere un entero")))
}

fn failure_json(pipeline: &PipelineName, err: &FanInError) -> Value {
    let action = match err {
        FanInError::Failure(f) => Some(f.action()),
        _ => None,
    };
    json!({ "pipeline": pipeline, "error": err.to_string(), "action": action })
}

fn run(args: Args) -> Result<bool, AppError> {
    let path = args.snapshot
                   .or_else(|| CONFIG.snapshot.clone())
                   .ok_or_else(|| AppError::Config("falta --snapshot (o FANIN_SNAPSHOT)".into()))?;
    let mut config = CONFIG.fanin;
    if let Some(max) = args.max {
        config.max_permutations = max;
    }
    if let Some(depth) = args.depth {
        config.history_depth = Some(depth);
    }
    if args.no_fanin {
        config.enabled = false;
    }
    let service = Snapshot::load(&path)?.into_service(config)?;

    let mut all_ok = true;
    let output: Vec<Value> = if args.graph {
        let mut graphs = vec![];
        for p in &args.pipelines {
            graphs.push(match service.graph(p) {
                            Ok(g) => serde_json::to_value(&g)?,
                            Err(e) => {
                                all_ok = false;
                                failure_json(p, &e)
                            }
                        });
        }
        graphs
    } else {
        let results = service.resolve_many(&args.pipelines);
        let mut values = vec![];
        for (p, r) in args.pipelines.iter().zip(results) {
            values.push(match r {
                            Ok(t) => serde_json::to_value(&t)?,
                            Err(e) => {
                                all_ok = false;
                                failure_json(p, &e)
                            }
                        });
        }
        values
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(all_ok)
}

fn main() {
    // CLI mínima: `fanin-inspect --snapshot <archivo> <pipeline>...`
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("{USAGE}");
        process::exit(2);
    }
    let parsed = match parse_args(&args) {
        Ok(p) if !p.pipelines.is_empty() => p,
        Ok(_) => {
            eprintln!("{USAGE}");
            process::exit(2);
        }
        Err(e) => {
            eprintln!("[fanin-inspect] {e}\n{USAGE}");
            process::exit(2);
        }
    };
    match run(parsed) {
        Ok(true) => {}
        Ok(false) => process::exit(4),
        Err(e) => {
            eprintln!("[fanin-inspect] error: {e}");
            process::exit(5);
        }
    }
}
