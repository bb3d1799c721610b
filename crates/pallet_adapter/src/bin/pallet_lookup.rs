#![forbid(unsafe_code)]

use std::env;

use pallet_adapter::{
    init_tracing, AdapterConfig, NOT_FOUND_MESSAGE, NO_CODE_MESSAGE, NO_DATA_FILE_MESSAGE,
};
use pallet_contracts::MonotonicTimeNs;
use pallet_os::{TraceOutcome, TraceabilityService};

const USAGE: &str = "usage: pallet_lookup <pallet_code>";

enum Failure {
    Usage(String),
    Lookup(String),
}

fn main() {
    init_tracing();
    match run() {
        Ok(()) => {}
        Err(Failure::Usage(message)) => {
            eprintln!("{message}");
            std::process::exit(2);
        }
        Err(Failure::Lookup(message)) => {
            eprintln!("{message}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<(), Failure> {
    let args: Vec<String> = env::args().skip(1).collect();
    let [code] = args.as_slice() else {
        return Err(Failure::Usage(USAGE.to_string()));
    };
    if code == "-h" || code == "--help" {
        println!("{USAGE}");
        return Ok(());
    }

    let config = AdapterConfig::from_env();
    let service =
        TraceabilityService::from_files(config.data_source(), config.traceability_config());
    match service.lookup(code, MonotonicTimeNs(0)) {
        TraceOutcome::Found { view, .. } => {
            let rendered = serde_json::to_string_pretty(&view)
                .map_err(|err| Failure::Lookup(err.to_string()))?;
            println!("{rendered}");
            Ok(())
        }
        TraceOutcome::NotFound { code } => {
            Err(Failure::Lookup(format!("{NOT_FOUND_MESSAGE}: {code}")))
        }
        TraceOutcome::NoCodeSupplied => Err(Failure::Lookup(NO_CODE_MESSAGE.to_string())),
        TraceOutcome::DataUnavailable { .. } => {
            Err(Failure::Lookup(NO_DATA_FILE_MESSAGE.to_string()))
        }
    }
}
