/// Party kernel — Script Replay Harness
///
/// Loads a JSON array of action envelopes, replays it twice through the
/// engine, prints each outcome and the final canonical hash, and fails if
/// the two runs disagree.
///
/// Usage: party_engine [SCRIPT]   (default: tests/fixtures/scenario.json)

use std::fs;
use std::process::ExitCode;

use party_engine::engine::PartyEngine;
use party_engine::events::ActionEnvelope;
use party_engine::hashing::canonical_hash;
use party_engine::telemetry::init_tracing;

const DEFAULT_SCRIPT: &str = "tests/fixtures/scenario.json";

fn load(path: &str) -> Result<Vec<ActionEnvelope>, String> {
    let data = fs::read_to_string(path).map_err(|e| format!("cannot read {}: {}", path, e))?;
    serde_json::from_str(&data).map_err(|e| format!("cannot parse {}: {}", path, e))
}

fn run(actions: &[ActionEnvelope], verbose: bool) -> Result<String, String> {
    let mut engine = PartyEngine::new();
    for action in actions {
        let result = engine.apply(action).map_err(|e| e.to_string())?;
        if verbose {
            if result.success {
                println!(
                    "[ok]       #{:<4} {:<22} notifications={}",
                    action.sequence,
                    result.action,
                    result.notifications.len()
                );
            } else {
                println!(
                    "[rejected] #{:<4} {:<22} {}",
                    action.sequence, result.action, result.reason
                );
            }
            for id in &result.disbanded {
                println!("           {} disbanded", id);
            }
        }
    }
    canonical_hash(engine.state()).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    init_tracing("warn");

    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_SCRIPT.to_string());
    let actions = match load(&path) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    println!("Loaded {} actions from {}", actions.len(), path);

    let first = run(&actions, true);
    let second = run(&actions, false);
    match (first, second) {
        (Ok(h1), Ok(h2)) if h1 == h2 => {
            println!("\nfinal hash: {}", h1);
            println!("[OK] replay is deterministic.");
            ExitCode::SUCCESS
        }
        (Ok(h1), Ok(h2)) => {
            println!("[FAIL] determinism: run1={} run2={}", h1, h2);
            ExitCode::FAILURE
        }
        (Err(e), _) | (_, Err(e)) => {
            println!("[FAIL] engine fault: {}", e);
            ExitCode::FAILURE
        }
    }
}
