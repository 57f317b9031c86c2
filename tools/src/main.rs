//! survey-runner: headless driver for the risk preference survey.
//!
//! Usage:
//!   survey-runner --seed 12345 --name "Ada" --age 36 --premium 0.1 --out ./results
//!   survey-runner --seed 12345 --data-dir ./data --ipc-mode
//!
//! Scripted mode plays a participant who takes the sure amount exactly
//! when it is at least EV + premium * |EV|, then writes the export as
//! JSON and CSV. IPC mode reads one SurveyCommand JSON object per line
//! on stdin and answers one JSON line per command on stdout.

use anyhow::Result;
use riskpref_core::{
    choice::Choice,
    command::{dispatch, CommandReply, SurveyCommand},
    config::SurveyConfig,
    export::SurveyExport,
    session::{PhaseOutcome, Session},
    types::{Money, ROWS},
};
use serde::Serialize;
use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let age = parse_arg(&args, "--age", 30u32);
    let premium = parse_arg(&args, "--premium", 0.0f64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let name = str_arg(&args, "--name").unwrap_or("Scripted Participant");
    let data_dir = str_arg(&args, "--data-dir");
    let out_dir = str_arg(&args, "--out").unwrap_or(".");

    let config = match data_dir {
        Some(dir) => SurveyConfig::load(dir)?,
        None => SurveyConfig::builtin()?,
    };
    let mut session = Session::new(config, seed)?;

    if ipc_mode {
        return run_ipc_loop(&mut session);
    }

    println!("Risk Preference Survey - survey-runner");
    println!("  seed:      {seed}");
    println!("  name:      {name}");
    println!("  age:       {age}");
    println!("  premium:   {premium}");
    println!("  data_dir:  {}", data_dir.unwrap_or("(builtin)"));
    println!();

    run_scripted(&mut session, name, age, premium)?;
    let export = session.export()?;
    print_summary(&export);
    write_export(&export, out_dir)?;
    Ok(())
}

/// Answer every problem as a threshold participant and confirm each phase.
fn run_scripted(session: &mut Session, name: &str, age: u32, premium: f64) -> Result<()> {
    let mut amounts = session.start(name, age)?;
    loop {
        let ev = session
            .current_prospect()
            .map(|p| p.expected_value())
            .ok_or_else(|| anyhow::anyhow!("no active prospect"))?;
        let threshold: Money = ev + premium * ev.abs();

        // Bottom row first so each edit is checked against a partial vector.
        for row in (0..ROWS).rev() {
            let choice = if amounts[row] >= threshold { Choice::Sure } else { Choice::Gamble };
            session.submit_choice(row, choice)?;
        }

        match session.confirm_phase()? {
            PhaseOutcome::Refine { amounts: next } => amounts = next,
            PhaseOutcome::Recorded { result, next_amounts } => {
                log::debug!("problem {} done: CE={}", result.problem_index, result.certainty_equivalent);
                amounts = next_amounts;
            }
            PhaseOutcome::Complete { .. } => return Ok(()),
        }
    }
}

/// One stdout line per command: `{"ok": reply}` or `{"error": message}`.
#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum IpcResponse {
    Ok(CommandReply),
    Error(String),
}

fn run_ipc_loop(session: &mut Session) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<SurveyCommand>(&buffer) {
            Ok(cmd) => match dispatch(session, cmd) {
                Ok(reply) => IpcResponse::Ok(reply),
                Err(e) => {
                    log::debug!("command failed: {e}");
                    IpcResponse::Error(e.to_string())
                }
            },
            Err(e) => IpcResponse::Error(format!("Malformed command: {e}")),
        };
        writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn print_summary(export: &SurveyExport) {
    let s = &export.summary;
    println!("=== SURVEY SUMMARY ===");
    println!("  session:        {}", export.participant.session_id);
    println!("  problems:       {} ({} gain, {} loss)", s.total_problems, s.gain_problems, s.loss_problems);
    println!("  risk averse:    {}", s.risk_averse_count);
    println!("  risk seeking:   {}", s.risk_seeking_count);
    println!("  risk neutral:   {}", s.risk_neutral_count);
    println!();
    for r in &export.results {
        println!(
            "  #{:<2} {:<4} EV {:>9.2} | CE {:>9.2} | {} | {}",
            r.problem_index, r.domain, r.expected_value, r.certainty_equivalent, r.risk_attitude, r.prospect
        );
    }
}

fn write_export(export: &SurveyExport, out_dir: &str) -> Result<()> {
    std::fs::create_dir_all(out_dir)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%SZ");
    let stem = format!(
        "risk_survey_{}_{timestamp}",
        export.participant.name.replace(' ', "_")
    );

    let json_path = Path::new(out_dir).join(format!("{stem}.json"));
    std::fs::write(&json_path, export.to_json_pretty()?)?;
    println!();
    println!("  Wrote {}", json_path.display());

    let csv_path = Path::new(out_dir).join(format!("{stem}.csv"));
    std::fs::write(&csv_path, export.to_csv())?;
    println!("  Wrote {}", csv_path.display());
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
