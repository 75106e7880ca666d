use anyhow::{anyhow, Context, Result};
use idea_canvas::{Board, EditorConfig, Project, Template, ValidatedStore};
use log::warn;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

const USAGE: &str = "usage: idea_canvas [PROJECT_DIR] [--template NAME]";

struct Args {
    project_dir: PathBuf,
    template: Option<Template>,
}

fn parse_args() -> Result<Args> {
    let mut project_dir = None;
    let mut template = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--template" => {
                let name = args
                    .next()
                    .ok_or_else(|| anyhow!("--template needs a name\n{}", USAGE))?;
                template = Some(name.parse::<Template>().map_err(|e| anyhow!(e))?);
            }
            "-h" | "--help" => return Err(anyhow!(USAGE)),
            _ if project_dir.is_none() => project_dir = Some(PathBuf::from(arg)),
            _ => return Err(anyhow!("unexpected argument: {}\n{}", arg, USAGE)),
        }
    }

    Ok(Args {
        project_dir: project_dir.unwrap_or_else(|| PathBuf::from("board")),
        template,
    })
}

fn run() -> Result<()> {
    let args = parse_args()?;

    let config = EditorConfig::load_or_default(&args.project_dir.join("config.json"))?;
    let project = Project::open_or_create(&args.project_dir)
        .with_context(|| format!("Cannot use project at {}", args.project_dir.display()))?;

    println!("Idea Canvas");
    println!("===========\n");

    let mut board = Board::with_config(config);
    let report = project.load_into(&mut board)?;
    if !report.is_clean() {
        warn!(
            "board.json had problems: {} skipped element(s), {} dropped connection(s), {} malformed connection(s)",
            report.skipped_elements.len(),
            report.dropped_connections.len(),
            report.malformed_connections
        );
    }
    println!("✓ Opened {}", project.root_dir().display());

    if let Some(template) = args.template {
        board.load_template(template);
        println!("✓ Applied {} template", template);
    }

    let summary = board.summary();
    println!("\n📊 {}", summary);

    let result = board.store().validate();
    if result.issues.is_empty() {
        println!("\n✅ No validation issues");
    } else {
        println!("\n🔍 Validation:");
        for issue in &result.issues {
            println!("  └─ {:?}: {}", issue.severity, issue.message);
        }
    }

    let events = board.drain_events();
    project.append_events(&events)?;
    project.save(&board)?;
    println!("\n✓ Saved ({} change record(s) logged)", events.len());

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
