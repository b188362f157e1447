//! Headless Sotoshop: replay an editing session and export the result.
//!
//!   sotoshop --session poster.json --output poster.png
//!   sotoshop -s poster.json -o poster.png --config editor.json --verbose

mod error;
mod session;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use sotoshop_core::{Editor, EditorConfig};
use sotoshop_render::{DocumentPainter, export_png_to};

use crate::error::CliResult;
use crate::session::{Replayer, Session};

/// Replay a JSON editing session through the Sotoshop editor and write a PNG.
#[derive(Parser, Debug)]
#[command(name = "sotoshop", version, about, long_about = None)]
struct Args {
    /// Session file with the commands to replay.
    #[arg(short, long, value_name = "FILE")]
    session: PathBuf,

    /// Where to write the exported PNG.
    #[arg(short, long, value_name = "FILE.png")]
    output: PathBuf,

    /// Editor configuration (JSON). Missing fields use defaults.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn run(args: &Args) -> CliResult<()> {
    let config = match &args.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };
    let session = Session::load(&args.session)?;
    let base_dir = args
        .session
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let mut replayer = Replayer::new(Editor::new(config), base_dir);
    let report = replayer.replay(&session);
    for reason in &report.skipped {
        eprintln!("skipped {reason}");
    }

    let editor = replayer.into_editor();
    let mut painter = DocumentPainter::new();
    export_png_to(editor.document(), &mut painter, &args.output)?;
    println!(
        "{} commands applied, {} skipped, {} layers -> {}",
        report.applied,
        report.skipped.len(),
        editor.document().len(),
        args.output.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "sotoshop", "-s", "in.json", "-o", "out.png", "--config", "cfg.json", "-v",
        ])
        .unwrap();
        assert_eq!(args.session, PathBuf::from("in.json"));
        assert_eq!(args.output, PathBuf::from("out.png"));
        assert_eq!(args.config, Some(PathBuf::from("cfg.json")));
        assert!(args.verbose);
        assert!(Args::try_parse_from(["sotoshop", "-o", "out.png"]).is_err());
    }

    #[test]
    fn test_run_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let session = dir.path().join("session.json");
        let config = dir.path().join("editor.json");
        let output = dir.path().join("out.png");
        std::fs::write(
            &session,
            r#"{ "commands": [
                { "op": "add_shape", "shape": "circle", "x": 4, "y": 4, "width": 20, "height": 20 },
                { "op": "add_text", "content": "Halo" },
                { "op": "delete", "layer": 9 }
            ] }"#,
        )
        .unwrap();
        std::fs::write(&config, r#"{ "canvas_width": 64, "canvas_height": 48 }"#).unwrap();

        let args = Args {
            session,
            output: output.clone(),
            config: Some(config),
            verbose: false,
        };
        run(&args).unwrap();
        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    fn test_run_reports_bad_session() {
        let dir = tempfile::tempdir().unwrap();
        let session = dir.path().join("session.json");
        std::fs::write(&session, "{ not json").unwrap();
        let args = Args {
            session,
            output: dir.path().join("out.png"),
            config: None,
            verbose: false,
        };
        assert!(matches!(run(&args), Err(crate::error::CliError::Session(_))));
    }
}
