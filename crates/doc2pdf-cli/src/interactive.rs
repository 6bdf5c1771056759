use std::path::{Path, PathBuf};

use anyhow::Result;
use dialoguer::{Confirm, Input};
use doc2pdf::{Outcome, Session};

use crate::default_output_dir;

/// Prompt for a file, convert it, and offer to continue.
///
/// After a success the selected file is cleared and the output directory
/// kept. After a failure both are kept so the same file can be retried.
pub fn run(mut session: Session) -> Result<()> {
    match session.engine_kind() {
        Some(kind) => println!("Office engine: {kind}"),
        None => println!("No office engine found; only images can be converted."),
    }

    loop {
        let kept = session.selection().map(|s| s.path.clone());
        let input = prompt_input(kept)?;
        if let Err(e) = session.select_file(&input) {
            eprintln!("Error: {e}");
            continue;
        }

        if session.output_dir().is_none() {
            let dir = prompt_output_dir(&input)?;
            if let Err(e) = session.select_output_dir(&dir) {
                eprintln!("Error: {e}");
                continue;
            }
        }

        let result = session.convert();
        let outcome = Outcome::from_result(&result);
        if let Ok(done) = &result {
            for warning in &done.warnings {
                eprintln!("Warning: {warning}");
            }
        }
        if outcome.success {
            println!("{}", outcome.message);
        } else {
            eprintln!("Conversion failed: {}", outcome.message);
        }

        let again = Confirm::new()
            .with_prompt(next_prompt(outcome.success))
            .default(true)
            .interact()?;
        if !again {
            break;
        }
        finish_round(&mut session, outcome.success);
    }
    Ok(())
}

fn next_prompt(success: bool) -> &'static str {
    if success {
        "Convert another file?"
    } else {
        "Try again?"
    }
}

/// Reset for the next file, unless the last conversion failed.
fn finish_round(session: &mut Session, success: bool) {
    if success {
        session.clear_selection();
    }
}

/// Ask for the file to convert, offering `default` (the file that just
/// failed) when there is one.
fn prompt_input(default: Option<PathBuf>) -> Result<PathBuf> {
    let mut prompt = Input::<String>::new().with_prompt("File to convert");
    if let Some(path) = default {
        prompt = prompt.default(path.display().to_string());
    }
    let path = prompt
        .validate_with(|input: &String| -> Result<(), String> {
            if Path::new(input.trim()).is_file() {
                Ok(())
            } else {
                Err(format!("'{input}' is not a file"))
            }
        })
        .interact_text()?;
    Ok(PathBuf::from(path.trim()))
}

fn prompt_output_dir(input: &Path) -> Result<PathBuf> {
    let default = default_output_dir(input).display().to_string();
    let path: String = Input::new()
        .with_prompt("Output directory")
        .default(default)
        .validate_with(|input: &String| -> Result<(), String> {
            if Path::new(input.trim()).is_dir() {
                Ok(())
            } else {
                Err(format!("'{input}' is not a directory"))
            }
        })
        .interact_text()?;
    Ok(PathBuf::from(path.trim()))
}
