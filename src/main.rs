use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

const JACK_EXT: &str = "jack";
const VM_EXT: &str = "vm";

/// Compiles .jack source into stack-machine .vm files.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// A .jack file, or a directory containing .jack files
    input: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();
    if run(&args.input) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run(input: &Path) -> bool {
    if input.extension().is_some_and(|ext| ext == JACK_EXT) {
        // single file: output keeps the file's stem, next to the input
        return compile_file(input, None);
    }

    if input.is_dir() {
        let sources = match jack_files_in(input) {
            Ok(sources) => sources,
            Err(err) => {
                eprintln!("unable to read {}: {}", input.display(), err);
                return false;
            }
        };
        if sources.is_empty() {
            eprintln!(
                "{} has no .jack files, nothing to compile",
                input.display()
            );
            return false;
        }
        // directory: one <ClassName>.vm per unit, inside the directory;
        // the first failing unit aborts the run
        return sources.iter().all(|source| compile_file(source, Some(input)));
    }

    eprintln!(
        "{}: expected a .jack file or a directory containing .jack files",
        input.display()
    );
    false
}

fn jack_files_in(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut sources: Vec<PathBuf> = fs::read_dir(dir)?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == JACK_EXT))
        .collect();
    sources.sort();
    Ok(sources)
}

fn compile_file(source: &Path, out_dir: Option<&Path>) -> bool {
    let text = match fs::read_to_string(source) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("unable to read {}: {}", source.display(), err);
            return false;
        }
    };

    let compiled = match jackc::compile(&clean_lines(&text)) {
        Ok(compiled) => compiled,
        Err(err) => {
            eprintln!("{}: {}", source.display(), err);
            return false;
        }
    };

    let out_path = match out_dir {
        Some(dir) => dir.join(format!("{}.{}", compiled.class_name, VM_EXT)),
        None => source.with_extension(VM_EXT),
    };
    let mut body = compiled.instructions.join("\n");
    body.push('\n');
    if let Err(err) = fs::write(&out_path, body) {
        eprintln!("unable to write {}: {}", out_path.display(), err);
        return false;
    }
    true
}

/// Deletes everything from `//` to end of line, deletes tab characters,
/// and drops lines left empty.
fn clean_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| match line.find("//") {
            Some(at) => &line[..at],
            None => line,
        })
        .map(|line| line.replace('\t', ""))
        .filter(|line| !line.is_empty())
        .collect()
}
