//! The mformat CLI.
//!
//! `mformat [OPTIONS] PATH` formats MATLAB/Octave source. A directory is
//! searched recursively for `*.m` files, processed in sorted order. Each
//! file announces itself on stderr and its formatted contents go to
//! stdout; failures are reported per file and turn the exit code non-zero
//! without stopping the remaining files.

mod config;
mod discovery;

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use mformat_common::settings::Settings;
use mformat_parser::ParseError;

#[derive(Parser)]
#[command(name = "mformat", version, about = "Format *.m files (MATLAB/Octave source code)")]
struct Cli {
    /// Path to a *.m source file, or a directory to search recursively
    path: PathBuf,

    /// Number of space characters per indentation level
    #[arg(long, value_name = "N")]
    indent: Option<usize>,

    /// Indent case/otherwise clauses inside switch (default)
    #[arg(long, overrides_with = "no_indent_case_otherwise")]
    indent_case_otherwise: bool,
    /// Do not indent case/otherwise clauses inside switch
    #[arg(long = "no-indent-case-otherwise")]
    no_indent_case_otherwise: bool,

    /// Indent the body of the main function
    #[arg(long, overrides_with = "no_indent_main_function")]
    indent_main_function: bool,
    /// Do not indent the body of the main function (default)
    #[arg(long = "no-indent-main-function")]
    no_indent_main_function: bool,

    /// Indent the bodies of local functions
    #[arg(long, overrides_with = "no_indent_local_function")]
    indent_local_function: bool,
    /// Do not indent the bodies of local functions (default)
    #[arg(long = "no-indent-local-function")]
    no_indent_local_function: bool,

    /// Indent the bodies of nested functions (default)
    #[arg(long, overrides_with = "no_indent_nested_function")]
    indent_nested_function: bool,
    /// Do not indent the bodies of nested functions
    #[arg(long = "no-indent-nested-function")]
    no_indent_nested_function: bool,

    /// Omit the space after commas when all list items are short (default)
    #[arg(long, overrides_with = "no_omit_space_after_comma")]
    omit_space_after_comma: bool,
    /// Always put a space after commas
    #[arg(long = "no-omit-space-after-comma")]
    no_omit_space_after_comma: bool,

    /// Maximum item length for omitting the space after commas
    #[arg(long, value_name = "N")]
    omit_space_after_comma_max_length: Option<usize>,

    /// Omit the spaces around colons when both operands are short (default)
    #[arg(long, overrides_with = "no_omit_space_around_colon")]
    omit_space_around_colon: bool,
    /// Always put spaces around colons
    #[arg(long = "no-omit-space-around-colon")]
    no_omit_space_around_colon: bool,

    /// Maximum operand length for omitting the spaces around colons
    #[arg(long, value_name = "N")]
    omit_space_around_colon_max_length: Option<usize>,

    /// Guarantee a newline at the end of the output (default)
    #[arg(long, overrides_with = "no_newline_at_end_of_file")]
    newline_at_end_of_file: bool,
    /// Leave the end of the output as the last statement wrote it
    #[arg(long = "no-newline-at-end-of-file")]
    no_newline_at_end_of_file: bool,
}

impl Cli {
    /// Fold the command-line options over file/default settings.
    fn apply_overrides(&self, settings: &mut Settings) {
        fn flag(positive: bool, negative: bool) -> Option<bool> {
            match (positive, negative) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            }
        }

        if let Some(indent) = self.indent {
            settings.indent = indent;
        }
        if let Some(n) = self.omit_space_after_comma_max_length {
            settings.omit_space_after_comma_max_length = n;
        }
        if let Some(n) = self.omit_space_around_colon_max_length {
            settings.omit_space_around_colon_max_length = n;
        }
        let pairs = [
            (
                flag(self.indent_case_otherwise, self.no_indent_case_otherwise),
                &mut settings.indent_case_otherwise,
            ),
            (
                flag(self.indent_main_function, self.no_indent_main_function),
                &mut settings.indent_main_function,
            ),
            (
                flag(self.indent_local_function, self.no_indent_local_function),
                &mut settings.indent_local_function,
            ),
            (
                flag(self.indent_nested_function, self.no_indent_nested_function),
                &mut settings.indent_nested_function,
            ),
            (
                flag(self.omit_space_after_comma, self.no_omit_space_after_comma),
                &mut settings.omit_space_after_comma,
            ),
            (
                flag(self.omit_space_around_colon, self.no_omit_space_around_colon),
                &mut settings.omit_space_around_colon,
            ),
            (
                flag(self.newline_at_end_of_file, self.no_newline_at_end_of_file),
                &mut settings.newline_at_end_of_file,
            ),
        ];
        for (value, target) in pairs {
            if let Some(value) = value {
                *target = value;
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let files = if cli.path.is_dir() {
        match discovery::discover_matlab_files(&cli.path) {
            Ok(files) => files,
            Err(e) => {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        }
    } else {
        vec![cli.path.clone()]
    };

    let mut failed = false;
    for file in &files {
        eprintln!("Processing '{}'...", file.display());
        if process_file(file, &cli).is_err() {
            failed = true;
        }
    }
    if failed {
        process::exit(1);
    }
}

/// Format one file to stdout. Errors are reported to stderr here; the
/// caller only needs to know whether to fail the process at the end.
fn process_file(path: &Path, cli: &Cli) -> Result<(), ()> {
    let source = std::fs::read_to_string(path).map_err(|e| {
        eprintln!("error: failed to read '{}': {}", path.display(), e);
    })?;

    let mut settings = config::load_settings(path).map_err(|e| {
        eprintln!("error: {}", e);
    })?;
    cli.apply_overrides(&mut settings);

    let formatted = mformat_fmt::format_source(&source, &settings).map_err(|e| {
        report_parse_error(path, &source, &e);
    })?;

    print!("{}", formatted);
    Ok(())
}

/// Render a parse error against the source with ariadne.
fn report_parse_error(path: &Path, source: &str, error: &ParseError) {
    use ariadne::{Label, Report, ReportKind, Source};

    eprintln!("error: cannot format '{}'", path.display());
    let start = error.pos.unwrap_or(0).min(source.len());
    let end = (start + 1).min(source.len().max(start));
    let _ = Report::<std::ops::Range<usize>>::build(ReportKind::Error, start..end)
        .with_message("Parse error")
        .with_label(Label::new(start..end).with_message(&error.message))
        .finish()
        .eprint(Source::from(source));
}
