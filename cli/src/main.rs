use std::{
    collections::HashSet,
    env, fs,
    io::{self, Read},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context};
use clap::{ArgAction, Parser, Subcommand};
use console::style;
use globset::{Glob, GlobSet, GlobSetBuilder};
use redpen_core::{
    create_goal, sanitize_mapped, update_goal_progress, CatalogKind, Category, Config,
    CorrectError, CorrectionResult, Engine, GoalKind, Severity, TextStatistics, WritingGoal,
};
use serde::Serialize;
use walkdir::WalkDir;

/// Rule-based grammar, spelling and style correction.
#[derive(Debug, Parser)]
#[command(name = "redpen", about = "Find and fix grammar, spelling and style slips.")]
struct Args {
    /// Path to config file (YAML). Defaults to redpen.yml if present.
    #[arg(long, default_value = "redpen.yml", global = true)]
    config: PathBuf,

    /// Emit JSON output for automation.
    #[arg(long, action = ArgAction::SetTrue, global = true)]
    json: bool,

    /// Only print the summary line.
    #[arg(long, action = ArgAction::SetTrue, global = true)]
    quiet: bool,

    /// Set config overrides (repeatable as key=value). Example: --set statistics.words_per_minute=250
    #[arg(long = "set", value_name = "KEY=VALUE", global = true)]
    sets: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Report findings without changing anything.
    Check {
        /// Exit non-zero if any finding has severity `error`.
        #[arg(long, action = ArgAction::SetTrue)]
        strict: bool,

        /// Use the extended catalog.
        #[arg(long, action = ArgAction::SetTrue)]
        extended: bool,

        /// Report only these categories (comma-separated).
        #[arg(long, value_delimiter = ',', value_name = "CAT[,CAT]")]
        only: Vec<String>,

        /// Hide these categories (comma-separated).
        #[arg(long, value_delimiter = ',', value_name = "CAT[,CAT]")]
        disable: Vec<String>,

        /// Files or directories to check; `-` reads stdin.
        #[arg(value_name = "PATH", default_value = ".", num_args = 0..)]
        paths: Vec<PathBuf>,
    },
    /// Print corrected text, or rewrite files in place.
    Fix {
        /// Use the extended catalog.
        #[arg(long, action = ArgAction::SetTrue)]
        extended: bool,

        /// Write corrections back to the files.
        #[arg(long, action = ArgAction::SetTrue)]
        write: bool,

        #[arg(value_name = "PATH", default_value = "-", num_args = 0..)]
        paths: Vec<PathBuf>,
    },
    /// Print text statistics.
    Stats {
        #[arg(value_name = "PATH", default_value = "-", num_args = 0..)]
        paths: Vec<PathBuf>,
    },
    /// Show progress towards a writing goal.
    Goal {
        /// word-count, reading-time or sentences.
        #[arg(long)]
        kind: GoalKind,

        #[arg(long)]
        target: usize,

        #[arg(value_name = "PATH", default_value = "-", num_args = 0..)]
        paths: Vec<PathBuf>,
    },
}

/// Where a document came from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    Stdin,
    File(PathBuf),
}

impl Source {
    fn label(&self) -> String {
        match self {
            Source::Stdin => "<stdin>".to_string(),
            Source::File(path) => path.to_string_lossy().replace('\\', "/"),
        }
    }

    fn read(&self) -> anyhow::Result<String> {
        match self {
            Source::Stdin => {
                let mut text = String::new();
                io::stdin()
                    .read_to_string(&mut text)
                    .context("Failed to read stdin")?;
                Ok(text)
            }
            Source::File(path) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display())),
        }
    }
}

#[derive(Debug, Serialize)]
struct FileReport<T> {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rejected: Option<String>,
}

#[derive(Debug, Serialize)]
struct CheckOutput {
    files: Vec<FileReport<CorrectionResult>>,
    total_findings: usize,
    total_errors: usize,
    rejected: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let mut cfg = load_config(&args.config)?;
    apply_overrides(&mut cfg, &args.sets)?;
    let ignore = build_ignore_set(&cfg.ignore_globs)?;
    let allowed = cfg.validation.allowed_extensions.clone();
    let engine = Engine::new(cfg).context("Failed to compile rule catalog")?;

    let failed = match &args.command {
        Command::Check {
            strict,
            extended,
            only,
            disable,
            paths,
        } => {
            let sources = collect_sources(paths, ignore.as_ref(), &allowed)?;
            let filter = CategoryFilter::new(only, disable)?;
            run_check(&engine, &args, sources, catalog_kind(*extended), &filter, *strict)?
        }
        Command::Fix {
            extended,
            write,
            paths,
        } => {
            let sources = collect_sources(paths, ignore.as_ref(), &allowed)?;
            run_fix(&engine, &args, sources, catalog_kind(*extended), *write)?
        }
        Command::Stats { paths } => {
            let sources = collect_sources(paths, ignore.as_ref(), &allowed)?;
            run_stats(&engine, &args, sources)?
        }
        Command::Goal {
            kind,
            target,
            paths,
        } => {
            let sources = collect_sources(paths, ignore.as_ref(), &allowed)?;
            run_goal(&engine, &args, sources, create_goal(*kind, *target))?
        }
    };

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

fn catalog_kind(extended: bool) -> Option<CatalogKind> {
    extended.then_some(CatalogKind::Extended)
}

/// Read a source after the file boundary checks. `Err` carries the rejection.
fn admit(engine: &Engine, source: &Source) -> anyhow::Result<Result<String, String>> {
    if let Source::File(path) = source {
        let report = engine
            .validate_file(path)
            .with_context(|| format!("Failed to inspect {}", path.display()))?;
        if let Some(reason) = report.first_error() {
            return Ok(Err(reason.to_string()));
        }
    }
    Ok(Ok(source.read()?))
}

fn correct(
    engine: &Engine,
    kind: Option<CatalogKind>,
    text: &str,
) -> Result<CorrectionResult, CorrectError> {
    match kind {
        Some(kind) => engine.correct_in(kind, text),
        None => engine.correct(text),
    }
}

/// Splice each fix into the raw text. Offsets refer to the sanitised text, so
/// they are mapped back first; bytes outside the fixed spans are kept as is.
fn apply_to_raw(raw: &str, result: &CorrectionResult) -> String {
    let mapped = sanitize_mapped(raw);
    let mut out = String::with_capacity(raw.len());
    let mut cursor = 0;
    for err in &result.errors {
        let (start, end) = mapped.raw_span(err.start, err.end);
        if start < cursor {
            continue;
        }
        out.push_str(&raw[cursor..start]);
        out.push_str(&err.suggestion);
        cursor = end;
    }
    out.push_str(&raw[cursor..]);
    out
}

/// Returns whether the file was rewritten.
fn write_fixes(file: &Path, raw: &str, result: &CorrectionResult) -> anyhow::Result<bool> {
    if result.errors.is_empty() {
        return Ok(false);
    }
    let fixed = apply_to_raw(raw, result);
    if fixed == raw {
        return Ok(false);
    }
    fs::write(file, fixed).with_context(|| format!("Failed to write {}", file.display()))?;
    tracing::debug!(path = %file.display(), fixes = result.errors.len(), "wrote fixes");
    Ok(true)
}

fn run_check(
    engine: &Engine,
    args: &Args,
    sources: Vec<Source>,
    kind: Option<CatalogKind>,
    filter: &CategoryFilter,
    strict: bool,
) -> anyhow::Result<bool> {
    let mut files = Vec::new();
    let mut total_findings = 0usize;
    let mut total_errors = 0usize;
    let mut rejected = 0usize;

    for source in sources {
        let path = source.label();
        let outcome = match admit(engine, &source)? {
            Ok(text) => correct(engine, kind, &text).map_err(|err| err.to_string()),
            Err(reason) => Err(reason),
        };
        match outcome {
            Ok(mut result) => {
                filter.retain(&mut result);
                total_findings += result.errors.len();
                total_errors += result
                    .errors
                    .iter()
                    .filter(|e| e.severity == Severity::Error)
                    .count();
                if !args.quiet && !args.json {
                    print_findings(&path, &result);
                }
                files.push(FileReport {
                    path,
                    report: Some(result),
                    rejected: None,
                });
            }
            Err(reason) => {
                rejected += 1;
                if !args.quiet && !args.json {
                    print_rejected(&path, &reason);
                }
                files.push(FileReport {
                    path,
                    report: None,
                    rejected: Some(reason),
                });
            }
        }
    }

    let output = CheckOutput {
        files,
        total_findings,
        total_errors,
        rejected,
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!(
            "\n{} files, {} findings, {} errors, {} rejected",
            output.files.len(),
            total_findings,
            total_errors,
            rejected
        );
    }

    Ok(rejected > 0 || (strict && total_errors > 0))
}

fn run_fix(
    engine: &Engine,
    args: &Args,
    sources: Vec<Source>,
    kind: Option<CatalogKind>,
    write: bool,
) -> anyhow::Result<bool> {
    let mut reports = Vec::new();
    let mut failed = false;

    for source in sources {
        let path = source.label();
        let text = match admit(engine, &source)? {
            Ok(text) => text,
            Err(reason) => {
                failed = true;
                print_rejected(&path, &reason);
                continue;
            }
        };
        let result = match correct(engine, kind, &text) {
            Ok(result) => result,
            Err(err) => {
                failed = true;
                print_rejected(&path, &err.to_string());
                continue;
            }
        };

        match (&source, write) {
            (Source::File(file), true) => {
                write_fixes(file, &text, &result)?;
                if !args.quiet && !args.json {
                    println!(
                        "{} {} ({} fixes)",
                        style("fixed").green(),
                        style(&path).bold(),
                        result.errors.len()
                    );
                }
            }
            _ if !args.json => println!("{}", result.corrected),
            _ => {}
        }

        reports.push(FileReport {
            path,
            report: Some(result),
            rejected: None,
        });
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    Ok(failed)
}

fn run_stats(engine: &Engine, args: &Args, sources: Vec<Source>) -> anyhow::Result<bool> {
    let mut reports = Vec::new();
    let mut failed = false;

    for source in sources {
        let path = source.label();
        match admit(engine, &source)? {
            Ok(text) => {
                let stats = engine.compute_statistics(&text);
                if !args.quiet && !args.json {
                    print_stats(&path, &stats);
                }
                reports.push(FileReport {
                    path,
                    report: Some(stats),
                    rejected: None,
                });
            }
            Err(reason) => {
                failed = true;
                if !args.json {
                    print_rejected(&path, &reason);
                }
                reports.push(FileReport {
                    path,
                    report: None,
                    rejected: Some(reason),
                });
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    Ok(failed)
}

fn run_goal(
    engine: &Engine,
    args: &Args,
    sources: Vec<Source>,
    goal: WritingGoal,
) -> anyhow::Result<bool> {
    let mut reports = Vec::new();
    let mut failed = false;

    for source in sources {
        let path = source.label();
        let text = match admit(engine, &source)? {
            Ok(text) => text,
            Err(reason) => {
                failed = true;
                print_rejected(&path, &reason);
                continue;
            }
        };
        let progress = update_goal_progress(&goal, &engine.compute_statistics(&text));
        if !args.json {
            let mark = if progress.completed {
                style("done").green()
            } else {
                style("open").yellow()
            };
            println!(
                "{} {}: {}/{} ({}%) [{}]",
                style(&path).bold(),
                progress.kind,
                progress.current,
                progress.target,
                progress.percent(),
                mark
            );
        }
        reports.push(FileReport {
            path,
            report: Some(progress),
            rejected: None,
        });
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    Ok(failed)
}

/// Category visibility for `check`.
#[derive(Debug, Default)]
struct CategoryFilter {
    only: HashSet<Category>,
    disable: HashSet<Category>,
}

impl CategoryFilter {
    fn new(only: &[String], disable: &[String]) -> anyhow::Result<Self> {
        let parse = |names: &[String]| -> anyhow::Result<HashSet<Category>> {
            names
                .iter()
                .map(|name| {
                    Category::parse(name).ok_or_else(|| anyhow!("unknown category `{name}`"))
                })
                .collect()
        };
        Ok(Self {
            only: parse(only)?,
            disable: parse(disable)?,
        })
    }

    fn allows(&self, category: Category) -> bool {
        if !self.only.is_empty() {
            self.only.contains(&category)
        } else {
            !self.disable.contains(&category)
        }
    }

    fn retain(&self, result: &mut CorrectionResult) {
        result.errors.retain(|e| self.allows(e.category));
    }
}

fn print_findings(path: &str, result: &CorrectionResult) {
    println!(
        "{} ({} words, readability {})",
        style(path).bold(),
        result.stats.word_count,
        result.readability_score
    );
    for warning in &result.warnings {
        println!("  {} {}", style("warning:").magenta(), warning);
    }
    if result.errors.is_empty() {
        println!("  {}", style("clean").green());
    }
    for err in &result.errors {
        let severity = match err.severity {
            Severity::Error => style(err.severity).red(),
            Severity::Warning => style(err.severity).yellow(),
            Severity::Suggestion => style(err.severity).cyan(),
        };
        println!(
            "  [{}] {}:{} {} {}",
            style(err.category).yellow(),
            err.location.line,
            err.location.column,
            severity,
            err.explanation
        );
        println!("      {} → {}", err.original, style(&err.suggestion).green());
    }
    for tip in &result.improvements {
        println!("  {} {}", style("tip:").dim(), tip);
    }
}

fn print_stats(path: &str, stats: &TextStatistics) {
    println!("{}", style(path).bold());
    println!("  words:               {}", stats.word_count);
    println!("  characters:          {}", stats.character_count);
    println!("  characters (no ws):  {}", stats.character_count_no_spaces);
    println!("  sentences:           {}", stats.sentence_count);
    println!("  paragraphs:          {}", stats.paragraph_count);
    println!("  words per sentence:  {:.1}", stats.average_words_per_sentence);
    println!("  reading time (min):  {}", stats.reading_time_minutes);
    println!(
        "  readability:         {} ({:?})",
        stats.flesch_score, stats.difficulty
    );
}

fn print_rejected(path: &str, reason: &str) {
    eprintln!("{} {}: {}", style("rejected").red(), style(path).bold(), reason);
}

fn build_ignore_set(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("invalid ignore glob `{pattern}`"))?);
    }
    Ok(Some(builder.build()?))
}

/// Expand paths into sources. Directories contribute files with an allowed
/// extension; explicit files are kept so the boundary checks can reject them.
fn collect_sources(
    paths: &[PathBuf],
    ignore: Option<&GlobSet>,
    allowed: &[String],
) -> anyhow::Result<Vec<Source>> {
    let mut sources = Vec::new();
    let mut files = Vec::new();
    for path in paths {
        if path.as_os_str() == "-" {
            if !sources.contains(&Source::Stdin) {
                sources.push(Source::Stdin);
            }
        } else if path.is_dir() {
            let mut walker = WalkDir::new(path).into_iter();
            while let Some(entry_res) = walker.next() {
                let entry = entry_res?;
                let entry_path = entry.path();
                if let Some(set) = ignore {
                    if set.is_match(entry_path) {
                        if entry.file_type().is_dir() {
                            walker.skip_current_dir();
                        }
                        continue;
                    }
                }
                if entry.file_type().is_file() && is_supported(entry_path, allowed) {
                    files.push(entry_path.to_path_buf());
                }
            }
        } else if path.is_file() {
            if ignore.is_some_and(|set| set.is_match(path)) {
                continue;
            }
            files.push(path.clone());
        } else {
            bail!("No such file or directory: {}", path.display());
        }
    }
    files.sort();
    files.dedup();
    sources.extend(files.into_iter().map(Source::File));
    Ok(sources)
}

fn is_supported(path: &Path, allowed: &[String]) -> bool {
    match path.extension().and_then(|s| s.to_str()) {
        Some(ext) => allowed
            .iter()
            .any(|a| a.trim_start_matches('.').eq_ignore_ascii_case(ext)),
        None => false,
    }
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    if path.exists() {
        let cfg = Config::load(path)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(cfg)
    } else {
        tracing::debug!(
            path = %path.display(),
            cwd = ?env::current_dir().ok(),
            "config not found, using defaults"
        );
        Ok(Config::default())
    }
}

fn apply_overrides(cfg: &mut Config, sets: &[String]) -> anyhow::Result<()> {
    for kv in sets {
        let (key, val) = kv
            .split_once('=')
            .map(|(k, v)| (k.trim(), v.trim()))
            .ok_or_else(|| anyhow!("override `{kv}` is not KEY=VALUE"))?;
        if key.is_empty() {
            continue;
        }
        match key {
            "catalog" => {
                cfg.catalog = match val.to_lowercase().as_str() {
                    "basic" => CatalogKind::Basic,
                    "extended" => CatalogKind::Extended,
                    other => bail!("unknown catalog `{other}` (expected basic or extended)"),
                };
            }
            "disabled_rules" => {
                cfg.disabled_rules.extend(
                    val.split(',')
                        .map(str::trim)
                        .filter(|id| !id.is_empty())
                        .map(str::to_string),
                );
            }
            "validation.max_length" => cfg.validation.max_length = parse_value(key, val)?,
            "validation.soft_length" => cfg.validation.soft_length = parse_value(key, val)?,
            "validation.repeated_char_run" => {
                cfg.validation.repeated_char_run = parse_value(key, val)?
            }
            "validation.whitespace_run" => cfg.validation.whitespace_run = parse_value(key, val)?,
            "validation.max_file_bytes" => cfg.validation.max_file_bytes = parse_value(key, val)?,
            "statistics.words_per_minute" => {
                cfg.statistics.words_per_minute = parse_value(key, val)?
            }
            other => bail!("unknown override key `{other}`"),
        }
    }
    Ok(())
}

fn parse_value<T>(key: &str, val: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    val.parse::<T>()
        .with_context(|| format!("invalid value `{val}` for `{key}`"))
}
