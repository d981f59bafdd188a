mod api;
mod config;
mod models;
mod report;
mod scoring;
mod session;
mod telemetry;
mod tui;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use api::{fallback, ApiError, HttpQuizApi, QuizApi};
use config::LoadedSettings;
use models::{AttemptDetail, GradedResult, Identity, JsonOutput, Subject};
use report::ReportMeta;
use scoring::{format_marks, format_similarity, is_passing_marks, ScoreTotal};

#[derive(Parser)]
#[command(name = "insightqa")]
#[command(about = "Take InsightQA tests and review graded results from the terminal")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Path to config.toml
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the subjects that have a question bank
    Subjects,

    /// Start a test for a subject in the terminal UI
    Take {
        /// Subject name (with or without the .txt suffix)
        subject: String,
    },

    /// Launch interactive terminal UI
    Tui,

    /// List your past attempts
    Results,

    /// Show the graded answers of one attempt
    Show {
        /// Result ID
        id: i64,
    },

    /// Write the PDF report of one attempt
    Export {
        /// Result ID
        id: i64,

        /// Output file or directory (defaults to export_dir from the config)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Print the effective configuration
    Config,
}

impl Commands {
    fn is_interactive(&self) -> bool {
        matches!(self, Commands::Take { .. } | Commands::Tui)
    }
}

fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(e) = run(cli) {
        if json {
            if let Ok(out) = serde_json::to_string(&JsonOutput::<()>::err(e.to_string())) {
                println!("{}", out);
            }
        }
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(interactive: bool) -> Result<(), Box<dyn std::error::Error>> {
    if interactive {
        telemetry::init_file(&config::data_dir().join(telemetry::LOG_FILE_NAME))?;
    } else {
        telemetry::init_stderr();
    }
    Ok(())
}

fn connect(loaded: &LoadedSettings) -> Result<Arc<dyn QuizApi>, ApiError> {
    let api = HttpQuizApi::new(loaded.settings.api_url.clone(), loaded.settings.timeout())?;
    tracing::debug!(target: "insightqa", base_url = api.base_url(), "client ready");
    Ok(Arc::new(api))
}

/// Identity is checked before any call reaches the service.
fn authenticated(
    loaded: &LoadedSettings,
) -> Result<(Identity, Arc<dyn QuizApi>), Box<dyn std::error::Error>> {
    let identity = loaded.require_identity()?;
    let api = connect(loaded)?;
    Ok((identity, api))
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(cli.command.is_interactive())?;
    let loaded = LoadedSettings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Config => {
            let redacted = loaded.settings.redacted();
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "path": loaded.path,
                        "settings": redacted
                    })))?
                );
            } else {
                println!("# {}", loaded.path.display());
                print!("{}", toml::to_string(&redacted)?);
            }
        }

        Commands::Subjects => {
            let (_, api) = authenticated(&loaded)?;
            let subjects = api
                .list_subjects()
                .map_err(|e| e.user_message(fallback::SUBJECTS))?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&subjects))?);
            } else if subjects.is_empty() {
                println!("No subjects available.");
            } else {
                println!("=== Available Tests ===");
                for subject in subjects {
                    println!("  {}", subject);
                }
                println!();
                println!("Start one with:");
                println!("  insightqa take <subject>");
            }
        }

        Commands::Take { subject } => {
            let (identity, api) = authenticated(&loaded)?;
            tui::run(
                api,
                identity,
                loaded.settings.export_dir(),
                Some(Subject::new(subject)),
            )?;
        }

        Commands::Tui => {
            let (identity, api) = authenticated(&loaded)?;
            tui::run(api, identity, loaded.settings.export_dir(), None)?;
        }

        Commands::Results => {
            let (identity, api) = authenticated(&loaded)?;
            let results = api
                .list_results(&identity.email)
                .map_err(|e| e.user_message(fallback::RESULTS))?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&results))?);
            } else if results.is_empty() {
                println!("No test results found.");
            } else {
                println!("{:<6} {:<30} DATE", "ID", "SUBJECT");
                println!("{}", "-".repeat(70));
                for r in results {
                    println!("{:<6} {:<30} {}", r.id, truncate(r.subject.name(), 28), r.date_label());
                }
            }
        }

        Commands::Show { id } => {
            let (identity, api) = authenticated(&loaded)?;
            let detail = api
                .load_result_detail(id)
                .map_err(|e| e.user_message(fallback::DETAIL))?;
            let subject = resolve_subject(api.as_ref(), &identity, id, &detail);
            let total = ScoreTotal::of(&detail.results);

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "id": id,
                        "subject": subject,
                        "results": detail.results,
                        "total": total
                    })))?
                );
            } else {
                println!(
                    "=== {} (result {}) ===",
                    subject.as_ref().map_or("Unknown Subject", Subject::name),
                    id
                );
                for (i, r) in detail.results.iter().enumerate() {
                    print_graded(i, r);
                }
                println!("{}", report::layout::total_line(total));
            }
        }

        Commands::Export { id, output } => {
            let (identity, api) = authenticated(&loaded)?;
            let detail = api
                .load_result_detail(id)
                .map_err(|e| e.user_message(fallback::DETAIL))?;
            let subject = resolve_subject(api.as_ref(), &identity, id, &detail);
            let meta = ReportMeta {
                subject: subject.map(|s| s.name().to_string()),
                user_label: Some(identity.email.clone()),
            };

            let report = report::generate(&detail.results, &meta)?;
            let target = output.unwrap_or_else(|| loaded.settings.export_dir());
            let path = report.write_to(&target)?;

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "path": path,
                        "pages": report.pages,
                        "total": report.total
                    })))?
                );
            } else {
                println!("Report written to {} ({} page(s), total {})", path.display(), report.pages, report.total);
            }
        }
    }

    Ok(())
}

/// The detail endpoint may omit the subject; the results list always has it.
fn resolve_subject(
    api: &dyn QuizApi,
    identity: &Identity,
    id: i64,
    detail: &AttemptDetail,
) -> Option<Subject> {
    if let Some(subject) = &detail.subject {
        return Some(subject.clone());
    }
    match api.list_results(&identity.email) {
        Ok(results) => results.into_iter().find(|r| r.id == id).map(|r| r.subject),
        Err(e) => {
            tracing::warn!(target: "insightqa", id, error = %e, "could not look up subject");
            None
        }
    }
}

fn print_graded(index: usize, r: &GradedResult) {
    let glyph = if is_passing_marks(r.marks) { "✓" } else { "✗" };
    let user_answer = if r.user_answer.is_empty() {
        report::layout::NO_ANSWER
    } else {
        r.user_answer.as_str()
    };

    println!("{}. {}", index + 1, r.question);
    println!("   Your answer:  {}", user_answer);
    println!("   Model answer: {}", r.answer);
    println!(
        "   Similarity: {} ({})  Marks: {} {}",
        format_similarity(r.similarity),
        scoring::tier(r.similarity).label(),
        format_marks(r.marks),
        glyph
    );
    println!();
}

/// Shortens to `max_len` characters, counting chars rather than bytes.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    mod truncate_tests {
        use super::*;

        #[test]
        fn truncate_short_string() {
            assert_eq!(truncate("os", 10), "os");
        }

        #[test]
        fn truncate_long_string() {
            assert_eq!(truncate("operating systems", 8), "opera...");
        }

        #[test]
        fn truncate_exact_length() {
            assert_eq!(truncate("hello", 5), "hello");
        }

        #[test]
        fn truncate_multibyte() {
            assert_eq!(truncate("données réseau", 9), "donnée...");
        }
    }

    mod cli_parsing_tests {
        use super::*;

        #[test]
        fn parse_subjects_command() {
            let cli = Cli::try_parse_from(["insightqa", "subjects"]).unwrap();
            assert!(!cli.json);
            assert!(cli.config.is_none());
            assert!(matches!(cli.command, Commands::Subjects));
        }

        #[test]
        fn parse_global_flags_after_subcommand() {
            let cli = Cli::try_parse_from([
                "insightqa",
                "results",
                "--json",
                "--config",
                "/tmp/c.toml",
            ])
            .unwrap();
            assert!(cli.json);
            assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
            assert!(matches!(cli.command, Commands::Results));
        }

        #[test]
        fn parse_take_command() {
            let cli = Cli::try_parse_from(["insightqa", "take", "operating systems"]).unwrap();
            match cli.command {
                Commands::Take { subject } => assert_eq!(subject, "operating systems"),
                _ => panic!("Expected Take command"),
            }
        }

        #[test]
        fn parse_show_command() {
            let cli = Cli::try_parse_from(["insightqa", "show", "42"]).unwrap();
            match cli.command {
                Commands::Show { id } => assert_eq!(id, 42),
                _ => panic!("Expected Show command"),
            }
        }

        #[test]
        fn parse_export_with_output() {
            let cli = Cli::try_parse_from(["insightqa", "export", "7", "-o", "out.pdf"]).unwrap();
            match cli.command {
                Commands::Export { id, output } => {
                    assert_eq!(id, 7);
                    assert_eq!(output, Some(PathBuf::from("out.pdf")));
                }
                _ => panic!("Expected Export command"),
            }
        }

        #[test]
        fn parse_export_defaults_output() {
            let cli = Cli::try_parse_from(["insightqa", "export", "7"]).unwrap();
            assert!(matches!(cli.command, Commands::Export { output: None, .. }));
        }

        #[test]
        fn show_requires_numeric_id() {
            assert!(Cli::try_parse_from(["insightqa", "show", "abc"]).is_err());
        }

        #[test]
        fn take_requires_subject() {
            assert!(Cli::try_parse_from(["insightqa", "take"]).is_err());
        }

        #[test]
        fn interactive_commands() {
            assert!(Commands::Tui.is_interactive());
            assert!(Commands::Take {
                subject: "os".into()
            }
            .is_interactive());
            assert!(!Commands::Results.is_interactive());
            assert!(!Commands::Config.is_interactive());
        }
    }

    mod subject_lookup_tests {
        use super::*;
        use crate::models::ResultSummary;
        use crate::tui::worker::fake::FakeApi;

        fn identity() -> Identity {
            Identity::new("t", "me@x.io")
        }

        #[test]
        fn detail_subject_wins() {
            let api = FakeApi::default();
            let detail = AttemptDetail {
                subject: Some(Subject::new("os")),
                results: Vec::new(),
            };
            assert_eq!(
                resolve_subject(&api, &identity(), 1, &detail),
                Some(Subject::new("os"))
            );
        }

        #[test]
        fn falls_back_to_results_list() {
            let api = FakeApi {
                results: vec![ResultSummary {
                    id: 3,
                    email: "me@x.io".into(),
                    subject: Subject::new("dbms"),
                    date: None,
                }],
                ..FakeApi::default()
            };
            let detail = AttemptDetail::default();
            assert_eq!(
                resolve_subject(&api, &identity(), 3, &detail),
                Some(Subject::new("dbms"))
            );
            assert_eq!(resolve_subject(&api, &identity(), 4, &detail), None);
        }
    }
}
