//! Tests for CLI parsing, dispatch and exit codes

use clap::Parser;
use rstest::rstest;

use kpitree::application::ApplicationError;
use kpitree::cli::args::{CategoryCommands, OutputFormat};
use kpitree::cli::commands::execute_command;
use kpitree::cli::{Cli, CliError, Commands};
use kpitree::domain::DomainError;
use kpitree::exitcode;
use kpitree::infrastructure::traits::StoreError;

#[test]
fn given_inline_formulas_when_parsing_args_then_collects_them() {
    let cli = Cli::try_parse_from([
        "kpitree",
        "--memory",
        "generate",
        "-e",
        "profit = revenue - cost",
        "-e",
        "revenue = quantity * price",
        "--format",
        "json",
    ])
    .unwrap();

    assert!(cli.memory);
    match cli.command {
        Some(Commands::Generate {
            file,
            formulas,
            format,
        }) => {
            assert!(file.is_none());
            assert_eq!(formulas.len(), 2);
            assert_eq!(format, OutputFormat::Json);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn given_category_generate_when_parsing_args_then_defaults_to_tree() {
    let cli = Cli::try_parse_from(["kpitree", "category", "generate", "growth", "mrr"]).unwrap();

    assert!(matches!(
        cli.command,
        Some(Commands::Category {
            command: CategoryCommands::Generate {
                format: OutputFormat::Tree,
                ..
            }
        })
    ));
}

#[test]
fn given_memory_and_store_when_parsing_args_then_rejected() {
    let result = Cli::try_parse_from(["kpitree", "--memory", "--store", "f.json", "forest", "nodes"]);

    assert!(result.is_err());
}

#[test]
fn given_memory_store_when_generating_then_succeeds() {
    let cli = Cli::try_parse_from([
        "kpitree",
        "--memory",
        "generate",
        "-e",
        "profit = revenue - cost",
    ])
    .unwrap();

    execute_command(&cli).unwrap();
}

#[test]
fn given_no_formulas_when_generating_then_invalid_args() {
    let cli = Cli::try_parse_from(["kpitree", "--memory", "generate"]).unwrap();

    let err = execute_command(&cli).unwrap_err();

    assert!(matches!(err, CliError::InvalidArgs(_)));
    assert_eq!(err.exit_code(), exitcode::USAGE);
}

#[rstest]
#[case(ApplicationError::from(DomainError::parse("a b", "missing '='")), exitcode::DATAERR)]
#[case(ApplicationError::from(DomainError::validation("= b", "empty root")), exitcode::DATAERR)]
#[case(ApplicationError::from(DomainError::consistency("gone")), exitcode::SOFTWARE)]
#[case(ApplicationError::Store(StoreError::Conflict { label: "a".into() }), exitcode::TEMPFAIL)]
#[case(ApplicationError::Store(StoreError::unavailable("disk")), exitcode::IOERR)]
#[case(ApplicationError::Cancelled, exitcode::SOFTWARE)]
#[case(ApplicationError::Config { message: "bad".into() }, exitcode::CONFIG)]
fn given_application_error_when_mapping_then_exit_code_by_kind(
    #[case] error: ApplicationError,
    #[case] expected: i32,
) {
    let err = CliError::from(error.in_formula(3, "a = b"));

    assert_eq!(err.exit_code(), expected);
}
