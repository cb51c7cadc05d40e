// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::{Config, parse_filter_key};
use runtime::HistoryFile;
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};
use wishing_app::{
    AccountId, Column, Navigation, PageSize, ViewerCommand, ViewerError, ViewerSession,
    ViewerState,
};

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `wishing-well --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let log_dir = config::app_data_dir().ok();
    let _log_guard = logging::init(log_dir.as_deref(), config.log_level(), options.debug)?;

    let history_path = match &options.data_path {
        Some(path) => path.clone(),
        None => config.history_path()?,
    };
    let page_size = match options.page_size {
        Some(size) => PageSize::new(size)?,
        None => config.page_size()?,
    };
    let mut hidden = config.hidden_filters()?;
    hidden.extend(options.hidden.iter().cloned());

    let state = ViewerState::new(page_size).with_preferred_account(config.preferred_account());
    let mut session = ViewerSession::new(HistoryFile::new(&history_path), state);
    info!(path = %session.source_mut().path().display(), "opening wish history");

    if options.refresh {
        match session.refresh() {
            Ok(_) => {
                if let Some(status) = session.state().status() {
                    println!("{}", status.message);
                }
            }
            Err(ViewerError::RefreshFailure { status, message }) => {
                warn!(status, "refresh did not succeed");
                eprintln!("refresh failed ({status}): {message}");
                if !session.state().data_loaded() {
                    session.reload()?;
                }
            }
            Err(error) => return Err(error.into()),
        }
    } else {
        session.reload().with_context(|| {
            format!(
                "load wish history {}; set [data].history_path or WISHING_WELL_DATA_PATH",
                history_path.display()
            )
        })?;
    }

    if options.check_only {
        let accounts = session.state().account_ids().count();
        println!("ok: {accounts} account(s) in {}", history_path.display());
        return Ok(());
    }

    let state = session.state_mut();
    for (column, key) in hidden {
        state.dispatch(ViewerCommand::SetFilter {
            column,
            key,
            enabled: false,
        })?;
    }
    if let Some(account) = options.account {
        state.dispatch(ViewerCommand::SelectAccount(account))?;
    }
    if let Some(page) = options.page {
        state.dispatch(ViewerCommand::Navigate(Navigation::Goto(page - 1)))?;
    }

    if options.json {
        println!("{}", runtime::render_json(state)?);
        return Ok(());
    }
    if options.stats {
        println!("{}", runtime::render_stats(state)?);
        println!("{}", runtime::render_filters(state));
    }
    print!("{}", runtime::render_page(state));
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    data_path: Option<PathBuf>,
    account: Option<AccountId>,
    page: Option<usize>,
    page_size: Option<usize>,
    hidden: Vec<(Column, String)>,
    stats: bool,
    json: bool,
    refresh: bool,
    debug: bool,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        data_path: None,
        account: None,
        page: None,
        page_size: None,
        hidden: Vec::new(),
        stats: false,
        json: false,
        refresh: false,
        debug: false,
        print_config_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--data" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--data requires a history file path"))?;
                options.data_path = Some(PathBuf::from(value.as_ref()));
            }
            "--account" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--account requires an account id"))?;
                options.account = Some(AccountId::from(value.as_ref()));
            }
            "--page" => {
                options.page = Some(positive(iter.next(), "--page")?);
            }
            "--page-size" => {
                options.page_size = Some(positive(iter.next(), "--page-size")?);
            }
            "--hide" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--hide requires a column=key filter"))?;
                options.hidden.push(parse_filter_key(value.as_ref())?);
            }
            "--stats" => {
                options.stats = true;
            }
            "--json" => {
                options.json = true;
            }
            "--refresh" => {
                options.refresh = true;
            }
            "--debug" => {
                options.debug = true;
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                bail!("unknown argument {unknown:?}; run with --help to see supported options");
            }
        }
    }

    Ok(options)
}

fn positive<S: AsRef<str>>(value: Option<S>, flag: &str) -> Result<usize> {
    let value = value.ok_or_else(|| anyhow!("{flag} requires a number"))?;
    let raw = value.as_ref();
    match raw.parse::<usize>() {
        Ok(number) if number > 0 => Ok(number),
        _ => bail!("{flag} expects a positive number, got {raw:?}"),
    }
}

fn print_help() {
    println!("wishing-well");
    println!("  --config <path>          Use a specific config path");
    println!("  --data <path>            Read wish history from this JSON file");
    println!("  --account <id>           Show this account");
    println!("  --page <n>               Show page n (1-based, clamped to the last page)");
    println!("  --page-size <n>          Rows per page");
    println!("  --hide <column=key>      Switch off a filter key (repeatable)");
    println!("  --stats                  Print statistics, pity counters and filter flags");
    println!("  --json                   Print the page as JSON");
    println!("  --refresh                Re-read the history file and report new wishes");
    println!("  --debug                  Log debug output");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --check                  Validate config and history file");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, parse_cli_args};
    use anyhow::Result;
    use std::path::PathBuf;
    use wishing_app::{AccountId, Column};

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/wishing-well-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                data_path: None,
                account: None,
                page: None,
                page_size: None,
                hidden: Vec::new(),
                stats: false,
                json: false,
                refresh: false,
                debug: false,
                print_config_path: false,
                print_example: false,
                check_only: false,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_and_data_paths() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "--config",
                "/custom/config.toml",
                "--data",
                "/custom/history.json",
            ],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        assert_eq!(
            options.data_path,
            Some(PathBuf::from("/custom/history.json"))
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_config_value() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_reads_view_options() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "--account",
                "700000001",
                "--page",
                "3",
                "--page-size",
                "20",
                "--hide",
                "rarity=3",
                "--hide",
                "type=Weapon",
            ],
            default_options_path(),
        )?;
        assert_eq!(options.account, Some(AccountId::from("700000001")));
        assert_eq!(options.page, Some(3));
        assert_eq!(options.page_size, Some(20));
        assert_eq!(
            options.hidden,
            vec![
                (Column::Rarity, "3".to_owned()),
                (Column::ItemType, "Weapon".to_owned()),
            ]
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_rejects_zero_and_non_numeric_pages() {
        let error = parse_cli_args(vec!["--page", "0"], default_options_path())
            .expect_err("page zero should fail");
        assert!(error.to_string().contains("positive number"));

        let error = parse_cli_args(vec!["--page-size", "ten"], default_options_path())
            .expect_err("non-numeric page size should fail");
        assert!(error.to_string().contains("positive number"));

        let error = parse_cli_args(vec!["--page"], default_options_path())
            .expect_err("missing page should fail");
        assert!(error.to_string().contains("requires a number"));
    }

    #[test]
    fn parse_cli_args_rejects_bad_hide_filter() {
        let error = parse_cli_args(vec!["--hide", "stars=5"], default_options_path())
            .expect_err("unknown column should fail");
        assert!(error.to_string().contains("unknown filter column"));
    }

    #[test]
    fn parse_cli_args_sets_print_and_check_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--print-example-config", "--check"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(!options.show_help);
        assert!(!options.refresh);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_output_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--stats", "--json", "--refresh", "--debug"],
            default_options_path(),
        )?;
        assert!(options.stats);
        assert!(options.json);
        assert!(options.refresh);
        assert!(options.debug);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }
}
