mod cli;
mod color;
mod crate_spec;
mod docfetch;
mod generate;
mod logging;
mod report;
mod source;
mod util;
mod version_resolver;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use docfetch::clear_cache;
use implindex::{CompilationUnit, DeclarationStore, IndexOptions, ShardLayout};
use source::UnitSource;
use tracing::warn;
use version_resolver::VersionResolver;

pub use generate::{GenerateOptions, generate};
pub use report::{Outcome, Report, ShardSummary, UnitFailure};

/// Run the CLI with the given arguments and return the output as a string.
///
/// # Arguments
/// * `args` - Command line arguments (excluding program name)
///
/// # Returns
/// * `Ok(String)` - Successful output (stdout)
/// * `Err(String)` - Error message (stderr). Shards of the units that did
///   load have still been written.
pub fn run_cli(args: &[&str]) -> Result<String, String> {
    match run_cli_impl(args) {
        Ok(output) => Ok(output),
        Err(e) => Err(format!("{e:#}")),
    }
}

fn run_cli_impl(args: &[&str]) -> anyhow::Result<String> {
    let parsed_args =
        match Cli::try_parse_from(std::iter::once("implgen").chain(args.iter().copied())) {
            Ok(args) => args,
            Err(e) => {
                // Handle --help and --version as successful outputs
                if e.kind() == clap::error::ErrorKind::DisplayHelp
                    || e.kind() == clap::error::ErrorKind::DisplayVersion
                {
                    return Ok(e.to_string());
                }
                return Err(e.into());
            }
        };

    logging::init_tracing(parsed_args.verbose);
    parsed_args.color.apply();

    if parsed_args.clear_cache {
        return Ok(match clear_cache()? {
            Some(dir) => format!("Cache cleared: {}\n", dir.display()),
            None => "Cache directory does not exist\n".to_string(),
        });
    }

    if parsed_args.units.is_empty() {
        anyhow::bail!("Missing required argument: UNIT");
    }

    // `cargo metadata` is slow, only run it when a crate lacks a version
    let resolver = if parsed_args.units.iter().any(UnitSource::needs_resolver) {
        VersionResolver::new()
            .inspect_err(|e| warn!("Versions fall back to latest: {e:#}"))
            .ok()
    } else {
        None
    };

    let use_cache = !parsed_args.no_cache;
    let mut store = DeclarationStore::new();
    let mut failures = vec![];
    for source in &parsed_args.units {
        match load_unit(source, resolver.as_ref(), use_cache) {
            Ok(unit) => {
                store.insert(unit);
            }
            Err(e) => failures.push(UnitFailure {
                unit: source.label(),
                error: format!("{e:#}"),
            }),
        }
    }

    let options = GenerateOptions {
        index: IndexOptions {
            contracts: parsed_args.contracts,
            inference: !parsed_args.no_inference,
        },
        layout: if parsed_args.split_units {
            ShardLayout::PerUnit
        } else {
            ShardLayout::PerContract
        },
        out_dir: parsed_args.out_dir,
        dry_run: parsed_args.dry_run,
    };

    let mut report = if store.is_empty() {
        Report::default()
    } else {
        generate(&store, &options)?
    };
    report.failures = failures;

    if report.is_success() {
        Ok(report.render())
    } else {
        anyhow::bail!(
            "{}{}{} of {} failed",
            report.render(),
            report.render_failures(),
            util::plural(report.failures.len(), "unit"),
            parsed_args.units.len()
        )
    }
}

fn load_unit(
    source: &UnitSource,
    resolver: Option<&VersionResolver>,
    use_cache: bool,
) -> anyhow::Result<CompilationUnit> {
    let krate = source.load(resolver, use_cache)?;
    implindex::rustdoc::unit_from_crate(&krate)
        .with_context(|| format!("Failed to index {}", source.label()))
}
