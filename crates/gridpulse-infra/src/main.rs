use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use gridpulse_infra::config::DEFAULT_DATA_CRON;
use gridpulse_infra::params::{EnvSource, FileSource, LayeredSource, ResolvedParameters};
use gridpulse_infra::stacks::{self, StackKind, StackOptions};
use gridpulse_infra::{synth, DataServiceConfig};
use std::io;
use std::path::PathBuf;

fn stack_arg() -> Arg {
    Arg::new("stack")
        .long("stack")
        .default_value("prod")
        .value_parser(value_parser!(StackKind))
        .help("Stack to build (prod or test)")
}

fn input_args(command: Command) -> Command {
    command
        .arg(stack_arg())
        .arg(
            Arg::new("params")
                .long("params")
                .value_parser(value_parser!(PathBuf))
                .help("Parameter file (.toml, .yaml, .yml or .json); TF_VAR_* variables take precedence"),
        )
        .arg(
            Arg::new("with-data-service")
                .long("with-data-service")
                .action(ArgAction::SetTrue)
                .help("Add the batch data service"),
        )
        .arg(
            Arg::new("cron")
                .long("cron")
                .default_value(DEFAULT_DATA_CRON)
                .requires("with-data-service")
                .help("Cron schedule for the data service"),
        )
}

fn cli() -> Command {
    Command::new("gridpulse-infra")
        .version(gridpulse_infra::VERSION)
        .about("GridPulse environment provisioning")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            input_args(Command::new("synth").about("Write the engine document for a stack")).arg(
                Arg::new("out")
                    .long("out")
                    .default_value("cdktf.out")
                    .value_parser(value_parser!(PathBuf))
                    .help("Output directory"),
            ),
        )
        .subcommand(input_args(
            Command::new("plan").about("Print the creation order and outputs"),
        ))
        .subcommand(
            Command::new("params")
                .about("List the parameter table of a stack")
                .arg(stack_arg()),
        )
}

fn stack_inputs(args: &ArgMatches) -> anyhow::Result<(StackKind, ResolvedParameters, StackOptions)> {
    let kind = *args
        .get_one::<StackKind>("stack")
        .context("missing --stack")?;

    let mut source = LayeredSource::new().with(EnvSource::default());
    if let Some(path) = args.get_one::<PathBuf>("params") {
        let file = FileSource::load(path)
            .with_context(|| format!("loading parameters from {}", path.display()))?;
        source = source.with(file);
    }
    let params = stacks::resolve_parameters(kind, &source)?;

    let mut options = StackOptions::default();
    if args.get_flag("with-data-service") {
        let cron = args
            .get_one::<String>("cron")
            .map_or(DEFAULT_DATA_CRON, String::as_str);
        options = options.with_data_service(DataServiceConfig::with_schedule(cron));
    }
    Ok((kind, params, options))
}

fn synth_command(args: &ArgMatches) -> anyhow::Result<()> {
    let (kind, params, options) = stack_inputs(args)?;
    let out = args
        .get_one::<PathBuf>("out")
        .context("missing --out")?;

    let graph = stacks::build_stack(kind, &params, &options)?;
    let document = synth::synthesize(&graph, kind.stack_name());
    let path = synth::write_document(&document, out, kind.stack_name())?;

    println!(
        "Synthesized {} ({} resources, backend {}) -> {}",
        kind.stack_name(),
        graph.len(),
        graph.backend(),
        path.display()
    );
    Ok(())
}

fn plan_command(args: &ArgMatches) -> anyhow::Result<()> {
    let (kind, params, options) = stack_inputs(args)?;
    let graph = stacks::build_stack(kind, &params, &options)?;

    println!(
        "Stack {} (environment {}, backend {})",
        kind.stack_name(),
        graph.environment_name(),
        graph.backend()
    );
    println!();
    println!("Creation order:");
    for (i, id) in graph.creation_order().iter().enumerate() {
        println!("  {:>3}. {}", i + 1, id);
    }
    println!();
    println!("Outputs:");
    for output in graph.outputs() {
        println!("  {:<20} = {}", output.name, output.display_value());
    }
    println!();
    println!("Fingerprint: {}", graph.fingerprint());
    Ok(())
}

fn params_command(args: &ArgMatches) -> anyhow::Result<()> {
    let kind = *args
        .get_one::<StackKind>("stack")
        .context("missing --stack")?;

    println!("{:<28} {:<9} {:<9} {}", "NAME", "REQUIRED", "SENSITIVE", "DESCRIPTION");
    for spec in stacks::parameter_specs(kind) {
        let default = match spec.default {
            Some("") | None => String::new(),
            Some(_) if spec.sensitive => " (default: [redacted])".to_string(),
            Some(value) => format!(" (default: {value})"),
        };
        println!(
            "{:<28} {:<9} {:<9} {}{}",
            spec.name,
            if spec.is_required() { "yes" } else { "no" },
            if spec.sensitive { "yes" } else { "no" },
            spec.description,
            default
        );
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Default to warn if RUST_LOG is not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    let matches = cli().get_matches();
    match matches.subcommand() {
        Some(("synth", args)) => synth_command(args),
        Some(("plan", args)) => plan_command(args),
        Some(("params", args)) => params_command(args),
        Some((other, _)) => anyhow::bail!("unknown command '{other}'"),
        None => anyhow::bail!("no command given"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn synth_defaults() {
        let matches = cli().get_matches_from(["gridpulse-infra", "synth"]);
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "synth");
        assert_eq!(args.get_one::<StackKind>("stack"), Some(&StackKind::Production));
        assert_eq!(
            args.get_one::<PathBuf>("out"),
            Some(&PathBuf::from("cdktf.out"))
        );
        assert!(!args.get_flag("with-data-service"));
    }

    #[test]
    fn cron_requires_data_service() {
        let result = cli().try_get_matches_from(["gridpulse-infra", "plan", "--cron", "0 * * * *"]);
        assert!(result.is_err());
    }
}
