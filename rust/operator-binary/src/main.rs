use std::{io::Write as _, path::PathBuf};

use anyhow::Context as _;
use clap::{crate_description, crate_version, Parser};
use stackable_operator::{logging::TracingTarget, CustomResourceExt};

use stackable_opentelemetry_operator::{
    config::OperatorConfig,
    crd::TargetAllocator,
    manifests::{self, Params},
    utils::{error_full_message, to_yaml_stream},
};

pub const APP_NAME: &str = "opentelemetry";

#[derive(clap::Parser)]
#[clap(author, version)]
struct Opts {
    #[clap(subcommand)]
    cmd: stackable_operator::cli::Command<TargetAllocatorRun>,
}

#[derive(clap::Parser)]
struct TargetAllocatorRun {
    /// YAML file containing the TargetAllocator to render
    #[clap(long, env)]
    target_allocator: PathBuf,
    #[command(flatten)]
    operator_config: OperatorConfig,
    /// Tracing log collector system
    #[arg(long, env, default_value_t, value_enum)]
    pub tracing_target: TracingTarget,
}

mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
    pub const TARGET: Option<&str> = option_env!("TARGET");
}

// Nothing here awaits, but the Jaeger tracing target exports spans from a task on the
// ambient tokio runtime, so logging has to be initialized inside one.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    match opts.cmd {
        stackable_operator::cli::Command::Crd => {
            TargetAllocator::print_yaml_schema()?;
        }
        stackable_operator::cli::Command::Run(TargetAllocatorRun {
            target_allocator,
            operator_config,
            tracing_target,
        }) => {
            stackable_operator::logging::initialize_logging(
                "OPENTELEMETRY_OPERATOR_LOG",
                APP_NAME,
                tracing_target,
            );
            stackable_operator::utils::print_startup_string(
                crate_description!(),
                crate_version!(),
                built_info::GIT_VERSION,
                built_info::TARGET.unwrap_or("unknown target"),
                built_info::BUILT_TIME_UTC,
                built_info::RUSTC_VERSION,
            );

            let ta: TargetAllocator = serde_yaml::from_slice(
                &std::fs::read(&target_allocator)
                    .with_context(|| format!("failed to read {}", target_allocator.display()))?,
            )
            .with_context(|| format!("failed to parse {}", target_allocator.display()))?;
            let params = Params::new(&ta, &operator_config)?;
            let manifests = manifests::build(&params).map_err(|err| {
                tracing::error!(
                    error = error_full_message(&err),
                    "failed to build manifests"
                );
                err
            })?;
            tracing::info!(
                target_allocator = params.name(),
                namespace = params.namespace(),
                count = manifests.len(),
                "built manifests"
            );

            std::io::stdout()
                .lock()
                .write_all(to_yaml_stream(&manifests)?.as_bytes())?;
        }
    }
    Ok(())
}
