use anyhow::Context;
use clap::{Parser, Subcommand};
use proxyspec::source::LocalStore;
use proxyspec::spec::AppsDocument;
use proxyspec::{Compiler, Deployment, Destination, Generator, PlatformDefaults};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "proxyspec")]
#[command(about = "Compile team app specs into container-proxy configuration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the full proxy configuration for a team.
    Generate {
        #[arg(long, env = "TEAM_NAME")]
        team: String,

        /// Directory holding the team's config location, secrets and parameters.
        #[arg(long, env = "PROXYSPEC_STORE")]
        store: PathBuf,

        /// YAML file overriding platform defaults.
        #[arg(long)]
        defaults: Option<PathBuf>,

        /// Output file, `-` for stdout.
        #[arg(short = 'o', long, default_value = "/opt/shinyproxy/application.yml")]
        out: String,
    },

    /// Compile an apps file without secrets and print what each app resolves to.
    /// The region comes from `AWS_REGION` as for `generate`.
    Check {
        #[arg(long, env = "TEAM_NAME", default_value = "team")]
        team: String,

        #[arg(long)]
        apps: PathBuf,

        #[arg(long)]
        defaults: Option<PathBuf>,
    },
}

fn load_defaults(path: Option<&Path>) -> anyhow::Result<PlatformDefaults> {
    match path {
        Some(p) => Ok(PlatformDefaults::from_file(p)?),
        None => Ok(PlatformDefaults::default()),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .event_format(fmt::format().compact().with_target(false)),
        )
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Generate {
            team,
            store,
            defaults,
            out,
        } => {
            let defaults = load_defaults(defaults.as_deref())?;
            let deployment = Deployment::from_env(&team)?;

            let generator = Generator::new(team, LocalStore::new(store), defaults, deployment);
            let spec = generator
                .generate()
                .with_context(|| format!("generating configuration for team {}", generator.team()))?;

            let dest = Destination::from(out.as_str());
            proxyspec::write(&spec, &dest).with_context(|| format!("writing {}", dest))?;
            info!("Configuration generation completed");
        }
        Commands::Check {
            team,
            apps,
            defaults,
        } => {
            let defaults = load_defaults(defaults.as_deref())?;
            let text = std::fs::read_to_string(&apps)
                .with_context(|| format!("read apps file {}", apps.display()))?;
            let doc = AppsDocument::from_yaml_str(&text, &apps.display().to_string())?;

            let deployment = Deployment::from_env(&team)?;
            let compiled =
                Compiler::new(&team, &defaults, &deployment.region).compile_apps(&doc.specs)?;
            for app in &compiled {
                println!("{}", app.summary());
            }
            println!("{} app(s) OK", compiled.len());
        }
    }

    Ok(())
}
