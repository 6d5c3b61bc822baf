use anyhow::Context;
use clap::{Parser, Subcommand};

mod config;
mod directive;
mod generator;
mod inventory;
mod template;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "caddy-labelgen")]
#[command(about = "Generate a Caddyfile from container and service labels", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a Caddyfile from an inventory snapshot.
    Generate {
        /// JSON inventory snapshot (containers, services, networks).
        #[arg(long = "inventory")]
        inventory_path: String,

        /// Output path; stdout when omitted.
        #[arg(short = 'o', long)]
        out: Option<String>,

        /// Prefix for Docker labels (env CADDY_DOCKER_LABEL_PREFIX wins).
        #[arg(long, default_value = config::DEFAULT_LABEL_PREFIX)]
        docker_label_prefix: String,

        /// Proxy to service tasks instead of VIP (env CADDY_DOCKER_PROXY_SERVICE_TASKS wins).
        #[arg(long)]
        proxy_service_tasks: bool,

        /// Id of the proxy's own container; read from /proc/self/cgroup when omitted.
        #[arg(long)]
        proxy_container_id: Option<String>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Generate {
            inventory_path,
            out,
            docker_label_prefix,
            proxy_service_tasks,
            proxy_container_id,
        } => {
            let mut options =
                config::GeneratorOptions::from_flags(docker_label_prefix, proxy_service_tasks);
            options.proxy_container_id = proxy_container_id;
            log::debug!("generator options: {:?}", options);

            let generator = generator::Generator::new(&options)?;
            let source = inventory::JsonFileInventory::new(&inventory_path);
            let caddyfile = generator.run(&source);

            match out {
                Some(out) => {
                    std::fs::write(&out, &caddyfile)
                        .with_context(|| format!("write Caddyfile {}", out))?;
                    log::info!("Wrote {}", out);
                }
                None => {
                    use std::io::Write;
                    std::io::stdout()
                        .write_all(&caddyfile)
                        .context("write Caddyfile to stdout")?;
                }
            }
        }
    }

    Ok(())
}
