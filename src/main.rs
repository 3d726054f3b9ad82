#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::assigning_clones,
    clippy::bool_to_int_with_if,
    clippy::case_sensitive_file_extension_comparisons,
    clippy::cast_possible_wrap,
    clippy::doc_markdown,
    clippy::field_reassign_with_default,
    clippy::float_cmp,
    clippy::implicit_clone,
    clippy::items_after_statements,
    clippy::map_unwrap_or,
    clippy::manual_let_else,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::needless_pass_by_value,
    clippy::needless_raw_string_hashes,
    clippy::redundant_closure_for_method_calls,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::struct_field_names,
    clippy::too_many_lines,
    clippy::uninlined_format_args,
    clippy::unused_self,
    clippy::cast_precision_loss,
    clippy::unnecessary_cast,
    clippy::unnecessary_lazy_evaluations,
    clippy::unnecessary_literal_bound,
    clippy::unnecessary_map_or,
    clippy::unnecessary_wraps,
    dead_code
)]

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use socialhook::command::{self, Route};
use socialhook::config::Config;
use socialhook::gateway;
use socialhook::security::{redact, redact_optional};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// `socialhook` - slash commands in, social media posts out.
#[derive(Parser, Debug)]
#[command(name = "socialhook")]
#[command(version)]
#[command(about = "Slash-command webhooks for posting to social media.", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook server
    #[command(long_about = "\
Start the webhook server.

Serves one POST endpoint per slash command (/slack/make, /slack/reply, \
/slack/delete, ...) plus GET /health. Bind address defaults to the values \
in your config file (gateway.host / gateway.port).

Examples:
  socialhook gateway                  # use config defaults
  socialhook gateway -p 8080          # listen on port 8080
  socialhook gateway --host 0.0.0.0   # bind to all interfaces
  socialhook gateway -p 0             # random available port")]
    Gateway {
        /// Port to listen on (use 0 for random available port); defaults to config gateway.port
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to; defaults to config gateway.host
        #[arg(long)]
        host: Option<String>,
    },

    /// Show configuration status (secrets redacted)
    Status,

    /// List configured social media services
    Services,

    /// Parse command text offline and print the result
    #[command(long_about = "\
Parse command text offline.

Runs the same grammar the webhook routes use and prints the parsed \
fields as JSON, or the message a chat user would see.

Examples:
  socialhook parse make 'twitter: hello world'
  socialhook parse reply-attachments 'twitter: https://x.com/a/status/1; a.png; nice'
  socialhook parse /slack/delete 'twitter: https://x.com/a/status/1'")]
    Parse {
        /// Route name or path (make, reply-attachments, /slack/share, ...)
        route: Route,

        /// Slash-command text as typed in chat
        text: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install default crypto provider for Rustls TLS.
    // This prevents the error: "could not automatically determine the process-level CryptoProvider"
    // when both aws-lc-rs and ring features are available (or neither is explicitly selected).
    if let Err(e) = rustls::crypto::ring::default_provider().install_default() {
        eprintln!("Warning: Failed to install default crypto provider: {e:?}");
    }

    let cli = Cli::parse();

    if let Some(config_dir) = &cli.config_dir {
        if config_dir.trim().is_empty() {
            bail!("--config-dir cannot be empty");
        }
        std::env::set_var("SOCIALHOOK_CONFIG_DIR", config_dir);
    }

    // Parsing is offline and stdout-only; it needs neither config nor logging.
    if let Commands::Parse { route, text } = &cli.command {
        return print_parse(*route, text);
    }

    // Initialize logging - respects RUST_LOG env var, defaults to INFO
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::load_or_init().await?;

    match cli.command {
        Commands::Parse { .. } => Ok(()),

        Commands::Gateway { port, host } => {
            let port = port.unwrap_or(config.gateway.port);
            let host = host.unwrap_or_else(|| config.gateway.host.clone());
            if port == 0 {
                info!("Starting socialhook gateway on {host} (random port)");
            } else {
                info!("Starting socialhook gateway on {host}:{port}");
            }
            gateway::run_gateway(&host, port, config).await
        }

        Commands::Status => {
            print_status(&config);
            Ok(())
        }

        Commands::Services => {
            print_services(&config);
            Ok(())
        }
    }
}

fn print_parse(route: Route, text: &str) -> Result<()> {
    let parsed = command::parse(route, text)?;
    println!("{}", serde_json::to_string_pretty(&parsed)?);
    Ok(())
}

fn print_status(config: &Config) {
    println!("socialhook status");
    println!();
    println!("Version:     {}", env!("CARGO_PKG_VERSION"));
    println!("Config:      {}", config.config_path.display());
    println!();
    println!("Gateway:");
    println!(
        "  Listen:            {}:{}",
        config.gateway.host, config.gateway.port
    );
    println!("  Public bind:       {}", config.gateway.allow_public_bind);
    println!(
        "  Request timeout:   {}s",
        config.gateway.request_timeout_secs
    );
    println!("  Max body:          {} bytes", config.gateway.max_body_bytes);
    println!();
    println!("Routes:");
    for route in Route::ALL {
        let token = config.routes.token_for(route);
        let shown = if token.is_empty() {
            "(disabled: no token)".to_string()
        } else {
            redact(token)
        };
        println!("  {:<26} {shown}", route.path());
    }
    println!();
    println!("Dispatch:");
    println!(
        "  Execute timeout:   {}s",
        config.dispatch.execute_timeout_secs
    );
    println!(
        "  Notify timeout:    {}s",
        config.dispatch.notify_timeout_secs
    );
    println!();
    println!("Notifier:");
    match config.notifier.webhook_url.as_deref() {
        Some(url) if !url.trim().is_empty() => {
            println!("  Kind:              slack");
            println!("  Webhook:           {}", redact(url));
            println!("  Channel:           {}", config.notifier.channel);
            println!("  Username:          {}", config.notifier.username);
        }
        _ => println!("  Kind:              log (no webhook_url)"),
    }
    println!();
    println!("Services:          {}", config.services.len());
}

fn print_services(config: &Config) {
    if config.services.is_empty() {
        println!("No services configured.");
        println!(
            "Add a [services.<name>] section to {}",
            config.config_path.display()
        );
        return;
    }

    println!("Configured services ({} total):\n", config.services.len());
    println!("  NAME                KIND      ACCESS TOKEN   USER ID");
    for (name, service) in &config.services {
        println!(
            "  {:<19} {:<9} {:<14} {}",
            name.to_lowercase(),
            service.kind.as_str(),
            redact_optional(service.access_token.as_deref()),
            service.user_id.as_deref().unwrap_or("-"),
        );
    }
}
