//! CultURIze CLI - PID redirects from a CSV sheet
//!
//! ```bash
//! culturize convert redirects.csv --target apache     # Write .htaccess
//! culturize validate redirects.csv                    # HTML report + URL checks
//! culturize publish redirects.csv --repo URL --branch main --target nginx
//! culturize serve                                     # Start HTTP server (port 3000)
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use culturize::{
    convert_csv, publish, validate_csv, HtmlMode, PublishRequest, Settings, Target,
    ValidateOptions,
};

#[derive(Parser)]
#[command(name = "culturize")]
#[command(about = "Validate CSV redirect sheets and generate Apache/Nginx rewrite rules", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a CSV file to a web server configuration
    Convert {
        /// Input CSV file
        input: PathBuf,

        /// Web server dialect
        #[arg(short, long, value_enum, default_value_t = Target::Apache)]
        target: Target,

        /// Subdirectory prefixed to Nginx rewrite paths
        #[arg(short, long, default_value = "")]
        subdir: String,

        /// Output file (default: .htaccess or nginx_redirect.conf)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// HTTP status used for Apache redirects
        #[arg(long)]
        redirection_code: Option<u16>,

        /// Match PIDs case-sensitively (drops the NC flag)
        #[arg(long)]
        no_case_insensitive: bool,

        /// Drop the NE flag so Apache escapes targets
        #[arg(long)]
        no_escape_flag: bool,
    },

    /// Check every row and write an HTML report
    Validate {
        /// Input CSV file
        input: PathBuf,

        /// Do not probe target URLs
        #[arg(long)]
        skip_url_check: bool,

        /// Maximum number of URL probes in flight
        #[arg(long)]
        concurrency: Option<usize>,

        /// Report file (default: next to the CSV)
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Write field values into the report without HTML escaping
        #[arg(long)]
        verbatim_html: bool,
    },

    /// Convert, commit and push the configuration to a Git repository
    Publish {
        /// Input CSV file
        input: PathBuf,

        /// Repository URL (https or ssh)
        #[arg(long)]
        repo: String,

        /// Branch to push to
        #[arg(long, default_value = "main")]
        branch: String,

        /// Web server dialect
        #[arg(short, long, value_enum, default_value_t = Target::Apache)]
        target: Target,

        /// Directory inside the repository
        #[arg(short, long, default_value = "")]
        subdir: String,

        /// Commit message
        #[arg(short, long, default_value = "Update redirections")]
        message: String,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match Settings::from_env() {
        Ok(settings) => run(cli.command, settings).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run(command: Commands, settings: Settings) -> Result<i32, Box<dyn std::error::Error>> {
    match command {
        Commands::Convert {
            input,
            target,
            subdir,
            output,
            redirection_code,
            no_case_insensitive,
            no_escape_flag,
        } => {
            let mut settings = settings;
            if let Some(code) = redirection_code {
                if !(300..400).contains(&code) {
                    return Err(format!("Invalid redirection code {}: expected a 3xx status", code).into());
                }
                settings.redirect.redirection_code = code;
            }
            if no_case_insensitive {
                settings.redirect.case_insensitive_redirs = false;
            }
            if no_escape_flag {
                settings.redirect.no_escape = false;
            }
            cmd_convert(&input, target, &subdir, output.as_deref(), &settings)
        }

        Commands::Validate {
            input,
            skip_url_check,
            concurrency,
            report,
            verbatim_html,
        } => {
            let mut options = ValidateOptions::from_probe(&settings.probe, !skip_url_check);
            if let Some(n) = concurrency {
                options.concurrency = n.max(1);
            }
            let mode = if verbatim_html { HtmlMode::Verbatim } else { HtmlMode::Escaped };
            cmd_validate(&input, &settings, &options, report.as_deref(), mode).await
        }

        Commands::Publish {
            input,
            repo,
            branch,
            target,
            subdir,
            message,
        } => {
            let request = PublishRequest {
                csv_path: input,
                subdir,
                repo_url: repo,
                branch,
                commit_message: message,
                target,
                html_mode: HtmlMode::Escaped,
            };
            cmd_publish(request, &settings).await
        }

        Commands::Serve { port } => {
            culturize::server::start_server(port, settings).await?;
            Ok(0)
        }
    }
}

fn cmd_convert(
    input: &Path,
    target: Target,
    subdir: &str,
    output: Option<&Path>,
    settings: &Settings,
) -> Result<i32, Box<dyn std::error::Error>> {
    eprintln!("📄 Converting: {}", input.display());

    let result = convert_csv(input, target, subdir, &settings.redirect)?;

    let default_output;
    let output = match output {
        Some(p) => p,
        None => {
            default_output = input
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(target.file_name());
            default_output.as_path()
        }
    };
    fs::write(output, &result.config)?;

    eprintln!("   ✅ Accepted: {}", result.num_lines_accepted);
    eprintln!("   ❌ Rejected: {}", result.num_lines_rejected);
    eprintln!("💾 Output written to: {}", output.display());
    Ok(0)
}

async fn cmd_validate(
    input: &Path,
    settings: &Settings,
    options: &ValidateOptions,
    report: Option<&Path>,
    mode: HtmlMode,
) -> Result<i32, Box<dyn std::error::Error>> {
    eprintln!("✔️  Validating: {}", input.display());

    let outcome = tokio::select! {
        outcome = validate_csv(input, &settings.redirect, options, report, mode) => outcome?,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\n⚠️  Interrupted, pending URL checks cancelled");
            return Ok(130);
        }
    };

    eprintln!("\n📊 Results: {} clean, {} with errors", outcome.accepted, outcome.rejected);
    if let Some(path) = &outcome.report_path {
        eprintln!("💾 Report written to: {}", path.display());
    }

    Ok(if outcome.rejected > 0 { 1 } else { 0 })
}

async fn cmd_publish(
    request: PublishRequest,
    settings: &Settings,
) -> Result<i32, Box<dyn std::error::Error>> {
    eprintln!("🚀 Publishing: {} → {}", request.csv_path.display(), request.repo_url);

    let outcome = publish(request, settings).await?;

    eprintln!("\n📊 Rules: {} accepted, {} rejected", outcome.accepted, outcome.rejected);
    if let Some(path) = &outcome.report_path {
        eprintln!("💾 Report written to: {}", path.display());
    }
    eprintln!("\n✨ Done!");
    Ok(0)
}
