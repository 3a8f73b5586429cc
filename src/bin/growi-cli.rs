use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use growi_client::{
    ApiFamily, CallOptions, GrowiClient, GrowiClientConfig, RequestDescription, TransportOptions,
};
use reqwest::Method;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "growi-cli",
    version,
    about = "Small async CLI for querying the GROWI REST APIs"
)]
struct Cli {
    /// Base URL of the GROWI site, without the `/_api` suffix.
    ///
    /// Required by `call` and `request`; `operations` works without it.
    #[arg(long, env = "GROWI_BASE_URL")]
    base_url: Option<String>,

    /// Access token sent as `Authorization: Bearer <token>`.
    #[arg(
        long,
        env = "GROWI_ACCESS_TOKEN",
        default_value = "",
        hide_env_values = true
    )]
    access_token: String,

    /// Request timeout in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Emit compact JSON instead of pretty-printed output.
    #[arg(long)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List catalogued `OpenAPI` operation ids.
    Operations {
        /// API family to list (v1 or v3).
        #[arg(long, default_value = "v3")]
        family: ApiFamily,

        /// Filter operations by substring match on operation id (case-insensitive).
        #[arg(long)]
        filter: Option<String>,
    },
    /// Call an endpoint by `OpenAPI` operation id.
    Call(CallArgs),
    /// Send a raw HTTP request using method + path below the family prefix.
    Request(RequestArgs),
}

#[derive(Debug, Args)]
struct CallArgs {
    /// API family of the operation (v1 or v3).
    family: ApiFamily,

    /// `OpenAPI` operation id (for example: getRecentPages).
    operation_id: String,

    /// Path parameter in form key=value. Repeat as needed.
    #[arg(long = "path-param", value_name = "KEY=VALUE")]
    path_param: Vec<String>,

    /// Query parameter in form key=value. Repeat as needed.
    #[arg(long = "query", value_name = "KEY=VALUE")]
    query: Vec<String>,

    #[command(flatten)]
    body: BodyInput,
}

#[derive(Debug, Args)]
struct RequestArgs {
    /// API family whose prefix the path is relative to (v1 or v3).
    family: ApiFamily,

    /// HTTP method (GET, POST, PUT, DELETE, ...).
    method: String,

    /// Request path (for example: /pages/recent).
    path: String,

    /// Query parameter in form key=value. Repeat as needed.
    #[arg(long = "query", value_name = "KEY=VALUE")]
    query: Vec<String>,

    #[command(flatten)]
    body: BodyInput,
}

#[derive(Debug, Args)]
struct BodyInput {
    /// JSON request body literal.
    #[arg(long, conflicts_with = "body_file")]
    body_json: Option<String>,

    /// Path to a file containing a JSON request body.
    #[arg(long, value_name = "PATH", conflicts_with = "body_json")]
    body_file: Option<PathBuf>,
}

/// Entry point for the async CLI.
///
/// Parses command-line arguments, builds a client for one GROWI site,
/// dispatches subcommands, and prints JSON output.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // `operations` is metadata-only; it does not require constructing a client.
    if let Command::Operations { family, filter } = &cli.command {
        print_operations(*family, filter.as_deref());
        return Ok(());
    }

    let client = build_client(&cli)?;

    let output = match &cli.command {
        Command::Operations { .. } => unreachable!("handled above"),
        Command::Call(args) => call_operation(&client, args)
            .await
            .with_context(|| format!("operation call failed: '{}'", args.operation_id))?,
        Command::Request(args) => send_request(&client, args)
            .await
            .with_context(|| format!("request failed: {} {}", args.method, args.path))?,
    };

    print_json(&output, cli.compact).context("failed to print JSON output")?;
    Ok(())
}

/// Builds a client for the site named by `--base-url`/`GROWI_BASE_URL`.
fn build_client(cli: &Cli) -> Result<GrowiClient> {
    let base_url = cli
        .base_url
        .as_deref()
        .context("--base-url or GROWI_BASE_URL is required")?;

    let mut transport = TransportOptions::default()
        .with_user_agent(concat!("growi-cli/", env!("CARGO_PKG_VERSION")));
    if let Some(secs) = cli.timeout_secs {
        transport = transport.with_timeout(std::time::Duration::from_secs(secs));
    }
    let config =
        GrowiClientConfig::new(base_url, &cli.access_token).with_transport_options(transport);
    GrowiClient::new(config).with_context(|| format!("failed to create client for '{base_url}'"))
}

/// Prints the operation catalog of one family.
fn print_operations(family: ApiFamily, filter: Option<&str>) {
    let filter = filter.map(str::to_ascii_lowercase);

    let operations: Vec<_> = family
        .operations()
        .iter()
        .filter(|operation| {
            filter
                .as_ref()
                .is_none_or(|needle| operation.operation_id.to_ascii_lowercase().contains(needle))
        })
        .collect();

    let (operation_id_width, method_width) =
        operations
            .iter()
            .fold((0usize, 0usize), |(id_max, method_max), operation| {
                (
                    id_max.max(operation.operation_id.len()),
                    method_max.max(operation.method.len()),
                )
            });

    for operation in operations {
        println!(
            "{:<operation_id_width$}  {:<method_width$}  {}{}",
            operation.operation_id,
            operation.method,
            family.suffix(),
            operation.path_template
        );
    }
}

/// Calls a catalogued operation by `operation_id` on the chosen family.
async fn call_operation(client: &GrowiClient, args: &CallArgs) -> Result<Value> {
    let path_params = parse_pairs(&args.path_param, "--path-param")
        .context("failed to parse --path-param arguments")?;
    let query = parse_pairs(&args.query, "--query").context("failed to parse --query arguments")?;
    let body = parse_body(&args.body).context("failed to parse request body input")?;

    let borrowed_path: Vec<(&str, &str)> = path_params
        .iter()
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();
    let borrowed_query: Vec<(&str, &str)> = query
        .iter()
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();

    let pending = match args.family {
        ApiFamily::V1 => client.v1().call_operation(
            &args.operation_id,
            &borrowed_path,
            &borrowed_query,
            body,
            CallOptions::default(),
        ),
        ApiFamily::V3 => client.v3().call_operation(
            &args.operation_id,
            &borrowed_path,
            &borrowed_query,
            body,
            CallOptions::default(),
        ),
    }?;

    let value = pending.await.with_context(|| {
        format!(
            "OpenAPI operation '{}' returned an error",
            args.operation_id
        )
    })?;
    Ok(value)
}

/// Sends a raw request below the family prefix, bypassing the catalog.
async fn send_request(client: &GrowiClient, args: &RequestArgs) -> Result<Value> {
    // Validate method eagerly so CLI errors are explicit before any network call.
    let method = Method::from_str(&args.method)
        .with_context(|| format!("invalid HTTP method '{}'", args.method))?;
    let query = parse_pairs(&args.query, "--query").context("failed to parse --query arguments")?;
    let body = parse_body(&args.body).context("failed to parse request body input")?;

    let mut request = RequestDescription::new(method, &args.path);
    request.query = query;
    request.body = body;

    let executor = match args.family {
        ApiFamily::V1 => client.v1().executor(),
        ApiFamily::V3 => client.v3().executor(),
    };
    let value = executor
        .execute(request, CallOptions::default())?
        .await
        .with_context(|| format!("HTTP request failed for path '{}'", args.path))?;
    Ok(value)
}

/// Parses repeated `key=value` arguments into owned key/value pairs.
///
/// Returns an error when a value does not include `=` or has an empty key.
fn parse_pairs(values: &[String], flag_name: &str) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::with_capacity(values.len());
    for item in values {
        let Some((key, value)) = item.split_once('=') else {
            bail!("invalid {flag_name} value '{item}': expected key=value");
        };
        if key.is_empty() {
            bail!("invalid {flag_name} value '{item}': empty key");
        }
        pairs.push((key.to_owned(), value.to_owned()));
    }
    Ok(pairs)
}

/// Parses an optional JSON body from inline text or a file path.
///
/// Exactly one of `--body-json` or `--body-file` may be set.
fn parse_body(body: &BodyInput) -> Result<Option<Value>> {
    match (&body.body_json, &body.body_file) {
        (Some(raw), None) => serde_json::from_str(raw)
            .context("failed to parse JSON from --body-json")
            .map(Some),
        (None, Some(path)) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read --body-file '{}'", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| {
                    format!("failed to parse JSON in --body-file '{}'", path.display())
                })
                .map(Some)
        }
        (None, None) => Ok(None),
        (Some(_), Some(_)) => bail!("use only one of --body-json or --body-file"),
    }
}

/// Prints a JSON value either compact or pretty-formatted.
fn print_json(value: &Value, compact: bool) -> Result<()> {
    if compact {
        println!(
            "{}",
            serde_json::to_string(value).context("Failed to render JSON")?
        );
    } else {
        println!(
            "{}",
            serde_json::to_string_pretty(value).context("Failed to render JSON")?
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command, build_client, parse_pairs};

    #[test]
    fn operations_parse_without_base_url() {
        let cli = Cli::try_parse_from(["growi-cli", "operations", "--family", "v1"])
            .expect("operations needs no site");
        assert!(matches!(cli.command, Command::Operations { .. }));
    }

    #[test]
    fn client_commands_require_base_url() {
        let mut cli = Cli::try_parse_from(["growi-cli", "call", "v3", "getHealthcheck"])
            .expect("arguments parse");
        cli.base_url = None;

        let error = build_client(&cli).expect_err("base URL is required");
        assert!(error.to_string().contains("GROWI_BASE_URL"));
    }

    #[test]
    fn client_builds_from_base_url_flag() {
        let cli = Cli::try_parse_from([
            "growi-cli",
            "--base-url",
            "https://wiki.example.com",
            "request",
            "v3",
            "GET",
            "/healthcheck",
        ])
        .expect("arguments parse");

        let client = build_client(&cli).expect("client builds");
        assert_eq!(
            client.transport_handle().base_url(),
            "https://wiki.example.com"
        );
    }

    #[test]
    fn parse_pairs_splits_on_first_equals() {
        let pairs = parse_pairs(&["q=a=b".to_owned()], "--query").expect("valid pair");
        assert_eq!(pairs, vec![("q".to_owned(), "a=b".to_owned())]);
    }

    #[test]
    fn parse_pairs_rejects_empty_key() {
        assert!(parse_pairs(&["=x".to_owned()], "--query").is_err());
        assert!(parse_pairs(&["novalue".to_owned()], "--query").is_err());
    }
}
