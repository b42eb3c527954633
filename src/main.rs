//! SOAP envelope adapter binary.
//!
//! Run with: `soap-envelope-adapter --config config.yaml --request request.xml`
//!
//! Reads a request envelope, passes it through an echo endpoint and prints the
//! response envelope.

use anyhow::{Context, Result};
use clap::Parser;
use soap_envelope_adapter::{
    ContextProperties, EchoHandler, InvocationOutcome, SoapAdapterConfig, SoapMessage,
    TracingSink, WebServiceEndpoint, XmlSoapMessage,
};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Echo endpoint for SOAP envelopes.
///
/// The request is translated into an internal message, echoed back (optionally
/// as SOAP fault) and translated into the response envelope written to stdout.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML)
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Path to the request envelope
    #[arg(short, long)]
    request: PathBuf,

    /// SOAP action of the request, as sent on the wire
    #[arg(long)]
    soap_action: Option<String>,

    /// Transport header of the request (repeatable)
    #[arg(long = "mime-header", value_name = "NAME: VALUE")]
    mime_headers: Vec<String>,

    /// Context property of the request (repeatable)
    #[arg(long = "property", value_name = "KEY=VALUE")]
    properties: Vec<String>,

    /// Reply with a SOAP fault (e.g. "SERVER,Something went wrong,en")
    #[arg(long)]
    fault: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr, stdout carries the response envelope
    let log_level = args.log_level.parse().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Starting SOAP envelope adapter v{}", env!("CARGO_PKG_VERSION"));
    info!("Config file: {}", args.config.display());

    let config = if args.config.exists() {
        let content =
            std::fs::read_to_string(&args.config).context("Failed to read config file")?;
        SoapAdapterConfig::from_yaml(&content).context("Failed to parse config file")?
    } else {
        info!("Config file not found, using defaults");
        SoapAdapterConfig::default()
    };

    info!(
        default_namespace = ?config.headers.default_namespace(),
        default_prefix = %config.headers.default_prefix,
        handle_mime_headers = config.mime.handle_mime_headers,
        "Configuration loaded"
    );

    let data = std::fs::read(&args.request)
        .with_context(|| format!("Failed to read request {}", args.request.display()))?;
    let mut request = XmlSoapMessage::parse(&data).context("Failed to parse request envelope")?;
    if let Some(action) = args.soap_action {
        request = request.with_soap_action(action);
    }
    for header in &args.mime_headers {
        let (name, value) = parse_mime_header(header)?;
        request = request.with_mime_header(name, value);
    }
    let properties = parse_properties(&args.properties)?;

    let handler = match args.fault {
        Some(definition) => EchoHandler::with_fault(definition),
        None => EchoHandler::new(),
    };
    let endpoint = WebServiceEndpoint::new(config, handler);
    let mut response = XmlSoapMessage::new(endpoint.response_version(request.version()));

    let outcome = endpoint
        .invoke(&request, &properties, &mut response, &TracingSink)
        .context("Failed to process request")?;

    match outcome {
        InvocationOutcome::Replied => {
            if let Some(version) = response.version() {
                info!(content_type = %version.content_type(), "Response content type");
            }
            if let Some(action) = response.soap_action() {
                info!(soap_action = %action, "Response SOAP action");
            }
            if let Some(headers) = response.mime_headers() {
                for (name, value) in headers.iter() {
                    info!(name = %name, value = %value, "Response MIME header");
                }
            }
            println!("{}", response.to_xml().context("Failed to serialize response")?);
        }
        InvocationOutcome::NoReply => info!("No response envelope produced"),
    }

    Ok(())
}

/// Parse `Name: value`.
fn parse_mime_header(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .with_context(|| format!("Invalid MIME header '{}', expected 'Name: value'", raw))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

/// Parse `key=value` pairs.
fn parse_properties(raw: &[String]) -> Result<ContextProperties> {
    let mut properties = ContextProperties::new();
    for entry in raw {
        let (key, value) = entry
            .split_once('=')
            .with_context(|| format!("Invalid property '{}', expected 'key=value'", entry))?;
        properties.insert(key.trim().to_string(), value.to_string());
    }
    Ok(properties)
}
