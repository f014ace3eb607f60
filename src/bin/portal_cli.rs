use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, bail, Context, Result};
use base64::Engine as _;
use chrono::{DateTime, Utc};
use clap::{ArgAction, Args, Parser, Subcommand};
use sap_portal_api::{
    client::{ClientError, PortalClient},
    portals::{self, Portal},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let timeout = Duration::from_secs(cli.timeout);

    match cli.command {
        Commands::Login(args) => handle_login(&cli.server, timeout, args, cli.json).await?,
        Commands::Logout => handle_logout()?,
        Commands::Whoami => handle_whoami(cli.json)?,
        Commands::Operations(args) => handle_operations(args, cli.json)?,
        Commands::Call(args) => handle_call(&cli.server, timeout, args, cli.json).await?,
        Commands::Pdf(args) => handle_pdf(&cli.server, timeout, args).await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "portal-cli", about = "Command-line access to the SAP portal API", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "SAP_PORTAL_SERVER",
        default_value = "http://localhost:8080",
        help = "Base URL of the portal API"
    )]
    server: String,
    #[arg(long, global = true, default_value_t = 30, help = "Request timeout in seconds")]
    timeout: u64,
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to a portal and remember the session
    Login(LoginArgs),
    /// Forget the stored session
    Logout,
    /// Show the stored session
    Whoami,
    /// List the operations a portal offers
    Operations(OperationsArgs),
    /// Call a portal operation
    Call(CallArgs),
    /// Call an operation returning a base64 PDF and write it to disk
    Pdf(PdfArgs),
}

#[derive(Args)]
struct LoginArgs {
    #[arg(long, help = "Portal to log in to")]
    portal: Portal,
    #[arg(long, help = "Customer, vendor or employee number")]
    id: String,
    #[arg(long, env = "SAP_PORTAL_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(
        long,
        action = ArgAction::SetTrue,
        help = "Do not persist the session to disk"
    )]
    no_save: bool,
}

#[derive(Args)]
struct OperationsArgs {
    #[arg(long, help = "Only list this portal's operations")]
    portal: Option<Portal>,
}

#[derive(Args)]
struct CallArgs {
    /// Operation name, e.g. `sales-order-data`
    operation: String,
    #[arg(long, help = "Portal to call; defaults to the stored session's portal")]
    portal: Option<Portal>,
    #[arg(
        short = 'p',
        long = "param",
        value_parser = parse_param,
        help = "Input as key=value; may be repeated"
    )]
    params: Vec<(String, String)>,
}

#[derive(Args)]
struct PdfArgs {
    #[command(flatten)]
    call: CallArgs,
    #[arg(long, short = 'o', help = "File to write the document to")]
    out: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    portal: Portal,
    identifier: String,
    token: String,
    expires_in: u64,
    saved_at: DateTime<Utc>,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

async fn handle_login(server: &str, timeout: Duration, args: LoginArgs, json: bool) -> Result<()> {
    let mut client = PortalClient::new(server, args.portal, timeout).map_err(user_error)?;
    let payload = client
        .login(&args.id, &args.password)
        .await
        .map_err(user_error)?;

    let token = client
        .token()
        .ok_or_else(|| anyhow!("login succeeded but no session token was returned"))?
        .to_string();
    let session = StoredSession {
        portal: args.portal,
        identifier: args.id.clone(),
        token,
        expires_in: payload
            .get("expiresIn")
            .and_then(Value::as_u64)
            .unwrap_or_default(),
        saved_at: Utc::now(),
    };

    let saved_path = if args.no_save {
        None
    } else {
        let path = session_file_path()
            .ok_or_else(|| anyhow!("cannot locate a home directory for the session file"))?;
        save_session(&path, &session)?;
        Some(path)
    };

    if json {
        print_json(&payload)?;
    } else {
        let name = payload.get("name").and_then(Value::as_str).unwrap_or("");
        println!("Logged in to the {} portal as {} {}", args.portal, args.id, name);
        if let Some(path) = saved_path {
            println!("Session saved to: {}", path.display());
        }
    }
    Ok(())
}

fn handle_logout() -> Result<()> {
    match read_session()? {
        Some((path, session)) => {
            clear_session_file(&path)?;
            println!("Logged out of the {} portal", session.portal);
        }
        None => println!("No stored session"),
    }
    Ok(())
}

fn handle_whoami(json: bool) -> Result<()> {
    let Some((path, session)) = read_session()? else {
        bail!("not logged in; run `portal-cli login` first");
    };

    if json {
        print_json(&session)?;
    } else {
        println!("Portal:   {}", session.portal);
        println!("Id:       {}", session.identifier);
        println!("Saved at: {}", session.saved_at.to_rfc3339());
        println!("File:     {}", path.display());
    }
    Ok(())
}

fn handle_operations(args: OperationsArgs, json: bool) -> Result<()> {
    let operations: Vec<_> = portals::catalog()
        .filter(|op| args.portal.map_or(true, |portal| op.portal == portal))
        .collect();

    if json {
        return print_json(&operations);
    }
    for op in operations {
        let inputs: Vec<&str> = op.inputs.iter().map(|input| input.name).collect();
        println!(
            "- {:<12} {:<22} {:?} {} [{}]",
            op.portal.slug(),
            op.name,
            op.method,
            op.summary,
            inputs.join(", ")
        );
    }
    Ok(())
}

/// Resolves the portal and inputs of a call, filling the identifier from the session.
fn prepare_call(args: &CallArgs) -> Result<(Portal, Option<String>, HashMap<String, String>)> {
    let session = read_session()?.map(|(_, session)| session);
    let portal = args
        .portal
        .or(session.as_ref().map(|s| s.portal))
        .ok_or_else(|| anyhow!("--portal is required when not logged in"))?;

    let mut params: HashMap<String, String> = args.params.iter().cloned().collect();
    let token = match session {
        Some(session) if session.portal == portal => {
            params
                .entry(portal.identifier().to_string())
                .or_insert(session.identifier);
            Some(session.token)
        }
        _ => None,
    };
    Ok((portal, token, params))
}

async fn handle_call(server: &str, timeout: Duration, args: CallArgs, json: bool) -> Result<()> {
    let (portal, token, params) = prepare_call(&args)?;
    let client = PortalClient::new(server, portal, timeout)
        .map_err(user_error)?
        .with_token(token);
    let payload = client
        .call(&args.operation, &params)
        .await
        .map_err(user_error)?;

    if json {
        return print_json(&payload);
    }
    match &payload {
        Value::Array(items) if items.is_empty() => println!("No records"),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                println!("#{}", index + 1);
                render_record(item);
            }
        }
        record => render_record(record),
    }
    Ok(())
}

async fn handle_pdf(server: &str, timeout: Duration, args: PdfArgs) -> Result<()> {
    let (portal, token, params) = prepare_call(&args.call)?;
    let client = PortalClient::new(server, portal, timeout)
        .map_err(user_error)?
        .with_token(token);
    let payload = client
        .call(&args.call.operation, &params)
        .await
        .map_err(user_error)?;

    let encoded = payload
        .get("pdf")
        .and_then(Value::as_str)
        .filter(|pdf| !pdf.is_empty())
        .ok_or_else(|| anyhow!("'{}' returned no document", args.call.operation))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .context("document is not valid base64")?;

    fs::write(&args.out, &bytes)
        .with_context(|| format!("failed writing {}", args.out.display()))?;
    println!("Wrote {} bytes to {}", bytes.len(), args.out.display());
    Ok(())
}

/// Reduces a client failure to its user-facing message; `PORTAL_CLI_DEBUG` also prints the cause.
fn user_error(err: ClientError) -> anyhow::Error {
    if std::env::var_os("PORTAL_CLI_DEBUG").is_some() {
        eprintln!("debug: {:?}", err);
    }
    anyhow!(err.user_message())
}

fn render_record(record: &Value) {
    match record {
        Value::Object(fields) => {
            for (name, value) in fields {
                match value {
                    Value::String(text) => println!("  {:<22} {}", name, text),
                    other => println!("  {:<22} {}", name, other),
                }
            }
        }
        other => println!("  {}", other),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn session_file_path() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("SAP_PORTAL_CLI_HOME") {
        let mut path = PathBuf::from(dir);
        path.push("session.json");
        return Some(path);
    }

    std::env::var("HOME").ok().map(|home| {
        let mut path = PathBuf::from(home);
        path.push(".sap-portal");
        path.push("session.json");
        path
    })
}

fn save_session(path: &Path, session: &StoredSession) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory {}", parent.display()))?;
    }

    let payload = serde_json::to_vec_pretty(session)?;
    fs::write(path, payload).with_context(|| format!("failed writing {}", path.display()))?;
    Ok(())
}

fn read_session() -> Result<Option<(PathBuf, StoredSession)>> {
    let path = match session_file_path() {
        Some(path) => path,
        None => return Ok(None),
    };

    if !path.exists() {
        return Ok(None);
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("failed to read session file {}", path.display()))?;
    let session: StoredSession = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse session file {}", path.display()))?;
    Ok(Some((path, session)))
}

fn clear_session_file(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("failed to remove {}", path.display()))?;
    }
    Ok(())
}
