//! Standalone web server binary
//!
//! Usage: cargo run -p memora_web --bin memora-web-server -- [OPTIONS]

use memora_web::{LogFormat, ServerConfig, WebServer};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug)]
struct Options {
    host: String,
    port: u16,
    static_dir: Option<PathBuf>,
    log_format: LogFormat,
}

enum Parsed {
    Run(Options),
    Help,
}

fn parse_args(args: &[String]) -> Result<Parsed, String> {
    let mut options = Options {
        host: "127.0.0.1".to_string(),
        port: 8080,
        static_dir: None,
        log_format: LogFormat::Pretty,
    };

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        let mut value = |name: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{name} requires a value"))
        };
        match arg.as_str() {
            "--host" | "-h" => options.host = value("--host")?,
            "--port" | "-p" => {
                options.port = value("--port")?
                    .parse()
                    .map_err(|_| "invalid port number".to_string())?
            }
            "--static-dir" | "-d" => options.static_dir = Some(PathBuf::from(value("--static-dir")?)),
            "--log-json" => options.log_format = LogFormat::Json,
            "--help" => return Ok(Parsed::Help),
            other => return Err(format!("Unknown argument: {other}")),
        }
    }
    Ok(Parsed::Run(options))
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let options = match parse_args(&args) {
        Ok(Parsed::Run(options)) => options,
        Ok(Parsed::Help) => {
            print_help();
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("Error: {message}");
            print_help();
            return ExitCode::from(2);
        }
    };

    if let Err(err) = memora_web::init_logging(options.log_format) {
        eprintln!("Error: failed to initialize logging: {err}");
        return ExitCode::from(2);
    }

    match serve(options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "server failed");
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn serve(options: Options) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ServerConfig::new(options.host, options.port);
    if let Some(dir) = options.static_dir {
        config = config.with_static_dir(dir);
    }

    tracing::info!(
        host = config.host(),
        port = config.port(),
        static_dir = ?config.static_dir(),
        "starting memora web server"
    );

    let handle = WebServer::new(config)?.start().await?;
    println!("Server running at http://{}", handle.address());
    println!("Press Ctrl+C to stop");

    tokio::signal::ctrl_c().await?;

    tracing::info!("shutting down");
    handle.shutdown().await?;
    Ok(())
}

fn print_help() {
    println!("Memora Web Server");
    println!();
    println!("Usage: memora-web-server [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --host, -h <HOST>        Host to bind to (default: 127.0.0.1)");
    println!("  --port, -p <PORT>        Port to bind to (default: 8080)");
    println!("  --static-dir, -d <DIR>   Serve frontend files from DIR before the embedded ones");
    println!("  --log-json               Emit logs as JSON lines");
    println!("  --help                   Show this help message");
}
