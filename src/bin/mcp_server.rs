//! pick-context MCP Server
//!
//! Serves the element inspector over the Model Context Protocol, so an AI
//! assistant can pick elements in a Chrome page and read back the report.

use clap::{Parser, ValueEnum};
use pick_context::browser::{BrowserSession, ConnectionOptions, LaunchOptions, SnapshotOptions};
use pick_context::mcp::InspectorServer;
use rmcp::{ServiceExt, transport::stdio};
use rmcp::transport::{
    sse_server::{SseServer, SseServerConfig},
    streamable_http_server::{StreamableHttpService, session::local::LocalSessionManager},
};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Transport {
    /// Standard input/output transport (default)
    Stdio,
    /// Server-Sent Events transport
    Sse,
    /// HTTP streamable transport
    Http,
}

#[derive(Parser)]
#[command(name = "pick-context-mcp")]
#[command(version)]
#[command(about = "Element inspector MCP server", long_about = None)]
struct Cli {
    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H')]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    executable_path: Option<String>,

    /// WebSocket endpoint URL of an already running browser
    #[arg(long, value_name = "URL")]
    ws_endpoint: Option<String>,

    /// Persistent browser profile directory
    #[arg(long, value_name = "DIR")]
    user_data_dir: Option<String>,

    /// Objects exported from the picked element before the rest are cut off
    #[arg(long, default_value_t = SnapshotOptions::default().max_objects)]
    max_objects: usize,

    /// Elements exported with their children
    #[arg(long, default_value_t = SnapshotOptions::default().max_dom_nodes)]
    max_dom_nodes: usize,

    /// Transport type to use
    #[arg(long, short = 't', value_enum, default_value = "stdio")]
    transport: Transport,

    /// Port for SSE or HTTP transport (default: 3000)
    #[arg(long, short = 'p', default_value = "3000")]
    port: u16,

    /// SSE endpoint path (default: /sse)
    #[arg(long, default_value = "/sse")]
    sse_path: String,

    /// SSE POST path for messages (default: /message)
    #[arg(long, default_value = "/message")]
    sse_post_path: String,

    /// HTTP streamable endpoint path (default: /mcp)
    #[arg(long, default_value = "/mcp")]
    http_path: String,
}

impl Cli {
    fn launch_options(&self) -> LaunchOptions {
        let mut options = LaunchOptions::new().headless(!self.headed);
        if let Some(ref path) = self.executable_path {
            options = options.chrome_path(path);
        }
        if let Some(ref dir) = self.user_data_dir {
            options = options.user_data_dir(dir);
        }
        options
    }

    fn server(&self) -> Result<InspectorServer, Box<dyn std::error::Error>> {
        let mut session = match self.ws_endpoint {
            Some(ref endpoint) => BrowserSession::connect(ConnectionOptions::new(endpoint))?,
            None => BrowserSession::launch(self.launch_options())?,
        };
        session.set_snapshot_options(
            SnapshotOptions::new()
                .max_objects(self.max_objects)
                .max_dom_nodes(self.max_dom_nodes),
        );
        Ok(InspectorServer::with_session(session))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    eprintln!("pick-context MCP Server v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("Browser mode: {}", if cli.headed { "headed" } else { "headless" });

    if let Some(ref path) = cli.executable_path {
        eprintln!("Browser executable: {}", path);
    }

    if let Some(ref endpoint) = cli.ws_endpoint {
        eprintln!("WebSocket endpoint: {}", endpoint);
    }

    if let Some(ref dir) = cli.user_data_dir {
        eprintln!("User data directory: {}", dir);
    }

    // One browser serves every connection
    let server = cli
        .server()
        .map_err(|e| format!("Failed to create inspector server: {}", e))?;

    match cli.transport {
        Transport::Stdio => {
            eprintln!("Transport: stdio");
            eprintln!("Ready to accept MCP connections via stdio");
            let running = server.serve(stdio()).await?;
            let quit_reason = running.waiting().await?;
            eprintln!("Server quit with reason: {:?}", quit_reason);
            // Give a small delay for destructors to complete
            tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;
            eprintln!("Cleanup complete, exiting...");
        }
        Transport::Sse => {
            eprintln!("Transport: SSE");
            eprintln!("Port: {}", cli.port);
            eprintln!("SSE path: {}", cli.sse_path);
            eprintln!("SSE POST path: {}", cli.sse_post_path);

            let bind_addr = format!("127.0.0.1:{}", cli.port);

            let config = SseServerConfig {
                bind: bind_addr.parse()?,
                sse_path: cli.sse_path.clone(),
                post_path: cli.sse_post_path.clone(),
                ct: CancellationToken::new(),
                sse_keep_alive: None,
            };

            let (sse_server, router) = SseServer::new(config);

            eprintln!("Ready to accept MCP connections at http://{}{}", bind_addr, cli.sse_path);

            let _cancellation_token = sse_server.with_service(move || server.clone());

            let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
            axum::serve(listener, router.into_make_service()).await?;
        }
        Transport::Http => {
            eprintln!("Transport: HTTP streamable");
            eprintln!("Port: {}", cli.port);
            eprintln!("HTTP path: {}", cli.http_path);

            let bind_addr = format!("127.0.0.1:{}", cli.port);

            let http_service = StreamableHttpService::new(
                move || Ok(server.clone()),
                LocalSessionManager::default().into(),
                Default::default(),
            );

            let router = axum::Router::new().nest_service(&cli.http_path, http_service);

            eprintln!("Ready to accept MCP connections at http://{}{}", bind_addr, cli.http_path);

            let listener = tokio::net::TcpListener::bind(bind_addr).await?;
            axum::serve(listener, router).await?;
        }
    }

    Ok(())
}
