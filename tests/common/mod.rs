//! Shared utilities for integration testing.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use compile_server::cache::ResultCache;
use compile_server::compiler::{Compilation, CompileError, Compiler, Diagnostic};
use compile_server::config::schema::{Config, ServerSettings};
use compile_server::http::HttpServer;
use compile_server::lifecycle::Shutdown;
use compile_server::registry::ConfigRegistry;

/// A scriptable stand-in for the external compiler.
///
/// Produces deterministic artifacts derived from the config it is given,
/// optionally sleeping per id (to model slow compilations) and failing on
/// demand (to model broken inputs).
#[derive(Default)]
pub struct TestCompiler {
    pub delays: HashMap<String, Duration>,
    pub fail: AtomicBool,
    pub seen: Mutex<Vec<Config>>,
}

impl TestCompiler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_delays(delays: &[(&str, Duration)]) -> Arc<Self> {
        Arc::new(Self {
            delays: delays
                .iter()
                .map(|(id, d)| (id.to_string(), *d))
                .collect(),
            ..Self::default()
        })
    }

    #[allow(dead_code)]
    pub fn last_seen(&self) -> Option<Config> {
        self.seen.lock().unwrap().last().cloned()
    }
}

impl Compiler for TestCompiler {
    fn compile(&self, config: &Config) -> Result<Compilation, CompileError> {
        self.seen.lock().unwrap().push(config.clone());

        if let Some(delay) = self.delays.get(&config.id) {
            std::thread::sleep(*delay);
        }
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(CompileError::Failed(vec![Diagnostic::message(format!(
                "forced failure for {}",
                config.id
            ))]));
        }

        Ok(Compilation {
            output: format!("// {} [{}]\nvar compiled = true;\n", config.id, config.mode),
            source_map: format!("{{\"version\":3,\"file\":\"{}.js\"}}", config.id),
            externs: format!("// externs for {}\n", config.id),
        })
    }
}

/// A config whose inputs need not exist on disk.
pub fn config(id: &str) -> Config {
    Config {
        id: id.to_string(),
        inputs: vec![format!("{id}.js").into()],
        ..Config::default()
    }
}

/// A running server plus handles onto its shared state.
pub struct TestServer {
    pub addr: SocketAddr,
    pub registry: ConfigRegistry,
    pub cache: ResultCache,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path_and_query: &str) -> String {
        format!("http://{}{}", self.addr, path_and_query)
    }
}

/// Register the configs and serve them on an ephemeral local port.
pub async fn spawn_server(configs: Vec<Config>, compiler: Arc<dyn Compiler>) -> TestServer {
    spawn_server_with(ServerSettings::default(), configs, compiler).await
}

pub async fn spawn_server_with(
    settings: ServerSettings,
    configs: Vec<Config>,
    compiler: Arc<dyn Compiler>,
) -> TestServer {
    let registry = ConfigRegistry::new();
    for config in configs {
        registry.register(config).unwrap();
    }
    let cache = ResultCache::new();
    let server = HttpServer::new(settings, registry.clone(), cache.clone(), compiler);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    TestServer {
        addr,
        registry,
        cache,
        shutdown,
    }
}

/// An HTTP client that ignores proxy environment variables.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
