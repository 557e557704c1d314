use {
    std::{collections::HashMap, fs, net::SocketAddr, path::Path, sync::Arc},
    tracing::{info, warn, error},
    tokio::{net::TcpListener, sync::oneshot},
    hyper::{Method, Response, StatusCode, body::Bytes, header::{self, HeaderMap, HeaderName, HeaderValue}, server::conn::http1},
    hyper_util::rt::tokio::{TokioIo, TokioTimer},
    http_body_util::Full,
    rayon::{ThreadPool, ThreadPoolBuilder},
    serde_json::json,
    tally_core::{CounterRecord, HandlerContext, HandlerEvent, HandlerResponse},
    tally_store::{BoxedTable, MemoryTable, SqliteTable, Table, TableRegistry},
    tally_handler::CounterHandler,
    crate::{
        config::{ServerConfig, TableConfig, TableDriverConfig},
        error::ServerError,
        http::HttpHandler,
        metrics::Metrics,
    },
};

pub const COUNTER_PATH: &str = "/counter";
pub const METRICS_PATH: &str = "/metrics";
pub const API_KEY_HEADER: &str = "x-api-key";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Local stand-in for the function host: fronts the counter handler with http.
#[derive(Clone)]
pub struct CounterServer {
    pub(crate) engine: Arc<Engine>,
}

pub(crate) struct Engine {
    handler: CounterHandler,
    api_key: Option<String>,
    thread_pool: ThreadPool,
    pub(crate) metrics: Metrics,
}

impl CounterServer {
    pub fn new(handler: CounterHandler, api_key: Option<String>) -> Result<Self, ServerError> {
        Ok(Self {
            engine: Arc::new(Engine {
                handler,
                api_key,
                thread_pool: ThreadPoolBuilder::new()
                    .thread_name(|index| format!("tally-worker-{index}"))
                    .build()
                    .map_err(|err| ServerError::InitError { reason: format!("failed to build thread pool: {err:?}") })?,
                metrics: Metrics::new()
                    .map_err(|err| ServerError::InitError { reason: format!("failed to register metrics: {err:?}") })?,
            }),
        })
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, ServerError> {
        let handler = CounterHandler::new(table_registry(config)?, config.handler_config());
        Self::new(handler, config.api_key.clone())
    }

    pub fn metrics(&self) -> &Metrics {
        &self.engine.metrics
    }

    pub async fn bind(port: u16) -> Result<TcpListener, ServerError> {
        let addr: SocketAddr = ([0, 0, 0, 0], port).into();
        TcpListener::bind(addr).await
            .map_err(|err| ServerError::InitError { reason: format!("failed to bind to {addr:?}: {err:?}") })
    }

    pub async fn serve(&self, listener: TcpListener) {
        match listener.local_addr() {
            Ok(addr) => info!("running on {addr:?}"),
            Err(err) => warn!("running on unknown address: {err:?}"),
        }

        loop {
            let (tcp, remote) = match listener.accept().await {
                Ok(v) => v,
                Err(err) => {
                    error!("failed to accept connection: {err:?}");
                    continue;
                }
            };
            let io = TokioIo::new(tcp);

            let handler = HttpHandler::new(self.clone());
            tokio::task::spawn(async move {
                if let Err(err) = http1::Builder::new()
                    .timer(TokioTimer::new())
                    .serve_connection(io, handler)
                    .await {
                    warn!("error while serving connection from {remote:?}: {err:?}");
                }
            });
        }
    }

    /// Runs routing on the worker pool, the handler blocks on table calls.
    pub async fn dispatch(&self, method: Method, path: String, headers: HeaderMap) -> Response<Full<Bytes>> {
        let (tx, rx) = oneshot::channel();
        let server = self.clone();
        self.engine.thread_pool.spawn(move || {
            let response = server.route(&method, &path, &headers);
            let _ = tx.send(response);
        });

        match rx.await {
            Ok(v) => v,
            Err(err) => {
                error!("worker dropped response: {err:?}");
                text_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error.\n")
            }
        }
    }

    pub fn route(&self, method: &Method, path: &str, headers: &HeaderMap) -> Response<Full<Bytes>> {
        let response = match path {
            COUNTER_PATH => {
                if *method != Method::GET {
                    text_response(StatusCode::METHOD_NOT_ALLOWED, "method not allowed.\n")
                } else if !self.is_authorized(headers) {
                    json_response(StatusCode::FORBIDDEN, &json!({"message": "Forbidden"}))
                } else {
                    self.invoke_counter(method, path, headers)
                }
            },
            METRICS_PATH => match self.engine.metrics.encode() {
                Ok(v) => text_response(StatusCode::OK, v),
                Err(err) => {
                    error!("failed to encode metrics: {err:?}");
                    text_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics.\n")
                }
            },
            _ => text_response(StatusCode::NOT_FOUND, "not found.\n"),
        };

        self.engine.metrics.http_requests_total
            .with_label_values(&[response.status().as_str()])
            .inc();
        response
    }

    fn is_authorized(&self, headers: &HeaderMap) -> bool {
        match &self.engine.api_key {
            None => true,
            Some(expected) => headers.get(API_KEY_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(|v| v == expected)
                .unwrap_or(false),
        }
    }

    fn invoke_counter(&self, method: &Method, path: &str, headers: &HeaderMap) -> Response<Full<Bytes>> {
        let event = HandlerEvent(json!({
            "httpMethod": method.as_str(),
            "path": path,
        }));
        let mut ctx = HandlerContext::new();
        if let Some(request_id) = headers.get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()) {
            ctx = ctx.with_request_id(request_id);
        }

        self.engine.metrics.invocations_total.inc();
        let response = self.engine.handler.handle(&event, &ctx);
        if !response.is_success() {
            self.engine.metrics.invocation_failures_total.inc();
        }

        into_http_response(response)
    }
}

pub fn into_http_response(response: HandlerResponse) -> Response<Full<Bytes>> {
    let status = StatusCode::from_u16(response.status_code).unwrap_or_else(|_| {
        warn!("handler returned invalid status code: {}", response.status_code);
        StatusCode::INTERNAL_SERVER_ERROR
    });

    let mut http_response = Response::new(Full::new(Bytes::from(response.body)));
    *http_response.status_mut() = status;
    for (name, value) in response.headers {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(&value)) {
            (Ok(name), Ok(value)) => {
                http_response.headers_mut().insert(name, value);
            },
            _ => warn!("skipping invalid response header: {name:?}"),
        }
    }
    http_response
}

fn text_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
}

fn json_response(status: StatusCode, body: &serde_json::Value) -> Response<Full<Bytes>> {
    let mut response = text_response(status, body.to_string());
    response.headers_mut().insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// Opens every configured table and seeds the counter record where asked to.
pub fn table_registry(config: &ServerConfig) -> Result<TableRegistry, ServerError> {
    let registry = TableRegistry::new();
    let mut databases = HashMap::new();

    for table_config in &config.tables {
        let table = open_table(table_config, &mut databases)?;

        if let Some(seed) = table_config.seed {
            let existing = table.get_item(&CounterRecord::key())
                .map_err(|err| ServerError::StorageError { reason: format!("failed to read table {:?}: {err}", table_config.name) })?;
            if existing.is_none() {
                info!("seeding table {:?} with counter = {seed}", table_config.name);
                table.put_item(&CounterRecord::key(), CounterRecord::new(seed).into())
                    .map_err(|err| ServerError::StorageError { reason: format!("failed to seed table {:?}: {err}", table_config.name) })?;
            }
        }

        registry.register(table_config.name.clone(), table)
            .map_err(|err| ServerError::StorageError { reason: err.to_string() })?;
    }

    Ok(registry)
}

/// Sqlite tables configured with the same path share one database connection.
fn open_table(config: &TableConfig, databases: &mut HashMap<String, SqliteTable>) -> Result<BoxedTable, ServerError> {
    Ok(match &config.driver {
        TableDriverConfig::Memory => BoxedTable::new(MemoryTable::new()),
        TableDriverConfig::Sqlite { path, in_memory } => {
            if in_memory.unwrap_or(false) {
                BoxedTable::new(SqliteTable::in_memory(config.name.clone()).map_err(|err| ServerError::StorageError {
                    reason: format!("failed to open sqlite table {:?}: {err}", config.name),
                })?)
            } else {
                let path = path.as_ref().ok_or_else(|| ServerError::ConfigurationError {
                    reason: format!("sqlite table {:?} needs either path or in_memory: true", config.name),
                })?;

                if let Some(database) = databases.get(path) {
                    return Ok(BoxedTable::new(database.table(config.name.clone())));
                }

                if let Some(parent) = Path::new(path).parent().filter(|v| !v.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).map_err(|err| ServerError::StorageError {
                        reason: format!("failed to create directory for sqlite table {:?}: {err:?}", config.name),
                    })?;
                }
                let table = SqliteTable::open(path, config.name.clone()).map_err(|err| ServerError::StorageError {
                    reason: format!("failed to open sqlite table {:?}: {err}", config.name),
                })?;
                databases.insert(path.clone(), table.clone());
                BoxedTable::new(table)
            }
        },
    })
}
