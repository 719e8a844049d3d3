//! Minimal Redis client: `GET` and `SET .. PX` over pooled TCP or TLS
//! connections.

use super::resp::{RedisError, RespValue};
use bytes::{Buf, BytesMut};
use rustls::pki_types::ServerName;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::debug;

const DEFAULT_PORT: u16 = 6379;
const READ_CHUNK: usize = 4096;

/// Built once and shared by every `rediss://` connection.
static TLS_CONFIG: LazyLock<Arc<rustls::ClientConfig>> = LazyLock::new(|| {
    let mut root_store = rustls::RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Arc::new(config)
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub database: u32,
    pub username: Option<String>,
    pub password: Option<String>,
    /// `rediss://`: wrap the connection in TLS, verified against the web PKI.
    pub tls: bool,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            database: 0,
            username: None,
            password: None,
            tls: false,
        }
    }
}

impl RedisConfig {
    /// Parses `redis[s]://[user[:password]@]host[:port][/db]`.
    ///
    /// Credentials may be percent-encoded. Userinfo without a colon is taken
    /// as a bare password.
    pub fn from_url(url: &str) -> Result<Self, RedisError> {
        let (tls, rest) = if let Some(rest) = url.strip_prefix("rediss://") {
            (true, rest)
        } else if let Some(rest) = url.strip_prefix("redis://") {
            (false, rest)
        } else {
            return Err(RedisError::InvalidUrl(
                "expected a redis:// or rediss:// URL".to_string(),
            ));
        };

        let mut config = Self {
            tls,
            ..Self::default()
        };

        let rest = if let Some((userinfo, rest)) = rest.rsplit_once('@') {
            match userinfo.split_once(':') {
                Some((user, password)) => {
                    if !user.is_empty() {
                        config.username = Some(percent_decode(user)?);
                    }
                    config.password = Some(percent_decode(password)?);
                }
                None if !userinfo.is_empty() => config.password = Some(percent_decode(userinfo)?),
                None => {}
            }
            rest
        } else {
            rest
        };

        let (host_port, database) = match rest.split_once('/') {
            Some((hp, db)) => (hp, Some(db)),
            None => (rest, None),
        };

        let (host, port) = split_host_port(host_port)?;
        if let Some(host) = host {
            config.host = host;
        }
        if let Some(port) = port {
            config.port = port;
        }

        if let Some(db) = database.filter(|db| !db.is_empty()) {
            config.database = db
                .parse()
                .map_err(|_| RedisError::InvalidUrl(format!("invalid database: {}", db)))?;
        }

        Ok(config)
    }

    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Decodes `%XX` escapes. Error messages never echo the input, which may
/// be a password.
fn percent_decode(input: &str) -> Result<String, RedisError> {
    let invalid = || RedisError::InvalidUrl("invalid percent-encoding in credentials".to_string());

    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3).ok_or_else(invalid)?;
            if !hex.iter().all(u8::is_ascii_hexdigit) {
                return Err(invalid());
            }
            let hex = std::str::from_utf8(hex).map_err(|_| invalid())?;
            decoded.push(u8::from_str_radix(hex, 16).map_err(|_| invalid())?);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(decoded).map_err(|_| invalid())
}

fn split_host_port(host_port: &str) -> Result<(Option<String>, Option<u16>), RedisError> {
    let parse_port = |port: &str| {
        port.parse::<u16>()
            .map_err(|_| RedisError::InvalidUrl(format!("invalid port: {}", port)))
    };

    if let Some(bracketed) = host_port.strip_prefix('[') {
        let (host, tail) = bracketed
            .split_once(']')
            .ok_or_else(|| RedisError::InvalidUrl(host_port.to_string()))?;
        let port = match tail.strip_prefix(':') {
            Some(port) => Some(parse_port(port)?),
            None => None,
        };
        return Ok((Some(host.to_string()), port));
    }

    match host_port.split_once(':') {
        Some((host, port)) => Ok((
            (!host.is_empty()).then(|| host.to_string()),
            Some(parse_port(port)?),
        )),
        None if host_port.is_empty() => Ok((None, None)),
        None => Ok((Some(host_port.to_string()), None)),
    }
}

trait RedisStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> RedisStream for T {}

async fn connect_stream(config: &RedisConfig) -> Result<Box<dyn RedisStream>, RedisError> {
    let tcp = TcpStream::connect(config.address()).await?;
    tcp.set_nodelay(true)?;
    if !config.tls {
        return Ok(Box::new(tcp));
    }

    let server_name = ServerName::try_from(config.host.clone()).map_err(|e| {
        RedisError::InvalidUrl(format!("invalid TLS server name '{}': {}", config.host, e))
    })?;
    let connector = tokio_rustls::TlsConnector::from(Arc::clone(&TLS_CONFIG));
    let stream = connector.connect(server_name, tcp).await?;
    Ok(Box::new(stream))
}

/// One authenticated connection with its read buffer.
struct RedisConnection {
    stream: Box<dyn RedisStream>,
    buffer: BytesMut,
}

impl RedisConnection {
    async fn open(config: &RedisConfig) -> Result<Self, RedisError> {
        let stream = connect_stream(config).await?;
        let mut conn = Self {
            stream,
            buffer: BytesMut::with_capacity(READ_CHUNK),
        };

        if let Some(password) = &config.password {
            let reply = match &config.username {
                Some(user) => {
                    conn.request(&[b"AUTH", user.as_bytes(), password.as_bytes()])
                        .await?
                }
                None => conn.request(&[b"AUTH", password.as_bytes()]).await?,
            };
            expect_ok(reply)?;
        }

        if config.database != 0 {
            let db = config.database.to_string();
            expect_ok(conn.request(&[b"SELECT", db.as_bytes()]).await?)?;
        }

        debug!(
            address = %config.address(),
            db = config.database,
            tls = config.tls,
            "Redis connection established"
        );
        Ok(conn)
    }

    async fn request(&mut self, args: &[&[u8]]) -> Result<RespValue, RedisError> {
        self.stream
            .write_all(&RespValue::command(args).encode())
            .await?;
        self.stream.flush().await?;
        self.read_value().await
    }

    async fn read_value(&mut self) -> Result<RespValue, RedisError> {
        loop {
            if let Some((value, used)) = RespValue::parse(&self.buffer)? {
                self.buffer.advance(used);
                return match value {
                    RespValue::Error(msg) => Err(RedisError::Redis(msg)),
                    other => Ok(other),
                };
            }

            self.buffer.reserve(READ_CHUNK);
            if self.stream.read_buf(&mut self.buffer).await? == 0 {
                return Err(RedisError::ConnectionClosed);
            }
        }
    }
}

fn expect_ok(reply: RespValue) -> Result<(), RedisError> {
    if reply.is_ok() {
        Ok(())
    } else {
        Err(RedisError::Protocol(format!("expected +OK, got {:?}", reply)))
    }
}

/// Shared client. Connections are checked out per command and returned to
/// an idle pool on success; a connection that failed mid-command is dropped.
pub struct RedisClient {
    config: RedisConfig,
    idle: Mutex<Vec<RedisConnection>>,
    pool_size: usize,
    timeout: Duration,
}

impl RedisClient {
    pub fn new(config: RedisConfig, pool_size: usize, timeout: Duration) -> Self {
        Self {
            config,
            idle: Mutex::new(Vec::with_capacity(pool_size)),
            pool_size,
            timeout,
        }
    }

    pub fn from_url(url: &str, pool_size: usize, timeout: Duration) -> Result<Self, RedisError> {
        Ok(Self::new(RedisConfig::from_url(url)?, pool_size, timeout))
    }

    pub fn config(&self) -> &RedisConfig {
        &self.config
    }

    pub async fn idle_connections(&self) -> usize {
        self.idle.lock().await.len()
    }

    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, RedisError> {
        let reply = self.execute(&[b"GET", key.as_bytes()]).await?;
        if reply.is_null() {
            return Ok(None);
        }
        reply
            .as_bytes()
            .map(|data| Some(data.to_vec()))
            .ok_or_else(|| RedisError::Protocol(format!("GET returned {:?}", reply)))
    }

    /// `SET key value PX <ms>`
    pub async fn set_px(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), RedisError> {
        let millis = ttl.as_millis().max(1).to_string();
        let reply = self
            .execute(&[b"SET", key.as_bytes(), value, b"PX", millis.as_bytes()])
            .await?;
        expect_ok(reply)
    }

    pub async fn ping(&self) -> Result<(), RedisError> {
        match self.execute(&[b"PING"]).await? {
            RespValue::SimpleString(s) if s == "PONG" => Ok(()),
            other => Err(RedisError::Protocol(format!("PING returned {:?}", other))),
        }
    }

    async fn execute(&self, args: &[&[u8]]) -> Result<RespValue, RedisError> {
        tokio::time::timeout(self.timeout, self.execute_inner(args))
            .await
            .map_err(|_| RedisError::Timeout)?
    }

    async fn execute_inner(&self, args: &[&[u8]]) -> Result<RespValue, RedisError> {
        let pooled = self.idle.lock().await.pop();
        let mut conn = match pooled {
            Some(conn) => conn,
            None => RedisConnection::open(&self.config).await?,
        };

        let reply = conn.request(args).await;
        match &reply {
            Ok(_) | Err(RedisError::Redis(_)) => self.release(conn).await,
            Err(_) => {}
        }
        reply
    }

    async fn release(&self, conn: RedisConnection) {
        let mut idle = self.idle.lock().await;
        if idle.len() < self.pool_size {
            idle.push(conn);
        }
    }
}
