//! In-process RESP server understanding the handful of commands the cache
//! store sends.

use cachedns_infrastructure::dns::cache::RespValue;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Default)]
struct State {
    values: HashMap<String, Vec<u8>>,
    commands: Vec<Vec<String>>,
}

pub struct MockRedisServer {
    addr: SocketAddr,
    state: Arc<Mutex<State>>,
    connections: Arc<AtomicUsize>,
    password: Option<String>,
    task: tokio::task::JoinHandle<()>,
}

impl MockRedisServer {
    pub async fn start() -> std::io::Result<Self> {
        Self::start_with(None, false).await
    }

    pub async fn with_password(password: &str) -> std::io::Result<Self> {
        Self::start_with(Some(password.to_string()), false).await
    }

    /// Accepts connections and never answers.
    pub async fn unresponsive() -> std::io::Result<Self> {
        Self::start_with(None, true).await
    }

    async fn start_with(password: Option<String>, mute: bool) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(Mutex::new(State::default()));
        let connections = Arc::new(AtomicUsize::new(0));

        let task = {
            let state = Arc::clone(&state);
            let connections = Arc::clone(&connections);
            let password = password.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    connections.fetch_add(1, Ordering::SeqCst);
                    let state = Arc::clone(&state);
                    let password = password.clone();
                    tokio::spawn(serve(stream, state, password, mute));
                }
            })
        };

        Ok(Self {
            addr,
            state,
            connections,
            password,
            task,
        })
    }

    pub fn url(&self) -> String {
        match &self.password {
            Some(password) => format!("redis://:{}@{}", password, self.addr),
            None => format!("redis://{}", self.addr),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url_without_password(&self) -> String {
        format!("redis://{}", self.addr)
    }

    pub fn raw_value(&self, key: &str) -> Option<Vec<u8>> {
        self.state.lock().unwrap().values.get(key).cloned()
    }

    pub fn put_raw(&self, key: &str, value: &[u8]) {
        self.state
            .lock()
            .unwrap()
            .values
            .insert(key.to_string(), value.to_vec());
    }

    pub fn commands(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

impl Drop for MockRedisServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(
    mut stream: TcpStream,
    state: Arc<Mutex<State>>,
    password: Option<String>,
    mute: bool,
) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let mut authenticated = password.is_none();

    loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        if mute {
            continue;
        }

        while let Ok(Some((value, used))) = RespValue::parse(&buf) {
            buf.drain(..used);
            let args = match value {
                RespValue::Array(Some(items)) => items
                    .iter()
                    .map(|item| {
                        String::from_utf8_lossy(item.as_bytes().unwrap_or_default()).into_owned()
                    })
                    .collect::<Vec<_>>(),
                _ => return,
            };

            let reply = {
                let mut state = state.lock().unwrap();
                state.commands.push(args.clone());
                respond(&mut state, &args, password.as_deref(), &mut authenticated)
            };
            if stream.write_all(&reply.encode()).await.is_err() {
                return;
            }
        }
    }
}

fn respond(
    state: &mut State,
    args: &[String],
    password: Option<&str>,
    authenticated: &mut bool,
) -> RespValue {
    let command = args.first().map(|c| c.to_ascii_uppercase()).unwrap_or_default();
    if command == "AUTH" {
        let given = args.last().map(String::as_str);
        return if given == password {
            *authenticated = true;
            RespValue::SimpleString("OK".to_string())
        } else {
            RespValue::Error("WRONGPASS invalid username-password pair".to_string())
        };
    }
    if !*authenticated {
        return RespValue::Error("NOAUTH Authentication required.".to_string());
    }

    match (command.as_str(), args.len()) {
        ("PING", _) => RespValue::SimpleString("PONG".to_string()),
        ("SELECT", 2) => RespValue::SimpleString("OK".to_string()),
        ("GET", 2) => RespValue::BulkString(state.values.get(&args[1]).cloned()),
        ("SET", n) if n >= 3 => {
            state
                .values
                .insert(args[1].clone(), args[2].clone().into_bytes());
            RespValue::SimpleString("OK".to_string())
        }
        _ => RespValue::Error(format!("ERR unknown command '{}'", command)),
    }
}
