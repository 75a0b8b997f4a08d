//! Shared test utilities for ftpgate core integration tests.
//!
//! Provides [`MemoryServer`], an in-memory FTP server that implements the
//! gateway's [`Connector`]/[`FtpTransport`] seam. It keeps a flat map of
//! absolute paths to nodes, formats `LIST` output the way a Unix `ls -l`
//! daemon does, and counts the commands tests care about.

// Each integration test is compiled as its own crate, so not every test file
// uses every function from this shared module. Suppress dead_code warnings.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use ftpgate_core::config::{Credentials, GatewaySettings};
use ftpgate_core::errors::TransportError;
use ftpgate_core::files::ListingParser;
use ftpgate_core::ftp::{
    Connector, FtpConnectionGateway, FtpGateway, FtpOperationsGateway, FtpTransport,
};

pub const USER: &str = "alice";
pub const PASSWORD: &str = "secret";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Dir,
    File(Vec<u8>),
    Symlink(String),
}

#[derive(Default)]
pub struct ServerState {
    pub nodes: BTreeMap<String, Node>,
    pub opened: usize,
    pub quits: usize,
    pub renames: usize,
    pub retrs: usize,
    /// Paths whose `DELE` is refused even though they exist.
    pub protected: HashSet<String>,
}

impl ServerState {
    fn node(&self, path: &str) -> Option<&Node> {
        self.nodes.get(path)
    }

    /// Follow a symlink chain to the final node path.
    fn resolve_link(&self, path: &str) -> String {
        let mut current = path.to_string();
        for _ in 0..8 {
            match self.nodes.get(&current) {
                Some(Node::Symlink(target)) => current = absolute(&parent_of(&current), target),
                _ => break,
            }
        }
        current
    }

    /// Resolve links in every component but the last, the way a Unix
    /// daemon walks a path before acting on its final entry.
    fn resolve_parents(&self, path: &str) -> String {
        let Some((parent, name)) = path.rsplit_once('/') else {
            return path.to_string();
        };
        if name.is_empty() {
            return path.to_string();
        }
        let mut current = "/".to_string();
        for part in parent.split('/').filter(|p| !p.is_empty()) {
            current = self.resolve_link(&join(&current, part));
        }
        join(&current, name)
    }

    fn is_dir(&self, path: &str) -> bool {
        matches!(self.node(&self.resolve_link(path)), Some(Node::Dir))
    }

    fn children(&self, dir: &str) -> Vec<(String, Node)> {
        let prefix = if dir == "/" {
            "/".to_string()
        } else {
            format!("{dir}/")
        };
        self.nodes
            .iter()
            .filter(|(path, _)| {
                path.len() > prefix.len()
                    && path.starts_with(&prefix)
                    && !path[prefix.len()..].contains('/')
            })
            .map(|(path, node)| (path[prefix.len()..].to_string(), node.clone()))
            .collect()
    }
}

/// In-memory FTP server. Clones share state.
#[derive(Clone)]
pub struct MemoryServer {
    state: Arc<Mutex<ServerState>>,
}

impl MemoryServer {
    pub fn new() -> Self {
        let mut state = ServerState::default();
        state.nodes.insert("/".to_string(), Node::Dir);
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap()
    }

    pub fn dir(self, path: &str) -> Self {
        self.state().nodes.insert(path.to_string(), Node::Dir);
        self
    }

    pub fn file(self, path: &str, content: &[u8]) -> Self {
        self.state()
            .nodes
            .insert(path.to_string(), Node::File(content.to_vec()));
        self
    }

    pub fn symlink(self, path: &str, target: &str) -> Self {
        self.state()
            .nodes
            .insert(path.to_string(), Node::Symlink(target.to_string()));
        self
    }

    pub fn protect(self, path: &str) -> Self {
        self.state().protected.insert(path.to_string());
        self
    }

    pub fn exists(&self, path: &str) -> bool {
        self.state().nodes.contains_key(path)
    }

    pub fn content(&self, path: &str) -> Option<Vec<u8>> {
        match self.state().nodes.get(path) {
            Some(Node::File(data)) => Some(data.clone()),
            _ => None,
        }
    }

    pub fn opened(&self) -> usize {
        self.state().opened
    }

    pub fn quits(&self) -> usize {
        self.state().quits
    }

    pub fn renames(&self) -> usize {
        self.state().renames
    }

    pub fn retrs(&self) -> usize {
        self.state().retrs
    }
}

impl Connector for MemoryServer {
    fn open(
        &self,
        _host: &str,
        _port: u16,
        _use_tls: bool,
        _connect_timeout: Duration,
    ) -> Result<Box<dyn FtpTransport>, TransportError> {
        self.state().opened += 1;
        Ok(Box::new(MemorySession {
            server: self.clone(),
            cwd: "/".to_string(),
            logged_in: false,
        }))
    }
}

struct MemorySession {
    server: MemoryServer,
    cwd: String,
    logged_in: bool,
}

fn reply(code: u32, message: &str) -> TransportError {
    TransportError::Reply {
        code,
        message: message.to_string(),
    }
}

fn not_found() -> TransportError {
    reply(550, "No such file or directory")
}

fn parent_of(path: &str) -> String {
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => path[..idx].to_string(),
    }
}

fn join(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Resolve `path` against `cwd` into a normalized absolute path.
fn absolute(cwd: &str, path: &str) -> String {
    let joined = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("{cwd}/{path}")
    };
    let mut parts: Vec<&str> = Vec::new();
    for part in joined.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    format!("/{}", parts.join("/"))
}

fn list_line(name: &str, node: &Node) -> String {
    match node {
        Node::Dir => format!("drwxr-xr-x 2 {USER} staff 4096 Jan 15 12:30 {name}"),
        Node::File(data) => format!(
            "-rw-r--r-- 1 {USER} staff {} Mar  3  2023 {name}",
            data.len()
        ),
        Node::Symlink(target) => format!(
            "lrwxrwxrwx 1 {USER} staff {} Jan 15  2023 {name} -> {target}",
            target.len()
        ),
    }
}

impl MemorySession {
    /// Absolute path with intermediate links resolved. Takes the state
    /// lock, so call it before locking.
    fn path(&self, path: &str) -> String {
        self.server
            .state()
            .resolve_parents(&absolute(&self.cwd, path))
    }

    fn require_login(&self) -> Result<(), TransportError> {
        if self.logged_in {
            Ok(())
        } else {
            Err(reply(530, "Please login with USER and PASS"))
        }
    }
}

impl FtpTransport for MemorySession {
    fn login(&mut self, username: &str, password: &str) -> Result<(), TransportError> {
        if username == USER && password == PASSWORD {
            self.logged_in = true;
            Ok(())
        } else {
            Err(reply(530, "Login incorrect"))
        }
    }

    fn set_passive(&mut self, _passive: bool) {}

    fn set_operation_timeout(&mut self, _timeout: Duration) -> Result<(), TransportError> {
        Ok(())
    }

    fn set_binary(&mut self) -> Result<(), TransportError> {
        self.require_login()
    }

    fn pwd(&mut self) -> Result<String, TransportError> {
        self.require_login()?;
        Ok(self.cwd.clone())
    }

    fn cwd(&mut self, path: &str) -> Result<(), TransportError> {
        self.require_login()?;
        let target = self.path(path);
        if self.server.state().is_dir(&target) {
            self.cwd = target;
            Ok(())
        } else {
            Err(not_found())
        }
    }

    fn list(&mut self, path: Option<&str>) -> Result<Vec<String>, TransportError> {
        self.require_login()?;
        let target = self.path(path.unwrap_or("."));
        let state = self.server.state();
        let resolved = state.resolve_link(&target);
        match state.node(&resolved) {
            Some(Node::Dir) => {
                let children = state.children(&resolved);
                let mut lines = vec![
                    format!("total {}", children.len()),
                    list_line(".", &Node::Dir),
                    list_line("..", &Node::Dir),
                ];
                lines.extend(children.iter().map(|(name, node)| list_line(name, node)));
                Ok(lines)
            }
            Some(node) => {
                let name = target.rsplit('/').next().unwrap_or_default();
                Ok(vec![list_line(name, node)])
            }
            None => Err(reply(450, "No such file or directory")),
        }
    }

    fn retr(&mut self, path: &str) -> Result<Vec<u8>, TransportError> {
        self.require_login()?;
        let target = self.path(path);
        let mut state = self.server.state();
        state.retrs += 1;
        match state.node(&state.resolve_link(&target)) {
            Some(Node::File(data)) => Ok(data.clone()),
            _ => Err(not_found()),
        }
    }

    fn put(&mut self, path: &str, data: &[u8]) -> Result<u64, TransportError> {
        self.require_login()?;
        let target = self.path(path);
        let mut state = self.server.state();
        if !state.is_dir(&parent_of(&target)) || state.is_dir(&target) {
            return Err(reply(553, "Could not create file"));
        }
        state.nodes.insert(target, Node::File(data.to_vec()));
        Ok(data.len() as u64)
    }

    fn size(&mut self, path: &str) -> Result<u64, TransportError> {
        self.require_login()?;
        let target = self.path(path);
        let state = self.server.state();
        match state.node(&state.resolve_link(&target)) {
            Some(Node::File(data)) => Ok(data.len() as u64),
            _ => Err(reply(550, "Could not get file size")),
        }
    }

    fn mkdir(&mut self, path: &str) -> Result<(), TransportError> {
        self.require_login()?;
        let target = self.path(path);
        let mut state = self.server.state();
        if state.nodes.contains_key(&target) || !state.is_dir(&parent_of(&target)) {
            return Err(reply(550, "Create directory operation failed"));
        }
        state.nodes.insert(target, Node::Dir);
        Ok(())
    }

    fn rmdir(&mut self, path: &str) -> Result<(), TransportError> {
        self.require_login()?;
        let target = self.path(path);
        let mut state = self.server.state();
        if target == "/" || state.node(&target) != Some(&Node::Dir) {
            return Err(not_found());
        }
        if !state.children(&target).is_empty() {
            return Err(reply(550, "Directory not empty"));
        }
        state.nodes.remove(&target);
        Ok(())
    }

    fn rm(&mut self, path: &str) -> Result<(), TransportError> {
        self.require_login()?;
        let target = self.path(path);
        let mut state = self.server.state();
        if state.protected.contains(&target) {
            return Err(reply(550, "Permission denied"));
        }
        match state.node(&target) {
            Some(Node::File(_)) | Some(Node::Symlink(_)) => {
                state.nodes.remove(&target);
                Ok(())
            }
            _ => Err(not_found()),
        }
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), TransportError> {
        self.require_login()?;
        let from = self.path(from);
        let to = self.path(to);
        let mut state = self.server.state();
        state.renames += 1;
        if !state.nodes.contains_key(&from) {
            return Err(not_found());
        }
        let prefix = format!("{from}/");
        let moved: Vec<String> = state
            .nodes
            .keys()
            .filter(|path| **path == from || path.starts_with(&prefix))
            .cloned()
            .collect();
        for old in moved {
            if let Some(node) = state.nodes.remove(&old) {
                let new = format!("{to}{}", &old[from.len()..]);
                state.nodes.insert(new, node);
            }
        }
        Ok(())
    }

    fn quit(&mut self) -> Result<(), TransportError> {
        self.server.state().quits += 1;
        Ok(())
    }
}

/// Credentials the memory server accepts.
pub fn credentials() -> Credentials {
    Credentials::new("ftp.example.com", 21, USER, PASSWORD)
}

/// Async façade over `server`.
pub fn gateway(server: &MemoryServer) -> FtpGateway {
    FtpGateway::new(Arc::new(server.clone()), GatewaySettings::default())
}

/// Connected operations gateway with a fixed listing year.
pub fn operations(server: &MemoryServer) -> FtpOperationsGateway {
    operations_with(server, GatewaySettings::default())
}

/// Like [`operations`], with custom settings.
pub fn operations_with(server: &MemoryServer, settings: GatewaySettings) -> FtpOperationsGateway {
    let mut connection =
        FtpConnectionGateway::new(Arc::new(server.clone()), settings, tracing::Span::none());
    let result = connection.connect(&credentials());
    assert!(result.success, "connect failed: {}", result.message);
    FtpOperationsGateway::with_parser(connection, ListingParser::with_current_year(2024))
}

/// A small website tree used by most tests.
pub fn site() -> MemoryServer {
    MemoryServer::new()
        .dir("/site")
        .dir("/site/images")
        .dir("/site/releases")
        .dir("/site/releases/v2")
        .file("/site/releases/v2/app.js", b"console.log(2)")
        .file("/site/index.html", b"<h1>hi</h1>")
        .file("/site/About.txt", b"about")
        .file("/site/images/logo.png", &[0x89, 0x50, 0x4e, 0x47])
        .symlink("/site/current", "/site/releases/v2")
        .symlink("/site/home.html", "index.html")
}
