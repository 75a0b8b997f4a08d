use std::sync::Arc;

use base64::Engine as _;
use ftpgate_core::config::Credentials;
use ftpgate_core::files::{OperationResult, RemoteFiles};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::AgentConfig;
use crate::protocol::errors;
use crate::protocol::messages::{JsonRpcErrorResponse, JsonRpcRequest, JsonRpcResponse};
use crate::protocol::methods::{
    AuthStatusResult, DeleteParams, EncodedFile, LoginParams, PathParams, RenameParams,
    TreeParams, WriteParams,
};
use crate::session::store::CredentialStore;

/// Dispatcher handles incoming JSON-RPC requests and routes them
/// to the appropriate handler function.
pub struct Dispatcher {
    files: Arc<dyn RemoteFiles>,
    credentials: Arc<CredentialStore>,
    config: AgentConfig,
}

/// The result of dispatching a request: either a success or error response.
pub enum DispatchResult {
    Success(JsonRpcResponse),
    Error(JsonRpcErrorResponse),
}

impl DispatchResult {
    /// Serialize the result to a JSON `Value`.
    pub fn to_json(&self) -> serde_json::Result<Value> {
        match self {
            Self::Success(resp) => serde_json::to_value(resp),
            Self::Error(resp) => serde_json::to_value(resp),
        }
    }
}

impl Dispatcher {
    pub fn new(
        files: Arc<dyn RemoteFiles>,
        credentials: Arc<CredentialStore>,
        config: AgentConfig,
    ) -> Self {
        Self {
            files,
            credentials,
            config,
        }
    }

    /// Dispatch a parsed JSON-RPC request to the appropriate handler.
    pub async fn dispatch(&self, request: JsonRpcRequest) -> DispatchResult {
        let method = request.method.as_str();
        debug!("Dispatching method: {}", method);

        match method {
            "auth.login" => self.handle_login(request).await,
            "auth.logout" => self.handle_logout(request).await,
            "auth.status" => self.handle_status(request).await,
            "files.list"
            | "files.tree"
            | "files.read"
            | "files.write"
            | "files.createFile"
            | "files.createFolder"
            | "files.rename"
            | "files.delete"
            | "files.isDirectory" => self.handle_files(request).await,
            _ => {
                warn!("Unknown method: {}", method);
                let message = format!("Method not found: {method}");
                DispatchResult::Error(JsonRpcErrorResponse::new(
                    request.id,
                    errors::METHOD_NOT_FOUND,
                    message,
                ))
            }
        }
    }

    // ── auth.* ──────────────────────────────────────────────────────

    async fn handle_login(&self, request: JsonRpcRequest) -> DispatchResult {
        let id = request.id.clone();
        let params: LoginParams = match parse_params(&request) {
            Ok(p) => p,
            Err(e) => return e,
        };

        let Some(credentials) = params.credentials.resolve(self.config.server.as_ref()) else {
            return DispatchResult::Error(JsonRpcErrorResponse::new(
                id,
                errors::INCOMPLETE_CREDENTIALS,
                "No FTP host given and none configured",
            ));
        };

        let result = self.files.login(&credentials).await;
        if result.success {
            info!(
                "Signed in as {} on {}:{}",
                credentials.username, credentials.host, credentials.port
            );
            self.credentials.store(credentials).await;
        } else {
            self.credentials.clear().await;
        }
        respond(id, &result)
    }

    async fn handle_logout(&self, request: JsonRpcRequest) -> DispatchResult {
        if self.credentials.clear().await {
            info!("Signed out");
        }
        respond(request.id, &OperationResult::<()>::done("Logged out"))
    }

    async fn handle_status(&self, request: JsonRpcRequest) -> DispatchResult {
        let status = match self.credentials.get().await {
            Some(creds) => AuthStatusResult {
                logged_in: true,
                host: Some(creds.host),
                username: Some(creds.username),
            },
            None => AuthStatusResult {
                logged_in: false,
                host: None,
                username: None,
            },
        };
        respond(request.id, &status)
    }

    // ── files.* ─────────────────────────────────────────────────────

    async fn handle_files(&self, request: JsonRpcRequest) -> DispatchResult {
        let Some(creds) = self.credentials.get().await else {
            return DispatchResult::Error(JsonRpcErrorResponse::new(
                request.id,
                errors::NOT_LOGGED_IN,
                "Not logged in. Call auth.login first",
            ));
        };

        let creds = &creds;

        match request.method.as_str() {
            "files.list" => self.handle_list(creds, request).await,
            "files.tree" => self.handle_tree(creds, request).await,
            "files.read" => self.handle_read(creds, request).await,
            "files.write" => self.handle_write(creds, request).await,
            "files.createFile" => {
                with_params(request, |p: PathParams| async move {
                    self.files.create_file(creds, &p.path).await
                })
                .await
            }
            "files.createFolder" => {
                with_params(request, |p: PathParams| async move {
                    self.files.create_folder(creds, &p.path).await
                })
                .await
            }
            "files.rename" => {
                with_params(request, |p: RenameParams| async move {
                    self.files.rename(creds, &p.old_path, &p.new_path).await
                })
                .await
            }
            "files.delete" => {
                with_params(request, |p: DeleteParams| async move {
                    self.files.delete(creds, p.paths).await
                })
                .await
            }
            _ => {
                with_params(request, |p: PathParams| async move {
                    self.files.is_directory(creds, &p.path).await
                })
                .await
            }
        }
    }

    async fn handle_list(&self, creds: &Credentials, request: JsonRpcRequest) -> DispatchResult {
        let id = request.id.clone();
        let params: PathParams = match parse_params(&request) {
            Ok(p) => p,
            Err(e) => return e,
        };
        respond(id, &self.files.list_directory(creds, &params.path).await)
    }

    async fn handle_tree(&self, creds: &Credentials, request: JsonRpcRequest) -> DispatchResult {
        let id = request.id.clone();
        let params: TreeParams = match parse_params(&request) {
            Ok(p) => p,
            Err(e) => return e,
        };
        let result = self
            .files
            .get_tree(creds, &params.path, params.max_depth)
            .await;
        respond(id, &result)
    }

    async fn handle_read(&self, creds: &Credentials, request: JsonRpcRequest) -> DispatchResult {
        let id = request.id.clone();
        let params: PathParams = match parse_params(&request) {
            Ok(p) => p,
            Err(e) => return e,
        };

        let result = self.files.read_file(creds, &params.path).await;
        let limit = self.config.max_read_bytes;
        if let Some(file) = &result.data {
            if file.size > limit {
                warn!("Refusing to return {} ({} bytes > {limit})", file.path, file.size);
                let refused = OperationResult::<()>::fail(format!(
                    "File is too large to open ({} bytes, limit {limit})",
                    file.size
                ));
                return respond(id, &refused);
            }
        }
        respond(id, &result.map(EncodedFile::from))
    }

    async fn handle_write(&self, creds: &Credentials, request: JsonRpcRequest) -> DispatchResult {
        let id = request.id.clone();
        let params: WriteParams = match parse_params(&request) {
            Ok(p) => p,
            Err(e) => return e,
        };

        let content = match base64::engine::general_purpose::STANDARD.decode(&params.content) {
            Ok(bytes) => bytes,
            Err(e) => {
                return DispatchResult::Error(JsonRpcErrorResponse::new(
                    id,
                    errors::INVALID_PARAMS,
                    format!("Invalid files.write content: {e}"),
                ));
            }
        };

        respond(id, &self.files.write_file(creds, &params.path, content).await)
    }
}

/// Deserialize `params`, or build the `INVALID_PARAMS` error response.
fn parse_params<P: DeserializeOwned>(request: &JsonRpcRequest) -> Result<P, DispatchResult> {
    serde_json::from_value(request.params.clone()).map_err(|e| {
        DispatchResult::Error(JsonRpcErrorResponse::new(
            request.id.clone(),
            errors::INVALID_PARAMS,
            format!("Invalid {} params: {e}", request.method),
        ))
    })
}

/// Parse params, run `call`, and respond with its result.
async fn with_params<P, T, F, Fut>(request: JsonRpcRequest, call: F) -> DispatchResult
where
    P: DeserializeOwned,
    T: Serialize,
    F: FnOnce(P) -> Fut,
    Fut: std::future::Future<Output = OperationResult<T>>,
{
    match parse_params::<P>(&request) {
        Ok(params) => respond(request.id, &call(params).await),
        Err(e) => e,
    }
}

/// Wrap a serializable result in a success response.
fn respond<T: Serialize>(id: Value, result: &T) -> DispatchResult {
    match serde_json::to_value(result) {
        Ok(value) => DispatchResult::Success(JsonRpcResponse::new(id, value)),
        Err(e) => DispatchResult::Error(JsonRpcErrorResponse::new(
            id,
            errors::INTERNAL_ERROR,
            format!("Failed to serialize result: {e}"),
        )),
    }
}
