//! JSON-RPC client for the local signing bridge.
//!
//! The bridge fronts the user's wallet: it reports the connected address,
//! drives the connect prompt, and builds, simulates, signs and sends the
//! create-pool transaction. One [`BridgeClient`] implements both
//! [`WalletGateway`] and [`ContractGateway`].
//!
//! Every call is a single attempt. Failures are returned to the controller,
//! which leaves retrying to the user.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::Config;
use crate::errors::{Result, SubmitterError};
use crate::form::CreatePoolRequest;
use crate::gateway::{
    explorer_tx_url, ContractGateway, CreatePoolResponse, GatewayError, WalletGateway,
};

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: Option<Value>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    pub data: Option<Value>,
}

impl From<RpcError> for GatewayError {
    fn from(e: RpcError) -> Self {
        GatewayError {
            message: e.message,
            code: Some(e.code),
            data: e.data,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AddressResult {
    address: Option<String>,
}

// ─────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────

pub struct BridgeClient {
    client: Client,
    bridge_url: String,
    contract_id: String,
    explorer_url: String,
    network: String,
}

impl BridgeClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder().timeout(config.http_timeout()).build()?;
        Ok(Self {
            client,
            bridge_url: config.bridge_url.clone(),
            contract_id: config.contract_id.clone(),
            explorer_url: config.explorer_url.clone(),
            network: config.network.clone(),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> std::result::Result<T, GatewayError> {
        let body = self.send(method, params).await?;
        let value = into_result(body)?;
        serde_json::from_value(value).map_err(|e| GatewayError::from(SubmitterError::from(e)))
    }

    async fn send(&self, method: &str, params: Value) -> Result<RpcResponse> {
        debug!("Bridge call {method}");
        let response = self
            .client
            .post(&self.bridge_url)
            .json(&request_body(method, params))
            .send()
            .await?;
        let status_error = response.error_for_status_ref().err();
        let bytes = response.bytes().await?;
        decode_envelope(&bytes, status_error)
    }
}

/// Decode a bridge reply. A JSON-RPC `error` envelope is returned even on a
/// non-2xx status so its wording reaches the classifier; otherwise a bad
/// status wins.
fn decode_envelope(bytes: &[u8], status_error: Option<reqwest::Error>) -> Result<RpcResponse> {
    match (serde_json::from_slice::<RpcResponse>(bytes), status_error) {
        (Ok(body), None) => Ok(body),
        (Ok(body), Some(_)) if body.error.is_some() => Ok(body),
        (_, Some(e)) => Err(e.into()),
        (Err(e), None) => Err(e.into()),
    }
}

fn request_body(method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params,
    })
}

/// Unwrap a JSON-RPC envelope. An `error` object wins over any `result`.
fn into_result(body: RpcResponse) -> std::result::Result<Value, GatewayError> {
    if let Some(err) = body.error {
        return Err(err.into());
    }
    body.result.ok_or_else(|| {
        SubmitterError::Bridge("Empty result from bridge".to_string()).into()
    })
}

#[async_trait]
impl WalletGateway for BridgeClient {
    async fn identity(&self) -> std::result::Result<Option<String>, GatewayError> {
        let res: AddressResult = self.call("getAddress", json!({})).await?;
        Ok(res.address)
    }

    async fn connect(&self) -> std::result::Result<Option<String>, GatewayError> {
        let res: AddressResult = self.call("connect", json!({})).await?;
        Ok(res.address)
    }
}

#[async_trait]
impl ContractGateway for BridgeClient {
    async fn create_pool(
        &self,
        request: &CreatePoolRequest,
    ) -> std::result::Result<CreatePoolResponse, GatewayError> {
        self.call(
            "createPool",
            json!({
                "contractId": self.contract_id,
                "request": request,
            }),
        )
        .await
    }

    fn explorer_url(&self, tx_hash: &str) -> String {
        explorer_tx_url(&self.explorer_url, &self.network, tx_hash)
    }
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use crate::classifier::{classify, ErrorKind};

    fn envelope(raw: &str) -> RpcResponse {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn request_envelope_shape() {
        let body = request_body("createPool", json!({"contractId": "CPOOL"}));
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["method"], "createPool");
        assert_eq!(body["params"]["contractId"], "CPOOL");
    }

    #[test]
    fn rpc_error_keeps_code_and_data() {
        let body = envelope(
            r#"{"error":{"code":4001,"message":"User rejected the request","data":{"reason":"closed"}}}"#,
        );
        let err = into_result(body).unwrap_err();
        assert_eq!(err.message, "User rejected the request");
        assert_eq!(err.code, Some(4001));
        assert_eq!(err.data, Some(json!({"reason": "closed"})));
    }

    #[test]
    fn missing_result_is_an_error() {
        let err = into_result(envelope(r#"{"jsonrpc":"2.0","id":1}"#)).unwrap_err();
        assert_eq!(err.message, "Bridge error: Empty result from bridge");
        assert_eq!(err.code, None);
    }

    #[test]
    fn create_pool_result_decodes() {
        let value = into_result(envelope(
            r#"{"result":{"txHash":"9f2c","poolId":12}}"#,
        ))
        .unwrap();
        let res: CreatePoolResponse = serde_json::from_value(value).unwrap();
        assert_eq!(res.tx_hash, "9f2c");
        assert_eq!(res.pool_id, Some(12));
    }

    #[test]
    fn null_address_means_no_wallet() {
        let value = into_result(envelope(r#"{"result":{"address":null}}"#)).unwrap();
        let res: AddressResult = serde_json::from_value(value).unwrap();
        assert_eq!(res.address, None);
    }

    fn config(bridge_url: &str) -> Config {
        Config {
            bridge_url: bridge_url.to_string(),
            contract_id: "CPOOL".to_string(),
            network: "testnet".to_string(),
            explorer_url: "https://stellar.expert/explorer".to_string(),
            api_port: 3002,
            submit_timeout_secs: 120,
            http_timeout_secs: 10,
        }
    }

    /// Serve exactly one HTTP request with `status` and `body`.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            let reply = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}")
    }

    /// Read headers and the full body so the client never sees a reset.
    async fn read_request(socket: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    return;
                }
            }
        }
    }

    fn pool_request() -> CreatePoolRequest {
        CreatePoolRequest {
            name: "Reef".to_string(),
            description: "Corals".to_string(),
            external_url: "https://reef.org".to_string(),
            image_hash: "bafy".to_string(),
            target_amount: "10".to_string(),
            deadline: 1_700_000_000,
        }
    }

    #[tokio::test]
    async fn error_envelope_on_server_error_reaches_classifier() {
        let url = serve_once(
            "500 Internal Server Error",
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"Simulation failed: Error(Contract, #3)"}}"#,
        )
        .await;
        let client = BridgeClient::new(&config(&url)).unwrap();

        let err = client.create_pool(&pool_request()).await.unwrap_err();
        assert_eq!(err.message, "Simulation failed: Error(Contract, #3)");
        assert_eq!(err.code, Some(-32000));
        assert_eq!(classify(&err).kind, ErrorKind::SimulationFailure);
    }

    #[tokio::test]
    async fn non_envelope_server_error_reports_status() {
        let url = serve_once("502 Bad Gateway", "upstream down").await;
        let client = BridgeClient::new(&config(&url)).unwrap();

        let err = client.create_pool(&pool_request()).await.unwrap_err();
        assert!(err.message.contains("502"), "got {}", err.message);
        assert_eq!(err.code, None);
    }

    #[tokio::test]
    async fn successful_create_pool_over_http() {
        let url = serve_once(
            "200 OK",
            r#"{"jsonrpc":"2.0","id":1,"result":{"txHash":"9f2c","poolId":12}}"#,
        )
        .await;
        let client = BridgeClient::new(&config(&url)).unwrap();

        let res = client.create_pool(&pool_request()).await.unwrap();
        assert_eq!(res.tx_hash, "9f2c");
        assert_eq!(res.pool_id, Some(12));
    }

    #[tokio::test]
    async fn identity_over_http() {
        let url = serve_once("200 OK", r#"{"jsonrpc":"2.0","id":1,"result":{"address":"GABC"}}"#)
            .await;
        let client = BridgeClient::new(&config(&url)).unwrap();
        assert_eq!(client.identity().await.unwrap().as_deref(), Some("GABC"));
    }

    #[test]
    fn explorer_link_uses_configured_network() {
        let config = Config {
            bridge_url: "http://127.0.0.1:8787".to_string(),
            contract_id: "CPOOL".to_string(),
            network: "public".to_string(),
            explorer_url: "https://stellar.expert/explorer".to_string(),
            api_port: 3002,
            submit_timeout_secs: 120,
            http_timeout_secs: 150,
        };
        let client = BridgeClient::new(&config).unwrap();
        assert_eq!(
            client.explorer_url("abc"),
            "https://stellar.expert/explorer/public/tx/abc"
        );
    }
}
