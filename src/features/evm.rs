//! Read-only contract calls.
//!
//! [`ContractReader`] is the port the address predictor uses for the vault
//! factory lookup. [`HttpContractReader`] speaks JSON-RPC `eth_call` with an
//! optional fallback endpoint. Each of its requests runs on a worker thread,
//! so concurrent calls overlap on the wire. [`MockContractReader`] answers
//! deterministically and counts calls, for tests and dry runs.

use crate::config::NetworkConfig;
use crate::deploy::abi::keccak256;
use alloy_primitives::Address;
use async_trait::async_trait;
use futures::channel::oneshot;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::Read;
use std::thread;
use thiserror::Error;

const MIN_RPC_RESPONSE_BYTES: u64 = 256;
const MAX_RPC_RESPONSE_BYTES: u64 = 2 * 1024 * 1024;

/// Transport or node failure, carried verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct RpcError(pub String);

#[async_trait(?Send)]
pub trait ContractReader {
    /// `eth_call` against `to` at the latest block; returns raw return data.
    async fn call(&self, to: Address, calldata: &[u8]) -> Result<Vec<u8>, RpcError>;
}

#[derive(Clone, Debug)]
pub struct HttpContractReader {
    rpc_url: String,
    fallback_rpc_url: Option<String>,
    max_response_bytes: u64,
}

impl HttpContractReader {
    pub fn new(rpc_url: impl Into<String>) -> Result<Self, RpcError> {
        let rpc_url = rpc_url.into();
        if rpc_url.trim().is_empty() {
            return Err(RpcError("evm rpc url is not configured".to_string()));
        }
        Ok(Self {
            rpc_url: rpc_url.trim().to_string(),
            fallback_rpc_url: None,
            max_response_bytes: MAX_RPC_RESPONSE_BYTES,
        })
    }

    pub fn from_network(network: &NetworkConfig) -> Result<Self, RpcError> {
        let rpc_url = network.rpc_url.as_deref().ok_or_else(|| {
            RpcError(format!(
                "evm rpc url is not configured for chain_id {}",
                network.chain_id
            ))
        })?;
        Ok(Self::new(rpc_url)?
            .with_fallback(network.fallback_rpc_url.clone())
            .with_max_response_bytes(network.rpc_max_response_bytes))
    }

    pub fn with_fallback(mut self, fallback_rpc_url: Option<String>) -> Self {
        self.fallback_rpc_url = fallback_rpc_url.filter(|url| !url.trim().is_empty());
        self
    }

    pub fn with_max_response_bytes(mut self, max_response_bytes: u64) -> Self {
        self.max_response_bytes = clamp_response_bytes(max_response_bytes);
        self
    }

    fn http_post(&self, body: &[u8]) -> Result<Vec<u8>, RpcError> {
        match self.try_http_post(&self.rpc_url, body) {
            Ok(body) => Ok(body),
            Err(primary_error) => match self.fallback_rpc_url.as_deref() {
                Some(fallback_url) => {
                    self.try_http_post(fallback_url, body)
                        .map_err(|fallback_error| {
                            RpcError(format!(
                                "primary rpc failed: {primary_error}; fallback rpc failed: {fallback_error}"
                            ))
                        })
                }
                None => Err(primary_error),
            },
        }
    }

    fn try_http_post(&self, url: &str, body: &[u8]) -> Result<Vec<u8>, RpcError> {
        let response = ureq::post(url)
            .set("content-type", "application/json")
            .send_bytes(body)
            .map_err(|error| match error {
                ureq::Error::Status(status, _) => {
                    RpcError(format!("evm rpc returned status {status}"))
                }
                ureq::Error::Transport(transport) => {
                    RpcError(format!("evm rpc transport failed: {transport}"))
                }
            })?;

        let mut raw = Vec::new();
        response
            .into_reader()
            .take(self.max_response_bytes.saturating_add(1))
            .read_to_end(&mut raw)
            .map_err(|error| RpcError(format!("failed to read rpc response body: {error}")))?;
        if u64::try_from(raw.len()).unwrap_or(u64::MAX) > self.max_response_bytes {
            return Err(RpcError(format!(
                "rpc response exceeded max_response_bytes={}",
                self.max_response_bytes
            )));
        }
        Ok(raw)
    }
}

#[async_trait(?Send)]
impl ContractReader for HttpContractReader {
    async fn call(&self, to: Address, calldata: &[u8]) -> Result<Vec<u8>, RpcError> {
        let body = eth_call_request_body(to, calldata)?;
        let worker = self.clone();
        let (sender, receiver) = oneshot::channel();
        thread::Builder::new()
            .name("eth-call".to_string())
            .spawn(move || {
                // the caller may have dropped the call
                let _ = sender.send(worker.http_post(&body));
            })
            .map_err(|error| RpcError(format!("failed to start rpc worker: {error}")))?;
        let raw = receiver
            .await
            .map_err(|_| RpcError("rpc worker exited without a response".to_string()))??;
        parse_eth_call_response(&raw)
    }
}

fn eth_call_request_body(to: Address, calldata: &[u8]) -> Result<Vec<u8>, RpcError> {
    serde_json::to_vec(&json!({
        "jsonrpc": "2.0",
        "method": "eth_call",
        "params": [
            {"to": format!("{to:#x}"), "data": format!("0x{}", hex::encode(calldata))},
            "latest"
        ],
        "id": 1
    }))
    .map_err(|error| RpcError(format!("failed to serialize eth_call request: {error}")))
}

fn parse_eth_call_response(raw: &[u8]) -> Result<Vec<u8>, RpcError> {
    let value: Value = serde_json::from_slice(raw)
        .map_err(|error| RpcError(format!("failed to parse eth_call response JSON: {error}")))?;
    if let Some(error) = value.get("error") {
        return Err(RpcError(format!("rpc returned error for eth_call: {error}")));
    }
    let result = value
        .get("result")
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError("eth_call result was missing".to_string()))?;
    let without_prefix = result
        .trim()
        .strip_prefix("0x")
        .ok_or_else(|| RpcError("eth_call result must be 0x-prefixed hex".to_string()))?;
    hex::decode(without_prefix)
        .map_err(|error| RpcError(format!("eth_call result is not valid hex: {error}")))
}

fn clamp_response_bytes(max_response_bytes: u64) -> u64 {
    max_response_bytes.clamp(MIN_RPC_RESPONSE_BYTES, MAX_RPC_RESPONSE_BYTES)
}

/// Answers every call with a word-encoded address derived from the calldata,
/// unless a canned response or failure was registered for that calldata.
#[derive(Debug, Default)]
pub struct MockContractReader {
    responses: BTreeMap<Vec<u8>, Result<Vec<u8>, RpcError>>,
    calls: RefCell<Vec<(Address, Vec<u8>)>>,
}

impl MockContractReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&mut self, calldata: Vec<u8>, response: Result<Vec<u8>, RpcError>) {
        self.responses.insert(calldata, response);
    }

    pub fn calls(&self) -> Vec<(Address, Vec<u8>)> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// The address the mock returns for `(to, calldata)` when no response is
    /// registered.
    pub fn derived_address(to: Address, calldata: &[u8]) -> Address {
        let mut preimage = to.to_vec();
        preimage.extend_from_slice(calldata);
        Address::from_word(keccak256(preimage))
    }
}

#[async_trait(?Send)]
impl ContractReader for MockContractReader {
    async fn call(&self, to: Address, calldata: &[u8]) -> Result<Vec<u8>, RpcError> {
        self.calls.borrow_mut().push((to, calldata.to_vec()));
        if let Some(response) = self.responses.get(calldata) {
            return response.clone();
        }
        Ok(Self::derived_address(to, calldata).into_word().to_vec())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use futures::future::join_all;
    use std::io::Write;
    use std::net::{TcpListener, TcpStream};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Loopback JSON-RPC node that holds every request for `delay` and
    /// records how many were open at once.
    pub(crate) struct SlowRpcNode {
        url: String,
        max_in_flight: Arc<AtomicUsize>,
    }

    impl SlowRpcNode {
        pub(crate) fn start(delay: Duration) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").expect("loopback bind");
            let url = format!("http://{}", listener.local_addr().expect("local addr"));
            let in_flight = Arc::new(AtomicUsize::new(0));
            let max_in_flight = Arc::new(AtomicUsize::new(0));
            let max = Arc::clone(&max_in_flight);
            thread::spawn(move || {
                for stream in listener.incoming().flatten() {
                    let in_flight = Arc::clone(&in_flight);
                    let max = Arc::clone(&max);
                    thread::spawn(move || answer(stream, &in_flight, &max, delay));
                }
            });
            Self { url, max_in_flight }
        }

        pub(crate) fn url(&self) -> &str {
            &self.url
        }

        pub(crate) fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }
    }

    fn answer(mut stream: TcpStream, in_flight: &AtomicUsize, max: &AtomicUsize, delay: Duration) {
        read_request(&mut stream);
        let open = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        max.fetch_max(open, Ordering::SeqCst);
        thread::sleep(delay);
        in_flight.fetch_sub(1, Ordering::SeqCst);

        let body = format!(
            r#"{{"jsonrpc":"2.0","id":1,"result":"0x{}{}"}}"#,
            "00".repeat(12),
            "ab".repeat(20)
        );
        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        stream
            .write_all(response.as_bytes())
            .expect("response should be written");
    }

    fn read_request(stream: &mut TcpStream) {
        let mut raw = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let read = stream.read(&mut chunk).expect("request should be readable");
            if read == 0 {
                return;
            }
            raw.extend_from_slice(&chunk[..read]);
            let text = String::from_utf8_lossy(&raw);
            let Some(header_end) = text.find("\r\n\r\n") else {
                continue;
            };
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    if name.eq_ignore_ascii_case("content-length") {
                        value.trim().parse::<usize>().ok()
                    } else {
                        None
                    }
                })
                .unwrap_or(0);
            if raw.len() >= header_end + 4 + content_length {
                return;
            }
        }
    }

    #[test]
    fn concurrent_http_calls_are_in_flight_together() {
        let node = SlowRpcNode::start(Duration::from_millis(200));
        let reader = HttpContractReader::new(node.url()).expect("reader should build");
        let calldatas: Vec<[u8; 1]> = (1u8..=3).map(|byte| [byte]).collect();
        let calls = calldatas
            .iter()
            .map(|calldata| reader.call(Address::repeat_byte(calldata[0]), calldata));

        let results = futures::executor::block_on(join_all(calls));
        for result in results {
            let word = result.expect("call should succeed");
            assert_eq!(Address::from_slice(&word[12..]), Address::repeat_byte(0xab));
        }
        assert!(
            node.max_in_flight() >= 2,
            "calls ran one at a time: max_in_flight={}",
            node.max_in_flight()
        );
    }

    #[test]
    fn eth_call_body_is_lowercase_hex_json_rpc() {
        let body = eth_call_request_body(Address::repeat_byte(0xab), &[0xde, 0xad])
            .expect("body should serialize");
        let value: Value = serde_json::from_slice(&body).expect("body should be json");
        assert_eq!(value["method"], "eth_call");
        assert_eq!(
            value["params"][0]["to"],
            format!("0x{}", "ab".repeat(20))
        );
        assert_eq!(value["params"][0]["data"], "0xdead");
        assert_eq!(value["params"][1], "latest");
    }

    #[test]
    fn parse_eth_call_response_decodes_result_and_surfaces_errors() {
        let ok = br#"{"jsonrpc":"2.0","id":1,"result":"0x00ff"}"#;
        assert_eq!(parse_eth_call_response(ok).expect("result decodes"), vec![0, 255]);

        let reverted = br#"{"jsonrpc":"2.0","id":1,"error":{"code":3,"message":"execution reverted"}}"#;
        let err = parse_eth_call_response(reverted).expect_err("rpc error must surface");
        assert!(err.0.contains("execution reverted"), "got {err}");

        let missing = br#"{"jsonrpc":"2.0","id":1}"#;
        assert!(parse_eth_call_response(missing).is_err());
    }

    #[test]
    fn reader_requires_rpc_url_and_clamps_response_cap() {
        let mut network = crate::config::tests::sample_network();
        network.rpc_url = None;
        assert!(HttpContractReader::from_network(&network).is_err());

        let reader = HttpContractReader::new("http://127.0.0.1:8545")
            .expect("reader should build")
            .with_max_response_bytes(1);
        assert_eq!(reader.max_response_bytes, MIN_RPC_RESPONSE_BYTES);
        let reader = reader.with_fallback(Some("   ".to_string()));
        assert!(reader.fallback_rpc_url.is_none());
    }

    #[test]
    fn mock_reader_records_calls_and_serves_canned_failures() {
        let mut reader = MockContractReader::new();
        reader.respond(vec![1], Err(RpcError("connection refused".to_string())));
        let to = Address::repeat_byte(0x01);

        let derived = futures::executor::block_on(reader.call(to, &[2]))
            .expect("default response is an address word");
        assert_eq!(
            Address::from_slice(&derived[12..]),
            MockContractReader::derived_address(to, &[2])
        );
        let err = futures::executor::block_on(reader.call(to, &[1]))
            .expect_err("canned failure is returned");
        assert_eq!(err, RpcError("connection refused".to_string()));
        assert_eq!(reader.call_count(), 2);
    }
}
