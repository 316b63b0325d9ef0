pub mod evm;

pub use evm::{ContractReader, HttpContractReader, MockContractReader, RpcError};
