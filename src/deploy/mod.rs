pub mod abi;
pub mod address;
pub mod builder;
pub mod metadata;
pub mod schema;
pub mod tokenization;
pub mod validator;

pub use builder::DeploymentBuilder;
pub use tokenization::TokenizationCoordinator;
