pub mod errors;
pub mod state_machine;
pub mod types;
