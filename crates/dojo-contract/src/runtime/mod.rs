pub mod executor;

pub use executor::LlmExecutor;
