//! Convert - external converter invocation in isolated scratch workspaces

pub mod error;
pub mod invoker;
pub mod scratch;

pub use error::ConversionError;
pub use invoker::{convert, ConversionInvoker, ConverterConfig, DEFAULT_OUTPUT_EXTENSION};
pub use scratch::ScratchSpace;
