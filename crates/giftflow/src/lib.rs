//! Giftflow - Core Library
//!
//! Classifies mystery gift save files by their path tokens and runs the
//! external converter once per destination code, in isolated scratch
//! workspaces, on a fixed-size worker pool.
//!
//! Pipeline: discover -> tokenize -> classify -> convert -> report.

pub mod catalog;
pub mod classify;
pub mod convert;
pub mod dispatch;
pub mod serve;

pub use catalog::{Catalog, CatalogError, Event, EventTable, MappingRule, MappingStore};
pub use classify::{classify, classify_with, tokenize, Classification};
pub use convert::{ConversionError, ConversionInvoker, ConverterConfig};
pub use dispatch::{
    run, DispatchConfig, DispatchError, Dispatcher, ExtensionSet, FileReport, RunSummary,
};
