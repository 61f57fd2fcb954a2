//! CLI module for giftflow

pub mod convert;
pub mod error;
pub mod output;
