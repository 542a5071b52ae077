#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]

pub mod config;
pub mod core;
pub mod logging;
pub mod services;

// Re-export commonly used types
pub use config::AssistantConfig;
pub use core::{
    Comparison, CompositeCondition, FieldValue, GridOperationResponse, GridSchema, Logic,
    Operator, Record, SortDir, SortSpec, ViewState,
};
pub use services::{Assistant, ChatGateway, PromptBuilder, TransportError};
