//! MCP server exposing PowerPoint editing as tools.
//!
//! The process picks one backend at startup ([`select::select_adapter`]) and
//! serves tool calls against it over stdio ([`mcp::McpServer`]).

pub mod config;
pub mod mcp;
pub mod select;
pub mod tools;

pub use config::{BackendPreference, ServerConfig};
pub use mcp::{McpServer, StdioTransport};
pub use select::{select_adapter, HostOs, SystemBackends};
pub use tools::ToolRouter;
