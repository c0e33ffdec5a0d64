//! Model Context Protocol over stdio.
//!
//! ```text
//! stdin ──▶ Transport ──▶ McpServer ──▶ ToolRouter ──▶ PowerPointAdapter
//!                             │
//! stdout ◀────────────────────┘
//! ```
//!
//! Messages are newline-delimited JSON-RPC 2.0; one request is handled to
//! completion before the next line is read.

pub mod protocol;
pub mod server;
pub mod transport;

pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
pub use server::{McpServer, ServerState};
pub use transport::{StdioTransport, Transport};
