// MCP (Model Context Protocol) server exposing the Ethereum tools
// to agent clients over stdio; ethkit-server adds the HTTP transport.

pub mod config;
pub mod protocol;
pub mod server;
pub mod tools;

pub use server::McpServer;
