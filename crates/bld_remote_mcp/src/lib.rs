//! Tool gateway for the BLD Remote bridge.
//!
//! A long-lived process speaking the Model Context Protocol over stdio.
//! Each MCP tool invocation maps to exactly one command-broker request
//! over a fresh loopback TCP connection; results come back decoded, with
//! viewport captures attached as image content blocks.
//!
//! Run it as `bld-remote-mcp`, or embed [`McpServer`] and drive
//! [`McpServer::serve`] with your own streams.

pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
pub mod tools;

pub use client::BrokerClient;
pub use config::GatewayConfig;
pub use error::GatewayError;
pub use server::McpServer;
