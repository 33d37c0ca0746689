// SPDX-License-Identifier: MIT

//! The two long-lived HTTP surfaces the daemon serves: the inbound agent
//! control plane and the outbound agent-binary file server.

pub mod agent_rpc;
pub mod file_server;

pub use agent_rpc::AgentRpcState;
pub use file_server::AgentFileServer;
