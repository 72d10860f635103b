//! VeriRAG Core - 核心类型和抽象
//!
//! 提供项目的基础类型、错误处理、配置等核心功能。

pub mod config;
pub mod error;
pub mod message;

pub use config::*;
pub use error::*;
pub use message::*;
