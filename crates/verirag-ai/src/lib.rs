//! VeriRAG AI - AI 提供商抽象层
//!
//! 编排核心只依赖 [`AIProvider`] trait；内置一个 OpenAI 兼容的实现。

pub mod providers;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod mock;

pub use providers::*;
pub use types::*;
