//! VeriRAG RAG - 回答、校验、回退的编排核心
//!
//! 检索 → 生成 → 接地性校验 → (必要时) 工具回退 → 重新生成。

pub mod context;
pub mod corpus;
pub mod generator;
pub mod orchestrator;
pub mod retriever;
pub mod verifier;

pub use context::*;
pub use corpus::*;
pub use generator::*;
pub use orchestrator::*;
pub use retriever::*;
pub use verifier::*;
