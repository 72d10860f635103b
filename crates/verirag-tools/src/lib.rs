//! VeriRAG Tools - 回退轮次使用的外部查询工具
//!
//! 工具集合是封闭的: `corpus_search` 与 `internet_search`。

pub mod corpus_search;
pub mod internet_search;
pub mod tool_registry;
pub mod types;

pub use corpus_search::*;
pub use internet_search::*;
pub use tool_registry::*;
pub use types::*;
