//! 拆分引擎模块
//!
//! 把一个合集EPUB按作品边界拆成多个独立EPUB的完整流水线：
//! 配置（spec）→ 规划（planner）→ 闭包解析（closure）→
//! 包重写（rewriter）→ 容器装配（assembler）。

mod assembler;
mod closure;
mod planner;
mod rewriter;
mod spec;

pub use assembler::assemble;
pub use closure::{
    ClosureStrategy, FilePrefixClosure, NcxSubtreeClosure, SubdirectoryClosure,
};
pub use planner::{plan, WorkPartition};
pub use rewriter::{rewrite, WORK_NCX_HREF};
pub use spec::{ClosureKind, PartitionSpec, SelectionRule, SplitConfig};
