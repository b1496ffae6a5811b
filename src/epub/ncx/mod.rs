//! NCX（Navigation Control file for XML）导航文档模块
//!
//! 此模块提供NCX导航控制文件的解析与序列化功能。NCX的层级
//! 导航点定义了合集中各作品之间唯一可靠的分区边界。

mod navigation;
mod parser;
mod writer;

// 重新导出公共类型以保持API兼容性
pub use navigation::{DocTitle, NavContent, NavLabel, NavMap, NavPoint, NcxMetadata};
pub use parser::Ncx;
