//! OPF（Open Packaging Format）包文档模块
//!
//! 此模块提供EPUB包文档的解析与序列化功能，包括元数据、
//! 清单、脊柱等信息的提取和重写。

mod manifest;
mod metadata;
mod parser;
mod spine;
mod writer;

// 重新导出公共类型以保持API兼容性
pub use manifest::{ManifestItem, NCX_MEDIA_TYPE};
pub use metadata::{Creator, DcEntry, Metadata};
pub use parser::Opf;
pub use spine::SpineItem;
