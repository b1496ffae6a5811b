pub mod epub;

// === 核心API重新导出 ===

/// 合集EPUB（主要接口）
pub use epub::Anthology;

/// 逐作品的拆分结果
pub use epub::{SavedWork, WorkResult};

/// 错误处理
pub use epub::{EpubError, Result};

// === 拆分配置 ===

/// 拆分配置和分区规则
pub use epub::{ClosureKind, PartitionSpec, SelectionRule, SplitConfig};

// === 底层组件（高级用法） ===

/// 容器组件
pub use epub::{Container, RootFile};

/// OPF组件
pub use epub::{Creator, DcEntry, ManifestItem, Metadata, Opf, SpineItem};

/// NCX组件
pub use epub::{DocTitle, NavMap, NavPoint, Ncx};

// === 库信息 ===

/// BookCleaver库的版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// BookCleaver库的描述
pub const DESCRIPTION: &str = "一个用于将EPUB合集拆分为独立书籍的Rust库";

// === 便捷函数 ===

/// 快速打开合集EPUB文件
///
/// 这是 `Anthology::open` 的便捷包装函数。
///
/// # 参数
/// * `path` - EPUB文件路径
///
/// # 返回值
/// * `Result<Anthology>` - 合集实例
///
/// # 示例
///
/// ```no_run
/// use bookcleaver;
///
/// let anthology = bookcleaver::open("omnibus.epub")?;
/// let (title, authors) = anthology.book_info();
/// println!("书名: {}", title);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Anthology> {
    Anthology::open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        println!("BookCleaver version: {}", VERSION);
    }

    #[test]
    fn test_description() {
        assert!(!DESCRIPTION.is_empty());
        println!("Description: {}", DESCRIPTION);
    }
}
