//! 清单模块
//!
//! 提供EPUB包中文件清单的结构定义。拆分引擎依赖清单项
//! 区分文档内容（进入阅读顺序）与共享资源（样式、图片）。

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// NCX导航文档的媒体类型
pub const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";

/// 被视为文档内容的媒体类型集合
static DOCUMENT_MEDIA_TYPES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "application/xhtml+xml",
        "text/html",
        "text/x-oeb1-document",
    ]
    .into_iter()
    .collect()
});

/// 清单项信息
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestItem {
    /// 项目ID（包内唯一）
    pub id: String,
    /// 文件路径(相对于OPF文件)
    pub href: String,
    /// 媒体类型
    pub media_type: String,
    /// 属性(如nav、cover-image等)
    pub properties: Option<String>,
}

impl ManifestItem {
    /// 创建新的清单项
    pub fn new(id: String, href: String, media_type: String) -> Self {
        Self {
            id,
            href,
            media_type,
            properties: None,
        }
    }

    /// 检查是否为文档内容（进入脊柱的阅读内容）
    pub fn is_document(&self) -> bool {
        DOCUMENT_MEDIA_TYPES.contains(self.media_type.as_str())
    }

    /// 检查是否为NCX导航文档
    pub fn is_ncx(&self) -> bool {
        self.media_type == NCX_MEDIA_TYPE
    }

    /// 检查是否为图片文件
    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }

    /// 检查是否为CSS文件
    pub fn is_css(&self) -> bool {
        self.media_type == "text/css"
    }

    /// 获取路径的文件名部分
    pub fn file_name(&self) -> &str {
        self.href.rsplit('/').next().unwrap_or(&self.href)
    }

    /// 获取路径的目录部分（没有目录时返回空字符串）
    pub fn directory(&self) -> &str {
        match self.href.rfind('/') {
            Some(pos) => &self.href[..pos],
            None => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_classification() {
        let doc = ManifestItem::new(
            "c1".to_string(),
            "text/part1.html".to_string(),
            "application/xhtml+xml".to_string(),
        );
        assert!(doc.is_document());
        assert!(!doc.is_css());

        let css = ManifestItem::new(
            "style".to_string(),
            "styles.css".to_string(),
            "text/css".to_string(),
        );
        assert!(css.is_css());
        assert!(!css.is_document());

        let ncx = ManifestItem::new(
            "toc.ncx".to_string(),
            "toc.ncx".to_string(),
            NCX_MEDIA_TYPE.to_string(),
        );
        assert!(ncx.is_ncx());
    }

    #[test]
    fn test_path_helpers() {
        let item = ManifestItem::new(
            "c1".to_string(),
            "components/001_storm/chapter1.html".to_string(),
            "application/xhtml+xml".to_string(),
        );
        assert_eq!(item.file_name(), "chapter1.html");
        assert_eq!(item.directory(), "components/001_storm");

        let flat = ManifestItem::new(
            "style".to_string(),
            "styles.css".to_string(),
            "text/css".to_string(),
        );
        assert_eq!(flat.file_name(), "styles.css");
        assert_eq!(flat.directory(), "");
    }
}
