//! 闭包解析策略模块
//!
//! 不同的合集用不同的打包惯例编码作品边界：文件名数字前缀、
//! 每部作品一个子目录、或只有NCX子树关系而无命名惯例。
//! 闭包解析策略决定除文档内容外，哪些非文档资源（样式、图片）
//! 应并入一部作品的清单路径闭包。

use crate::epub::opf::Opf;
use crate::epub::split::spec::ClosureKind;
use std::collections::HashSet;

/// 闭包解析策略
///
/// 输入是作品的内容文件闭包种子（文档路径，来自导航子树或
/// 路径前缀匹配），输出是该作品完整的清单路径闭包，按清单的
/// 文档顺序排列。
pub trait ClosureStrategy {
    /// 解析作品的完整清单路径闭包
    ///
    /// # 参数
    /// * `documents` - 作品的文档路径集合
    /// * `opf` - 源合集的包文档
    fn resolve(&self, documents: &[String], opf: &Opf) -> Vec<String>;
}

impl ClosureKind {
    /// 构造该种类对应的策略实例
    pub fn strategy(&self) -> Box<dyn ClosureStrategy> {
        match self {
            ClosureKind::NcxSubtree => Box::new(NcxSubtreeClosure),
            ClosureKind::FilePrefix => Box::new(FilePrefixClosure),
            ClosureKind::Subdirectory => Box::new(SubdirectoryClosure),
        }
    }
}

/// 纯NCX子树策略
///
/// 没有文件名惯例的合集：全部非文档资源视为共享，复制进
/// 每部作品。输出必须自包含，重复存储优先于节省空间。
pub struct NcxSubtreeClosure;

impl ClosureStrategy for NcxSubtreeClosure {
    fn resolve(&self, documents: &[String], opf: &Opf) -> Vec<String> {
        let doc_set: HashSet<&str> = documents.iter().map(|path| path.as_str()).collect();

        opf.manifest
            .iter()
            .filter(|item| {
                doc_set.contains(item.href.as_str()) || (!item.is_document() && !item.is_ncx())
            })
            .map(|item| item.href.clone())
            .collect()
    }
}

/// 文件名数字前缀策略
///
/// 合集用共享数字前缀为作品分组文件（如`001_chapter1.html`、
/// `001_cover.jpg`）。携带本作品前缀的非文档资源并入闭包，
/// 没有数字前缀的资源视为共享。
pub struct FilePrefixClosure;

impl FilePrefixClosure {
    /// 提取文件名的数字前缀（第一个下划线之前的纯数字部分）
    fn name_prefix(name: &str) -> Option<&str> {
        let prefix = name.split('_').next()?;
        if !prefix.is_empty()
            && prefix.len() < name.len()
            && prefix.bytes().all(|b| b.is_ascii_digit())
        {
            Some(prefix)
        } else {
            None
        }
    }
}

impl ClosureStrategy for FilePrefixClosure {
    fn resolve(&self, documents: &[String], opf: &Opf) -> Vec<String> {
        let doc_set: HashSet<&str> = documents.iter().map(|path| path.as_str()).collect();

        // 本作品的前缀集合来自其文档的文件名
        let prefixes: HashSet<&str> = documents
            .iter()
            .filter_map(|path| {
                let name = path.rsplit('/').next().unwrap_or(path);
                Self::name_prefix(name)
            })
            .collect();

        opf.manifest
            .iter()
            .filter(|item| {
                if doc_set.contains(item.href.as_str()) {
                    return true;
                }
                if item.is_document() || item.is_ncx() {
                    return false;
                }
                match Self::name_prefix(item.file_name()) {
                    Some(prefix) => prefixes.contains(prefix),
                    // 无前缀的资源是共享的
                    None => true,
                }
            })
            .map(|item| item.href.clone())
            .collect()
    }
}

/// 子目录策略
///
/// 每部作品的文件放在专属子目录下（如`components/001_storm/`）。
/// 位于本作品目录内的非文档资源并入闭包；不属于任何文档目录
/// 的资源（如顶层的样式目录）视为共享。
pub struct SubdirectoryClosure;

impl ClosureStrategy for SubdirectoryClosure {
    fn resolve(&self, documents: &[String], opf: &Opf) -> Vec<String> {
        let doc_set: HashSet<&str> = documents.iter().map(|path| path.as_str()).collect();

        let work_dirs: HashSet<String> = documents
            .iter()
            .map(|path| directory_of(path).to_string())
            .collect();

        // 合集中所有文档所在的目录：落在别的作品目录里的资源不共享
        let all_doc_dirs: HashSet<String> = opf
            .manifest
            .iter()
            .filter(|item| item.is_document())
            .map(|item| item.directory().to_string())
            .collect();

        opf.manifest
            .iter()
            .filter(|item| {
                if doc_set.contains(item.href.as_str()) {
                    return true;
                }
                if item.is_document() || item.is_ncx() {
                    return false;
                }
                let dir = item.directory();
                if work_dirs.iter().any(|d| dir_within(dir, d)) {
                    return true;
                }
                !all_doc_dirs.iter().any(|d| dir_within(dir, d))
            })
            .map(|item| item.href.clone())
            .collect()
    }
}

fn directory_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[..pos],
        None => "",
    }
}

/// 检查`dir`是否等于`base`或位于其下
fn dir_within(dir: &str, base: &str) -> bool {
    dir == base || (!base.is_empty() && dir.starts_with(base) && dir.as_bytes()[base.len()] == b'/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::opf::ManifestItem;
    use crate::epub::opf::Opf;

    fn opf_with(items: Vec<(&str, &str, &str)>) -> Opf {
        Opf {
            version: "2.0".to_string(),
            metadata: Default::default(),
            manifest: items
                .into_iter()
                .map(|(id, href, media_type)| {
                    ManifestItem::new(id.to_string(), href.to_string(), media_type.to_string())
                })
                .collect(),
            spine: Vec::new(),
            spine_toc: None,
        }
    }

    const XHTML: &str = "application/xhtml+xml";

    #[test]
    fn test_ncx_subtree_closure_shares_all_resources() {
        let opf = opf_with(vec![
            ("p1", "part1.html", XHTML),
            ("p2", "part2.html", XHTML),
            ("css", "styles.css", "text/css"),
            ("img", "cover.jpg", "image/jpeg"),
            ("ncx", "toc.ncx", "application/x-dtbncx+xml"),
        ]);

        let documents = vec!["part1.html".to_string()];
        let closure = NcxSubtreeClosure.resolve(&documents, &opf);

        assert_eq!(closure, vec!["part1.html", "styles.css", "cover.jpg"]);
    }

    #[test]
    fn test_file_prefix_closure_groups_by_prefix() {
        let opf = opf_with(vec![
            ("c1", "001_chapter1.html", XHTML),
            ("c2", "002_chapter1.html", XHTML),
            ("i1", "001_cover.jpg", "image/jpeg"),
            ("i2", "002_cover.jpg", "image/jpeg"),
            ("css", "styles.css", "text/css"),
        ]);

        let documents = vec!["001_chapter1.html".to_string()];
        let closure = FilePrefixClosure.resolve(&documents, &opf);

        // 本作品前缀的资源和无前缀的共享资源并入，他作品的排除
        assert_eq!(
            closure,
            vec!["001_chapter1.html", "001_cover.jpg", "styles.css"]
        );
    }

    #[test]
    fn test_file_prefix_requires_digits() {
        assert_eq!(FilePrefixClosure::name_prefix("001_ch.html"), Some("001"));
        assert_eq!(FilePrefixClosure::name_prefix("cover_ch.html"), None);
        assert_eq!(FilePrefixClosure::name_prefix("styles.css"), None);
        assert_eq!(FilePrefixClosure::name_prefix("_lead.html"), None);
    }

    #[test]
    fn test_subdirectory_closure() {
        let opf = opf_with(vec![
            ("c1", "components/001_storm/ch1.html", XHTML),
            ("c2", "components/002_moon/ch1.html", XHTML),
            ("i1", "components/001_storm/cover.jpg", "image/jpeg"),
            ("i2", "components/002_moon/cover.jpg", "image/jpeg"),
            ("css", "css/styles.css", "text/css"),
        ]);

        let documents = vec!["components/001_storm/ch1.html".to_string()];
        let closure = SubdirectoryClosure.resolve(&documents, &opf);

        assert_eq!(
            closure,
            vec![
                "components/001_storm/ch1.html",
                "components/001_storm/cover.jpg",
                "css/styles.css"
            ]
        );
    }
}
