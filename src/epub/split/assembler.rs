//! 容器装配模块
//!
//! 把作品的包文档、导航文档和资源字节装配成一个完整的EPUB
//! 容器。条目布局固定：mimetype、META-INF/container.xml、
//! OEBPS/content.opf、OEBPS/toc.ncx，其余资源按清单顺序放在
//! OEBPS/下，保证同样的输入产出字节等价的容器。

use crate::epub::container::{container_xml, Container};
use crate::epub::error::{EpubError, Result};
use crate::epub::ncx::Ncx;
use crate::epub::opf::Opf;
use std::collections::HashMap;

/// 装配单部作品的EPUB容器
///
/// 清单中除NCX外的每个条目都必须能在`resources`中找到字节
/// 内容，否则返回`MissingResource`并放弃整个作品。
///
/// # 参数
/// * `opf` - 作品的包文档
/// * `ncx` - 作品的导航文档
/// * `resources` - 源清单路径到文件字节的映射
///
/// # 返回值
/// * `Result<Container>` - 装配完成的容器
pub fn assemble(
    opf: &Opf,
    ncx: &Ncx,
    resources: &HashMap<String, Vec<u8>>,
) -> Result<Container> {
    let mut container = Container::new();
    container.insert("META-INF/container.xml", container_xml().into_bytes());
    container.insert("OEBPS/content.opf", opf.to_xml()?.into_bytes());
    container.insert("OEBPS/toc.ncx", ncx.to_xml()?.into_bytes());

    // 资源按清单顺序写入，路径保持与清单一致
    for item in &opf.manifest {
        if item.is_ncx() {
            continue;
        }
        let data = resources
            .get(&item.href)
            .ok_or_else(|| EpubError::MissingResource(item.href.clone()))?;
        container.insert(&format!("OEBPS/{}", item.href), data.clone());
    }

    Ok(container)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::container::EPUB_MIMETYPE;
    use crate::epub::ncx::{NavContent, NavLabel, NavPoint};
    use crate::epub::opf::{ManifestItem, Metadata, SpineItem, NCX_MEDIA_TYPE};

    fn sample_models() -> (Opf, Ncx) {
        let mut metadata = Metadata::new();
        metadata.set_title("Book One");
        metadata.set_creator("某作者");

        let opf = Opf {
            version: "2.0".to_string(),
            metadata,
            manifest: vec![
                ManifestItem::new(
                    "part1".to_string(),
                    "part1.html".to_string(),
                    "application/xhtml+xml".to_string(),
                ),
                ManifestItem::new(
                    "css".to_string(),
                    "styles.css".to_string(),
                    "text/css".to_string(),
                ),
                ManifestItem::new(
                    "toc.ncx".to_string(),
                    "toc.ncx".to_string(),
                    NCX_MEDIA_TYPE.to_string(),
                ),
            ],
            spine: vec![SpineItem::new("part1".to_string())],
            spine_toc: Some("toc.ncx".to_string()),
        };

        let nav_root = NavPoint::new(
            "b1".to_string(),
            1,
            NavLabel::new("Book One".to_string()),
            NavContent::new("part1.html".to_string()),
        );
        let ncx = Ncx::for_work("Book One", None, nav_root);

        (opf, ncx)
    }

    fn sample_resources() -> HashMap<String, Vec<u8>> {
        let mut resources = HashMap::new();
        resources.insert("part1.html".to_string(), b"<html>one</html>".to_vec());
        resources.insert("styles.css".to_string(), b"body{}".to_vec());
        resources
    }

    #[test]
    fn test_assemble_layout() {
        let (opf, ncx) = sample_models();
        let container = assemble(&opf, &ncx, &sample_resources()).expect("装配失败");

        assert_eq!(
            container.paths(),
            vec![
                "mimetype",
                "META-INF/container.xml",
                "OEBPS/content.opf",
                "OEBPS/toc.ncx",
                "OEBPS/part1.html",
                "OEBPS/styles.css",
            ]
        );
        assert_eq!(container.get("mimetype"), Some(EPUB_MIMETYPE.as_bytes()));
        assert_eq!(
            container.get("OEBPS/part1.html"),
            Some(b"<html>one</html>".as_slice())
        );
    }

    #[test]
    fn test_assembled_container_is_valid_epub() {
        let (opf, ncx) = sample_models();
        let container = assemble(&opf, &ncx, &sample_resources()).expect("装配失败");

        let bytes = container.encode().expect("编码失败");
        let decoded = Container::decode(&bytes).expect("输出应是合法EPUB容器");
        assert_eq!(decoded, container);

        // 输出中的包文档和导航文档可重新解析
        let opf_xml = String::from_utf8(decoded.get("OEBPS/content.opf").unwrap().to_vec()).unwrap();
        let reparsed = Opf::parse_xml(&opf_xml).expect("输出OPF应可解析");
        assert_eq!(reparsed.metadata.title(), Some("Book One".to_string()));

        let ncx_xml = String::from_utf8(decoded.get("OEBPS/toc.ncx").unwrap().to_vec()).unwrap();
        let reparsed_ncx = Ncx::parse_xml(&ncx_xml).expect("输出NCX应可解析");
        assert_eq!(reparsed_ncx.title(), Some(&"Book One".to_string()));
    }

    #[test]
    fn test_missing_resource_aborts_work() {
        let (opf, ncx) = sample_models();
        let mut resources = sample_resources();
        resources.remove("styles.css");

        let result = assemble(&opf, &ncx, &resources);
        match result {
            Err(EpubError::MissingResource(path)) => assert_eq!(path, "styles.css"),
            other => panic!("期望MissingResource, 得到: {:?}", other),
        }
    }

    #[test]
    fn test_assemble_is_deterministic() {
        let (opf, ncx) = sample_models();
        let resources = sample_resources();

        let first = assemble(&opf, &ncx, &resources).unwrap().encode().unwrap();
        let second = assemble(&opf, &ncx, &resources).unwrap().encode().unwrap();
        assert_eq!(first, second);
    }
}
