//! NCX解析器模块
//!
//! 提供NCX（Navigation Control file for XML）文件的XML解析功能。
//! 兄弟导航点保持文档顺序，不按playOrder重排：拆分引擎依赖
//! 文档顺序在内容原样带入时产出可复现的结果。

use crate::epub::error::{EpubError, Result};
use crate::epub::ncx::navigation::{DocTitle, NavContent, NavLabel, NavMap, NavPoint, NcxMetadata};
use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// NCX导航文档的解析结果
#[derive(Debug, Clone, PartialEq)]
pub struct Ncx {
    /// NCX版本
    pub version: String,
    /// XML语言
    pub xml_lang: Option<String>,
    /// 元数据
    pub metadata: NcxMetadata,
    /// 文档标题
    pub doc_title: Option<DocTitle>,
    /// 导航地图
    pub nav_map: NavMap,
}

impl Ncx {
    /// 解析NCX文件内容
    ///
    /// XML格式错误时返回`InvalidNavigationDocument`。
    ///
    /// # 参数
    /// * `xml_content` - NCX文件的XML内容
    ///
    /// # 返回值
    /// * `Result<Ncx>` - 解析后的NCX信息
    pub fn parse_xml(xml_content: &str) -> Result<Ncx> {
        let mut reader = Reader::from_str(xml_content);
        reader.config_mut().trim_text(true);
        reader.config_mut().expand_empty_elements = true;

        let mut version = String::new();
        let mut xml_lang = None;
        let mut metadata = NcxMetadata::new();
        let mut doc_title = None;
        let mut nav_map = NavMap::new();

        let mut buf = Vec::new();
        let mut current_section = String::new();
        let mut text_content = String::new();

        // 导航点解析状态：未完成的祖先节点入栈
        let mut nav_point_stack: Vec<NavPoint> = Vec::new();
        let mut current_nav_point: Option<NavPoint> = None;
        let mut current_nav_label: Option<NavLabel> = None;
        let mut in_doc_title = false;

        loop {
            match reader.read_event_into(&mut buf).map_err(|e| {
                EpubError::InvalidNavigationDocument(format!("XML解析错误: {}", e))
            })? {
                Event::Start(ref e) => {
                    let local_name_bytes = e.local_name();
                    let local_name = String::from_utf8_lossy(local_name_bytes.as_ref());

                    match local_name.as_ref() {
                        "ncx" => {
                            let (ncx_version, ncx_lang) = Self::parse_ncx_attributes(e)?;
                            version = ncx_version;
                            xml_lang = ncx_lang;
                        }
                        "head" => {
                            current_section = "head".to_string();
                        }
                        "docTitle" => {
                            in_doc_title = true;
                        }
                        "navMap" => {
                            current_section = "navMap".to_string();
                        }
                        "meta" if current_section == "head" => {
                            Self::parse_meta_element(e, &mut metadata)?;
                        }
                        "navPoint" if current_section == "navMap" => {
                            let (id, play_order, class) = Self::parse_nav_point_attributes(e)?;

                            // 当前未完成的导航点成为父节点入栈
                            if let Some(nav_point) = current_nav_point.take() {
                                nav_point_stack.push(nav_point);
                            }

                            current_nav_point = Some(NavPoint {
                                id,
                                play_order,
                                class,
                                nav_label: NavLabel::new(String::new()),
                                content: NavContent::new(String::new()),
                                children: Vec::new(),
                            });
                        }
                        "navLabel" if current_section == "navMap" => {
                            current_nav_label = Some(NavLabel::new(String::new()));
                        }
                        "content" if current_section == "navMap" => {
                            let src = Self::parse_content_src(e)?;
                            if let Some(ref mut nav_point) = current_nav_point {
                                nav_point.content = NavContent::new(src);
                            }
                        }
                        _ => {}
                    }
                    text_content.clear();
                }
                Event::End(ref e) => {
                    let local_name_bytes = e.local_name();
                    let local_name = String::from_utf8_lossy(local_name_bytes.as_ref());

                    match local_name.as_ref() {
                        "head" | "navMap" => {
                            current_section.clear();
                        }
                        "docTitle" => {
                            doc_title = Some(DocTitle::new(text_content.trim().to_string()));
                            in_doc_title = false;
                        }
                        "text" if in_doc_title => {}
                        "text" if current_section == "navMap" => {
                            if let Some(ref mut nav_label) = current_nav_label {
                                nav_label.text = text_content.trim().to_string();
                            }
                        }
                        "navLabel" if current_section == "navMap" => {
                            if let (Some(nav_label), Some(ref mut nav_point)) =
                                (current_nav_label.take(), current_nav_point.as_mut())
                            {
                                nav_point.nav_label = nav_label;
                            }
                        }
                        "navPoint" if current_section == "navMap" => {
                            if let Some(nav_point) = current_nav_point.take() {
                                if let Some(mut parent) = nav_point_stack.pop() {
                                    parent.add_child(nav_point);
                                    current_nav_point = Some(parent);
                                } else {
                                    nav_map.add_nav_point(nav_point);
                                }
                            }
                        }
                        _ => {}
                    }
                }
                Event::Text(e) => {
                    text_content.push_str(&e.unescape().map_err(|e| {
                        EpubError::InvalidNavigationDocument(format!("XML解析错误: {}", e))
                    })?);
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(Ncx {
            version,
            xml_lang,
            metadata,
            doc_title,
            nav_map,
        })
    }

    /// 为单部作品构造新的NCX
    ///
    /// 导航地图只包含该作品的导航子树，docTitle为作品标题，
    /// playOrder深度优先从1重新编号，dtb:depth按子树重新计算。
    ///
    /// # 参数
    /// * `title` - 作品标题
    /// * `uid` - 标识符（通常沿用源包的identifier）
    /// * `nav_root` - 作品的导航子树根节点
    pub fn for_work(title: &str, uid: Option<String>, mut nav_root: NavPoint) -> Ncx {
        nav_root.nav_label = NavLabel::new(title.to_string());

        let mut next = 1;
        nav_root.renumber(&mut next);

        let mut nav_map = NavMap::new();
        nav_map.add_nav_point(nav_root);

        let mut metadata = NcxMetadata::new();
        metadata.uid = uid;
        metadata.depth = Some(nav_map.depth());

        Ncx {
            version: "2005-1".to_string(),
            xml_lang: None,
            metadata,
            doc_title: Some(DocTitle::new(title.to_string())),
            nav_map,
        }
    }

    /// 获取文档标题文本
    pub fn title(&self) -> Option<&String> {
        self.doc_title.as_ref().map(|title| &title.text)
    }

    /// 获取导航深度（元数据缺失时按导航树计算）
    pub fn depth(&self) -> u32 {
        self.metadata.depth.unwrap_or_else(|| self.nav_map.depth())
    }

    /// 解析NCX根元素的属性
    fn parse_ncx_attributes(e: &quick_xml::events::BytesStart) -> Result<(String, Option<String>)> {
        let mut version = String::new();
        let mut xml_lang = None;

        for attr_result in e.attributes() {
            let attr = attr_result
                .map_err(|err| EpubError::XmlError(quick_xml::Error::InvalidAttr(err)))?;
            match attr.key.local_name().as_ref() {
                b"version" => {
                    version = String::from_utf8_lossy(&attr.value).to_string();
                }
                b"lang" => {
                    xml_lang = Some(String::from_utf8_lossy(&attr.value).to_string());
                }
                _ => {}
            }
        }

        Ok((version, xml_lang))
    }

    /// 解析meta元素
    fn parse_meta_element(
        e: &quick_xml::events::BytesStart,
        metadata: &mut NcxMetadata,
    ) -> Result<()> {
        let mut name = String::new();
        let mut content = String::new();

        for attr_result in e.attributes() {
            let attr = attr_result
                .map_err(|err| EpubError::XmlError(quick_xml::Error::InvalidAttr(err)))?;
            match attr.key.local_name().as_ref() {
                b"name" => {
                    name = String::from_utf8_lossy(&attr.value).to_string();
                }
                b"content" => {
                    content = String::from_utf8_lossy(&attr.value).to_string();
                }
                _ => {}
            }
        }

        match name.as_str() {
            "dtb:uid" => {
                metadata.uid = Some(content);
            }
            "dtb:depth" => {
                metadata.depth = content.parse().ok();
            }
            _ => {
                metadata.other_metadata.insert(name, content);
            }
        }

        Ok(())
    }

    /// 解析navPoint元素的属性
    fn parse_nav_point_attributes(
        e: &quick_xml::events::BytesStart,
    ) -> Result<(String, u32, Option<String>)> {
        let mut id = String::new();
        let mut play_order = 0;
        let mut class = None;

        for attr_result in e.attributes() {
            let attr = attr_result
                .map_err(|err| EpubError::XmlError(quick_xml::Error::InvalidAttr(err)))?;
            match attr.key.local_name().as_ref() {
                b"id" => {
                    id = String::from_utf8_lossy(&attr.value).to_string();
                }
                b"playOrder" => {
                    play_order = String::from_utf8_lossy(&attr.value).parse().unwrap_or(0);
                }
                b"class" => {
                    class = Some(String::from_utf8_lossy(&attr.value).to_string());
                }
                _ => {}
            }
        }

        Ok((id, play_order, class))
    }

    /// 解析content元素的src属性
    fn parse_content_src(e: &quick_xml::events::BytesStart) -> Result<String> {
        for attr_result in e.attributes() {
            let attr = attr_result
                .map_err(|err| EpubError::XmlError(quick_xml::Error::InvalidAttr(err)))?;
            if attr.key.local_name().as_ref() == b"src" {
                return Ok(String::from_utf8_lossy(&attr.value).to_string());
            }
        }
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_NCX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
<head>
<meta name="dtb:uid" content="urn:uuid:1234"/>
<meta name="dtb:depth" content="2"/>
</head>
<docTitle><text>三部曲合集</text></docTitle>
<navMap>
<navPoint id="book2" playOrder="4">
<navLabel><text>第二卷</text></navLabel>
<content src="part2.html"/>
<navPoint id="b2ch1" playOrder="5">
<navLabel><text>第一章</text></navLabel>
<content src="part2.html#ch1"/>
</navPoint>
</navPoint>
<navPoint id="book1" playOrder="1">
<navLabel><text>第一卷</text></navLabel>
<content src="part1.html"/>
</navPoint>
</navMap>
</ncx>"#;

    #[test]
    fn test_parse_preserves_document_order() {
        let ncx = Ncx::parse_xml(SAMPLE_NCX).expect("解析NCX失败");

        assert_eq!(ncx.version, "2005-1");
        assert_eq!(ncx.title(), Some(&"三部曲合集".to_string()));
        assert_eq!(ncx.metadata.uid, Some("urn:uuid:1234".to_string()));

        // playOrder乱序也不重排：book2在文档中先出现
        assert_eq!(ncx.nav_map.nav_points.len(), 2);
        assert_eq!(ncx.nav_map.nav_points[0].id, "book2");
        assert_eq!(ncx.nav_map.nav_points[1].id, "book1");
    }

    #[test]
    fn test_parse_nested_nav_points() {
        let ncx = Ncx::parse_xml(SAMPLE_NCX).expect("解析NCX失败");

        let book2 = &ncx.nav_map.nav_points[0];
        assert_eq!(book2.nav_label.text, "第二卷");
        assert_eq!(book2.content.src, "part2.html");
        assert_eq!(book2.children.len(), 1);
        assert_eq!(book2.children[0].nav_label.text, "第一章");
        assert_eq!(book2.children[0].content.path(), "part2.html");
    }

    #[test]
    fn test_parse_rejects_malformed_xml() {
        let result = Ncx::parse_xml("<ncx><navMap><navPoint></navMap></ncx>");
        assert!(matches!(
            result,
            Err(EpubError::InvalidNavigationDocument(_))
        ));
    }

    #[test]
    fn test_for_work_renumbers_and_retitles() {
        let ncx = Ncx::parse_xml(SAMPLE_NCX).expect("解析NCX失败");
        let subtree = ncx.nav_map.nav_points[0].clone();

        let work = Ncx::for_work("第二卷(单行本)", Some("urn:uuid:1234".to_string()), subtree);

        assert_eq!(work.title(), Some(&"第二卷(单行本)".to_string()));
        assert_eq!(work.nav_map.nav_points.len(), 1);

        let root = &work.nav_map.nav_points[0];
        assert_eq!(root.nav_label.text, "第二卷(单行本)");
        assert_eq!(root.play_order, 1);
        assert_eq!(root.children[0].play_order, 2);
        assert_eq!(work.metadata.depth, Some(2));
    }
}
