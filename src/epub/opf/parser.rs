//! OPF解析器模块
//!
//! 提供OPF（Open Packaging Format）文件的XML解析功能。
//! 清单和脊柱均按文档顺序保存，后续拆分阶段依赖这一顺序
//! 产出可复现的输出。

use crate::epub::error::{EpubError, Result};
use crate::epub::ncx::Ncx;
use crate::epub::opf::{manifest::ManifestItem, metadata::Metadata, spine::SpineItem};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::collections::HashMap;

/// OPF包文档的解析结果
#[derive(Debug, Clone, PartialEq)]
pub struct Opf {
    /// EPUB版本
    pub version: String,
    /// 元数据
    pub metadata: Metadata,
    /// 清单项(文件列表，文档顺序)
    pub manifest: Vec<ManifestItem>,
    /// 脊柱(阅读顺序)
    pub spine: Vec<SpineItem>,
    /// 脊柱的目录引用(toc属性)
    pub spine_toc: Option<String>,
}

impl Opf {
    /// 解析OPF文件内容
    ///
    /// 缺少manifest或spine元素、或脊柱itemref引用了不存在的
    /// 清单项时，返回`InvalidPackageDocument`。
    ///
    /// # 参数
    /// * `xml_content` - OPF文件的XML内容
    ///
    /// # 返回值
    /// * `Result<Opf>` - 解析后的OPF信息
    pub fn parse_xml(xml_content: &str) -> Result<Opf> {
        let mut reader = Reader::from_str(xml_content);
        reader.config_mut().trim_text(true);
        reader.config_mut().expand_empty_elements = true;

        let mut version = String::new();
        let mut metadata = Metadata::new();
        let mut manifest = Vec::new();
        let mut spine = Vec::new();
        let mut spine_toc = None;
        let mut saw_manifest = false;
        let mut saw_spine = false;

        let mut buf = Vec::new();
        let mut current_section = String::new();
        let mut text_content = String::new();
        let mut current_attributes = HashMap::new();

        loop {
            match reader
                .read_event_into(&mut buf)
                .map_err(|e| EpubError::InvalidPackageDocument(format!("XML解析错误: {}", e)))?
            {
                Event::Start(ref e) => {
                    let local_name_bytes = e.local_name();
                    let local_name = String::from_utf8_lossy(local_name_bytes.as_ref());

                    match local_name.as_ref() {
                        "package" => {
                            version = Self::attribute_value(e, b"version")?.unwrap_or_default();
                        }
                        "metadata" => {
                            current_section = "metadata".to_string();
                        }
                        "manifest" => {
                            current_section = "manifest".to_string();
                            saw_manifest = true;
                        }
                        "spine" => {
                            current_section = "spine".to_string();
                            saw_spine = true;
                            spine_toc = Self::attribute_value(e, b"toc")?;
                        }
                        "item" if current_section == "manifest" => {
                            Self::parse_manifest_item(e, &mut manifest)?;
                        }
                        "itemref" if current_section == "spine" => {
                            Self::parse_spine_item(e, &mut spine)?;
                        }
                        "meta" if current_section == "metadata" => {
                            let name = Self::attribute_value(e, b"name")?.unwrap_or_default();
                            let content = Self::attribute_value(e, b"content")?.unwrap_or_default();
                            if !name.is_empty() && !content.is_empty() {
                                metadata.add_meta(name, content);
                            }
                            text_content.clear();
                        }
                        _ if current_section == "metadata" => {
                            current_attributes.clear();
                            for attr_result in e.attributes() {
                                if let Ok(attr) = attr_result {
                                    let key = String::from_utf8_lossy(attr.key.local_name().as_ref())
                                        .to_string();
                                    let value = String::from_utf8_lossy(&attr.value).to_string();
                                    current_attributes.insert(key, value);
                                }
                            }
                            text_content.clear();
                        }
                        _ => {}
                    }
                }
                Event::End(ref e) => {
                    let local_name_bytes = e.local_name();
                    let local_name = String::from_utf8_lossy(local_name_bytes.as_ref());

                    match local_name.as_ref() {
                        "metadata" | "manifest" | "spine" => {
                            current_section.clear();
                        }
                        "meta" if current_section == "metadata" => {}
                        _ if current_section == "metadata" => {
                            let content = text_content.trim();
                            // dc-metadata/x-metadata是旧式包装元素，不是条目
                            if !content.is_empty()
                                && local_name.as_ref() != "dc-metadata"
                                && local_name.as_ref() != "x-metadata"
                            {
                                metadata.add_dublin_core(
                                    local_name.to_string(),
                                    content.to_string(),
                                    current_attributes.clone(),
                                );
                            }
                            text_content.clear();
                        }
                        _ => {}
                    }
                }
                Event::Text(e) => {
                    text_content.push_str(&e.unescape().map_err(|e| {
                        EpubError::InvalidPackageDocument(format!("XML解析错误: {}", e))
                    })?);
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !saw_manifest {
            return Err(EpubError::InvalidPackageDocument(
                "缺少manifest元素".to_string(),
            ));
        }
        if !saw_spine {
            return Err(EpubError::InvalidPackageDocument(
                "缺少spine元素".to_string(),
            ));
        }

        let opf = Opf {
            version,
            metadata,
            manifest,
            spine,
            spine_toc,
        };

        // 脊柱引用必须全部指向清单项
        for spine_item in &opf.spine {
            if opf.item_by_id(&spine_item.idref).is_none() {
                return Err(EpubError::InvalidPackageDocument(format!(
                    "脊柱引用了不存在的清单项: {}",
                    spine_item.idref
                )));
            }
        }

        Ok(opf)
    }

    /// 读取元素的单个属性值
    fn attribute_value(
        e: &quick_xml::events::BytesStart,
        name: &[u8],
    ) -> Result<Option<String>> {
        for attr_result in e.attributes() {
            let attr = attr_result
                .map_err(|err| EpubError::XmlError(quick_xml::Error::InvalidAttr(err)))?;
            if attr.key.local_name().as_ref() == name {
                return Ok(Some(String::from_utf8_lossy(&attr.value).to_string()));
            }
        }
        Ok(None)
    }

    /// 解析清单项
    fn parse_manifest_item(
        e: &quick_xml::events::BytesStart,
        manifest: &mut Vec<ManifestItem>,
    ) -> Result<()> {
        let mut item = ManifestItem::new(String::new(), String::new(), String::new());

        for attr_result in e.attributes() {
            let attr = attr_result
                .map_err(|e| EpubError::XmlError(quick_xml::Error::InvalidAttr(e)))?;
            match attr.key.local_name().as_ref() {
                b"id" => {
                    item.id = String::from_utf8_lossy(&attr.value).to_string();
                }
                b"href" => {
                    item.href = String::from_utf8_lossy(&attr.value).to_string();
                }
                b"media-type" => {
                    item.media_type = String::from_utf8_lossy(&attr.value).to_string();
                }
                b"properties" => {
                    item.properties = Some(String::from_utf8_lossy(&attr.value).to_string());
                }
                _ => {}
            }
        }

        if !item.id.is_empty() && !item.href.is_empty() && !item.media_type.is_empty() {
            manifest.push(item);
        }

        Ok(())
    }

    /// 解析脊柱项
    fn parse_spine_item(
        e: &quick_xml::events::BytesStart,
        spine: &mut Vec<SpineItem>,
    ) -> Result<()> {
        let mut idref = String::new();
        let mut linear = true;

        for attr_result in e.attributes() {
            let attr = attr_result
                .map_err(|e| EpubError::XmlError(quick_xml::Error::InvalidAttr(e)))?;
            match attr.key.local_name().as_ref() {
                b"idref" => {
                    idref = String::from_utf8_lossy(&attr.value).to_string();
                }
                b"linear" => {
                    linear = String::from_utf8_lossy(&attr.value) != "no";
                }
                _ => {}
            }
        }

        if !idref.is_empty() {
            spine.push(SpineItem::with_linear(idref, linear));
        }

        Ok(())
    }

    /// 根据ID查找清单项
    pub fn item_by_id(&self, id: &str) -> Option<&ManifestItem> {
        self.manifest.iter().find(|item| item.id == id)
    }

    /// 根据路径查找清单项（查询路径中的锚点会被忽略）
    pub fn item_by_href(&self, href: &str) -> Option<&ManifestItem> {
        let path = href.split('#').next().unwrap_or(href);
        self.manifest.iter().find(|item| item.href == path)
    }

    /// 查找NCX导航文档的清单项
    pub fn ncx_item(&self) -> Option<&ManifestItem> {
        self.manifest.iter().find(|item| item.is_ncx())
    }

    /// 获取脊柱项对应的清单路径(按阅读顺序)
    pub fn spine_hrefs(&self) -> Vec<String> {
        self.spine
            .iter()
            .filter_map(|spine_item| self.item_by_id(&spine_item.idref))
            .map(|item| item.href.clone())
            .collect()
    }

    /// 校验包内引用的一致性
    ///
    /// 每个脊柱idref和每个导航点的目标路径都必须能在清单中
    /// 解析到，否则返回`InvalidPackageDocument`。
    ///
    /// # 参数
    /// * `ncx` - 可选的导航文档；为None时只校验脊柱
    pub fn validate_references(&self, ncx: Option<&Ncx>) -> Result<()> {
        for spine_item in &self.spine {
            if self.item_by_id(&spine_item.idref).is_none() {
                return Err(EpubError::InvalidPackageDocument(format!(
                    "脊柱引用了不存在的清单项: {}",
                    spine_item.idref
                )));
            }
        }

        if let Some(ncx) = ncx {
            for nav_point in ncx.nav_map.all_nav_points() {
                let path = nav_point.content.path();
                if path.is_empty() {
                    continue;
                }
                if self.item_by_href(path).is_none() {
                    return Err(EpubError::InvalidPackageDocument(format!(
                        "导航点 {} 的目标 {} 不在清单中",
                        nav_point.id, path
                    )));
                }
            }
        }

        Ok(())
    }
}
