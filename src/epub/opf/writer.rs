//! OPF序列化模块
//!
//! 将内存中的OPF包文档序列化回XML。属性按键名排序写出，
//! 保证同一输入的序列化结果在任何运行中都逐字节一致。

use crate::epub::error::Result;
use crate::epub::opf::parser::Opf;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

impl Opf {
    /// 序列化为OPF 2.0包文档XML
    ///
    /// # 返回值
    /// * `Result<String>` - 序列化后的XML文本
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut package = BytesStart::new("package");
        package.push_attribute(("xmlns", "http://www.idpf.org/2007/opf"));
        // unique-identifier必须指向identifier条目实际携带的id
        let uid_target = self.metadata.unique_identifier_id().unwrap_or("BookId");
        package.push_attribute(("unique-identifier", uid_target));
        let version = if self.version.is_empty() {
            "2.0"
        } else {
            self.version.as_str()
        };
        package.push_attribute(("version", version));
        writer.write_event(Event::Start(package))?;

        self.write_metadata(&mut writer)?;
        self.write_manifest(&mut writer)?;
        self.write_spine(&mut writer)?;

        writer.write_event(Event::End(BytesEnd::new("package")))?;

        let bytes = writer.into_inner().into_inner();
        Ok(String::from_utf8_lossy(&bytes).to_string())
    }

    fn write_metadata<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut metadata = BytesStart::new("metadata");
        metadata.push_attribute(("xmlns:dc", "http://purl.org/dc/elements/1.1/"));
        metadata.push_attribute(("xmlns:opf", "http://www.idpf.org/2007/opf"));
        writer.write_event(Event::Start(metadata))?;

        let has_identifier_id = self.metadata.unique_identifier_id().is_some();
        let mut first_identifier = true;
        for entry in self.metadata.entries() {
            let name = format!("dc:{}", entry.name);
            let mut elem = BytesStart::new(name.as_str());

            // 源合集的identifier都不带id时，给第一个补上BookId
            if entry.name == "identifier" {
                if !has_identifier_id && first_identifier {
                    elem.push_attribute(("id", "BookId"));
                }
                first_identifier = false;
            }

            let mut keys: Vec<&String> = entry.attributes.keys().collect();
            keys.sort();
            for key in keys {
                elem.push_attribute((key.as_str(), entry.attributes[key].as_str()));
            }

            writer.write_event(Event::Start(elem))?;
            writer.write_event(Event::Text(BytesText::new(&entry.value)))?;
            writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
        }

        for (name, content) in self.metadata.metas() {
            let mut meta = BytesStart::new("meta");
            meta.push_attribute(("name", name.as_str()));
            meta.push_attribute(("content", content.as_str()));
            writer.write_event(Event::Empty(meta))?;
        }

        writer.write_event(Event::End(BytesEnd::new("metadata")))?;
        Ok(())
    }

    fn write_manifest<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_event(Event::Start(BytesStart::new("manifest")))?;

        for item in &self.manifest {
            let mut elem = BytesStart::new("item");
            elem.push_attribute(("id", item.id.as_str()));
            elem.push_attribute(("href", item.href.as_str()));
            elem.push_attribute(("media-type", item.media_type.as_str()));
            if let Some(properties) = &item.properties {
                elem.push_attribute(("properties", properties.as_str()));
            }
            writer.write_event(Event::Empty(elem))?;
        }

        writer.write_event(Event::End(BytesEnd::new("manifest")))?;
        Ok(())
    }

    fn write_spine<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut spine = BytesStart::new("spine");
        if let Some(toc) = &self.spine_toc {
            spine.push_attribute(("toc", toc.as_str()));
        }
        writer.write_event(Event::Start(spine))?;

        for spine_item in &self.spine {
            let mut elem = BytesStart::new("itemref");
            elem.push_attribute(("idref", spine_item.idref.as_str()));
            if !spine_item.is_linear() {
                elem.push_attribute(("linear", "no"));
            }
            writer.write_event(Event::Empty(elem))?;
        }

        writer.write_event(Event::End(BytesEnd::new("spine")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_OPF: &str = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="BookId">
<metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
<dc:title>测试书</dc:title>
<dc:creator role="aut">作者</dc:creator>
<dc:language>zh-CN</dc:language>
</metadata>
<manifest>
<item id="part1" href="part1.html" media-type="application/xhtml+xml"/>
<item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
</manifest>
<spine toc="ncx">
<itemref idref="part1"/>
</spine>
</package>"#;

    #[test]
    fn test_round_trip_parse_write_parse() {
        let opf = Opf::parse_xml(SAMPLE_OPF).expect("解析失败");
        let xml = opf.to_xml().expect("序列化失败");
        let reparsed = Opf::parse_xml(&xml).expect("重解析失败");

        assert_eq!(reparsed.metadata.title(), opf.metadata.title());
        assert_eq!(reparsed.manifest, opf.manifest);
        assert_eq!(reparsed.spine, opf.spine);
        assert_eq!(reparsed.spine_toc, opf.spine_toc);
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let opf = Opf::parse_xml(SAMPLE_OPF).expect("解析失败");
        assert_eq!(opf.to_xml().unwrap(), opf.to_xml().unwrap());
    }

    #[test]
    fn test_unique_identifier_follows_identifier_id() {
        let xml = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="pub-id">
<metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
<dc:title>测试书</dc:title>
<dc:identifier id="pub-id">urn:uuid:9</dc:identifier>
</metadata>
<manifest>
<item id="part1" href="part1.html" media-type="application/xhtml+xml"/>
</manifest>
<spine>
<itemref idref="part1"/>
</spine>
</package>"#;
        let opf = Opf::parse_xml(xml).expect("解析失败");
        let out = opf.to_xml().expect("序列化失败");

        // unique-identifier指向identifier条目自己的id，不悬空
        assert!(out.contains("unique-identifier=\"pub-id\""));
        assert!(out.contains("id=\"pub-id\""));
        assert!(!out.contains("BookId"));
    }

    #[test]
    fn test_identifier_without_id_gets_book_id() {
        let xml = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0">
<metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
<dc:title>测试书</dc:title>
<dc:identifier>urn:uuid:9</dc:identifier>
</metadata>
<manifest>
<item id="part1" href="part1.html" media-type="application/xhtml+xml"/>
</manifest>
<spine>
<itemref idref="part1"/>
</spine>
</package>"#;
        let opf = Opf::parse_xml(xml).expect("解析失败");
        let out = opf.to_xml().expect("序列化失败");

        assert!(out.contains("unique-identifier=\"BookId\""));
        assert!(out.contains("<dc:identifier id=\"BookId\">"));
    }

    #[test]
    fn test_escapes_special_characters() {
        let mut opf = Opf::parse_xml(SAMPLE_OPF).expect("解析失败");
        opf.metadata.set_title("Rogues & <Knaves>");

        let xml = opf.to_xml().expect("序列化失败");
        assert!(xml.contains("Rogues &amp; &lt;Knaves&gt;"));

        let reparsed = Opf::parse_xml(&xml).expect("重解析失败");
        assert_eq!(
            reparsed.metadata.title(),
            Some("Rogues & <Knaves>".to_string())
        );
    }
}
