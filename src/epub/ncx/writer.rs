//! NCX序列化模块
//!
//! 将内存中的导航文档序列化回NCX XML。

use crate::epub::error::Result;
use crate::epub::ncx::navigation::NavPoint;
use crate::epub::ncx::parser::Ncx;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

impl Ncx {
    /// 序列化为NCX 2005-1文档XML
    ///
    /// # 返回值
    /// * `Result<String>` - 序列化后的XML文本
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut ncx = BytesStart::new("ncx");
        ncx.push_attribute(("xmlns", "http://www.daisy.org/z3986/2005/ncx/"));
        let version = if self.version.is_empty() {
            "2005-1"
        } else {
            self.version.as_str()
        };
        ncx.push_attribute(("version", version));
        if let Some(lang) = &self.xml_lang {
            ncx.push_attribute(("xml:lang", lang.as_str()));
        }
        writer.write_event(Event::Start(ncx))?;

        self.write_head(&mut writer)?;
        self.write_doc_title(&mut writer)?;
        self.write_nav_map(&mut writer)?;

        writer.write_event(Event::End(BytesEnd::new("ncx")))?;

        let bytes = writer.into_inner().into_inner();
        Ok(String::from_utf8_lossy(&bytes).to_string())
    }

    fn write_head<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_event(Event::Start(BytesStart::new("head")))?;

        if let Some(uid) = &self.metadata.uid {
            write_meta(writer, "dtb:uid", uid)?;
        }
        let depth = self.depth().to_string();
        write_meta(writer, "dtb:depth", &depth)?;

        // 其他元数据按键名排序写出，保证输出可复现
        let mut keys: Vec<&String> = self.metadata.other_metadata.keys().collect();
        keys.sort();
        for key in keys {
            write_meta(writer, key, &self.metadata.other_metadata[key])?;
        }

        writer.write_event(Event::End(BytesEnd::new("head")))?;
        Ok(())
    }

    fn write_doc_title<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let text = self
            .doc_title
            .as_ref()
            .map(|title| title.text.as_str())
            .unwrap_or("");

        writer.write_event(Event::Start(BytesStart::new("docTitle")))?;
        writer.write_event(Event::Start(BytesStart::new("text")))?;
        writer.write_event(Event::Text(BytesText::new(text)))?;
        writer.write_event(Event::End(BytesEnd::new("text")))?;
        writer.write_event(Event::End(BytesEnd::new("docTitle")))?;
        Ok(())
    }

    fn write_nav_map<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_event(Event::Start(BytesStart::new("navMap")))?;
        for nav_point in &self.nav_map.nav_points {
            write_nav_point(writer, nav_point)?;
        }
        writer.write_event(Event::End(BytesEnd::new("navMap")))?;
        Ok(())
    }
}

fn write_meta<W: std::io::Write>(writer: &mut Writer<W>, name: &str, content: &str) -> Result<()> {
    let mut meta = BytesStart::new("meta");
    meta.push_attribute(("name", name));
    meta.push_attribute(("content", content));
    writer.write_event(Event::Empty(meta))?;
    Ok(())
}

fn write_nav_point<W: std::io::Write>(writer: &mut Writer<W>, nav_point: &NavPoint) -> Result<()> {
    let mut elem = BytesStart::new("navPoint");
    elem.push_attribute(("id", nav_point.id.as_str()));
    elem.push_attribute(("playOrder", nav_point.play_order.to_string().as_str()));
    if let Some(class) = &nav_point.class {
        elem.push_attribute(("class", class.as_str()));
    }
    writer.write_event(Event::Start(elem))?;

    writer.write_event(Event::Start(BytesStart::new("navLabel")))?;
    writer.write_event(Event::Start(BytesStart::new("text")))?;
    writer.write_event(Event::Text(BytesText::new(&nav_point.nav_label.text)))?;
    writer.write_event(Event::End(BytesEnd::new("text")))?;
    writer.write_event(Event::End(BytesEnd::new("navLabel")))?;

    let mut content = BytesStart::new("content");
    content.push_attribute(("src", nav_point.content.src.as_str()));
    writer.write_event(Event::Empty(content))?;

    for child in &nav_point.children {
        write_nav_point(writer, child)?;
    }

    writer.write_event(Event::End(BytesEnd::new("navPoint")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::ncx::navigation::{NavContent, NavLabel};

    fn sample_ncx() -> Ncx {
        let mut root = NavPoint::new(
            "book1".to_string(),
            1,
            NavLabel::new("第一卷".to_string()),
            NavContent::new("part1.html".to_string()),
        );
        root.add_child(NavPoint::new(
            "ch1".to_string(),
            2,
            NavLabel::new("第一章".to_string()),
            NavContent::new("part1.html#ch1".to_string()),
        ));
        Ncx::for_work("第一卷", Some("urn:uuid:1234".to_string()), root)
    }

    #[test]
    fn test_round_trip_write_parse() {
        let ncx = sample_ncx();
        let xml = ncx.to_xml().expect("序列化失败");
        let reparsed = Ncx::parse_xml(&xml).expect("重解析失败");

        assert_eq!(reparsed.title(), ncx.title());
        assert_eq!(reparsed.metadata.uid, ncx.metadata.uid);
        assert_eq!(reparsed.nav_map, ncx.nav_map);
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let ncx = sample_ncx();
        assert_eq!(ncx.to_xml().unwrap(), ncx.to_xml().unwrap());
    }

    #[test]
    fn test_nested_nav_points_serialized() {
        let ncx = sample_ncx();
        let xml = ncx.to_xml().expect("序列化失败");

        assert!(xml.contains("dtb:uid"));
        assert!(xml.contains("playOrder=\"1\""));
        assert!(xml.contains("playOrder=\"2\""));
        assert!(xml.contains("src=\"part1.html#ch1\""));
    }
}
