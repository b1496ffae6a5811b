//! EPUB容器编解码模块
//!
//! 提供zip容器的解码与编码功能。EPUB容器要求第一个条目为
//! 未压缩的mimetype文件，内容为`application/epub+zip`，
//! 其余条目使用deflate压缩。

use crate::epub::error::{EpubError, Result};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// mimetype条目的标准内容
pub const EPUB_MIMETYPE: &str = "application/epub+zip";

/// 容器中的单个文件条目
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerFile {
    /// 容器内路径
    pub path: String,
    /// 文件内容
    pub data: Vec<u8>,
}

/// 解码后的EPUB容器
///
/// 条目顺序即zip归档中的顺序，编码时原样保留，
/// 以保证输出可复现。
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    /// 有序的文件条目列表
    pub entries: Vec<ContainerFile>,
}

impl Container {
    /// 创建一个只含mimetype条目的新容器
    pub fn new() -> Self {
        Self {
            entries: vec![ContainerFile {
                path: "mimetype".to_string(),
                data: EPUB_MIMETYPE.as_bytes().to_vec(),
            }],
        }
    }

    /// 解码zip字节流为容器
    ///
    /// 检查步骤：
    /// 1. 字节流必须是合法的zip归档
    /// 2. 必须存在mimetype条目
    /// 3. mimetype条目必须未压缩存储
    /// 4. mimetype内容必须为`application/epub+zip`
    ///
    /// # 参数
    /// * `bytes` - EPUB文件的完整字节内容
    ///
    /// # 返回值
    /// * `Result<Container>` - 解码后的容器
    pub fn decode(bytes: &[u8]) -> Result<Container> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| EpubError::MalformedContainer(format!("不是有效的zip归档: {}", e)))?;

        let mut entries = Vec::new();
        let mut mimetype_seen = false;

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }

            let path = file.name().to_string();
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;

            if path == "mimetype" {
                mimetype_seen = true;
                if file.compression() != CompressionMethod::Stored {
                    return Err(EpubError::MalformedContainer(
                        "mimetype条目被压缩存储".to_string(),
                    ));
                }
                let content = String::from_utf8_lossy(&data);
                if content.trim() != EPUB_MIMETYPE {
                    return Err(EpubError::InvalidMimetype {
                        expected: EPUB_MIMETYPE.to_string(),
                        found: content.trim().to_string(),
                    });
                }
            }

            entries.push(ContainerFile { path, data });
        }

        if !mimetype_seen {
            return Err(EpubError::MissingMimetype);
        }

        Ok(Container { entries })
    }

    /// 编码容器为zip字节流
    ///
    /// mimetype条目总是第一个写入且不压缩，其余条目按插入顺序
    /// 使用deflate压缩写入。
    ///
    /// # 返回值
    /// * `Result<Vec<u8>>` - 编码后的zip字节流
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mimetype = self
            .entries
            .iter()
            .find(|entry| entry.path == "mimetype")
            .ok_or(EpubError::MissingMimetype)?;

        if mimetype.data != EPUB_MIMETYPE.as_bytes() {
            return Err(EpubError::InvalidMimetype {
                expected: EPUB_MIMETYPE.to_string(),
                found: String::from_utf8_lossy(&mimetype.data).to_string(),
            });
        }

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        zip.start_file("mimetype", stored)?;
        zip.write_all(&mimetype.data)?;

        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for entry in &self.entries {
            if entry.path == "mimetype" {
                continue;
            }
            zip.start_file(&entry.path, deflated)?;
            zip.write_all(&entry.data)?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    /// 按路径查找条目内容
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|entry| entry.path == path)
            .map(|entry| entry.data.as_slice())
    }

    /// 插入或替换条目（保持首次插入的顺序）
    pub fn insert(&mut self, path: &str, data: Vec<u8>) {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.path == path) {
            entry.data = data;
        } else {
            self.entries.push(ContainerFile {
                path: path.to_string(),
                data,
            });
        }
    }

    /// 获取所有条目路径
    pub fn paths(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.path.as_str()).collect()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

/// Container.xml中的rootfile信息
#[derive(Debug, Clone)]
pub struct RootFile {
    pub full_path: String,
    pub media_type: String,
}

/// 解析container.xml内容，返回全部rootfile条目
///
/// # 参数
/// * `xml_content` - container.xml的文件内容
///
/// # 返回值
/// * `Result<Vec<RootFile>>` - 解析出的rootfile列表
pub fn parse_container_xml(xml_content: &str) -> Result<Vec<RootFile>> {
    let mut reader = Reader::from_str(xml_content);
    reader.config_mut().trim_text(true);
    reader.config_mut().expand_empty_elements = true;

    let mut rootfiles = Vec::new();
    let mut buf = Vec::new();
    let mut in_rootfiles = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let local_name = e.local_name();
                match local_name.as_ref() {
                    b"rootfiles" => {
                        in_rootfiles = true;
                    }
                    b"rootfile" if in_rootfiles => {
                        let mut full_path = String::new();
                        let mut media_type = String::new();

                        for attr_result in e.attributes() {
                            let attr = attr_result.map_err(|e| {
                                EpubError::XmlError(quick_xml::Error::InvalidAttr(e))
                            })?;
                            match attr.key.local_name().as_ref() {
                                b"full-path" => {
                                    full_path = String::from_utf8_lossy(&attr.value).to_string();
                                }
                                b"media-type" => {
                                    media_type = String::from_utf8_lossy(&attr.value).to_string();
                                }
                                _ => {}
                            }
                        }

                        if !full_path.is_empty() && !media_type.is_empty() {
                            rootfiles.push(RootFile {
                                full_path,
                                media_type,
                            });
                        }
                    }
                    _ => {}
                }
            }
            Event::End(ref e) => {
                if e.local_name().as_ref() == b"rootfiles" {
                    in_rootfiles = false;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if rootfiles.is_empty() {
        return Err(EpubError::ContainerParseError(
            "没有找到任何rootfile条目".to_string(),
        ));
    }

    Ok(rootfiles)
}

/// 从容器中定位OPF包文档的路径
///
/// 读取META-INF/container.xml并返回第一个
/// application/oebps-package+xml类型的rootfile路径。
///
/// # 参数
/// * `container` - 解码后的容器
///
/// # 返回值
/// * `Result<String>` - OPF文件的完整路径
pub fn locate_opf(container: &Container) -> Result<String> {
    let xml = container
        .get("META-INF/container.xml")
        .ok_or_else(|| EpubError::ContainerParseError("缺少META-INF/container.xml".to_string()))?;

    let rootfiles = parse_container_xml(&String::from_utf8_lossy(xml))?;

    // 查找第一个标准类型的rootfile，没有则退回到第一个条目
    let path = rootfiles
        .iter()
        .find(|rf| rf.media_type == "application/oebps-package+xml")
        .or_else(|| rootfiles.first())
        .map(|rf| rf.full_path.clone());

    path.ok_or_else(|| {
        EpubError::ContainerParseError("container.xml中没有找到有效的rootfile".to_string())
    })
}

/// 生成输出容器使用的container.xml内容
///
/// 固定指向OEBPS/content.opf。
pub fn container_xml() -> String {
    concat!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
        "<container version=\"1.0\" xmlns=\"urn:oasis:names:tc:opendocument:xmlns:container\">\n",
        "   <rootfiles>\n",
        "      <rootfile full-path=\"OEBPS/content.opf\" media-type=\"application/oebps-package+xml\"/>\n",
        "   </rootfiles>\n",
        "</container>"
    )
    .to_string()
}
