//! 元数据处理模块
//!
//! 提供EPUB元数据的结构定义和处理功能。元数据条目按文档顺序
//! 保存，拆分时替换标题和作者，其余条目原样带入输出作品。

use std::collections::HashMap;

/// Dublin Core元数据条目，如 <dc:title>书名</dc:title>
#[derive(Debug, Clone, PartialEq)]
pub struct DcEntry {
    /// 元素本地名称（去掉dc:前缀，如title、creator）
    pub name: String,
    /// 元素文本内容
    pub value: String,
    /// 元素属性（如role、scheme、id等）
    pub attributes: HashMap<String, String>,
}

impl DcEntry {
    /// 创建不带属性的条目
    pub fn new(name: String, value: String) -> Self {
        Self {
            name,
            value,
            attributes: HashMap::new(),
        }
    }
}

/// 创建者信息(作者、编辑者等)
#[derive(Debug, Clone, PartialEq)]
pub struct Creator {
    /// 创建者姓名
    pub name: String,
    /// 角色(如aut、edt等)
    pub role: Option<String>,
}

/// OPF包文档的元数据
///
/// Dublin Core条目与name/content形式的meta标签分开保存，
/// 两者都保持文档顺序。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    entries: Vec<DcEntry>,
    metas: Vec<(String, String)>,
}

impl Metadata {
    /// 创建空的元数据
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个Dublin Core条目
    pub fn add_dublin_core(
        &mut self,
        name: String,
        value: String,
        attributes: HashMap<String, String>,
    ) {
        self.entries.push(DcEntry {
            name,
            value,
            attributes,
        });
    }

    /// 追加一个name/content形式的meta标签
    pub fn add_meta(&mut self, name: String, content: String) {
        self.metas.push((name, content));
    }

    /// 获取书籍标题（第一个title条目）
    pub fn title(&self) -> Option<String> {
        self.first_value("title")
    }

    /// 获取所有创建者信息
    pub fn creators(&self) -> Vec<Creator> {
        self.entries
            .iter()
            .filter(|entry| entry.name == "creator")
            .map(|entry| Creator {
                name: entry.value.clone(),
                role: entry.attributes.get("role").cloned(),
            })
            .collect()
    }

    /// 获取语言
    pub fn language(&self) -> Option<String> {
        self.first_value("language")
    }

    /// 获取第一个标识符
    pub fn identifier(&self) -> Option<String> {
        self.first_value("identifier")
    }

    /// 获取带id属性的identifier条目的id值
    ///
    /// package元素的unique-identifier属性必须指向这个id。
    pub fn unique_identifier_id(&self) -> Option<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.name == "identifier")
            .find_map(|entry| entry.attributes.get("id"))
            .map(|id| id.as_str())
    }

    /// 替换标题为指定值
    ///
    /// 原有的title条目全部移除，在条目列表开头插入新标题。
    pub fn set_title(&mut self, title: &str) {
        self.entries.retain(|entry| entry.name != "title");
        self.entries
            .insert(0, DcEntry::new("title".to_string(), title.to_string()));
    }

    /// 替换创建者为单一作者
    ///
    /// 原有的creator条目全部移除，新作者插入到标题之后。
    pub fn set_creator(&mut self, author: &str) {
        self.entries.retain(|entry| entry.name != "creator");
        let mut entry = DcEntry::new("creator".to_string(), author.to_string());
        entry
            .attributes
            .insert("role".to_string(), "aut".to_string());
        let pos = if self.entries.is_empty() { 0 } else { 1 };
        self.entries.insert(pos, entry);
    }

    /// 按文档顺序访问所有Dublin Core条目
    pub fn entries(&self) -> &[DcEntry] {
        &self.entries
    }

    /// 按文档顺序访问所有meta标签
    pub fn metas(&self) -> &[(String, String)] {
        &self.metas
    }

    fn first_value(&self, name: &str) -> Option<String> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metadata() -> Metadata {
        let mut metadata = Metadata::new();
        metadata.add_dublin_core("title".to_string(), "合集".to_string(), HashMap::new());
        let mut attrs = HashMap::new();
        attrs.insert("role".to_string(), "aut".to_string());
        metadata.add_dublin_core("creator".to_string(), "某作者".to_string(), attrs);
        metadata.add_dublin_core("language".to_string(), "zh-CN".to_string(), HashMap::new());
        metadata.add_dublin_core(
            "identifier".to_string(),
            "urn:uuid:1234".to_string(),
            HashMap::new(),
        );
        metadata
    }

    #[test]
    fn test_basic_accessors() {
        let metadata = sample_metadata();
        assert_eq!(metadata.title(), Some("合集".to_string()));
        assert_eq!(metadata.language(), Some("zh-CN".to_string()));
        assert_eq!(metadata.identifier(), Some("urn:uuid:1234".to_string()));

        let creators = metadata.creators();
        assert_eq!(creators.len(), 1);
        assert_eq!(creators[0].name, "某作者");
        assert_eq!(creators[0].role, Some("aut".to_string()));
    }

    #[test]
    fn test_set_title_and_creator_replace_existing() {
        let mut metadata = sample_metadata();
        metadata.set_title("第一卷");
        metadata.set_creator("新作者");

        assert_eq!(metadata.title(), Some("第一卷".to_string()));
        let creators = metadata.creators();
        assert_eq!(creators.len(), 1);
        assert_eq!(creators[0].name, "新作者");

        // 语言和标识符保留
        assert_eq!(metadata.language(), Some("zh-CN".to_string()));
        assert_eq!(metadata.identifier(), Some("urn:uuid:1234".to_string()));
    }
}
