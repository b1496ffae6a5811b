use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EpubError>;

/// Epub拆分相关的错误类型
#[derive(Error, Debug)]
pub enum EpubError {
    #[error("IO错误: {0}")]
    Io(#[from] io::Error),

    #[error("Zip文件错误: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("容器格式错误: {0}")]
    MalformedContainer(String),

    #[error("缺少mimetype文件")]
    MissingMimetype,

    #[error("无效的mimetype: 期望 {expected}, 找到: {found}")]
    InvalidMimetype { expected: String, found: String },

    #[error("XML解析错误: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("container.xml解析错误: {0}")]
    ContainerParseError(String),

    #[error("OPF包文档错误: {0}")]
    InvalidPackageDocument(String),

    #[error("NCX导航文档错误: {0}")]
    InvalidNavigationDocument(String),

    #[error("拆分规则索引越界: 第 {index} 个导航点不存在(共 {available} 个)")]
    PartitionSpecOutOfRange { index: usize, available: usize },

    #[error("拆分规则存在歧义: 文档 {path} 同时属于 \"{first}\" 和 \"{second}\"")]
    AmbiguousPartition {
        path: String,
        first: String,
        second: String,
    },

    #[error("缺少资源文件: {0}")]
    MissingResource(String),

    #[error("配置文件错误: {0}")]
    ConfigError(String),
}
