//! 拆分规则配置模块
//!
//! 提供作品分区规则的结构定义，支持从YAML文件加载配置。
//! 每条规则描述一部目标作品：标题、作者和选择规则。

use crate::epub::error::{EpubError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 作品的选择规则
///
/// 不同的合集用不同方式编码作品边界，选择规则描述如何在
/// 源合集中圈定一部作品的内容。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionRule {
    /// 第N个根导航点及其全部后代（从1开始计数）
    NavIndex(usize),
    /// 清单路径携带指定前缀的全部条目
    PathPrefix(String),
}

/// 单部目标作品的分区规则
///
/// 由调用方在规划开始前构造，被规划器消费一次，不会被修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionSpec {
    /// 作品标题
    pub title: String,
    /// 作者
    pub author: String,
    /// 选择规则
    pub rule: SelectionRule,
}

impl PartitionSpec {
    /// 创建基于导航点索引的分区规则
    pub fn by_nav_index(title: &str, author: &str, index: usize) -> Self {
        Self {
            title: title.to_string(),
            author: author.to_string(),
            rule: SelectionRule::NavIndex(index),
        }
    }

    /// 创建基于路径前缀的分区规则
    pub fn by_path_prefix(title: &str, author: &str, prefix: &str) -> Self {
        Self {
            title: title.to_string(),
            author: author.to_string(),
            rule: SelectionRule::PathPrefix(prefix.to_string()),
        }
    }
}

/// 闭包解析策略的种类（配置文件中选择）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosureKind {
    /// 纯NCX子树成员关系，共享资源全部带入（默认）
    #[default]
    NcxSubtree,
    /// 文件名数字前缀分组（如001_xxx.html）
    FilePrefix,
    /// 每部作品独立子目录分组
    Subdirectory,
}

/// 一次拆分任务的完整配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// 闭包解析策略
    #[serde(default)]
    pub closure: ClosureKind,
    /// 目标作品列表（顺序即输出顺序）
    pub works: Vec<PartitionSpec>,
}

impl SplitConfig {
    /// 从YAML配置文件加载拆分配置
    ///
    /// # 参数
    /// * `path` - 配置文件路径
    ///
    /// # 返回值
    /// * `Result<Self>` - 加载成功返回配置实例，失败返回错误
    ///
    /// # 示例
    ///
    /// ```no_run
    /// use bookcleaver::epub::split::SplitConfig;
    /// let config = SplitConfig::from_file("split.yaml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| EpubError::ConfigError(format!("无法读取配置文件: {}", e)))?;

        let config: SplitConfig = serde_yml::from_str(&content)
            .map_err(|e| EpubError::ConfigError(format!("配置文件格式错误: {}", e)))?;

        if config.works.is_empty() {
            return Err(EpubError::ConfigError(
                "配置中没有任何目标作品".to_string(),
            ));
        }

        Ok(config)
    }

    /// 生成默认配置文件模板
    ///
    /// # 参数
    /// * `path` - 模板写入路径
    ///
    /// # 返回值
    /// * `Result<()>` - 生成成功返回Ok，失败返回错误
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let default_config = Self::default_config();
        let yaml_content = serde_yml::to_string(&default_config)
            .map_err(|e| EpubError::ConfigError(format!("序列化配置失败: {}", e)))?;

        let content_with_header = format!(
            "# EPUB合集拆分配置文件\n# closure: 闭包解析策略(ncx_subtree / file_prefix / subdirectory)\n# works: 目标作品列表，rule为nav_index(根导航点序号，从1开始)或path_prefix(路径前缀)\n\n{}",
            yaml_content
        );

        fs::write(path, content_with_header)
            .map_err(|e| EpubError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }

    /// 获取默认配置（示例性质的三卷本拆分）
    pub fn default_config() -> Self {
        Self {
            closure: ClosureKind::NcxSubtree,
            works: vec![
                PartitionSpec::by_nav_index("第一卷", "未知作者", 1),
                PartitionSpec::by_nav_index("第二卷", "未知作者", 2),
                PartitionSpec::by_nav_index("第三卷", "未知作者", 3),
            ],
        }
    }
}
