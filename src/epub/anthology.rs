//! 合集EPUB模块
//!
//! 表示一个已解码的合集EPUB，是拆分流水线的入口。打开时完成
//! 容器解码、OPF与NCX解析和引用校验，任何解析失败都中止整个
//! 拆分；之后的逐作品错误只影响对应的作品。

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::epub::container::{locate_opf, Container};
use crate::epub::error::{EpubError, Result};
use crate::epub::ncx::Ncx;
use crate::epub::opf::Opf;
use crate::epub::split::{assemble, plan, rewrite, SplitConfig};

/// 单部作品的拆分结果
#[derive(Debug)]
pub struct WorkResult {
    /// 作品标题
    pub title: String,
    /// 作者
    pub author: String,
    /// 拆分结果：成功为装配好的容器，失败为该作品的错误
    pub outcome: Result<Container>,
}

/// 写入磁盘后的单部作品结果
#[derive(Debug)]
pub struct SavedWork {
    /// 作品标题
    pub title: String,
    /// 写入结果：成功为输出文件路径
    pub outcome: Result<PathBuf>,
}

/// 表示一个已解码的合集EPUB
pub struct Anthology {
    container: Container,
    opf: Opf,
    ncx: Option<Ncx>,
    opf_dir: String,
    resources: HashMap<String, Vec<u8>>,
}

impl Anthology {
    /// 从文件路径打开合集
    ///
    /// # 参数
    /// * `path` - epub文件的路径
    ///
    /// # 返回值
    /// * `Result<Anthology>` - 成功返回合集实例，失败返回错误
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Anthology> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// 从字节内容解码合集
    ///
    /// 解码步骤：
    /// 1. 解码zip容器并校验mimetype
    /// 2. 通过META-INF/container.xml定位并解析OPF包文档
    /// 3. 解析清单中声明的NCX导航文档（若有）
    /// 4. 校验脊柱与导航点的引用一致性
    ///
    /// # 参数
    /// * `bytes` - EPUB文件的完整字节内容
    pub fn from_bytes(bytes: &[u8]) -> Result<Anthology> {
        let container = Container::decode(bytes)?;

        let opf_path = locate_opf(&container)?;
        let opf_dir = match opf_path.rfind('/') {
            Some(pos) => opf_path[..pos].to_string(),
            None => String::new(),
        };

        let opf_xml = container
            .get(&opf_path)
            .ok_or_else(|| EpubError::MissingResource(opf_path.clone()))?;
        let opf = Opf::parse_xml(&String::from_utf8_lossy(opf_xml))?;

        // 清单声明了NCX就必须能读到并解析，导航边界是拆分的依据
        let ncx = match opf.ncx_item() {
            Some(item) => {
                let full_path = join_path(&opf_dir, &item.href);
                let ncx_xml = container
                    .get(&full_path)
                    .ok_or_else(|| EpubError::MissingResource(full_path.clone()))?;
                Some(Ncx::parse_xml(&String::from_utf8_lossy(ncx_xml))?)
            }
            None => None,
        };

        opf.validate_references(ncx.as_ref())?;

        // 清单路径到文件字节的映射，供装配阶段使用
        let mut resources = HashMap::new();
        for item in &opf.manifest {
            if item.is_ncx() {
                continue;
            }
            if let Some(data) = container.get(&join_path(&opf_dir, &item.href)) {
                resources.insert(item.href.clone(), data.to_vec());
            }
        }

        Ok(Anthology {
            container,
            opf,
            ncx,
            opf_dir,
            resources,
        })
    }

    /// 获取合集的包文档
    pub fn opf(&self) -> &Opf {
        &self.opf
    }

    /// 获取合集的导航文档
    pub fn ncx(&self) -> Option<&Ncx> {
        self.ncx.as_ref()
    }

    /// 获取书籍的基本信息
    ///
    /// # 返回值
    /// * `(String, Vec<String>)` - (书名, 作者列表)
    pub fn book_info(&self) -> (String, Vec<String>) {
        let title = self
            .opf
            .metadata
            .title()
            .unwrap_or_else(|| "未知标题".to_string());

        let authors = self
            .opf
            .metadata
            .creators()
            .iter()
            .map(|creator| creator.name.clone())
            .collect();

        (title, authors)
    }

    /// 列出容器中的所有条目路径
    pub fn list_files(&self) -> Vec<String> {
        self.container
            .paths()
            .into_iter()
            .map(|path| path.to_string())
            .collect()
    }

    /// 根导航点数量（没有NCX时为0）
    pub fn root_nav_count(&self) -> usize {
        self.ncx
            .as_ref()
            .map(|ncx| ncx.nav_map.nav_points.len())
            .unwrap_or(0)
    }

    /// 按配置把合集拆分为多个独立作品
    ///
    /// 结果与配置中的作品一一对应。单部作品的失败（索引越界、
    /// 分区歧义、资源缺失）只标记该作品，不影响其他作品。
    ///
    /// # 参数
    /// * `config` - 拆分配置
    ///
    /// # 返回值
    /// * `Vec<WorkResult>` - 逐作品的拆分结果
    pub fn split(&self, config: &SplitConfig) -> Vec<WorkResult> {
        let strategy = config.closure.strategy();
        let partitions = plan(&self.opf, self.ncx.as_ref(), &config.works, strategy.as_ref());

        config
            .works
            .iter()
            .zip(partitions)
            .map(|(spec, partition)| {
                let outcome = partition.and_then(|p| {
                    let (opf, ncx) = rewrite(&self.opf, &p)?;
                    assemble(&opf, &ncx, &self.resources)
                });
                WorkResult {
                    title: spec.title.clone(),
                    author: spec.author.clone(),
                    outcome,
                }
            })
            .collect()
    }

    /// 拆分并把每部作品写入输出目录
    ///
    /// 输出文件名为`<作者> - <标题>.epub`，文件系统不允许的
    /// 字符替换为下划线。
    ///
    /// # 参数
    /// * `config` - 拆分配置
    /// * `output_dir` - 输出目录（不存在时创建）
    ///
    /// # 返回值
    /// * `Result<Vec<SavedWork>>` - 逐作品的写入结果
    pub fn split_to_dir<P: AsRef<Path>>(
        &self,
        config: &SplitConfig,
        output_dir: P,
    ) -> Result<Vec<SavedWork>> {
        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir)?;

        let saved = self
            .split(config)
            .into_iter()
            .map(|work| {
                let outcome = work.outcome.and_then(|container| {
                    let file_name = output_file_name(&work.author, &work.title);
                    let path = output_dir.join(file_name);
                    fs::write(&path, container.encode()?)?;
                    Ok(path)
                });
                SavedWork {
                    title: work.title,
                    outcome,
                }
            })
            .collect();

        Ok(saved)
    }

    /// OPF文件所在的目录（容器内路径）
    pub fn opf_directory(&self) -> &str {
        &self.opf_dir
    }
}

/// 拼接OPF目录与清单相对路径
fn join_path(dir: &str, href: &str) -> String {
    if dir.is_empty() {
        href.to_string()
    } else {
        format!("{}/{}", dir, href)
    }
}

/// 生成`<作者> - <标题>.epub`形式的输出文件名
fn output_file_name(author: &str, title: &str) -> String {
    let raw = format!("{} - {}.epub", author, title);
    raw.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .collect()
}
