//! 分区规划模块
//!
//! 根据调用方提供的分区规则，为每部目标作品确定属于它的
//! 导航子树、清单路径闭包和脊柱子集。单部作品的规划失败
//! 不影响其他作品：结果按输入顺序逐项返回。

use crate::epub::error::{EpubError, Result};
use crate::epub::ncx::{NavContent, NavLabel, NavPoint, Ncx};
use crate::epub::opf::{Opf, SpineItem};
use crate::epub::split::closure::ClosureStrategy;
use crate::epub::split::spec::{PartitionSpec, SelectionRule};
use std::collections::HashSet;

/// 单部作品的分区结果
///
/// 由规划器创建，被包重写器消费后丢弃。所有路径按值持有，
/// 与源模型相互独立。
#[derive(Debug, Clone)]
pub struct WorkPartition {
    /// 作品标题
    pub title: String,
    /// 作者
    pub author: String,
    /// 文档内容的清单路径（清单顺序）
    pub document_paths: Vec<String>,
    /// 非文档资源的清单路径（清单顺序）
    pub resource_paths: Vec<String>,
    /// 过滤后的脊柱（相对顺序保持不变）
    pub spine: Vec<SpineItem>,
    /// 作品的导航子树
    pub nav_root: NavPoint,
}

/// 为每条分区规则规划一个作品分区
///
/// 结果与输入规则一一对应。索引越界、前缀无匹配等错误只
/// 标记对应的作品，其余作品继续规划。两部作品的文档闭包
/// 相交时，这对规则被判为歧义，双方都标记为
/// `AmbiguousPartition`；共享的非文档资源则复制进各自闭包，
/// 不算冲突。
///
/// # 参数
/// * `opf` - 源合集的包文档
/// * `ncx` - 源合集的导航文档（索引规则必需）
/// * `specs` - 分区规则列表
/// * `strategy` - 闭包解析策略
///
/// # 返回值
/// * `Vec<Result<WorkPartition>>` - 按输入顺序的逐作品结果
pub fn plan(
    opf: &Opf,
    ncx: Option<&Ncx>,
    specs: &[PartitionSpec],
    strategy: &dyn ClosureStrategy,
) -> Vec<Result<WorkPartition>> {
    let mut results: Vec<Result<WorkPartition>> = specs
        .iter()
        .enumerate()
        .map(|(index, spec)| plan_one(opf, ncx, spec, index, strategy))
        .collect();

    // 文档闭包两两相交检查
    let mut conflicts = Vec::new();
    for i in 0..results.len() {
        for j in (i + 1)..results.len() {
            let (Ok(first), Ok(second)) = (&results[i], &results[j]) else {
                continue;
            };
            let first_docs: HashSet<&str> =
                first.document_paths.iter().map(|p| p.as_str()).collect();
            if let Some(shared) = second
                .document_paths
                .iter()
                .find(|path| first_docs.contains(path.as_str()))
            {
                conflicts.push((i, j, shared.clone()));
            }
        }
    }

    for (i, j, path) in conflicts {
        let first = specs[i].title.clone();
        let second = specs[j].title.clone();
        for index in [i, j] {
            if results[index].is_ok() {
                results[index] = Err(EpubError::AmbiguousPartition {
                    path: path.clone(),
                    first: first.clone(),
                    second: second.clone(),
                });
            }
        }
    }

    results
}

/// 规划单部作品
fn plan_one(
    opf: &Opf,
    ncx: Option<&Ncx>,
    spec: &PartitionSpec,
    index: usize,
    strategy: &dyn ClosureStrategy,
) -> Result<WorkPartition> {
    // 第1步：解析选择规则，得到文档种子和导航子树
    let (documents, nav_root) = match &spec.rule {
        SelectionRule::NavIndex(nav_index) => resolve_nav_index(opf, ncx, spec, *nav_index)?,
        SelectionRule::PathPrefix(prefix) => resolve_path_prefix(opf, ncx, spec, index, prefix)?,
    };

    // 第2/3步：策略扩展出完整清单路径闭包，文档与资源分列
    let closure = strategy.resolve(&documents, opf);
    let mut document_paths = Vec::new();
    let mut resource_paths = Vec::new();
    for path in closure {
        match opf.item_by_href(&path) {
            Some(item) if item.is_document() => document_paths.push(path),
            Some(_) => resource_paths.push(path),
            None => {}
        }
    }

    // 第4步：过滤脊柱，保持相对顺序
    let doc_set: HashSet<&str> = document_paths.iter().map(|p| p.as_str()).collect();
    let spine = opf
        .spine
        .iter()
        .filter(|spine_item| {
            opf.item_by_id(&spine_item.idref)
                .map(|item| doc_set.contains(item.href.as_str()))
                .unwrap_or(false)
        })
        .cloned()
        .collect();

    Ok(WorkPartition {
        title: spec.title.clone(),
        author: spec.author.clone(),
        document_paths,
        resource_paths,
        spine,
        nav_root,
    })
}

/// 解析索引规则：第N个根导航点及其全部后代
fn resolve_nav_index(
    opf: &Opf,
    ncx: Option<&Ncx>,
    spec: &PartitionSpec,
    nav_index: usize,
) -> Result<(Vec<String>, NavPoint)> {
    let ncx = ncx.ok_or_else(|| {
        EpubError::InvalidNavigationDocument(format!(
            "作品 \"{}\" 使用索引规则，但合集没有NCX导航文档",
            spec.title
        ))
    })?;

    let available = ncx.nav_map.nav_points.len();
    if nav_index == 0 || nav_index > available {
        return Err(EpubError::PartitionSpecOutOfRange {
            index: nav_index,
            available,
        });
    }

    let nav_root = ncx.nav_map.nav_points[nav_index - 1].clone();

    // 子树内容路径解析到清单，得到内容文件闭包
    let documents = nav_root
        .subtree_paths()
        .into_iter()
        .filter_map(|path| opf.item_by_href(&path).map(|item| item.href.clone()))
        .collect();

    Ok((documents, nav_root))
}

/// 解析前缀规则：路径携带前缀记号的全部文档
fn resolve_path_prefix(
    opf: &Opf,
    ncx: Option<&Ncx>,
    spec: &PartitionSpec,
    index: usize,
    prefix: &str,
) -> Result<(Vec<String>, NavPoint)> {
    let documents: Vec<String> = opf
        .manifest
        .iter()
        .filter(|item| item.is_document() && path_carries_prefix(&item.href, prefix))
        .map(|item| item.href.clone())
        .collect();

    if documents.is_empty() {
        return Err(EpubError::ConfigError(format!(
            "路径前缀 \"{}\" 没有匹配到任何文档",
            prefix
        )));
    }

    let doc_set: HashSet<&str> = documents.iter().map(|p| p.as_str()).collect();

    // 完全落在前缀文档集合内的根导航点构成作品的目录子树
    let mut matching_roots = Vec::new();
    if let Some(ncx) = ncx {
        for root in &ncx.nav_map.nav_points {
            let paths = root.subtree_paths();
            if !paths.is_empty() && paths.iter().all(|path| doc_set.contains(path.as_str())) {
                matching_roots.push(root.clone());
            }
        }
    }

    let nav_root = match matching_roots.len() {
        1 => matching_roots.remove(0),
        // 没有可用子树时合成单节点目录，多个子树时合成共同父节点
        _ => {
            let mut root = NavPoint::new(
                format!("work-{}", index + 1),
                0,
                NavLabel::new(spec.title.clone()),
                NavContent::new(documents[0].clone()),
            );
            root.children = matching_roots;
            root
        }
    };

    Ok((documents, nav_root))
}

/// 检查路径的任一段是否以前缀记号开头
fn path_carries_prefix(href: &str, prefix: &str) -> bool {
    href.split('/').any(|segment| segment.starts_with(prefix))
}
