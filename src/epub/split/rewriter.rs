//! 包重写模块
//!
//! 根据作品分区，从源合集的包文档派生出独立作品的包文档和
//! 导航文档。源模型保持不变，所有输出都是新构造的。

use crate::epub::error::Result;
use crate::epub::ncx::Ncx;
use crate::epub::opf::{ManifestItem, Opf, NCX_MEDIA_TYPE};
use crate::epub::split::planner::WorkPartition;
use std::collections::HashSet;

/// 输出作品中NCX的清单ID和路径
pub const WORK_NCX_HREF: &str = "toc.ncx";

/// 为单部作品派生包文档和导航文档
///
/// 元数据以源合集为基础：标题和创建者替换为作品自己的，
/// 语言、标识符等其余条目原样保留。清单按源顺序过滤到
/// 闭包内的条目，并补上作品自己的NCX项；脊柱来自分区，
/// toc属性指向新NCX。派生完成后重新校验引用完整性。
///
/// # 参数
/// * `source` - 源合集的包文档
/// * `partition` - 规划器产出的作品分区
///
/// # 返回值
/// * `Result<(Opf, Ncx)>` - 作品的包文档与导航文档
pub fn rewrite(source: &Opf, partition: &WorkPartition) -> Result<(Opf, Ncx)> {
    let mut metadata = source.metadata.clone();
    metadata.set_title(&partition.title);
    metadata.set_creator(&partition.author);

    let closure: HashSet<&str> = partition
        .document_paths
        .iter()
        .chain(partition.resource_paths.iter())
        .map(|path| path.as_str())
        .collect();

    // 清单保持源文档顺序；源合集的NCX项不带入，换成作品自己的
    let mut manifest: Vec<ManifestItem> = source
        .manifest
        .iter()
        .filter(|item| !item.is_ncx() && closure.contains(item.href.as_str()))
        .cloned()
        .collect();
    manifest.push(ManifestItem::new(
        WORK_NCX_HREF.to_string(),
        WORK_NCX_HREF.to_string(),
        NCX_MEDIA_TYPE.to_string(),
    ));

    let ncx = Ncx::for_work(
        &partition.title,
        metadata.identifier(),
        partition.nav_root.clone(),
    );

    let opf = Opf {
        version: source.version.clone(),
        metadata,
        manifest,
        spine: partition.spine.clone(),
        spine_toc: Some(WORK_NCX_HREF.to_string()),
    };

    opf.validate_references(Some(&ncx))?;

    Ok((opf, ncx))
}
