//! NCX导航元素数据结构定义
//!
//! 定义NCX文件中的各种导航元素，包括导航点、导航标签、内容引用等。
//! 导航点构成自有树（子节点按值持有），子树可以被整体提取并
//! 交给独立的作品分区，不依赖源文档的生存期。

use std::collections::HashMap;

/// NCX元数据信息
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NcxMetadata {
    /// 唯一标识符（dtb:uid）
    pub uid: Option<String>,
    /// 导航深度（dtb:depth）
    pub depth: Option<u32>,
    /// 其他元数据
    pub other_metadata: HashMap<String, String>,
}

impl NcxMetadata {
    /// 创建新的NCX元数据
    pub fn new() -> Self {
        Self::default()
    }
}

/// 文档标题
#[derive(Debug, Clone, PartialEq)]
pub struct DocTitle {
    /// 标题文本
    pub text: String,
}

impl DocTitle {
    /// 创建新的文档标题
    pub fn new(text: String) -> Self {
        Self { text }
    }
}

/// 导航标签
#[derive(Debug, Clone, PartialEq)]
pub struct NavLabel {
    /// 标签文本
    pub text: String,
}

impl NavLabel {
    /// 创建新的导航标签
    pub fn new(text: String) -> Self {
        Self { text }
    }
}

/// 导航内容引用
#[derive(Debug, Clone, PartialEq)]
pub struct NavContent {
    /// 源文件路径（可能带 #锚点 片段）
    pub src: String,
}

impl NavContent {
    /// 创建新的导航内容引用
    pub fn new(src: String) -> Self {
        Self { src }
    }

    /// 获取去掉锚点片段的文件路径
    pub fn path(&self) -> &str {
        self.src.split('#').next().unwrap_or(&self.src)
    }
}

/// 导航点
#[derive(Debug, Clone, PartialEq)]
pub struct NavPoint {
    /// 唯一标识符
    pub id: String,
    /// 播放顺序
    pub play_order: u32,
    /// CSS类名（可选）
    pub class: Option<String>,
    /// 导航标签
    pub nav_label: NavLabel,
    /// 内容引用
    pub content: NavContent,
    /// 子导航点（文档顺序）
    pub children: Vec<NavPoint>,
}

impl NavPoint {
    /// 创建新的导航点
    pub fn new(id: String, play_order: u32, nav_label: NavLabel, content: NavContent) -> Self {
        Self {
            id,
            play_order,
            class: None,
            nav_label,
            content,
            children: Vec::new(),
        }
    }

    /// 添加子导航点
    pub fn add_child(&mut self, child: NavPoint) {
        self.children.push(child);
    }

    /// 获取所有导航点（包括子导航点）的平铺列表
    pub fn all_nav_points(&self) -> Vec<&NavPoint> {
        let mut points = vec![self];
        for child in &self.children {
            points.extend(child.all_nav_points());
        }
        points
    }

    /// 获取子树中所有内容文件的路径（锚点已剥离、去重、文档顺序）
    ///
    /// 这是作品分区的内容文件闭包来源：同一文件被多个导航点
    /// 引用时只出现一次。
    pub fn subtree_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        for nav_point in self.all_nav_points() {
            let path = nav_point.content.path();
            if !path.is_empty() && !paths.iter().any(|p| p == path) {
                paths.push(path.to_string());
            }
        }
        paths
    }

    /// 获取导航深度
    pub fn depth(&self) -> u32 {
        if self.children.is_empty() {
            1
        } else {
            1 + self
                .children
                .iter()
                .map(|child| child.depth())
                .max()
                .unwrap_or(0)
        }
    }

    /// 深度优先重新编号playOrder
    ///
    /// `next`为下一个可用的序号，调用后指向子树之后的序号。
    pub fn renumber(&mut self, next: &mut u32) {
        self.play_order = *next;
        *next += 1;
        for child in &mut self.children {
            child.renumber(next);
        }
    }
}

/// 导航地图
///
/// 根导航点按文档顺序保存。合集中每个根导航点通常对应一部
/// 作品，拆分引擎以此为分区边界。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavMap {
    /// 根导航点列表（文档顺序）
    pub nav_points: Vec<NavPoint>,
}

impl NavMap {
    /// 创建新的导航地图
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加根导航点
    pub fn add_nav_point(&mut self, nav_point: NavPoint) {
        self.nav_points.push(nav_point);
    }

    /// 获取所有导航点的平铺列表
    pub fn all_nav_points(&self) -> Vec<&NavPoint> {
        let mut all_points = Vec::new();
        for nav_point in &self.nav_points {
            all_points.extend(nav_point.all_nav_points());
        }
        all_points
    }

    /// 获取导航深度
    pub fn depth(&self) -> u32 {
        self.nav_points
            .iter()
            .map(|point| point.depth())
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nav(id: &str, order: u32, label: &str, src: &str) -> NavPoint {
        NavPoint::new(
            id.to_string(),
            order,
            NavLabel::new(label.to_string()),
            NavContent::new(src.to_string()),
        )
    }

    #[test]
    fn test_content_path_strips_anchor() {
        let content = NavContent::new("part1.html#chapter3".to_string());
        assert_eq!(content.path(), "part1.html");

        let plain = NavContent::new("part1.html".to_string());
        assert_eq!(plain.path(), "part1.html");
    }

    #[test]
    fn test_subtree_paths_dedup_and_order() {
        let mut root = nav("book1", 1, "第一卷", "part1.html");
        root.add_child(nav("ch1", 2, "第一章", "part1.html#ch1"));
        root.add_child(nav("ch2", 3, "第二章", "part2.html"));
        root.add_child(nav("ch3", 4, "第三章", "part2.html#late"));

        assert_eq!(root.subtree_paths(), vec!["part1.html", "part2.html"]);
    }

    #[test]
    fn test_depth_and_renumber() {
        let mut root = nav("book1", 9, "第一卷", "part1.html");
        let mut ch = nav("ch1", 7, "第一章", "part1.html#ch1");
        ch.add_child(nav("sec1", 8, "第一节", "part1.html#sec1"));
        root.add_child(ch);

        assert_eq!(root.depth(), 3);

        let mut next = 1;
        root.renumber(&mut next);
        assert_eq!(root.play_order, 1);
        assert_eq!(root.children[0].play_order, 2);
        assert_eq!(root.children[0].children[0].play_order, 3);
        assert_eq!(next, 4);
    }
}
