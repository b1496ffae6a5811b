pub mod anthology;
pub mod container;
pub mod error;
pub mod ncx;
pub mod opf;
pub mod split;

// 重新导出错误处理
pub use error::{EpubError, Result};

// 重新导出容器相关
pub use container::{Container, ContainerFile, RootFile};

// 重新导出合集入口
pub use anthology::{Anthology, SavedWork, WorkResult};

// 重新导出OPF相关
pub use opf::{Creator, DcEntry, ManifestItem, Metadata, Opf, SpineItem};

// 重新导出NCX相关
pub use ncx::{DocTitle, NavContent, NavLabel, NavMap, NavPoint, Ncx};

// 重新导出拆分引擎相关
pub use split::{ClosureKind, PartitionSpec, SelectionRule, SplitConfig, WorkPartition};
