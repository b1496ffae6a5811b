use bookcleaver::{Anthology, Result, SplitConfig};
use clap::Parser;
use std::process::ExitCode;

/// 📚 BookCleaver - EPUB合集拆分工具
#[derive(Parser)]
#[command(name = "bookcleaver")]
#[command(about = "一个用于将EPUB合集拆分为独立书籍的Rust工具")]
#[command(version)]
struct Args {
    /// 合集EPUB文件路径
    #[arg(help = "要拆分的合集EPUB文件路径", required_unless_present = "init_config")]
    epub_file: Option<String>,

    /// 拆分配置文件路径
    #[arg(short, long, default_value = "split.yaml", help = "拆分配置文件(YAML)")]
    config: String,

    /// 输出目录
    #[arg(short, long, default_value = "output", help = "独立EPUB的输出目录")]
    output: String,

    /// 详细输出模式
    #[arg(short, long, help = "显示详细信息")]
    verbose: bool,

    /// 只规划不写出
    #[arg(long, help = "只显示拆分计划，不写出任何文件")]
    dry_run: bool,

    /// 生成默认配置文件模板
    #[arg(long, help = "在配置文件路径生成默认模板后退出")]
    init_config: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    println!("📚 BookCleaver - EPUB合集拆分工具");

    if args.init_config {
        return match SplitConfig::generate_default_config(&args.config) {
            Ok(()) => {
                println!("✅ 已生成配置模板: {}", args.config);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ 错误: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    // required_unless_present保证此处一定有值
    let epub_file = args.epub_file.as_deref().unwrap_or_default();

    match split_anthology(epub_file, &args) {
        Ok((0, _)) => {
            println!("🎉 拆分完成！");
            ExitCode::SUCCESS
        }
        Ok((failed, total)) if batch_succeeded(failed, total) => {
            eprintln!("⚠️  拆分完成，但有 {} 部作品失败(共 {} 部)", failed, total);
            ExitCode::SUCCESS
        }
        Ok((_, total)) => {
            eprintln!("❌ 全部 {} 部作品拆分失败", total);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("❌ 错误: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// 批次是否算成功退出
///
/// 部分作品失败不影响退出码，只有全部作品失败才返回非零；
/// 源合集解析失败在更外层处理。
fn batch_succeeded(failed: usize, total: usize) -> bool {
    total == 0 || failed < total
}

/// 执行拆分流程，返回(失败的作品数, 作品总数)
fn split_anthology(path: &str, args: &Args) -> Result<(usize, usize)> {
    let config = SplitConfig::from_file(&args.config)?;

    println!("正在打开合集EPUB: {}", path);
    let anthology = Anthology::open(path)?;

    let (title, authors) = anthology.book_info();
    println!("\n📖 合集信息:");
    println!("  标题: {}", title);
    if !authors.is_empty() {
        println!("  作者: {}", authors.join("、"));
    }
    println!("  根导航点: {} 个", anthology.root_nav_count());
    println!("  目标作品: {} 部", config.works.len());

    if args.verbose {
        println!("\n📁 容器内容:");
        for (i, file) in anthology.list_files().iter().enumerate() {
            println!("  {}. {}", i + 1, file);
        }
    }

    let total = config.works.len();

    if args.dry_run {
        println!("\n🔍 拆分计划 (dry-run):");
        let mut failed = 0;
        for result in anthology.split(&config) {
            match result.outcome {
                Ok(container) => {
                    println!(
                        "  ✅ {} - {} ({} 个条目)",
                        result.author,
                        result.title,
                        container.entries.len()
                    );
                }
                Err(e) => {
                    failed += 1;
                    println!("  ❌ {}: {}", result.title, e);
                }
            }
        }
        return Ok((failed, total));
    }

    println!("\n✂️  正在拆分到目录: {}", args.output);
    let mut failed = 0;
    for saved in anthology.split_to_dir(&config, &args.output)? {
        match saved.outcome {
            Ok(path) => {
                println!("  ✅ {} -> {}", saved.title, path.display());
            }
            Err(e) => {
                failed += 1;
                eprintln!("  ❌ {}: {}", saved.title, e);
            }
        }
    }

    Ok((failed, total))
}

#[cfg(test)]
mod tests {
    use super::batch_succeeded;

    #[test]
    fn test_partial_failure_still_succeeds() {
        assert!(batch_succeeded(0, 3));
        // 3成功1失败的批次退出码为零
        assert!(batch_succeeded(1, 4));
        assert!(!batch_succeeded(3, 3));
    }
}
