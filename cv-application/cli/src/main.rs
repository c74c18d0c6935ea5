//! Commcell CLI 应用

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "cvctl")]
#[command(about = "Commcell 命令行工具", long_about = None)]
#[command(version)]
struct Cli {
    /// 日志级别
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// 使用的 profile，缺省为默认 profile
    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Profile 管理
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// 登录并显示 CommServ 信息
    Login,

    /// 事件查询
    Events {
        #[command(subcommand)]
        action: EventsAction,
    },

    /// 区域管理
    Regions {
        #[command(subcommand)]
        action: RegionsAction,
    },

    /// 全局过滤器
    Filters {
        #[command(subcommand)]
        action: FiltersAction,
    },

    /// 软件缓存
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// 系统设置
    System {
        #[command(subcommand)]
        action: SystemAction,
    },

    /// 子客户端管理
    Subclients {
        #[command(subcommand)]
        action: SubclientsAction,
    },

    /// QCommand 执行
    Qcommand {
        #[command(subcommand)]
        action: QcommandAction,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// 添加 profile
    Add {
        /// Profile 名称
        name: String,
        /// Web 控制台主机名
        hostname: String,
        /// 登录用户名
        #[arg(long, short = 'u')]
        username: String,
        /// 登录密码（不指定时使用 CVCTL_PASSWORD）
        #[arg(long)]
        password: Option<String>,
        /// Web 服务地址
        #[arg(long)]
        web_service_url: Option<String>,
        /// 不校验 SSL 证书
        #[arg(long)]
        insecure: bool,
        /// 仅使用 HTTPS
        #[arg(long)]
        force_https: bool,
        /// CA 证书路径
        #[arg(long)]
        certificate: Option<String>,
    },
    /// 列出 profile
    List,
    /// 移除 profile
    Remove { name: String },
    /// 设置默认 profile
    Default { name: String },
}

#[derive(Subcommand)]
enum EventsAction {
    /// 列出事件
    List {
        /// 过滤条件，格式 key=value，可重复
        #[arg(long = "filter", short = 'f')]
        filters: Vec<String>,
        /// 显示事件详情
        #[arg(long)]
        details: bool,
    },
    /// 显示单个事件
    Show {
        /// 事件 ID
        id: String,
    },
}

#[derive(Subcommand)]
enum RegionsAction {
    /// 列出区域
    List,
    /// 显示区域详情
    Show { name: String },
    /// 创建区域
    Add {
        /// 区域名称
        name: String,
        /// 区域类型
        #[arg(long, default_value = "USER_CREATED")]
        region_type: String,
        /// 位置列表（JSON 数组）
        #[arg(long)]
        locations: Option<String>,
    },
    /// 删除区域
    Delete { name: String },
}

#[derive(Subcommand)]
enum FiltersAction {
    /// 显示过滤列表
    Show {
        /// WINDOWS / UNIX / NAS
        kind: String,
    },
    /// 追加过滤项
    Add {
        kind: String,
        #[arg(required = true)]
        filters: Vec<String>,
    },
    /// 覆盖过滤列表
    Overwrite {
        kind: String,
        #[arg(required = true)]
        filters: Vec<String>,
    },
    /// 清空过滤列表
    Clear { kind: String },
}

#[derive(Subcommand)]
enum CacheAction {
    /// 显示 CommServ 缓存路径
    CsPath,
    /// 列出远程缓存客户端
    RemoteClients,
    /// 提交 CommServ 缓存
    Commit,
}

#[derive(Subcommand)]
enum SystemAction {
    /// 查询或设置 GUI 超时
    GuiTimeout {
        /// 新的超时时间（分钟）
        #[arg(long)]
        set: Option<u32>,
    },
}

#[derive(Subcommand)]
enum SubclientsAction {
    /// 列出子客户端
    List {
        /// 客户端名称
        client: String,
        /// 代理名称
        #[arg(long, default_value = "file system")]
        agent: String,
        #[arg(long)]
        instance: Option<String>,
        #[arg(long)]
        backupset: Option<String>,
    },
    /// 触发备份
    Backup {
        /// 客户端名称
        client: String,
        /// 子客户端名称
        subclient: String,
        #[arg(long, default_value = "file system")]
        agent: String,
        #[arg(long)]
        instance: Option<String>,
        #[arg(long)]
        backupset: Option<String>,
        /// full / incremental / transaction_log / differential / synthetic_full
        #[arg(long, default_value = "incremental")]
        level: String,
        /// 合成全备前运行增量备份
        #[arg(long)]
        incremental_backup: bool,
        /// 收集元数据
        #[arg(long)]
        collect_metadata: bool,
    },
}

#[derive(Subcommand)]
enum QcommandAction {
    /// 执行 QCommand
    Exec {
        /// 命令内容，例如 `qlist client`
        command: String,
        /// 输入 XML 文件
        #[arg(long)]
        input_xml: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志，RUST_LOG 优先
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.to_lowercase()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("cvctl 启动");

    let profile = cli.profile.as_deref();

    // 处理命令
    match cli.command {
        Commands::Profile { action } => commands::profile::handle(action).await?,
        Commands::Login => commands::login::handle(profile).await?,
        Commands::Events { action } => commands::events::handle(profile, action).await?,
        Commands::Regions { action } => commands::regions::handle(profile, action).await?,
        Commands::Filters { action } => commands::filters::handle(profile, action).await?,
        Commands::Cache { action } => commands::cache::handle(profile, action).await?,
        Commands::System { action } => commands::system::handle(profile, action).await?,
        Commands::Subclients { action } => commands::subclients::handle(profile, action).await?,
        Commands::Qcommand { action } => commands::qcommand::handle(profile, action).await?,
    }

    Ok(())
}
