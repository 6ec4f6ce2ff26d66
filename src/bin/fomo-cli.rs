//! FOMO CLI 客户端（测试版）
//!
//! 非交互式 CLI，用于测试和展示同步功能
//! 启动时通过命令行参数指定账号，自动登录，只展示同步到的信息

use anyhow::Result;
use clap::Parser;
use fomo_sdk_core_rust::fomo::client::{ClientConfig, FomoClient};
use fomo_sdk_core_rust::fomo::friend::FriendListener;
use fomo_sdk_core_rust::fomo::group::{Group, GroupListener};
use fomo_sdk_core_rust::fomo::place::{Place, PlaceListener};
use fomo_sdk_core_rust::fomo::route::RouteListener;
use fomo_sdk_core_rust::fomo::types::LatLng;
use fomo_sdk_core_rust::fomo::user::User;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::info;

/// FOMO CLI 客户端
#[derive(Parser, Debug)]
#[command(name = "fomo-cli")]
#[command(about = "FOMO CLI 客户端 - 用于测试和展示同步功能", long_about = None)]
struct Args {
    /// 登录邮箱
    #[arg(short, long)]
    email: String,

    /// 登录密码
    #[arg(short, long)]
    password: String,

    /// 远端存储基础地址
    #[arg(long, default_value = "http://localhost:54321")]
    store_url: String,

    /// 远端存储 API key
    #[arg(long, default_value = "")]
    store_key: String,

    /// 地图服务商 API key
    #[arg(long, default_value = "")]
    maps_key: String,

    /// 运行时长（秒），0 表示持续运行
    #[arg(short, long, default_value = "0")]
    duration: u64,

    /// 日志级别（默认: info,fomo_sdk_core_rust=debug）
    #[arg(long, default_value = "info,fomo_sdk_core_rust=debug")]
    log_level: String,
}

/// 初始化日志（同时输出到 stdout 和文件）
fn init_logger(log_level: &str) {
    use std::fs::OpenOptions;
    use std::io;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    // 优先使用环境变量 RUST_LOG（如果设置了），否则使用命令行参数
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    // 创建日志文件（追加模式）
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("无法创建日志文件 debug.log");

    // 输出到 stdout（控制台），保留 ANSI 颜色代码用于终端显示
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(true);

    // 输出到文件，禁用 ANSI 颜色代码（文件不需要颜色）
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    info!("[CLI] 📝 日志已同时输出到控制台和文件: debug.log");
}

/// 设置监听器（输出所有同步到的信息）
fn setup_listeners(client: &mut FomoClient) {
    // 好友监听器
    struct CliFriendListener;
    #[async_trait::async_trait]
    impl FriendListener for CliFriendListener {
        async fn on_friend_list_changed(&self, friends: Vec<User>) {
            info!("[CLI/Friend] 👥 好友列表变更（共 {} 人）", friends.len());
            for friend in &friends {
                info!(
                    "[CLI/Friend]   - {} ({}, {})",
                    friend.display_name, friend.latitude, friend.longitude
                );
            }
        }

        async fn on_friend_request_list_changed(&self, requesters: Vec<User>) {
            info!("[CLI/Friend] 📝 好友申请变更（共 {} 条）", requesters.len());
            for requester in &requesters {
                info!("[CLI/Friend]   - 来自 {}", requester.username);
            }
        }
    }
    client.set_friend_listener(Arc::new(CliFriendListener));

    // 群组监听器
    struct CliGroupListener;
    #[async_trait::async_trait]
    impl GroupListener for CliGroupListener {
        async fn on_group_list_changed(&self, groups: Vec<Group>) {
            info!("[CLI/Group] 👥 群组列表变更（共 {} 个）", groups.len());
        }

        async fn on_group_request_list_changed(&self, requests: Vec<Group>) {
            info!("[CLI/Group] 📝 群组邀请变更（共 {} 条）", requests.len());
            for request in &requests {
                info!("[CLI/Group]   - 邀请加入 {}", request.name);
            }
        }

        async fn on_group_member_list_changed(&self, members: Vec<User>) {
            info!("[CLI/Group] 👤 成员列表变更（共 {} 人）", members.len());
        }
    }
    client.set_group_listener(Arc::new(CliGroupListener));

    // 地点监听器
    struct CliPlaceListener;
    #[async_trait::async_trait]
    impl PlaceListener for CliPlaceListener {
        async fn on_place_list_changed(&self, places: Vec<Place>) {
            info!("[CLI/Place] 📍 地点列表变更（共 {} 个）", places.len());
        }
    }
    client.set_place_listener(Arc::new(CliPlaceListener));

    // 路线监听器
    struct CliRouteListener;
    #[async_trait::async_trait]
    impl RouteListener for CliRouteListener {
        async fn on_route_changed(&self, route: Option<Vec<LatLng>>, destination: Option<LatLng>) {
            match (route, destination) {
                (Some(route), Some(destination)) => info!(
                    "[CLI/Route] 🗺️ 路线变更: {} 个点，目的地 ({}, {})",
                    route.len(),
                    destination.latitude,
                    destination.longitude
                ),
                _ => info!("[CLI/Route] 🗺️ 路线已清除"),
            }
        }
    }
    client.set_route_listener(Arc::new(CliRouteListener));
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志
    init_logger(&args.log_level);

    info!("[CLI] 🚀 FOMO CLI 客户端（测试模式）");
    info!("[CLI] 📧 邮箱: {}", args.email);
    info!("[CLI] ⏱️  运行时长: {} 秒（0=持续运行）", args.duration);

    let config = ClientConfig::new(args.store_url.clone(), args.store_key.clone(), args.maps_key.clone());
    let mut client = FomoClient::new(config);

    // 设置监听器
    setup_listeners(&mut client);

    // 登录
    client
        .sign_in(&args.email, &args.password)
        .await
        .map_err(|e| anyhow::anyhow!("登录失败: {}", e))?;

    let state = client.state();
    info!("[CLI] ✅ 登录成功！uid: {}", state.uid());
    info!(
        "[CLI] 👤 {} (@{}) 状态: {} {}",
        state.display_name(),
        state.username(),
        state.status().emoji,
        state.status().description
    );
    info!("[CLI] 👥 好友 {} 人，群组 {} 个，地点 {} 个",
        state.friends().len(),
        state.groups().len(),
        state.places().len()
    );

    info!("[CLI] 📥 开始周期同步...");
    if args.duration > 0 {
        info!("[CLI] ⏰ {} 秒后自动退出", args.duration);
        sleep(Duration::from_secs(args.duration)).await;
        client.sign_out().await;
        info!("[CLI] 👋 程序退出");
    } else {
        info!("[CLI] ⏰ 持续运行中，按 Ctrl+C 退出");
        // 持续运行直到被中断
        loop {
            sleep(Duration::from_secs(3600)).await;
        }
    }

    Ok(())
}
