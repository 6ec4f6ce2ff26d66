//! 单测公共工具

use crate::fomo::state::StateStore;
use crate::fomo::store::{MemoryStore, TableStore};
use serde_json::json;
use std::sync::{Arc, Once};

static INIT_LOGGER: Once = Once::new();

pub(crate) fn init_test_logger() {
    INIT_LOGGER.call_once(|| {
        use tracing_subscriber::prelude::*;
        use tracing_subscriber::EnvFilter;

        // 关闭 hyper_util::client 等第三方库的 debug，只保留当前 crate 的 debug
        let filter_layer = EnvFilter::new(
            "info,fomo_sdk_core_rust=debug,hyper_util::client=info,reqwest=info",
        );

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_file(true)
            .with_line_number(true)
            .with_target(false)
            .with_test_writer();

        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .init();
    });
}

/// 预置状态目录的内存存储
pub(crate) async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for (id, description, emoji) in [
        (1, "Chilling", "😎"),
        (7, "Idle", "💤"),
        (9, "On my way", "🏃"),
    ] {
        store
            .insert(
                "statuses",
                json!({
                    "id": id,
                    "created_at": "2024-01-01T00:00:00Z",
                    "description": description,
                    "emoji": emoji,
                }),
            )
            .await
            .unwrap();
    }
    store
}

/// 插入一行最小的用户记录
pub(crate) async fn seed_user(store: &MemoryStore, uid: &str, username: &str) {
    store
        .insert(
            "users",
            json!({
                "uid": uid,
                "created_at": "2024-01-01T00:00:00Z",
                "email": format!("{username}@example.com"),
                "display_name": username,
                "username": username,
                "latitude": 0.0,
                "longitude": 0.0,
                "status": 1,
                "route": null,
                "destination_latitude": null,
                "destination_longitude": null,
            }),
        )
        .await
        .unwrap();
}

/// 已登录用户的状态镜像
pub(crate) fn signed_in_state(uid: &str) -> Arc<StateStore> {
    let state = Arc::new(StateStore::new());
    state.set_uid(uid);
    state.set_signed_in(true);
    state
}
