//! 认证接入（REST）
//!
//! 密码登录与注册走远端的认证端点，拿到的 access token 之后
//! 附在每次存储请求上。令牌刷新不在核心范围内。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionData {
    pub access_token: String,
    pub user: AuthUser,
}

#[derive(Debug, Deserialize)]
pub struct AuthUser {
    pub id: String,
}

/// 密码登录，返回会话（uid 与 access token）
pub async fn sign_in_async(
    base_url: &str,
    api_key: &str,
    email: &str,
    password: &str,
) -> Result<SessionData> {
    let client = reqwest::Client::new();
    let operation_id = Uuid::new_v4().to_string();
    let url = format!(
        "{}/auth/v1/token?grant_type=password",
        base_url.trim_end_matches('/')
    );

    info!("🔐 正在登录...");
    debug!("   URL: {}", url);
    debug!("   邮箱: {}", email);
    debug!("   OperationID: {}", operation_id);

    let request = CredentialsRequest {
        email: email.to_string(),
        password: password.to_string(),
    };
    let response = client
        .post(&url)
        .header("apikey", api_key)
        .header("Content-Type", "application/json")
        .header("operationID", &operation_id)
        .json(&request)
        .send()
        .await
        .context("请求认证端点失败")?;

    let status = response.status();
    let text = response.text().await.context("读取认证响应失败")?;
    if !status.is_success() {
        anyhow::bail!("认证失败 HTTP {status}: {text}");
    }

    let session: SessionData =
        serde_json::from_str(&text).with_context(|| format!("解析认证响应失败，原始响应: {text}"))?;
    info!("✅ 登录成功: uid={}", session.user.id);
    Ok(session)
}

/// 注册新账号，返回会话
pub async fn sign_up_async(
    base_url: &str,
    api_key: &str,
    email: &str,
    password: &str,
) -> Result<SessionData> {
    let client = reqwest::Client::new();
    let operation_id = Uuid::new_v4().to_string();
    let url = format!("{}/auth/v1/signup", base_url.trim_end_matches('/'));

    info!("🔐 正在注册...");
    debug!("   URL: {}", url);
    debug!("   OperationID: {}", operation_id);

    let request = CredentialsRequest {
        email: email.to_string(),
        password: password.to_string(),
    };
    let response = client
        .post(&url)
        .header("apikey", api_key)
        .header("Content-Type", "application/json")
        .header("operationID", &operation_id)
        .json(&request)
        .send()
        .await
        .context("请求注册端点失败")?;

    let status = response.status();
    let text = response.text().await.context("读取注册响应失败")?;
    if !status.is_success() {
        anyhow::bail!("注册失败 HTTP {status}: {text}");
    }

    let session: SessionData =
        serde_json::from_str(&text).with_context(|| format!("解析注册响应失败，原始响应: {text}"))?;
    info!("✅ 注册成功: uid={}", session.user.id);
    Ok(session)
}
