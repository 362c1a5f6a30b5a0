use crate::models::auth::{AuthResponse, LoginRequest, RegisterRequest, User};
use anyhow::Result;
use log::{debug, error, info};
use reqwest::Client;

pub async fn login(
    client: &Client,
    base_url: &str,
    username: &str,
    password: &str,
) -> Result<AuthResponse, anyhow::Error> {
    debug!("Logging in as {}", username);
    let url = format!("{}/api/auth/login", base_url);
    let request = LoginRequest {
        username: username.to_string(),
        password: password.to_string(),
    };
    let resp = client.post(&url).form(&request).send().await?;

    if resp.status().is_success() {
        let response = resp.json::<AuthResponse>().await?;
        info!("Logged in successfully");
        Ok(response)
    } else {
        error!("Login failed: {}", resp.status());
        Err(anyhow::anyhow!("Login failed: {}", resp.status()))
    }
}

pub async fn register(
    client: &Client,
    base_url: &str,
    request: &RegisterRequest,
) -> Result<User, anyhow::Error> {
    let url = format!("{}/api/auth/register", base_url);
    let resp = client.post(&url).json(request).send().await?;

    if resp.status().is_success() {
        let user = resp.json::<User>().await?;
        info!("Registered user {}", user.username);
        Ok(user)
    } else {
        error!("Registration failed: {}", resp.status());
        Err(anyhow::anyhow!("Registration failed: {}", resp.status()))
    }
}

pub async fn current_user(client: &Client, base_url: &str, token: &str) -> Result<User> {
    let url = format!("{}/api/auth/me", base_url);
    let resp = client.get(&url).bearer_auth(token).send().await?;

    if resp.status().is_success() {
        Ok(resp.json::<User>().await?)
    } else {
        error!("Failed to get current user: {}", resp.status());
        Err(anyhow::anyhow!("Failed to get current user"))
    }
}
