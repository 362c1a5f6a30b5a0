use crate::models::poll::{CreatePollRequest, Poll, VoteRequest};
use anyhow::Result;
use log::{error, info};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

fn authorized(builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => builder.header("Authorization", format!("Bearer {}", token)),
        None => builder,
    }
}

async fn parse<T: DeserializeOwned>(resp: Response, action: &str) -> Result<T> {
    if resp.status().is_success() {
        Ok(resp.json::<T>().await?)
    } else {
        error!("Failed to {}: {}", action, resp.status());
        Err(anyhow::anyhow!("Failed to {}: {}", action, resp.status()))
    }
}

pub async fn list_polls(
    client: &Client,
    base_url: &str,
    token: Option<&str>,
    skip: u32,
    limit: u32,
) -> Result<Vec<Poll>> {
    let url = format!("{}/api/polls/", base_url);
    let resp = authorized(client.get(&url), token)
        .query(&[("skip", skip), ("limit", limit)])
        .send()
        .await?;
    parse(resp, "list polls").await
}

pub async fn get_poll(
    client: &Client,
    base_url: &str,
    poll_id: i64,
    token: Option<&str>,
) -> Result<Poll> {
    let url = format!("{}/api/polls/{}", base_url, poll_id);
    let resp = authorized(client.get(&url), token).send().await?;
    let poll: Poll = parse(resp, "get poll").await?;
    info!("Poll {} received successfully", poll.id);
    Ok(poll)
}

pub async fn create_poll(
    client: &Client,
    base_url: &str,
    token: &str,
    request: &CreatePollRequest,
) -> Result<Poll> {
    let url = format!("{}/api/polls/", base_url);
    let resp = authorized(client.post(&url), Some(token))
        .json(request)
        .send()
        .await?;
    let poll: Poll = parse(resp, "create poll").await?;
    info!("Created poll {}", poll.id);
    Ok(poll)
}

pub async fn vote(
    client: &Client,
    base_url: &str,
    token: &str,
    poll_id: i64,
    option_id: i64,
) -> Result<Poll> {
    let url = format!("{}/api/polls/{}/vote", base_url, poll_id);
    let resp = authorized(client.post(&url), Some(token))
        .json(&VoteRequest { option_id })
        .send()
        .await?;
    parse(resp, "vote").await
}

pub async fn toggle_like(
    client: &Client,
    base_url: &str,
    token: &str,
    poll_id: i64,
) -> Result<Poll> {
    let url = format!("{}/api/polls/{}/like", base_url, poll_id);
    let resp = authorized(client.post(&url), Some(token)).send().await?;
    parse(resp, "toggle like").await
}

pub async fn delete_poll(
    client: &Client,
    base_url: &str,
    token: &str,
    poll_id: i64,
) -> Result<()> {
    let url = format!("{}/api/polls/{}", base_url, poll_id);
    let resp = authorized(client.delete(&url), Some(token)).send().await?;

    if resp.status().is_success() {
        info!("Deleted poll {}", poll_id);
        Ok(())
    } else {
        error!("Failed to delete poll {}: {}", poll_id, resp.status());
        Err(anyhow::anyhow!("Failed to delete poll {}", poll_id))
    }
}
