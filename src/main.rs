use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use poll_live::api;
use poll_live::config::Config;
use poll_live::{ChannelState, Poll, PollChannel};
use reqwest::Client;

fn print_tally(poll: &Poll) {
    println!(
        "{} ({} votes, {} likes)",
        poll.title, poll.total_votes, poll.like_count
    );
    for option in &poll.options {
        println!(
            "  {:>5.1}%  {:>4}  {}",
            poll.percentage(option),
            option.vote_count,
            option.text
        );
    }
}

async fn resolve_token(client: &Client, config: &Config) -> Result<String> {
    if let Some(token) = &config.token {
        return Ok(token.clone());
    }
    match (&config.username, &config.password) {
        (Some(username), Some(password)) => {
            let auth = api::auth::login(client, &config.api_url, username, password).await?;
            Ok(auth.access_token)
        }
        _ => Err(anyhow::anyhow!(
            "either --token or both --username and --password are required"
        )),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    let client = Client::new();

    let token = resolve_token(&client, &config).await?;
    let poll = api::polls::get_poll(&client, &config.api_url, config.poll_id, Some(&token))
        .await
        .with_context(|| format!("could not load poll {}", config.poll_id))?;
    print_tally(&poll);

    let channel = PollChannel::new(config.channel());
    channel.subscribe(print_tally);
    let mut state = channel.watch_state();
    channel.connect(config.poll_id, &token)?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Interrupted, closing realtime channel"),
        _ = state.wait_for(|s| *s == ChannelState::Exhausted) => {
            warn!("Realtime connection lost; restart to resume live updates");
        }
    }

    channel.disconnect();
    Ok(())
}
