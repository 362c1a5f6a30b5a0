use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PollOption {
    pub id: i64,
    pub text: String,
    pub order: i32,
    #[serde(default)]
    pub vote_count: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Poll {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub creator_id: i64,
    pub creator_username: String,
    pub is_active: bool,
    pub created_at: String,
    pub options: Vec<PollOption>,
    #[serde(default)]
    pub total_votes: u64,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub user_voted: bool,
    #[serde(default)]
    pub user_liked: bool,
    #[serde(default)]
    pub user_vote_option_id: Option<i64>,
}

impl Poll {
    /// Share of the total vote an option holds, in percent.
    pub fn percentage(&self, option: &PollOption) -> f64 {
        if self.total_votes == 0 {
            return 0.0;
        }
        option.vote_count as f64 * 100.0 / self.total_votes as f64
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct NewPollOption {
    pub text: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct CreatePollRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub options: Vec<NewPollOption>,
}

#[derive(Serialize, Debug)]
pub struct VoteRequest {
    pub option_id: i64,
}

#[cfg(test)]
pub(crate) fn sample_poll(id: i64, votes: &[u64]) -> Poll {
    let options: Vec<PollOption> = votes
        .iter()
        .enumerate()
        .map(|(i, count)| PollOption {
            id: id * 100 + i as i64,
            text: format!("Option {}", i + 1),
            order: i as i32,
            vote_count: *count,
        })
        .collect();

    Poll {
        id,
        title: format!("Poll {}", id),
        description: None,
        creator_id: 1,
        creator_username: "alice".to_owned(),
        is_active: true,
        created_at: "2024-05-01T12:00:00".to_owned(),
        total_votes: votes.iter().sum(),
        options,
        like_count: 0,
        user_voted: false,
        user_liked: false,
        user_vote_option_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_counters_default_to_zero() {
        let json = r#"{
            "id": 3,
            "title": "Lunch spot",
            "description": null,
            "creator_id": 9,
            "creator_username": "bob",
            "is_active": true,
            "created_at": "2024-05-01T12:00:00.123456",
            "options": [{"id": 1, "text": "Tacos", "order": 0}]
        }"#;

        let poll: Poll = serde_json::from_str(json).unwrap();
        assert_eq!(poll.total_votes, 0);
        assert_eq!(poll.like_count, 0);
        assert_eq!(poll.options[0].vote_count, 0);
        assert!(!poll.user_voted);
        assert_eq!(poll.user_vote_option_id, None);
    }

    #[test]
    fn percentage_handles_empty_poll() {
        let empty = sample_poll(1, &[0, 0]);
        assert_eq!(empty.percentage(&empty.options[0]), 0.0);

        let poll = sample_poll(2, &[1, 3]);
        assert_eq!(poll.percentage(&poll.options[1]), 75.0);
    }

    #[test]
    fn create_request_omits_missing_description() {
        let request = CreatePollRequest {
            title: "Best editor".to_owned(),
            description: None,
            options: vec![
                NewPollOption { text: "vim".to_owned() },
                NewPollOption { text: "emacs".to_owned() },
            ],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("description").is_none());
        assert_eq!(json["options"][1]["text"], "emacs");
    }
}
