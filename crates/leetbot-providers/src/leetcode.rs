//! LeetCode GraphQL provider.
//!
//! The daily challenge is resolved in three round trips: the month's
//! challenge card lists one item per day, the item names the question's
//! slug, and the slug yields the question itself.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use leetbot_core::{
    config::ProviderConfig,
    context::Context,
    error::LeetbotError,
    model::{DayKey, Difficulty, Task},
    traits::TaskProvider,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const CHAPTERS_QUERY: &str = "query GetChaptersWithItems($cardSlug: String!) \
     { chapters(cardSlug: $cardSlug) { items { id title type } } }";
const ITEM_QUERY: &str =
    "query GetItem($itemId: String!) { item(id: $itemId) { question { titleSlug } } }";
const QUESTION_QUERY: &str = "query GetQuestion($titleSlug: String!) \
     { question(titleSlug: $titleSlug) { questionId questionTitle difficulty content hints } }";

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// GraphQL client for the LeetCode daily challenge.
pub struct LeetCodeClient {
    client: reqwest::Client,
    graphql_url: String,
    csrf_token: Option<String>,
}

impl LeetCodeClient {
    /// Create from config values.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, LeetbotError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LeetbotError::Provider(format!("leetcode: failed to build client: {e}")))?;
        Ok(Self {
            client,
            graphql_url: config.graphql_url.clone(),
            csrf_token: config.csrf_token.clone(),
        })
    }

    /// Challenge cards are named after the month, e.g. `june-leetcoding-challenge-2023`.
    pub fn card_slug(date: NaiveDate) -> String {
        format!(
            "{}-leetcoding-challenge-{}",
            date.format("%B").to_string().to_lowercase(),
            date.year()
        )
    }

    async fn query<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, LeetbotError> {
        let body = GraphQlRequest {
            operation_name: operation,
            variables,
            query,
        };
        debug!("leetcode: POST {} {operation}", self.graphql_url);

        let mut request = self
            .client
            .post(&self.graphql_url)
            .header("accept", "*/*")
            .json(&body);
        if let Some(token) = &self.csrf_token {
            request = request.header("x-csrftoken", token);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| LeetbotError::Provider(format!("leetcode {operation} failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(LeetbotError::Provider(format!(
                "leetcode {operation} returned {status}: {text}"
            )));
        }

        let parsed: GraphQlResponse<T> = resp.json().await.map_err(|e| {
            LeetbotError::Provider(format!("leetcode {operation}: failed to parse response: {e}"))
        })?;

        if let Some(errors) = parsed.errors.filter(|e| !e.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(LeetbotError::Provider(format!(
                "leetcode {operation}: {}",
                messages.join("; ")
            )));
        }

        parsed
            .data
            .ok_or_else(|| LeetbotError::Provider(format!("leetcode {operation}: empty data")))
    }

    /// Item ids of the month's daily challenges, in day order.
    ///
    /// The first item of every chapter is an introduction card, not a challenge.
    async fn daily_item_ids(&self, date: NaiveDate) -> Result<Vec<String>, LeetbotError> {
        let data: ChaptersData = self
            .query(
                "GetChaptersWithItems",
                CHAPTERS_QUERY,
                json!({ "cardSlug": Self::card_slug(date) }),
            )
            .await?;

        Ok(data
            .chapters
            .into_iter()
            .flat_map(|chapter| chapter.items.into_iter().skip(1).map(|item| item.id))
            .collect())
    }

    async fn title_slug(&self, item_id: &str) -> Result<String, LeetbotError> {
        let data: ItemData = self
            .query("GetItem", ITEM_QUERY, json!({ "itemId": item_id }))
            .await?;
        data.item
            .and_then(|item| item.question)
            .map(|q| q.title_slug)
            .ok_or_else(|| LeetbotError::Provider(format!("leetcode: item {item_id} has no question")))
    }

    async fn question(&self, title_slug: &str) -> Result<Question, LeetbotError> {
        let data: QuestionData = self
            .query(
                "GetQuestion",
                QUESTION_QUERY,
                json!({ "titleSlug": title_slug }),
            )
            .await?;
        data.question
            .ok_or_else(|| LeetbotError::Provider(format!("leetcode: no question {title_slug}")))
    }

    async fn fetch(&self, date: NaiveDate) -> Result<Task, LeetbotError> {
        let ids = self.daily_item_ids(date).await?;
        let day = date.day() as usize;
        let Some(item_id) = ids.get(day - 1) else {
            debug!(
                "leetcode: {} lists {} challenges, none for day {day}",
                Self::card_slug(date),
                ids.len()
            );
            return Err(LeetbotError::NoSuchTask);
        };

        let title_slug = self.title_slug(item_id).await?;
        let question = self.question(&title_slug).await?;
        let question_id = question.question_id.parse::<u64>().map_err(|e| {
            LeetbotError::Provider(format!(
                "leetcode: bad question id {:?}: {e}",
                question.question_id
            ))
        })?;

        Ok(Task {
            day_key: DayKey::from_date(date),
            question_id,
            title: question.question_title,
            content: question.content.unwrap_or_default(),
            hints: question.hints,
            difficulty: Difficulty::parse(&question.difficulty),
            title_slug,
        })
    }
}

#[async_trait]
impl TaskProvider for LeetCodeClient {
    fn name(&self) -> &str {
        "leetcode"
    }

    async fn fetch_daily_task(
        &self,
        ctx: &Context,
        date: NaiveDate,
    ) -> Result<Task, LeetbotError> {
        ctx.run(self.fetch(date)).await
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphQlRequest<'a> {
    operation_name: &'a str,
    variables: serde_json::Value,
    query: &'a str,
}

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct ChaptersData {
    #[serde(default)]
    chapters: Vec<Chapter>,
}

#[derive(Deserialize)]
struct Chapter {
    #[serde(default)]
    items: Vec<ChapterItem>,
}

#[derive(Deserialize)]
struct ChapterItem {
    id: String,
}

#[derive(Deserialize)]
struct ItemData {
    item: Option<Item>,
}

#[derive(Deserialize)]
struct Item {
    question: Option<ItemQuestion>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemQuestion {
    title_slug: String,
}

#[derive(Deserialize)]
struct QuestionData {
    question: Option<Question>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Question {
    question_id: String,
    question_title: String,
    #[serde(default)]
    difficulty: String,
    content: Option<String>,
    #[serde(default)]
    hints: Vec<String>,
}
