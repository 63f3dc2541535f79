use std::{
    sync::OnceLock,
    time::Duration,
};

use rand::Rng;
use regex::Regex;
use reqwest::blocking::Client;
use serde_json::{
    json,
    Map,
    Value,
};
use tracing::{
    debug,
    info,
};

use super::SentenceProposer;
use crate::{
    core::{
        http::{
            http_client,
            post_json,
        },
        utils::dedup_sentences,
        NplusError,
    },
    persistence::Settings,
};

const SYSTEM_PROMPT: &str =
    "You're an expert AI language assistant, analyse the user provided prompt and answer accordingly.";

/// Talks to any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiProposer {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiProposer {
    pub fn new(
        base_url: &str,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, NplusError> {
        Ok(Self {
            client: http_client(timeout)?,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            model,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, NplusError> {
        let api_key = std::env::var(&settings.api_key_env).map_err(|_| {
            NplusError::GenerationFailure(format!(
                "environment variable {} is not set",
                settings.api_key_env
            ))
        })?;

        Self::new(
            &settings.api_base_url,
            api_key,
            settings.model.clone(),
            Duration::from_secs(settings.request_timeout_secs),
        )
    }
}

impl SentenceProposer for OpenAiProposer {
    fn propose(
        &self,
        lemma: &str,
        count: usize,
        min_words: usize,
        max_words: usize,
    ) -> Result<Vec<String>, NplusError> {
        let word_count = rand::rng().random_range(min_words..=max_words.max(min_words));
        info!(lemma, count, word_count, model = %self.model, "requesting sentences");

        let body = build_request(&self.model, lemma, count, word_count);
        let reply = post_json(&self.client, &self.endpoint, &self.api_key, &body)
            .map_err(|e| NplusError::GenerationFailure(e.to_string()))?;

        let sentences = parse_reply(&reply, count)?;
        debug!(lemma, received = sentences.len(), "sentences parsed");
        Ok(sentences)
    }
}

fn field_name(i: usize) -> String {
    format!("sentence{}", i)
}

pub fn build_request(model: &str, lemma: &str, count: usize, word_count: usize) -> Value {
    let mut properties = Map::new();
    for i in 1..=count {
        properties.insert(
            field_name(i),
            json!({ "type": "string", "description": format!("The sentence #{}.", i) }),
        );
    }
    let required: Vec<String> = (1..=count).map(field_name).collect();

    let user_prompt = format!(
        "Produce {} simple {}-word sentences that must all include the word {}. \
         Return only the sentences in the JSON fields as specified.",
        count, word_count, lemma
    );

    json!({
        "model": model,
        "messages": [
            { "role": "system", "content": SYSTEM_PROMPT },
            { "role": "user", "content": user_prompt },
        ],
        "response_format": {
            "type": "json_schema",
            "json_schema": {
                "name": "sentences",
                "strict": true,
                "schema": {
                    "type": "object",
                    "properties": properties,
                    "required": required,
                    "additionalProperties": false,
                },
            },
        },
    })
}

fn json_object_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").unwrap())
}

/// Pulls `sentence1..sentenceN` out of a chat completion reply, in field order.
pub fn parse_reply(reply: &Value, count: usize) -> Result<Vec<String>, NplusError> {
    let content = reply
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .ok_or_else(|| NplusError::GenerationFailure("reply has no message content".into()))?;

    let object = json_object_regex()
        .find(content)
        .ok_or_else(|| NplusError::GenerationFailure("no JSON object in reply".into()))?;

    let data: Value = serde_json::from_str(object.as_str())
        .map_err(|e| NplusError::GenerationFailure(format!("malformed JSON in reply: {}", e)))?;

    let raw: Vec<&str> =
        (1..=count).filter_map(|i| data.get(field_name(i)).and_then(Value::as_str)).collect();

    let sentences = dedup_sentences(raw);
    if sentences.is_empty() {
        return Err(NplusError::GenerationFailure("reply contained no sentences".into()));
    }
    Ok(sentences)
}
