//! Story generation service.
//!
//! Composes the provider prompt from the catalog phrases, makes one bounded
//! call to the text-generation backend and validates the `{title, content}`
//! reply. Any failure is answered with a fixed fallback story, so
//! `generate` always produces something to show.

use crate::config::IllustrationConfig;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use storytime_common::llm_client::{ChatRequest, LlmClient, LlmConfig, LlmError};
use storytime_common::{character_phrase, story_type_phrase, GeneratedStory};
use thiserror::Error;
use tracing::{info, warn};

/// Style qualifiers appended to every illustration prompt
pub const ILLUSTRATION_STYLE: &str =
    "children's book illustration style, colorful, friendly, safe for kids";

/// Fixed system instruction sent with every request
pub const SYSTEM_PROMPT: &str = "You are a magical storyteller who creates wonderful, age-appropriate stories for children aged 3-12. Your stories should be:
- Safe, positive, and educational
- 200-400 words long
- Easy to understand with simple vocabulary
- Include moral lessons about kindness, friendship, courage, or helping others
- Have happy endings
- Be engaging and imaginative
- Free from scary, violent, or inappropriate content

Always respond with a JSON object containing \"title\" and \"content\" fields.";

/// A canned story used when the provider cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackStory {
    pub title: &'static str,
    pub content: &'static str,
    pub image_prompt: &'static str,
    pub seed: u32,
}

pub static PRINCESS_FALLBACK: FallbackStory = FallbackStory {
    title: "The Kind Princess and the Magic Garden",
    content: "Once upon a time, there was a kind princess who discovered a magical garden behind her castle. In this garden, flowers could talk and sing beautiful songs. The princess learned that the garden was sad because it hadn't rained in many days. Using her kind heart and determination, the princess found a way to bring rain clouds to water the garden. All the flowers bloomed brighter than ever, and they sang a special thank-you song for the princess. From that day on, the princess visited the garden every day, and together they made the kingdom more beautiful. The princess learned that helping others always brings the greatest joy.",
    image_prompt: "princess in magical garden",
    seed: 123,
};

pub static GENERIC_FALLBACK: FallbackStory = FallbackStory {
    title: "A Magical Adventure",
    content: "Once upon a time, in a land filled with wonder and magic, there lived a brave hero who went on an amazing adventure. Along the way, they met new friends, learned important lessons about kindness and courage, and discovered that the greatest magic of all comes from helping others. Together with their friends, they solved problems, shared laughter, and created memories that would last forever. And they all lived happily ever after, knowing that friendship and kindness make the world a more magical place.",
    image_prompt: "magical adventure",
    seed: 456,
};

/// Fallback for a character id; only the princess has her own.
pub fn fallback_for(character: &str) -> &'static FallbackStory {
    match character {
        "princess" => &PRINCESS_FALLBACK,
        _ => &GENERIC_FALLBACK,
    }
}

/// Why a provider attempt did not yield a story
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationFailure {
    #[error("provider error: {0}")]
    Provider(#[from] LlmError),

    #[error("provider did not answer within {0} seconds")]
    Timeout(u64),

    #[error("malformed reply: {0}")]
    MalformedReply(String),
}

/// Compose the user instruction for the provider.
pub fn compose_prompt(character: &str, story_type: &str, user_prompt: Option<&str>) -> String {
    let mut prompt = format!(
        "Create {} starring {}.",
        story_type_phrase(story_type),
        character_phrase(character)
    );

    if let Some(extra) = user_prompt.filter(|p| !p.trim().is_empty()) {
        prompt.push_str(" The child wants: ");
        prompt.push_str(extra);
    }

    prompt.push_str(" Make it magical, fun, and perfect for young children!");
    prompt
}

/// Text describing the picture for a (character, story type) pair.
pub fn illustration_prompt(character: &str, story_type: &str) -> String {
    format!(
        "{} in {}, {}",
        character_phrase(character),
        story_type_phrase(story_type),
        ILLUSTRATION_STYLE
    )
}

/// Validate a provider reply: `title` and `content` must be non-blank strings.
/// The accepted strings are returned as the provider wrote them.
pub fn parse_reply(reply: &serde_json::Value) -> Result<(String, String), GenerationFailure> {
    let field = |name: &str| -> Result<String, GenerationFailure> {
        reply
            .get(name)
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| GenerationFailure::MalformedReply(format!("missing or empty '{}'", name)))
    };

    Ok((field("title")?, field("content")?))
}

pub struct StoryGenerator {
    client: Arc<dyn LlmClient>,
    timeout: Duration,
    temperature: f32,
    max_tokens: u32,
    illustration: IllustrationConfig,
}

impl StoryGenerator {
    pub fn new(client: Arc<dyn LlmClient>, llm: &LlmConfig, illustration: IllustrationConfig) -> Self {
        Self {
            client,
            timeout: Duration::from_secs(llm.timeout_secs),
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
            illustration,
        }
    }

    /// Override the provider timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Produce a story. Never fails: provider problems yield the fallback.
    pub async fn generate(
        &self,
        character: &str,
        story_type: &str,
        user_prompt: Option<&str>,
    ) -> GeneratedStory {
        match self.try_generate(character, story_type, user_prompt).await {
            Ok(story) => {
                info!("[GEN] Generated \"{}\" for {}/{}", story.title, character, story_type);
                story
            }
            Err(e) => {
                warn!(
                    "[GEN] Using fallback story for {}/{}: {}",
                    character, story_type, e
                );
                self.fallback(character)
            }
        }
    }

    /// One provider attempt, no retry.
    pub async fn try_generate(
        &self,
        character: &str,
        story_type: &str,
        user_prompt: Option<&str>,
    ) -> Result<GeneratedStory, GenerationFailure> {
        let request = ChatRequest::new(
            SYSTEM_PROMPT,
            compose_prompt(character, story_type, user_prompt),
        )
        .with_sampling(self.temperature, self.max_tokens);

        let reply = tokio::time::timeout(self.timeout, self.client.call_json(&request))
            .await
            .map_err(|_| GenerationFailure::Timeout(self.timeout.as_secs()))??;

        let (title, content) = parse_reply(&reply)?;
        let seed = rand::thread_rng().gen_range(0..1000);

        Ok(GeneratedStory {
            title,
            content,
            image_url: self.image_url(&illustration_prompt(character, story_type), seed),
        })
    }

    /// The canned story for a character, with its fixed-seed picture.
    pub fn fallback(&self, character: &str) -> GeneratedStory {
        let fallback = fallback_for(character);
        let prompt = format!("{}, {}", fallback.image_prompt, ILLUSTRATION_STYLE);
        GeneratedStory {
            title: fallback.title.to_string(),
            content: fallback.content.to_string(),
            image_url: self.image_url(&prompt, fallback.seed),
        }
    }

    /// `<base>/<url-encoded prompt>?width=W&height=H&seed=S`
    pub fn image_url(&self, prompt: &str, seed: u32) -> String {
        format!(
            "{}/{}?width={}&height={}&seed={}",
            self.illustration.base_url.trim_end_matches('/'),
            encode_uri_component(prompt),
            self.illustration.width,
            self.illustration.height,
            seed
        )
    }
}

/// Percent-encode a path segment, leaving `!'()*` readable as browsers'
/// `encodeURIComponent` does.
fn encode_uri_component(text: &str) -> String {
    let encoded = urlencoding::encode(text);
    let mut out = String::with_capacity(encoded.len());
    let mut rest: &str = &encoded;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let escape = rest.get(pos..pos + 3).unwrap_or(&rest[pos..]);
        match escape {
            "%21" => out.push('!'),
            "%27" => out.push('\''),
            "%28" => out.push('('),
            "%29" => out.push(')'),
            "%2A" => out.push('*'),
            other => out.push_str(other),
        }
        rest = &rest[pos + escape.len()..];
    }
    out.push_str(rest);
    out
}
