//! Semantic scoring of analysis windows.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, warn};
use vshorts_models::{format_seconds, ShortClip, SignalPair};

use crate::client::{ChatClient, ChatMessage};
use crate::error::AiResult;
use crate::parse::{parse_detailed, parse_pre_score, parse_views, DetailedScore, PreScore, ViewEstimate};

/// Everything the oracle is told about one window.
#[derive(Debug, Clone)]
pub struct ScoringContext {
    /// Window start in seconds
    pub time: f64,
    pub signals: SignalPair,
    /// Pre-score from the cheap tier, once known
    pub pre_score: Option<u8>,
    /// Still frame from the window
    pub frame: Option<PathBuf>,
}

impl ScoringContext {
    pub fn new(time: f64, signals: SignalPair) -> Self {
        Self {
            time,
            signals,
            pre_score: None,
            frame: None,
        }
    }

    pub fn with_pre_score(mut self, pre_score: u8) -> Self {
        self.pre_score = Some(pre_score);
        self
    }

    pub fn with_frame(mut self, frame: Option<PathBuf>) -> Self {
        self.frame = frame;
        self
    }
}

/// Content-understanding oracle with a cheap and an expensive tier.
#[async_trait]
pub trait SemanticScorer: Send + Sync {
    /// Cheap 1..10 estimate from the signal descriptions alone.
    async fn pre_score(&self, ctx: &ScoringContext) -> AiResult<PreScore>;

    /// Emotional/viral scores, title and commentary from the full context.
    async fn detailed_score(&self, ctx: &ScoringContext) -> AiResult<DetailedScore>;
}

/// Estimates the reach of a finished short.
#[async_trait]
pub trait PotentialEstimator: Send + Sync {
    async fn estimate_potential(&self, short: &ShortClip) -> AiResult<ViewEstimate>;
}

/// [`SemanticScorer`] backed by a chat-completions model.
pub struct OpenAiScorer {
    client: ChatClient,
}

impl OpenAiScorer {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ChatClient {
        &self.client
    }
}

#[async_trait]
impl SemanticScorer for OpenAiScorer {
    async fn pre_score(&self, ctx: &ScoringContext) -> AiResult<PreScore> {
        let config = self.client.config();
        let messages = pre_score_messages(ctx);

        let completion = self
            .client
            .complete(&config.pre_score_model, &messages, config.pre_score_max_tokens)
            .await?;

        let parsed = parse_pre_score(&completion.text);
        debug!(
            time = ctx.time,
            pre_score = parsed.score.get(),
            defaulted = parsed.score.is_defaulted(),
            "Pre-score parsed"
        );
        Ok(parsed)
    }

    async fn detailed_score(&self, ctx: &ScoringContext) -> AiResult<DetailedScore> {
        let config = self.client.config();

        let frame_url = match ctx.frame.as_deref() {
            Some(path) => match frame_data_url(path).await {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!(time = ctx.time, error = %e, "Could not read frame, scoring text only");
                    None
                }
            },
            None => None,
        };

        let model = if frame_url.is_some() {
            &config.vision_model
        } else {
            &config.detailed_model
        };
        let messages = detailed_messages(ctx, frame_url);

        let completion = self
            .client
            .complete(model, &messages, config.detailed_max_tokens)
            .await?;

        let parsed = parse_detailed(&completion.text);
        debug!(
            time = ctx.time,
            emotional = parsed.emotional.get(),
            viral = parsed.viral.get(),
            title = %parsed.title.value,
            "Detailed score parsed"
        );
        Ok(parsed)
    }
}

#[async_trait]
impl PotentialEstimator for OpenAiScorer {
    async fn estimate_potential(&self, short: &ShortClip) -> AiResult<ViewEstimate> {
        let config = self.client.config();
        let messages = estimate_messages(short);

        let completion = self
            .client
            .complete(&config.detailed_model, &messages, config.estimate_max_tokens)
            .await?;

        Ok(parse_views(&completion.text))
    }
}

/// Read a JPEG frame into a base64 data URL.
pub async fn frame_data_url(path: &Path) -> AiResult<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(format!("data:image/jpeg;base64,{}", STANDARD.encode(bytes)))
}

fn pre_score_messages(ctx: &ScoringContext) -> Vec<ChatMessage> {
    let motion = &ctx.signals.motion;
    let audio = &ctx.signals.audio;

    vec![
        ChatMessage::system(format!(
            "Rate how likely this video moment is to go viral on a scale of 1 to 10. \
             Start your reply with the number.\n\
             Motion: {:.1}/10\n\
             Sound: {:.1}/10\n\
             Motion description: {}\n\
             Sound description: {}",
            motion.value, audio.value, motion.description, audio.description
        )),
        ChatMessage::user("Give a brief assessment of this moment."),
    ]
}

fn detailed_messages(ctx: &ScoringContext, frame_url: Option<String>) -> Vec<ChatMessage> {
    let system = ChatMessage::system(
        "You are an expert in viral short-form video. Analyze this moment and answer \
         using exactly these labels:\n\
         Emotional response: <score from 1 to 10>\n\
         Viral potential: <score from 1 to 10>\n\
         Title: <a catchy clickbait title>\n\
         Then describe the emotions this moment will evoke in viewers.",
    );

    let mut text = format!(
        "Moment at {}:\n- Motion: {}\n- Sound: {}",
        format_seconds(ctx.time),
        ctx.signals.motion.description,
        ctx.signals.audio.description
    );
    if let Some(pre) = ctx.pre_score {
        text.push_str(&format!("\n- Initial score: {}/10", pre));
    }

    let user = match frame_url {
        Some(url) => ChatMessage::user_with_image(text, url),
        None => ChatMessage::user(text),
    };

    vec![system, user]
}

fn estimate_messages(short: &ShortClip) -> Vec<ChatMessage> {
    let mut text = format!(
        "Short #{} ({:.0}s, cut from {} to {})",
        short.index + 1,
        short.duration(),
        format_seconds(short.start),
        format_seconds(short.end)
    );
    if let Some(title) = &short.title {
        text.push_str(&format!("\nTitle: {}", title));
    }
    if let Some(description) = &short.description {
        text.push_str(&format!("\nContent: {}", description));
    }

    vec![
        ChatMessage::system(
            "You are an expert in YouTube Shorts performance. Estimate the number of views \
             this short could reach (a number between 1000 and 1000000) and put that number \
             first in your reply. Then describe the target audience, the main virality \
             factors and how the short could be improved.",
        ),
        ChatMessage::user(text),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MessageContent;
    use vshorts_models::SignalReading;

    fn context() -> ScoringContext {
        ScoringContext::new(
            42.0,
            SignalPair::new(SignalReading::motion(8.0), SignalReading::audio(4.0)),
        )
    }

    #[test]
    fn test_pre_score_prompt_carries_signals() {
        let messages = pre_score_messages(&context());
        let MessageContent::Text(system) = &messages[0].content else {
            panic!("expected text content");
        };
        assert!(system.contains("Motion: 8.0/10"));
        assert!(system.contains("Very intense motion"));
        assert!(system.contains("Quiet sound"));
    }

    #[test]
    fn test_detailed_prompt_includes_pre_score_only_when_known() {
        let without = detailed_messages(&context(), None);
        let MessageContent::Text(text) = &without[1].content else {
            panic!("expected text content");
        };
        assert!(!text.contains("Initial score"));

        let with = detailed_messages(&context().with_pre_score(8), None);
        let MessageContent::Text(text) = &with[1].content else {
            panic!("expected text content");
        };
        assert!(text.contains("Initial score: 8/10"));
        assert!(text.contains("00:00:42"));
    }

    #[test]
    fn test_detailed_prompt_attaches_frame() {
        let messages = detailed_messages(&context(), Some("data:image/jpeg;base64,AA".into()));
        assert!(matches!(messages[1].content, MessageContent::Parts(ref parts) if parts.len() == 2));
    }

    #[tokio::test]
    async fn test_frame_data_url() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("window_0000000.jpg");
        tokio::fs::write(&path, [0xFFu8, 0xD8, 0xFF]).await.unwrap();

        let url = frame_data_url(&path).await.unwrap();
        assert_eq!(url, "data:image/jpeg;base64,/9j/");
    }
}
