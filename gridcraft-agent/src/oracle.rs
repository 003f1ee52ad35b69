//! The decision-maker consulted every turn.
//!
//! An oracle takes a text prompt plus an optional continuation token and
//! returns free-form text plus a new token. The token is the only link
//! between rounds; oracles may not rely on hidden session state beyond what
//! the token names.

use gridcraft_sim::{
    ChatMessage, CompletionRequest, Direction, Error, ErrorKind, FinishReason, LlmProvider,
    ProviderError, Result, Usage, UsageTracker,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

/// Opaque handle linking a call to the conversation before it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What an oracle said
#[derive(Debug, Clone)]
pub struct OracleReply {
    pub text: String,
    pub token: ContinuationToken,
    pub usage: Option<Usage>,
}

/// A black-box decision maker
#[allow(async_fn_in_trait)]
pub trait Oracle {
    fn name(&self) -> &str;

    async fn consult(
        &mut self,
        prompt: &str,
        continuation: Option<&ContinuationToken>,
    ) -> Result<OracleReply>;

    /// Tokens spent so far, for oracles backed by a metered service
    fn usage(&self) -> Option<&UsageTracker> {
        None
    }
}

/// Instructions sent as the system message of every conversation
pub const SYSTEM_PROMPT: &str = r#"You are an intelligent path finding AI controlling an agent in a 2D grid world. You can see the whole grid, where you are represented by the character '@'.
'#' represents obstacles, '.' represents floor where you can walk, 'F' represents food (you can also walk onto it to collect it).

IMPORTANT: Your goal is to find the food and walk onto it to collect it.
Minimize the number of moves and avoid going back to cells you have already visited.

Respond with one word: 'up', 'down', 'left' or 'right' to move, followed by the number of moves required to reach the closest food if you can see it.

---

Example 1:

.....
..#F.
..@#.
.....
....#

The number of moves to the closest food here is 6 because you need to walk around the obstacle: down, right, right, up, up, left

---

Example 2:

..F.#
....#
..@##
##.##
....#

The number of moves to the closest food here is 2: up, up"#;

// ============================================================================
// ChatOracle - LLM-backed oracle
// ============================================================================

/// One exchange in a conversation tree
#[derive(Debug, Clone)]
struct Exchange {
    parent: Option<ContinuationToken>,
    prompt: String,
    reply: String,
}

/// Oracle backed by a chat-completion provider.
///
/// Each reply gets a fresh token naming its exchange. Passing a token back
/// replays the thread that ends at that exchange, so a round can be retried
/// from the same point without the failed reply leaking into the context.
pub struct ChatOracle<P> {
    provider: P,
    temperature: Option<f32>,
    exchanges: HashMap<ContinuationToken, Exchange>,
    next_id: u64,
    usage: UsageTracker,
}

impl<P: LlmProvider> ChatOracle<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            temperature: None,
            exchanges: HashMap::new(),
            next_id: 0,
            usage: UsageTracker::new(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Messages for a new prompt continuing `continuation`
    fn thread(&self, continuation: Option<&ContinuationToken>) -> Result<Vec<ChatMessage>> {
        let mut chain = Vec::new();
        let mut cursor = continuation.cloned();
        while let Some(token) = cursor {
            let exchange = self.exchanges.get(&token).ok_or_else(|| {
                Error::invalid_argument(format!("unknown continuation token '{}'", token))
                    .with_operation("oracle::thread")
            })?;
            chain.push(exchange);
            cursor = exchange.parent.clone();
        }

        let mut messages = Vec::with_capacity(chain.len() * 2 + 2);
        messages.push(ChatMessage::system(SYSTEM_PROMPT));
        for exchange in chain.into_iter().rev() {
            messages.push(ChatMessage::user(&exchange.prompt));
            messages.push(ChatMessage::assistant(&exchange.reply));
        }
        Ok(messages)
    }
}

impl<P: LlmProvider> Oracle for ChatOracle<P> {
    fn name(&self) -> &str {
        self.provider.name()
    }

    fn usage(&self) -> Option<&UsageTracker> {
        Some(&self.usage)
    }

    async fn consult(
        &mut self,
        prompt: &str,
        continuation: Option<&ContinuationToken>,
    ) -> Result<OracleReply> {
        let mut messages = self.thread(continuation)?;
        messages.push(ChatMessage::user(prompt));
        debug!(messages = messages.len(), "consulting {}", self.provider.name());

        let mut request = CompletionRequest::new(messages);
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }

        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| provider_error(e).with_operation("oracle::consult"))?;

        let text = response.content.ok_or_else(|| {
            Error::oracle_unavailable("empty response")
                .with_operation("oracle::consult")
                .with_context("response_id", response.id.clone())
        })?;

        if response.finish_reason == FinishReason::Length {
            warn!(model = %response.model, "reply was cut off at the token limit");
        }
        self.usage.track(&response.model, &response.usage);

        self.next_id += 1;
        let token = ContinuationToken::new(format!("turn-{}", self.next_id));
        self.exchanges.insert(
            token.clone(),
            Exchange {
                parent: continuation.cloned(),
                prompt: prompt.to_string(),
                reply: text.clone(),
            },
        );

        Ok(OracleReply {
            text,
            token,
            usage: Some(response.usage),
        })
    }
}

/// Map a transport failure onto the oracle error taxonomy
fn provider_error(err: ProviderError) -> Error {
    let error = match &err {
        ProviderError::RateLimited { retry_after } => {
            let e = Error::new(ErrorKind::RateLimited, err.to_string());
            match retry_after {
                Some(secs) => e.with_context("retry_after", secs.to_string()),
                None => e,
            }
        }
        ProviderError::AuthenticationFailed => {
            Error::config_invalid("oracle rejected the API key")
        }
        ProviderError::Api { status, .. } if *status < 500 => {
            Error::oracle_unavailable(err.to_string())
                .with_context("status", status.to_string())
                .permanent()
        }
        ProviderError::Network(_) => Error::new(ErrorKind::NetworkFailed, err.to_string()),
        _ => Error::oracle_unavailable(err.to_string()),
    };
    error.set_source(err)
}

// ============================================================================
// RandomOracle - offline stand-in
// ============================================================================

/// Picks a uniformly random direction without any network call
pub struct RandomOracle<R> {
    rng: R,
    calls: u64,
}

impl<R: Rng> RandomOracle<R> {
    pub fn new(rng: R) -> Self {
        Self { rng, calls: 0 }
    }
}

impl<R: Rng> Oracle for RandomOracle<R> {
    fn name(&self) -> &str {
        "random"
    }

    async fn consult(
        &mut self,
        _prompt: &str,
        _continuation: Option<&ContinuationToken>,
    ) -> Result<OracleReply> {
        let direction = Direction::ALL[self.rng.gen_range(0..Direction::ALL.len())];
        self.calls += 1;
        Ok(OracleReply {
            text: direction.name().to_string(),
            token: ContinuationToken::new(format!("random-{}", self.calls)),
            usage: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridcraft_sim::{CompletionResponse, Role};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::sync::Mutex;

    /// Replies with canned text and records every request
    struct EchoProvider {
        replies: Mutex<Vec<Option<String>>>,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl EchoProvider {
        fn new(replies: &[Option<&str>]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().rev().map(|r| r.map(String::from)).collect()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl LlmProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        fn default_model(&self) -> &str {
            "echo-1"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> std::result::Result<CompletionResponse, ProviderError> {
            self.seen.lock().unwrap().push(request.messages);
            let content = self
                .replies
                .lock()
                .unwrap()
                .pop()
                .ok_or(ProviderError::Network("connection refused".into()))?;
            Ok(CompletionResponse {
                id: "same-id".into(),
                model: "echo-1".into(),
                content,
                finish_reason: FinishReason::Stop,
                usage: Usage {
                    prompt_tokens: 10,
                    completion_tokens: 1,
                    total_tokens: 11,
                },
            })
        }
    }

    #[test]
    fn test_chat_oracle_threads_conversation() {
        tokio_test::block_on(async {
            let mut oracle = ChatOracle::new(EchoProvider::new(&[Some("up"), Some("left")]));

            let first = oracle.consult("board 1", None).await.unwrap();
            assert_eq!(first.text, "up");

            let second = oracle.consult("board 2", Some(&first.token)).await.unwrap();
            assert_eq!(second.text, "left");
            assert_ne!(first.token, second.token);

            let seen = oracle.provider.seen.lock().unwrap();
            assert_eq!(seen[0].len(), 2);
            let roles: Vec<Role> = seen[1].iter().map(|m| m.role).collect();
            assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
            assert_eq!(seen[1][2].content.as_deref(), Some("up"));
            assert_eq!(seen[1][3].content.as_deref(), Some("board 2"));
        });
    }

    #[test]
    fn test_retry_from_same_token_drops_failed_branch() {
        tokio_test::block_on(async {
            let mut oracle =
                ChatOracle::new(EchoProvider::new(&[Some("up"), Some("no idea"), Some("right")]));

            let first = oracle.consult("board", None).await.unwrap();
            oracle.consult("again", Some(&first.token)).await.unwrap();
            oracle.consult("again", Some(&first.token)).await.unwrap();

            let seen = oracle.provider.seen.lock().unwrap();
            assert_eq!(seen[2].len(), 4);
            assert!(seen[2].iter().all(|m| m.content.as_deref() != Some("no idea")));
            let usage = oracle.usage().unwrap();
            assert_eq!(usage.total_calls, 3);
            assert_eq!(usage.by_model["echo-1"].total_tokens, 33);
        });
    }

    #[test]
    fn test_unknown_token_is_rejected() {
        tokio_test::block_on(async {
            let mut oracle = ChatOracle::new(EchoProvider::new(&[Some("up")]));
            let bogus = ContinuationToken::new("turn-99");
            let err = oracle.consult("board", Some(&bogus)).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        });
    }

    #[test]
    fn test_empty_and_failed_responses() {
        tokio_test::block_on(async {
            let mut oracle = ChatOracle::new(EchoProvider::new(&[None]));

            let err = oracle.consult("board", None).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::OracleUnavailable);

            let err = oracle.consult("board", None).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NetworkFailed);
            assert!(err.is_retryable());
        });
    }

    #[test]
    fn test_provider_error_mapping() {
        let err = provider_error(ProviderError::AuthenticationFailed);
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert!(!err.is_retryable());

        let err = provider_error(ProviderError::Api { status: 400, message: "bad".into() });
        assert_eq!(err.kind(), ErrorKind::OracleUnavailable);
        assert!(!err.is_retryable());

        let err = provider_error(ProviderError::Api { status: 503, message: "busy".into() });
        assert!(err.is_retryable());

        let err = provider_error(ProviderError::RateLimited { retry_after: Some(5) });
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert_eq!(err.context()[0], ("retry_after", "5".to_string()));
    }

    #[tokio::test]
    async fn test_random_oracle_names_a_direction() {
        let mut oracle = RandomOracle::new(SmallRng::seed_from_u64(11));
        for _ in 0..20 {
            let reply = oracle.consult("anything", None).await.unwrap();
            assert!(reply.text.parse::<Direction>().is_ok());
        }
        assert!(oracle.usage().is_none());
    }
}
