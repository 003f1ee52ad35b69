//! # gridcraft-sim
//!
//! The simulation core: an agent foraging for food on a 2-D grid under a
//! hunger countdown.
//!
//! ## Core Concepts
//! - **GridWorld**: fixed-size tile grid, implicitly walled, rendered as text
//! - **Agent**: position + hunger; every move attempt costs one hunger point
//! - **Simulation**: the world and its single agent
//! - **Parser**: pulls a direction out of free-form oracle text
//! - **Provider**: chat-completion backends the oracle talks to

pub mod agent;
pub mod direction;
pub mod error;
pub mod parser;
pub mod provider;
pub mod simulation;
pub mod tile;
pub mod world;

pub use agent::{Agent, MoveOutcome, DEFAULT_MAX_HUNGER, VISION_RANGE};
pub use direction::Direction;
pub use error::{Error, ErrorKind, ErrorStatus, Result};
pub use parser::{parse_direction, parse_reply, OracleMove};
pub use provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider,
    OpenAIProvider, ProviderConfig, ProviderError, ProviderType, Role, Usage, UsageTracker,
};
pub use simulation::{SimConfig, Simulation};
pub use tile::{Position, TileKind, AGENT_CHAR};
pub use world::{GridWorld, Region, TileDistribution};
