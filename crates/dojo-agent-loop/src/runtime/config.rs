use async_trait::async_trait;
use dojo_contract::{LlmExecutor, Tool};
use genai::chat::ChatOptions;
use genai::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Default upper bound for one `agent` step.
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(120);

/// Default LLM executor backed by `genai::Client`.
#[derive(Clone)]
pub struct GenaiLlmExecutor {
    client: Client,
}

impl GenaiLlmExecutor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl std::fmt::Debug for GenaiLlmExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenaiLlmExecutor").finish()
    }
}

#[async_trait]
impl LlmExecutor for GenaiLlmExecutor {
    async fn exec_chat_response(
        &self,
        model: &str,
        chat_req: genai::chat::ChatRequest,
        options: Option<&ChatOptions>,
    ) -> genai::Result<genai::chat::ChatResponse> {
        self.client.exec_chat(model, chat_req, options).await
    }

    fn name(&self) -> &'static str {
        "genai_client"
    }
}

/// Runtime configuration for the agent step.
#[derive(Clone)]
pub struct AgentConfig {
    /// Unique identifier for this agent.
    pub id: String,
    /// Model identifier (e.g., "gpt-4o-mini").
    pub model: String,
    /// System prompt for the LLM.
    pub system_prompt: String,
    /// Chat options for the LLM.
    pub chat_options: Option<ChatOptions>,
    /// Upper bound for one step, inference and tool calls included.
    pub step_timeout: Duration,
    /// Tools available to the model, keyed by tool id.
    pub tools: HashMap<String, Arc<dyn Tool>>,
    /// Optional LLM executor override.
    ///
    /// When not set, the step uses [`GenaiLlmExecutor`] with `Client::default()`.
    pub llm_executor: Option<Arc<dyn LlmExecutor>>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            id: "default".to_string(),
            model: "gpt-4o-mini".to_string(),
            system_prompt: String::new(),
            chat_options: Some(ChatOptions::default().with_capture_tool_calls(true)),
            step_timeout: DEFAULT_STEP_TIMEOUT,
            tools: HashMap::new(),
            llm_executor: None,
        }
    }
}

impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tool_ids: Vec<&String> = self.tools.keys().collect();
        tool_ids.sort();
        f.debug_struct("AgentConfig")
            .field("id", &self.id)
            .field("model", &self.model)
            .field(
                "system_prompt",
                &format!("[{} chars]", self.system_prompt.len()),
            )
            .field("chat_options", &self.chat_options)
            .field("step_timeout", &self.step_timeout)
            .field("tools", &tool_ids)
            .field(
                "llm_executor",
                &self
                    .llm_executor
                    .as_ref()
                    .map(|executor| executor.name())
                    .unwrap_or("genai_client(default)"),
            )
            .finish()
    }
}

impl AgentConfig {
    /// Create a config for `model` with defaults for everything else.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn with_chat_options(mut self, options: ChatOptions) -> Self {
        self.chat_options = Some(options);
        self
    }

    #[must_use]
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    /// Register a tool under its descriptor id.
    #[must_use]
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.insert(tool.descriptor().id, tool);
        self
    }

    /// Set LLM executor.
    #[must_use]
    pub fn with_llm_executor(mut self, executor: Arc<dyn LlmExecutor>) -> Self {
        self.llm_executor = Some(executor);
        self
    }

    /// The configured executor, or a default genai client.
    pub fn executor(&self) -> Arc<dyn LlmExecutor> {
        self.llm_executor
            .clone()
            .unwrap_or_else(|| Arc::new(GenaiLlmExecutor::new(Client::default())))
    }

    /// Tools ordered by id, so requests are deterministic.
    pub fn sorted_tools(&self) -> Vec<&dyn Tool> {
        let mut entries: Vec<(&String, &Arc<dyn Tool>)> = self.tools.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter().map(|(_, tool)| tool.as_ref()).collect()
    }
}
