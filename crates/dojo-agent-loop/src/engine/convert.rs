//! Pure functions for converting between dojo and genai types.

use dojo_contract::{Message, Role, Tool, ToolCall, ToolDescriptor, ToolResult};
use genai::chat::{ChatMessage, ChatRequest, ChatResponse, MessageContent, ToolResponse};

/// Convert a ToolDescriptor to a genai Tool.
pub fn to_genai_tool(desc: &ToolDescriptor) -> genai::chat::Tool {
    genai::chat::Tool::new(&desc.id)
        .with_description(&desc.description)
        .with_schema(desc.parameters.clone())
}

/// Convert a Message to a genai ChatMessage.
pub fn to_chat_message(msg: &Message) -> ChatMessage {
    match msg.role {
        Role::Human => ChatMessage::user(&msg.content),
        Role::Agent => {
            if msg.tool_calls().is_empty() {
                return ChatMessage::assistant(&msg.content);
            }
            let mut content = MessageContent::from(msg.content.as_str());
            for call in msg.tool_calls() {
                content.push(genai::chat::ContentPart::ToolCall(genai::chat::ToolCall {
                    call_id: call.id.clone(),
                    fn_name: call.name.clone(),
                    fn_arguments: call.arguments.clone(),
                    thought_signatures: None,
                }));
            }
            ChatMessage::assistant(content)
        }
        Role::Tool => {
            let response = ToolResponse {
                call_id: msg.tool_call_id.clone().unwrap_or_default(),
                content: msg.content.clone(),
            };
            ChatMessage::from(response)
        }
    }
}

/// Build a genai ChatRequest from the system prompt, history and tools.
pub fn build_request(system_prompt: &str, messages: &[Message], tools: &[&dyn Tool]) -> ChatRequest {
    let mut chat_messages = Vec::with_capacity(messages.len() + 1);
    if !system_prompt.is_empty() {
        chat_messages.push(ChatMessage::system(system_prompt));
    }
    chat_messages.extend(messages.iter().map(to_chat_message));

    let genai_tools: Vec<genai::chat::Tool> = tools
        .iter()
        .map(|t| to_genai_tool(&t.descriptor()))
        .collect();

    let mut request = ChatRequest::new(chat_messages);
    if !genai_tools.is_empty() {
        request = request.with_tools(genai_tools);
    }
    request
}

/// Project a chat response into the agent message it produced.
pub fn agent_message_from_response(response: &ChatResponse) -> Message {
    let text = response
        .first_text()
        .map(|s| s.to_string())
        .unwrap_or_default();
    let tool_calls: Vec<ToolCall> = response
        .tool_calls()
        .into_iter()
        .map(|tc| ToolCall::new(&tc.call_id, &tc.fn_name, tc.fn_arguments.clone()))
        .collect();
    Message::agent_with_tool_calls(text, tool_calls)
}

/// Create a tool response message from ToolResult.
pub fn tool_response(call_id: impl Into<String>, result: &ToolResult) -> Message {
    let content = serde_json::to_string(result)
        .unwrap_or_else(|_| result.message.clone().unwrap_or_default());
    Message::tool(call_id, content)
}
