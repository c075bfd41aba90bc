//! Canonical prompt blueprint.
//!
//! Every streamed event is rendered into one of these so that callers and the
//! tracking backend see the same shape regardless of provider.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The backend echoes unset fields as `null`; read those as the default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or<'de, D>(deserializer: D, fallback: fn() -> String) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(fallback))
}

fn tool_type_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    string_or(deserializer, default_tool_type)
}

fn template_type_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    string_or(deserializer, default_template_type)
}

fn template_format_or_default<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<String, D::Error> {
    string_or(deserializer, default_template_format)
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Developer,
    User,
    #[default]
    Assistant,
    Tool,
    Function,
    Placeholder,
    /// Roles this client does not model.
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        #[serde(default, deserialize_with = "null_as_default")]
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        item_id: Option<String>,
    },
    Thinking {
        #[serde(default, deserialize_with = "null_as_default")]
        thinking: String,
        #[serde(default, deserialize_with = "null_as_default")]
        signature: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        item_id: Option<String>,
    },
    ToolUse {
        #[serde(default, deserialize_with = "null_as_default")]
        id: String,
        #[serde(default, deserialize_with = "null_as_default")]
        name: String,
        #[serde(default)]
        input: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        item_id: Option<String>,
    },
    /// Block kinds echoed by the backend that this client does not model.
    #[serde(other)]
    Other,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text {
            text: text.into(),
            item_id: None,
        }
    }

    pub fn thinking(thinking: impl Into<String>, signature: impl Into<String>) -> Self {
        ContentBlock::Thinking {
            thinking: thinking.into(),
            signature: signature.into(),
            item_id: None,
        }
    }

    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        ContentBlock::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
            item_id: None,
        }
    }

    /// Tags the block with the provider's item id.
    pub fn with_item_id(mut self, id: Option<String>) -> Self {
        match &mut self {
            ContentBlock::Text { item_id, .. }
            | ContentBlock::Thinking { item_id, .. }
            | ContentBlock::ToolUse { item_id, .. } => {
                *item_id = id;
            }
            ContentBlock::Other => {}
        }
        self
    }

    /// Appends `other` onto `self` when both belong to the same logical block.
    fn try_extend(&mut self, other: &ContentBlock) -> bool {
        match (self, other) {
            (
                ContentBlock::Text { text, item_id },
                ContentBlock::Text {
                    text: more,
                    item_id: more_id,
                },
            ) if same_item(item_id.as_ref(), more_id.as_ref()) => {
                text.push_str(more);
                true
            }
            (
                ContentBlock::Thinking {
                    thinking,
                    signature,
                    item_id,
                },
                ContentBlock::Thinking {
                    thinking: more,
                    signature: more_signature,
                    item_id: more_id,
                },
            ) if same_item(item_id.as_ref(), more_id.as_ref()) => {
                thinking.push_str(more);
                signature.push_str(more_signature);
                true
            }
            _ => false,
        }
    }
}

fn same_item(current: Option<&String>, incoming: Option<&String>) -> bool {
    incoming.is_none() || current == incoming
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct FunctionCall {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// A JSON fragment string while streaming, or a structured value once complete.
    #[serde(default, alias = "input")]
    pub arguments: Value,
}

impl FunctionCall {
    fn extend(&mut self, other: FunctionCall) {
        self.name.push_str(&other.name);
        append_arguments(&mut self.arguments, other.arguments);
    }
}

fn append_arguments(target: &mut Value, more: Value) {
    match (target, more) {
        (Value::String(current), Value::String(fragment)) => current.push_str(&fragment),
        (_, more) if is_blank(&more) => {}
        (target, more) => *target = more,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ToolCall {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(
        rename = "type",
        default = "default_tool_type",
        deserialize_with = "tool_type_or_default"
    )]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub function: FunctionCall,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
}

fn default_tool_type() -> String {
    "function".to_string()
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            kind: default_tool_type(),
            function: FunctionCall {
                name: name.into(),
                arguments,
            },
            item_id: None,
        }
    }

    pub fn with_item_id(mut self, item_id: Option<String>) -> Self {
        self.item_id = item_id;
        self
    }

    fn starts_new_call_after(&self, last: &ToolCall) -> bool {
        if !self.id.is_empty() && self.id != last.id {
            return true;
        }
        if self.item_id.is_some() && self.item_id != last.item_id {
            return true;
        }
        !self.function.name.is_empty() && !last.function.name.is_empty() && self.id.is_empty()
    }
}

fn default_template_format() -> String {
    "f-string".to_string()
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct AssistantMessage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: Role,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Vec<ContentBlock>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default)]
    pub function_call: Option<FunctionCall>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub input_variables: Vec<String>,
    #[serde(
        default = "default_template_format",
        deserialize_with = "template_format_or_default"
    )]
    pub template_format: String,
}

impl Default for AssistantMessage {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl AssistantMessage {
    pub fn new(content: Vec<ContentBlock>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls,
            function_call: None,
            name: None,
            input_variables: Vec::new(),
            template_format: default_template_format(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && self.tool_calls.is_empty() && self.function_call.is_none()
    }

    /// Concatenated text of every text block.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Input of the `tool_use` content block an anonymous tool-call fragment
    /// belongs to, matched by item id.
    fn tool_use_input(&mut self, call: &ToolCall) -> Option<&mut Value> {
        let wanted = call.item_id.as_ref().filter(|_| call.id.is_empty())?;
        self.content.iter_mut().rev().find_map(|block| match block {
            ContentBlock::ToolUse {
                input,
                item_id: Some(item_id),
                ..
            } if item_id == wanted => Some(input),
            _ => None,
        })
    }

    /// Folds a single-event fragment into this transcript.
    ///
    /// Text and thinking fragments extend the last block of the same kind
    /// (and item id, when tagged). Tool-call fragments extend the last call
    /// unless they carry a new id or item id; an untitled fragment tagged
    /// with the item id of a `tool_use` content block feeds that block's
    /// input instead.
    pub fn absorb(&mut self, fragment: AssistantMessage) {
        for block in fragment.content {
            if let Some(last) = self.content.last_mut() {
                if last.try_extend(&block) {
                    continue;
                }
            }
            self.content.push(block);
        }

        for call in fragment.tool_calls {
            if let Some(input) = self.tool_use_input(&call) {
                append_arguments(input, call.function.arguments);
                continue;
            }
            match self.tool_calls.last_mut() {
                Some(last) if !call.starts_new_call_after(&*last) => {
                    if last.item_id.is_none() {
                        last.item_id = call.item_id;
                    }
                    last.function.extend(call.function);
                }
                _ => self.tool_calls.push(call),
            }
        }

        if let Some(function_call) = fragment.function_call {
            match &mut self.function_call {
                Some(existing) => existing.extend(function_call),
                None => self.function_call = Some(function_call),
            }
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PromptTemplate {
    #[serde(
        rename = "type",
        default = "default_template_type",
        deserialize_with = "template_type_or_default"
    )]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub messages: Vec<AssistantMessage>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub input_variables: Vec<String>,
}

fn default_template_type() -> String {
    "chat".to_string()
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            kind: default_template_type(),
            messages: Vec::new(),
            input_variables: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ModelMetadata {
    #[serde(default, deserialize_with = "null_as_default")]
    pub provider: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parameters: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct BlueprintMetadata {
    #[serde(default, deserialize_with = "null_as_default")]
    pub model: ModelMetadata,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BlueprintMetadata {
    pub fn new(provider: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            model: ModelMetadata {
                provider: provider.into(),
                name: model_name.into(),
                api_type: None,
                parameters: Map::new(),
            },
            extra: Map::new(),
        }
    }

    pub fn with_api_type(mut self, api_type: impl Into<String>) -> Self {
        self.model.api_type = Some(api_type.into());
        self
    }

    pub fn with_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.model.parameters = parameters;
        self
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PromptBlueprint {
    #[serde(default, deserialize_with = "null_as_default")]
    pub prompt_template: PromptTemplate,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: BlueprintMetadata,
}

impl PromptBlueprint {
    pub fn from_message(message: AssistantMessage, metadata: BlueprintMetadata) -> Self {
        Self {
            prompt_template: PromptTemplate {
                kind: default_template_type(),
                messages: vec![message],
                input_variables: Vec::new(),
            },
            metadata,
        }
    }

    /// The assistant turn this blueprint describes.
    pub fn message(&self) -> Option<&AssistantMessage> {
        self.prompt_template.messages.first()
    }
}
