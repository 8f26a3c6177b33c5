//! Node, option and target definitions.

use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Borrow;
use std::fmt;
use uuid::Uuid;

use crate::requirements::Requirement;
use crate::results::ResultEffect;

/// Sentinel target that ends the conversation.
pub const END_SENTINEL: &str = "END";

/// Deserialize a field that may be `null` as its default value.
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A short random id (16 hex characters).
pub(crate) fn random_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(16);
    id
}

/// Whether a raw target string is the end-of-dialogue sentinel.
pub fn is_end_sentinel(raw: &str) -> bool {
    raw.eq_ignore_ascii_case(END_SENTINEL)
}

/// Identifier of a node; equal to its key in the owning graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identifier of an option; unique within its node only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct OptionId(String);

impl OptionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OptionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Where a choice leads. Stored as a plain string: `""`, `"END"` or a node id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum Target {
    #[default]
    None,
    End,
    Node(NodeId),
}

impl Target {
    pub fn node(id: impl Into<String>) -> Self {
        Target::from(id.into())
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Target::None)
    }

    pub fn node_id(&self) -> Option<&NodeId> {
        match self {
            Target::Node(id) => Some(id),
            _ => None,
        }
    }
}

impl From<String> for Target {
    fn from(raw: String) -> Self {
        if raw.is_empty() {
            Target::None
        } else if is_end_sentinel(&raw) {
            Target::End
        } else {
            Target::Node(NodeId(raw))
        }
    }
}

impl From<&str> for Target {
    fn from(raw: &str) -> Self {
        Target::from(raw.to_string())
    }
}

impl From<Target> for String {
    fn from(target: Target) -> Self {
        match target {
            Target::None => String::new(),
            Target::End => END_SENTINEL.to_string(),
            Target::Node(id) => id.0,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::None => Ok(()),
            Target::End => f.write_str(END_SENTINEL),
            Target::Node(id) => f.write_str(id.as_str()),
        }
    }
}

/// A single dialogue beat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DialogueNode {
    #[serde(default, deserialize_with = "null_default")]
    pub id: NodeId,
    #[serde(default, deserialize_with = "null_default")]
    pub speaker: String,
    #[serde(default, deserialize_with = "null_default")]
    pub text: String,
    /// Display order.
    #[serde(default, deserialize_with = "null_default")]
    pub options: Vec<DialogueOption>,
}

impl DialogueNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(id),
            ..Default::default()
        }
    }

    pub fn with_speaker(mut self, speaker: impl Into<String>) -> Self {
        self.speaker = speaker.into();
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_option(mut self, option: DialogueOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn option(&self, id: &str) -> Option<&DialogueOption> {
        self.options.iter().find(|o| o.id.as_str() == id)
    }

    pub fn option_mut(&mut self, id: &str) -> Option<&mut DialogueOption> {
        self.options.iter_mut().find(|o| o.id.as_str() == id)
    }

    /// A fresh option id not used by any option of this node.
    pub(crate) fn unused_option_id(&self) -> OptionId {
        loop {
            let id = OptionId(random_id());
            if self.option(id.as_str()).is_none() {
                return id;
            }
        }
    }
}

/// A selectable choice on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DialogueOption {
    #[serde(default, deserialize_with = "null_default")]
    pub id: OptionId,
    #[serde(default, deserialize_with = "null_default")]
    pub label: String,
    #[serde(default, deserialize_with = "null_default")]
    pub next: Target,
    /// Hidden options only appear when a passive check on the requirement succeeds.
    #[serde(default, deserialize_with = "null_default")]
    pub hidden: bool,
    #[serde(default)]
    pub requirement: Option<Requirement>,
    #[serde(default, deserialize_with = "null_default")]
    pub results: Vec<ResultEffect>,
}

impl DialogueOption {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: OptionId::new(id),
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn with_next(mut self, next: impl Into<Target>) -> Self {
        self.next = next.into();
        self
    }

    pub fn with_requirement(mut self, requirement: impl Into<Requirement>) -> Self {
        self.requirement = Some(requirement.into());
        self
    }

    pub fn with_result(mut self, result: ResultEffect) -> Self {
        self.results.push(result);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_parsing() {
        assert_eq!(Target::from(""), Target::None);
        assert_eq!(Target::from("END"), Target::End);
        assert_eq!(Target::from("end"), Target::End);
        assert_eq!(Target::from("End"), Target::End);
        assert_eq!(Target::from("gate"), Target::Node(NodeId::new("gate")));
        // Ids are compared exactly, no case folding.
        assert_ne!(Target::from("Gate"), Target::from("gate"));
    }

    #[test]
    fn test_target_serializes_as_string() {
        let option = DialogueOption::new("o1", "Leave").with_next("end");
        let json = serde_json::to_value(&option).unwrap();
        assert_eq!(json["next"], "END");

        let option = DialogueOption::new("o2", "Stay");
        let json = serde_json::to_value(&option).unwrap();
        assert_eq!(json["next"], "");
        assert!(json["requirement"].is_null());
    }

    #[test]
    fn test_null_fields_load_as_defaults() {
        let node: DialogueNode =
            serde_json::from_str(r#"{"id":"a","speaker":null,"text":"Hi","options":null}"#).unwrap();
        assert!(node.options.is_empty());
        assert!(node.speaker.is_empty());

        let node: DialogueNode = serde_json::from_str(r#"{"text":"Hi"}"#).unwrap();
        assert!(node.id.is_empty());
        assert!(node.options.is_empty());
    }

    #[test]
    fn test_unused_option_id_is_unique() {
        let mut node = DialogueNode::new("a");
        for _ in 0..20 {
            let id = node.unused_option_id();
            assert!(node.option(id.as_str()).is_none());
            node.options.push(DialogueOption {
                id,
                ..Default::default()
            });
        }
        assert_eq!(node.options.len(), 20);
    }

    #[test]
    fn test_random_id_shape() {
        let id = random_id();
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
