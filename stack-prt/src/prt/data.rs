//! The stored form of a potential response tree, as read from JSON.
//!
//! Stored trees come from many versions of the authoring tools, so the readers here are lenient
//! about representation: node names may be numbers or strings, the nodes may be a list or an
//! object keyed by name, and `-1`, `""`, or `null` all mean "no next node".

use serde::{de, Deserialize, Deserializer};
use std::fmt;
use super::node::{Branch, PrtNode, ScoreMode};

/// A value written as either a number or a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl Loose {
    fn into_string(self) -> String {
        match self {
            Self::Int(n) => n.to_string(),
            Self::Float(n) => n.to_string(),
            Self::Str(s) => s,
            Self::Bool(b) => u8::from(b).to_string(),
        }
    }
}

fn loose_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<Loose>::deserialize(deserializer)?
        .map(Loose::into_string)
        .unwrap_or_default())
}

fn loose_option<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = loose_string(deserializer)?;
    Ok(Some(value).filter(|v| !v.trim().is_empty()))
}

fn next_node<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(loose_option(deserializer)?.filter(|next| next.trim() != "-1"))
}

fn loose_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Bool(b)) => b,
        Some(Loose::Int(n)) => n != 0,
        Some(Loose::Float(n)) => n != 0.0,
        Some(Loose::Str(s)) => matches!(s.trim(), "1" | "true"),
        None => false,
    })
}

fn default_mode() -> ScoreMode {
    ScoreMode::Add
}

fn default_format() -> u8 {
    1
}

/// A stored node. Branch fields are flat, prefixed with `true` and `false`.
#[derive(Debug, Deserialize)]
pub(crate) struct NodeData {
    #[serde(deserialize_with = "loose_string")]
    nodename: String,
    #[serde(default)]
    answertest: String,
    #[serde(default, deserialize_with = "loose_string")]
    sans: String,
    #[serde(default, deserialize_with = "loose_string")]
    tans: String,
    #[serde(default, deserialize_with = "loose_string")]
    testoptions: String,
    #[serde(default, deserialize_with = "loose_bool")]
    quiet: bool,

    #[serde(default = "default_mode")]
    truescoremode: ScoreMode,
    #[serde(default, deserialize_with = "loose_string")]
    truescore: String,
    #[serde(default, deserialize_with = "loose_option")]
    truepenalty: Option<String>,
    #[serde(default, deserialize_with = "next_node")]
    truenextnode: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    trueanswernote: String,
    #[serde(default, deserialize_with = "loose_string")]
    truefeedback: String,
    #[serde(default = "default_format")]
    truefeedbackformat: u8,

    #[serde(default = "default_mode")]
    falsescoremode: ScoreMode,
    #[serde(default, deserialize_with = "loose_string")]
    falsescore: String,
    #[serde(default, deserialize_with = "loose_option")]
    falsepenalty: Option<String>,
    #[serde(default, deserialize_with = "next_node")]
    falsenextnode: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    falseanswernote: String,
    #[serde(default, deserialize_with = "loose_string")]
    falsefeedback: String,
    #[serde(default = "default_format")]
    falsefeedbackformat: u8,
}

fn score_or_zero(score: String) -> String {
    if score.trim().is_empty() {
        "0".to_string()
    } else {
        score
    }
}

impl From<NodeData> for PrtNode {
    fn from(data: NodeData) -> Self {
        Self {
            name: data.nodename,
            answer_test: data.answertest,
            sans: data.sans,
            tans: data.tans,
            test_options: data.testoptions,
            quiet: data.quiet,
            true_branch: Branch {
                mode: data.truescoremode,
                score: score_or_zero(data.truescore),
                penalty: data.truepenalty,
                next: data.truenextnode,
                answer_note: data.trueanswernote,
                feedback: data.truefeedback,
                feedback_format: data.truefeedbackformat,
            },
            false_branch: Branch {
                mode: data.falsescoremode,
                score: score_or_zero(data.falsescore),
                penalty: data.falsepenalty,
                next: data.falsenextnode,
                answer_note: data.falseanswernote,
                feedback: data.falsefeedback,
                feedback_format: data.falsefeedbackformat,
            },
        }
    }
}

/// The nodes of a stored tree, in the order they were stored.
#[derive(Debug, Default)]
pub(crate) struct NodeList(pub Vec<NodeData>);

impl<'de> Deserialize<'de> for NodeList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NodeListVisitor;

        impl<'de> de::Visitor<'de> for NodeListVisitor {
            type Value = NodeList;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a list of nodes, or an object of nodes keyed by name")
            }

            fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<NodeList, A::Error> {
                let mut nodes = Vec::new();
                while let Some(node) = seq.next_element()? {
                    nodes.push(node);
                }
                Ok(NodeList(nodes))
            }

            fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<NodeList, A::Error> {
                let mut nodes = Vec::new();
                while let Some((_, node)) = map.next_entry::<de::IgnoredAny, NodeData>()? {
                    nodes.push(node);
                }
                Ok(NodeList(nodes))
            }
        }

        deserializer.deserialize_any(NodeListVisitor)
    }
}

/// A stored tree.
#[derive(Debug, Deserialize)]
pub(crate) struct PrtData {
    pub name: String,
    #[serde(default = "default_value")]
    pub value: f64,
    #[serde(default, deserialize_with = "loose_bool")]
    pub autosimplify: bool,
    #[serde(default, deserialize_with = "loose_string")]
    pub feedbackstyle: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub feedbackvariables: String,
    pub nodes: NodeList,
    #[serde(default, deserialize_with = "loose_option")]
    pub firstnodename: Option<String>,
}

fn default_value() -> f64 {
    1.0
}
