//! Potential response trees: graphs of answer tests that decide the score and feedback of a
//! response.
//!
//! A [`Prt`] is validated once, when it is built. After that, every name a branch refers to is
//! guaranteed to exist, and following branches from any node can never return to it.

mod data;
pub mod node;

pub use node::{Branch, PrtNode, ScoreMode};

use data::PrtData;
use serde::Serialize;
use stack_filter::Translator;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;
use tracing::warn;

/// A potential response tree could not be built.
#[derive(Debug, Error)]
pub enum PrtError {
    /// The tree has no nodes to start from.
    #[error("potential response tree `{0}` has no nodes")]
    NoNodes(String),

    /// Two nodes have the same name.
    #[error("potential response tree `{prt}` has more than one node named `{node}`")]
    DuplicateNode { prt: String, node: String },

    /// The first node is not a node of the tree.
    #[error("the first node `{node}` of potential response tree `{prt}` does not exist")]
    UnknownFirstNode { prt: String, node: String },

    /// A branch leads to a node that does not exist.
    #[error("node `{node}` of potential response tree `{prt}` leads to `{next}`, which does not exist")]
    UnknownNextNode { prt: String, node: String, next: String },

    /// Following the branches of the tree can lead back to a node already visited.
    #[error("potential response tree `{prt}` contains a cycle: {}", .path.join(" -> "))]
    Cycle { prt: String, path: Vec<String> },

    /// The stored tree could not be read.
    #[error("invalid potential response tree: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// The position of a node during the cycle search.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Colour {
    Unvisited,
    OnPath,
    Done,
}

/// The branches of a single node, as listed by [`Prt::nodes_summary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSummary {
    pub name: String,
    pub answer_test: String,
    pub true_next: Option<String>,
    pub true_answer_note: String,
    pub false_next: Option<String>,
    pub false_answer_note: String,
}

/// A validated potential response tree.
#[derive(Debug, Clone)]
pub struct Prt {
    name: String,
    value: f64,
    simplify: bool,
    feedback_style: u8,
    feedback_variables: String,
    nodes: Vec<PrtNode>,
    index: HashMap<String, usize>,
    first_node: usize,
}

impl Prt {
    /// Builds a tree from its nodes.
    ///
    /// The walk starts at `first_node`. When it is not given, the walk starts at the first node
    /// in `nodes`. Building fails if two nodes share a name, if a branch or the first node refers
    /// to a node that does not exist, or if the branches form a cycle.
    pub fn new(
        name: impl Into<String>,
        nodes: Vec<PrtNode>,
        first_node: Option<&str>,
    ) -> Result<Self, PrtError> {
        let name = name.into();
        if nodes.is_empty() {
            return Err(PrtError::NoNodes(name));
        }

        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.name.clone(), i).is_some() {
                return Err(PrtError::DuplicateNode { prt: name, node: node.name.clone() });
            }
        }

        let first_node = match first_node {
            Some(first) => *index.get(first).ok_or_else(|| PrtError::UnknownFirstNode {
                prt: name.clone(),
                node: first.to_string(),
            })?,
            None => {
                warn!(prt = %name, node = %nodes[0].name, "no first node given, starting at the first node stored");
                0
            },
        };

        for node in &nodes {
            if let Some(next) = node.successors().find(|next| !index.contains_key(*next)) {
                return Err(PrtError::UnknownNextNode {
                    prt: name,
                    node: node.name.clone(),
                    next: next.to_string(),
                });
            }
        }

        let prt = Self {
            name,
            value: 1.0,
            simplify: true,
            feedback_style: 1,
            feedback_variables: String::new(),
            nodes,
            index,
            first_node,
        };
        prt.check_acyclic()?;
        Ok(prt)
    }

    /// Builds a tree from its stored JSON form.
    ///
    /// ```
    /// use stack_prt::prt::Prt;
    ///
    /// let prt = Prt::from_json(r#"{
    ///     "name": "prt1",
    ///     "value": 2,
    ///     "firstnodename": "1",
    ///     "nodes": [{
    ///         "nodename": 1,
    ///         "answertest": "AlgEquiv",
    ///         "sans": "ans1",
    ///         "tans": "x^2",
    ///         "truescoremode": "=", "truescore": 1, "truenextnode": -1, "trueanswernote": "prt1-1-T",
    ///         "falsescoremode": "=", "falsescore": 0, "falsenextnode": -1, "falseanswernote": "prt1-1-F"
    ///     }]
    /// }"#).unwrap();
    ///
    /// assert_eq!(prt.value(), 2.0);
    /// assert_eq!(prt.first_node().name, "1");
    /// assert_eq!(prt.first_node().true_branch.next, None);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, PrtError> {
        let data: PrtData = serde_json::from_str(json)?;
        let nodes = data.nodes.0.into_iter().map(PrtNode::from).collect();
        let mut prt = Self::new(data.name, nodes, data.firstnodename.as_deref())?;
        prt.value = data.value;
        prt.simplify = data.autosimplify;
        prt.feedback_style = data.feedbackstyle.trim().parse().unwrap_or(1);
        prt.feedback_variables = data.feedbackvariables;
        Ok(prt)
    }

    /// Sets the share of the marks of the question given by the tree. Returns the updated tree
    /// for chaining.
    pub fn with_value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }

    /// Sets whether expressions are simplified. Returns the updated tree for chaining.
    pub fn with_simplify(mut self, simplify: bool) -> Self {
        self.simplify = simplify;
        self
    }

    /// Sets the feedback style, from `0` (formative) to `3`. Returns the updated tree for
    /// chaining.
    pub fn with_feedback_style(mut self, style: u8) -> Self {
        self.feedback_style = style;
        self
    }

    /// Sets the feedback variables. Returns the updated tree for chaining.
    pub fn with_feedback_variables(mut self, source: impl Into<String>) -> Self {
        self.feedback_variables = source.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn simplify(&self) -> bool {
        self.simplify
    }

    pub fn feedback_style(&self) -> u8 {
        self.feedback_style
    }

    pub fn feedback_variables(&self) -> &str {
        &self.feedback_variables
    }

    /// Returns the nodes, in the order they were given.
    pub fn nodes(&self) -> &[PrtNode] {
        &self.nodes
    }

    /// Returns the node with the given name.
    pub fn node(&self, name: &str) -> Option<&PrtNode> {
        self.index.get(name).map(|&i| &self.nodes[i])
    }

    /// Returns the node the walk starts at.
    pub fn first_node(&self) -> &PrtNode {
        &self.nodes[self.first_node]
    }

    /// Formative trees give feedback only, and do not contribute to the score of the question.
    pub fn is_formative(&self) -> bool {
        self.feedback_style == 0
    }

    fn check_acyclic(&self) -> Result<(), PrtError> {
        let mut colours = vec![Colour::Unvisited; self.nodes.len()];
        let mut path = Vec::new();
        for start in 0..self.nodes.len() {
            if colours[start] == Colour::Unvisited {
                self.visit(start, &mut colours, &mut path)?;
            }
        }
        Ok(())
    }

    fn visit(&self, i: usize, colours: &mut [Colour], path: &mut Vec<usize>) -> Result<(), PrtError> {
        colours[i] = Colour::OnPath;
        path.push(i);
        for next in self.nodes[i].successors() {
            let j = self.index[next];
            match colours[j] {
                Colour::Unvisited => self.visit(j, colours, path)?,
                Colour::OnPath => {
                    let start = path.iter().position(|&k| k == j).unwrap_or(0);
                    let mut names = path[start..]
                        .iter()
                        .map(|&k| self.nodes[k].name.clone())
                        .collect::<Vec<_>>();
                    names.push(next.to_string());
                    return Err(PrtError::Cycle { prt: self.name.clone(), path: names });
                },
                Colour::Done => {},
            }
        }
        path.pop();
        colours[i] = Colour::Done;
        Ok(())
    }

    /// Returns the nodes reachable from the first node, each listed before the nodes its branches
    /// lead to. Nodes that cannot be reached are left out.
    pub fn reverse_post_order(&self) -> Vec<&str> {
        fn post_order<'a>(prt: &'a Prt, i: usize, visited: &mut [bool], order: &mut Vec<&'a str>) {
            visited[i] = true;
            for next in prt.nodes[i].successors() {
                let j = prt.index[next];
                if !visited[j] {
                    post_order(prt, j, visited, order);
                }
            }
            order.push(&prt.nodes[i].name);
        }

        let mut visited = vec![false; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());
        post_order(self, self.first_node, &mut visited, &mut order);
        order.reverse();
        order
    }

    /// Returns the names of the answer tests used by the tree.
    pub fn answer_tests(&self) -> BTreeSet<&str> {
        self.nodes.iter().map(|node| node.answer_test.as_str()).collect()
    }

    /// Returns the expressions compared by the nodes, keyed by `<prt>-<n>-sans` and
    /// `<prt>-<n>-tans`, where `n` counts the nodes from one. Blank expressions are left out.
    pub fn raw_arguments_used(&self) -> BTreeMap<String, &str> {
        let mut arguments = BTreeMap::new();
        for (i, node) in self.nodes.iter().enumerate() {
            let key = format!("{}-{}", self.name, i + 1);
            if !node.sans.trim().is_empty() {
                arguments.insert(format!("{}-sans", key), node.sans.as_str());
            }
            if !node.tans.trim().is_empty() {
                arguments.insert(format!("{}-tans", key), node.tans.as_str());
            }
        }
        arguments
    }

    /// Returns every answer note the tree can record, sorted. `NULL` is always included: it is
    /// the note of a response that reached no node.
    pub fn all_answer_notes(&self) -> BTreeSet<&str> {
        let mut notes = BTreeSet::from(["NULL"]);
        for node in &self.nodes {
            notes.insert(node.true_branch.answer_note.as_str());
            notes.insert(node.false_branch.answer_note.as_str());
        }
        notes
    }

    /// Returns the feedback text of every branch as a single string, true branch first.
    pub fn feedback_test(&self) -> String {
        self.nodes
            .iter()
            .flat_map(|node| [&node.true_branch.feedback, &node.false_branch.feedback])
            .map(String::as_str)
            .collect()
    }

    /// Summarises where each node leads, in the order the nodes were given.
    pub fn nodes_summary(&self) -> Vec<NodeSummary> {
        self.nodes
            .iter()
            .map(|node| NodeSummary {
                name: node.name.clone(),
                answer_test: node.answer_test.clone(),
                true_next: node.true_branch.next.clone(),
                true_answer_note: node.true_branch.answer_note.clone(),
                false_next: node.false_branch.next.clone(),
                false_answer_note: node.false_branch.answer_note.clone(),
            })
            .collect()
    }

    /// Returns the translated names of the feedback styles, keyed by style.
    pub fn feedback_style_options(translator: &dyn Translator) -> BTreeMap<u8, String> {
        (0..=3)
            .map(|style| (style, translator.translate(&format!("feedbackstyle{}", style), &[])))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use stack_filter::{KeyTranslator, StringTable};
    use super::*;

    /// 1 -> (2 | 3), 2 -> 3, and an orphan node 4.
    fn branching() -> Prt {
        Prt::new("prt1", vec![
            PrtNode::new("1", "AlgEquiv", "ans1", "x^2")
                .on_true(Branch::set("1", "prt1-1-T").next("2").feedback("<p>Good.</p>"))
                .on_false(Branch::set("0", "prt1-1-F").next("3")),
            PrtNode::new("2", "CasEqual", "ans1", "x^2")
                .on_true(Branch::set("1", "prt1-2-T"))
                .on_false(Branch::set("0.5", "prt1-2-F").next("3").feedback("<p>Simplify.</p>")),
            PrtNode::new("3", "AlgEquiv", "ans1", "")
                .on_true(Branch::set("0", "prt1-3-T"))
                .on_false(Branch::set("0", "prt1-3-F")),
            PrtNode::new("4", "String", "ans2", "\"y\"")
                .on_true(Branch::set("0", ""))
                .on_false(Branch::set("0", "prt1-4-F")),
        ], Some("1")).unwrap()
    }

    #[test]
    fn reverse_post_order_drops_orphans() {
        assert_eq!(branching().reverse_post_order(), vec!["1", "2", "3"]);
    }

    #[test]
    fn cycles_rejected() {
        let err = Prt::new("prt1", vec![
            PrtNode::new("1", "AlgEquiv", "a", "b").on_false(Branch::set("0", "").next("2")),
            PrtNode::new("2", "AlgEquiv", "a", "b").on_true(Branch::set("0", "").next("1")),
        ], None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "potential response tree `prt1` contains a cycle: 1 -> 2 -> 1",
        );

        let err = Prt::new("prt1", vec![
            PrtNode::new("1", "AlgEquiv", "a", "b").on_true(Branch::set("0", "").next("1")),
        ], Some("1")).unwrap_err();
        assert!(matches!(err, PrtError::Cycle { .. }));
    }

    #[test]
    fn structural_errors() {
        assert!(matches!(Prt::new("p", vec![], None), Err(PrtError::NoNodes(_))));

        let duplicate = vec![
            PrtNode::new("1", "AlgEquiv", "a", "b"),
            PrtNode::new("1", "AlgEquiv", "a", "c"),
        ];
        assert!(matches!(Prt::new("p", duplicate, None), Err(PrtError::DuplicateNode { .. })));

        let missing = vec![PrtNode::new("1", "AlgEquiv", "a", "b")
            .on_true(Branch::set("1", "").next("7"))];
        let err = Prt::new("p", missing, None).unwrap_err();
        assert_eq!(err.to_string(), "node `1` of potential response tree `p` leads to `7`, which does not exist");

        let nodes = vec![PrtNode::new("1", "AlgEquiv", "a", "b")];
        assert!(matches!(Prt::new("p", nodes, Some("2")), Err(PrtError::UnknownFirstNode { .. })));
    }

    #[test]
    fn first_node_falls_back_to_first_stored() {
        let prt = Prt::new("p", vec![
            PrtNode::new("5", "AlgEquiv", "a", "b").on_true(Branch::set("1", "").next("2")),
            PrtNode::new("2", "AlgEquiv", "a", "b"),
        ], None).unwrap();
        assert_eq!(prt.first_node().name, "5");
    }

    #[test]
    fn queries() {
        let prt = branching();
        assert_eq!(prt.answer_tests().into_iter().collect::<Vec<_>>(), vec!["AlgEquiv", "CasEqual", "String"]);
        assert_eq!(prt.feedback_test(), "<p>Good.</p><p>Simplify.</p>");
        assert!(!prt.is_formative());
        assert!(prt.clone().with_feedback_style(0).is_formative());

        let notes = prt.all_answer_notes();
        assert!(notes.contains("NULL"));
        assert!(notes.contains("prt1-2-F"));

        let arguments = prt.raw_arguments_used();
        assert_eq!(arguments.get("prt1-1-tans"), Some(&"x^2"));
        assert_eq!(arguments.get("prt1-4-sans"), Some(&"ans2"));
        assert_eq!(arguments.get("prt1-3-tans"), None);

        let summary = prt.nodes_summary();
        assert_eq!(summary[1].false_next.as_deref(), Some("3"));
        assert_eq!(summary[2].true_next, None);
    }

    #[test]
    fn feedback_styles() {
        let options = Prt::feedback_style_options(&KeyTranslator);
        assert_eq!(options[&2], "feedbackstyle2");

        let options = Prt::feedback_style_options(&StringTable::english());
        assert_eq!(options[&0], "Formative");
    }

    #[test]
    fn stored_nodes_as_object() {
        let prt = Prt::from_json(r#"{
            "name": "prt2",
            "autosimplify": "1",
            "feedbackstyle": "0",
            "feedbackvariables": "sa: ans1^2;",
            "nodes": {
                "0": {
                    "nodename": "0", "answertest": "AlgEquiv", "sans": "sa", "tans": "4",
                    "truescoremode": "=", "truescore": "1", "truenextnode": "1",
                    "falsescoremode": "-", "falsescore": "0.5", "falsepenalty": "", "falsenextnode": ""
                },
                "1": {
                    "nodename": "1", "answertest": "String", "sans": "ans2", "tans": "\"a\"", "quiet": 1,
                    "truenextnode": null, "falsenextnode": "-1"
                }
            }
        }"#).unwrap();

        assert!(prt.simplify());
        assert!(prt.is_formative());
        assert_eq!(prt.feedback_variables(), "sa: ans1^2;");
        assert_eq!(prt.first_node().name, "0");

        let first = prt.node("0").unwrap();
        assert_eq!(first.false_branch.mode, ScoreMode::Subtract);
        assert_eq!(first.false_branch.penalty, None);
        assert_eq!(first.false_branch.next, None);

        let second = prt.node("1").unwrap();
        assert!(second.quiet);
        assert_eq!(second.true_branch.mode, ScoreMode::Add);
        assert_eq!(second.true_branch.score, "0");
    }

    #[test]
    fn unknown_score_mode_rejected() {
        let err = Prt::from_json(r#"{
            "name": "prt1",
            "nodes": [{ "nodename": "1", "answertest": "AlgEquiv", "truescoremode": "*" }]
        }"#).unwrap_err();
        assert!(err.to_string().contains("unrecognised score mode `*`"));
    }
}
