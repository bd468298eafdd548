use super::{Ast, NodeId};

/// A pre-order iterator over a node and its descendants.
///
/// The iterator uses an explicit stack, so deeply nested input cannot overflow the call stack.
#[derive(Debug, Clone)]
pub struct Descendants<'a> {
    ast: &'a Ast,
    stack: Vec<NodeId>,
}

impl<'a> Descendants<'a> {
    /// Creates a new iterator starting at the given node.
    pub fn new(ast: &'a Ast, start: NodeId) -> Self {
        Self { ast, stack: vec![start] }
    }
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        // push in reverse so the leftmost child is visited first
        self.stack.extend(self.ast.node(id).children().into_iter().rev());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::parse;

    #[test]
    fn pre_order() {
        let ast = parse("a*b + c");
        let expr = ast.first_expr().unwrap();
        let order = ast.descendants(expr)
            .map(|id| ast.source_of(id).to_string())
            .collect::<Vec<_>>();
        assert_eq!(order, vec!["a*b + c", "a*b", "a", "b", "c"]);
    }
}
