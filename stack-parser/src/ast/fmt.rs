//! Canonical textual form of the tree.
//!
//! The output is valid CAS syntax. Implied multiplications are printed with an explicit `*`, and
//! parentheses are inserted wherever a rewritten tree would otherwise print ambiguously.

use crate::{parser::{Associativity, Precedence}, util::to_cas_string};
use super::{Ast, NodeId, NodeKind};
use std::fmt::{self, Display, Formatter};

/// Which side of a binary operator a node sits on.
#[derive(Clone, Copy, PartialEq)]
enum Side {
    Left,
    Right,
}

/// Formats a single node of an [`Ast`]. Created with [`Ast::display`].
#[derive(Debug, Clone, Copy)]
pub struct NodeDisplay<'a> {
    ast: &'a Ast,
    id: NodeId,
}

impl Ast {
    /// Returns a value that formats the given node in canonical form.
    pub fn display(&self, id: NodeId) -> NodeDisplay<'_> {
        NodeDisplay { ast: self, id }
    }

    /// Returns the precedence of the operator at the node, or [`None`] for atoms.
    fn precedence_of(&self, id: NodeId) -> Option<Precedence> {
        match self.kind(id) {
            NodeKind::Binary { op, .. } => Some(op.precedence()),
            NodeKind::Prefix { op, .. } => Some(op.precedence()),
            NodeKind::Postfix { op, .. } => Some(op.precedence()),
            _ => None,
        }
    }

    fn fmt_node(&self, id: NodeId, f: &mut Formatter) -> fmt::Result {
        match self.kind(id) {
            NodeKind::Root { statements } => self.fmt_joined(statements, ";", f),
            NodeKind::Statement { expr } => self.fmt_node(*expr, f),
            NodeKind::Number { raw } => write!(f, "{}", raw),
            NodeKind::Str { value } => write!(f, "{}", to_cas_string(value)),
            NodeKind::Identifier { name } => write!(f, "{}", name),
            NodeKind::Call { callee, args } => {
                self.fmt_operand(*callee, Precedence::Factorial, None, f)?;
                write!(f, "(")?;
                self.fmt_joined(args, ",", f)?;
                write!(f, ")")
            },
            NodeKind::Prefix { op, operand } => {
                write!(f, "{}", op)?;
                self.fmt_operand(*operand, op.precedence(), None, f)
            },
            NodeKind::Postfix { op, operand } => {
                self.fmt_operand(*operand, op.precedence(), None, f)?;
                write!(f, "{}", op)
            },
            NodeKind::Binary { op, lhs, rhs, .. } => {
                let prec = op.precedence();
                let assoc = op.associativity();
                self.fmt_operand(*lhs, prec, Some((assoc, Side::Left)), f)?;
                write!(f, "{}", op)?;
                self.fmt_operand(*rhs, prec, Some((assoc, Side::Right)), f)
            },
            NodeKind::Group { items } => {
                write!(f, "(")?;
                self.fmt_joined(items, ",", f)?;
                write!(f, ")")
            },
            NodeKind::List { items } => {
                write!(f, "[")?;
                self.fmt_joined(items, ",", f)?;
                write!(f, "]")
            },
            NodeKind::Set { items } => {
                write!(f, "{{")?;
                self.fmt_joined(items, ",", f)?;
                write!(f, "}}")
            },
            NodeKind::Missing => Ok(()),
        }
    }

    /// Formats an operand, wrapping it in parentheses if it binds looser than its parent.
    fn fmt_operand(
        &self,
        id: NodeId,
        parent: Precedence,
        binary: Option<(Associativity, Side)>,
        f: &mut Formatter,
    ) -> fmt::Result {
        let wrap = match self.precedence_of(id) {
            Some(child) if child < parent => true,
            Some(child) if child == parent => matches!(
                binary,
                Some((Associativity::Left, Side::Right)) | Some((Associativity::Right, Side::Left))
            ),
            _ => false,
        };

        if wrap {
            write!(f, "(")?;
            self.fmt_node(id, f)?;
            write!(f, ")")
        } else {
            self.fmt_node(id, f)
        }
    }

    fn fmt_joined(&self, ids: &[NodeId], sep: &str, f: &mut Formatter) -> fmt::Result {
        for (i, &id) in ids.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", sep)?;
            }
            self.fmt_node(id, f)?;
        }
        Ok(())
    }
}

impl Display for NodeDisplay<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.ast.fmt_node(self.id, f)
    }
}

impl Display for Ast {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.fmt_node(self.root, f)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::{ast::{Implicit, NodeKind}, parse, parser::op::BinOpKind};

    #[test]
    fn canonical_form() {
        assert_eq!(parse("2 x + sin( x )").to_string(), "2*x+sin(x)");
        assert_eq!(parse("a**b; c $ d").to_string(), "a^b;c;d");
        assert_eq!(parse(r#"s:"say \"hi\"""#).to_string(), r#"s:"say \"hi\"""#);
        assert_eq!(parse("not a and b or c").to_string(), "not a and b or c");
        assert_eq!(parse("{1,[2,(3)]}").to_string(), "{1,[2,(3)]}");
    }

    #[test]
    fn rewritten_tree_keeps_meaning() {
        // turn `f(x)^2` into `(f*(x))^2` without adding a group node
        let mut ast = parse("f(x)^2");
        let expr = ast.first_expr().unwrap();
        let NodeKind::Binary { lhs: call, .. } = ast.kind(expr).clone() else {
            panic!("expected a binary node");
        };
        let NodeKind::Call { callee, args } = ast.kind(call).clone() else {
            panic!("expected a call");
        };
        let group = ast.push(NodeKind::Group { items: args }, 1..4);
        ast.replace(call, NodeKind::Binary {
            op: BinOpKind::Mul,
            lhs: callee,
            rhs: group,
            implicit: Some(Implicit::Juxtaposed),
        });
        assert_eq!(ast.to_string(), "(f*(x))^2");
    }

    #[test]
    fn associativity_parentheses() {
        let mut ast = parse("a - b");
        let expr = ast.first_expr().unwrap();
        let NodeKind::Binary { rhs, .. } = ast.kind(expr).clone() else {
            panic!("expected a binary node");
        };
        let b = ast.push(NodeKind::Identifier { name: "b".to_string() }, 4..5);
        let c = ast.push(NodeKind::Identifier { name: "c".to_string() }, 4..5);
        ast.replace(rhs, NodeKind::Binary { op: BinOpKind::Sub, lhs: b, rhs: c, implicit: None });
        assert_eq!(ast.to_string(), "a-(b-c)");
    }
}
