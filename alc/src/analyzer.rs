//! Block analyzer
//!
//! Flattens the condition tree of an `если` statement into an ordered list
//! of comparison leaves and describes both branches.

use crate::ast::{Assignment, BinaryOp, IfStatement, Node};
use crate::model::{
    AssignmentDescription, AssignmentValue, ConditionDescription, ConditionOperand,
    LogicalOperator, RuleDescription,
};
use alc_core::Value;

/// Describe one conditional statement
pub fn analyze(stmt: &IfStatement) -> RuleDescription {
    let mut conditions = Vec::new();
    flatten(&stmt.condition, LogicalOperator::None, &mut conditions);

    RuleDescription {
        conditions,
        then_assignment: describe_assignment(&stmt.then_branch),
        else_assignment: stmt.else_branch.as_ref().map(describe_assignment),
    }
}

/// Left subtrees keep the inherited operator; right subtrees of `и`/`или`
/// take that operator.
fn flatten(node: &Node, logical: LogicalOperator, out: &mut Vec<ConditionDescription>) {
    let Node::Binary { left, op, right } = node else {
        return;
    };

    match op {
        BinaryOp::Or => {
            flatten(left, logical, out);
            flatten(right, LogicalOperator::Or, out);
        }
        BinaryOp::And => {
            flatten(left, logical, out);
            flatten(right, LogicalOperator::And, out);
        }
        op if op.is_comparison() => out.push(describe_condition(left, *op, right, logical)),
        _ => {
            flatten(left, logical, out);
            flatten(right, logical, out);
        }
    }
}

fn describe_condition(
    left: &Node,
    operator: BinaryOp,
    right: &Node,
    logical: LogicalOperator,
) -> ConditionDescription {
    let cell = match left {
        Node::Cell(cell) => cell.clone(),
        _ => Default::default(),
    };
    let operand = match right {
        Node::Cell(cell) => ConditionOperand::Cell(cell.clone()),
        Node::Literal(value) => ConditionOperand::Literal(value.clone()),
        _ => ConditionOperand::Literal(Value::Null),
    };

    ConditionDescription {
        cell,
        operator,
        operand,
        logical,
    }
}

fn describe_assignment(assignment: &Assignment) -> AssignmentDescription {
    let value = match assignment.value.as_ref() {
        Node::Cell(cell) => AssignmentValue::Cell(cell.clone()),
        Node::Literal(value) => AssignmentValue::Literal(value.clone()),
        other => AssignmentValue::Unresolved(expression_text(other)),
    };

    AssignmentDescription {
        target: assignment.target.clone(),
        value,
    }
}

/// Source-like text of an expression, nested operations parenthesised
fn expression_text(node: &Node) -> String {
    match node {
        Node::Cell(cell) => cell.to_string(),
        Node::Literal(Value::Text(s)) => format!("\"{}\"", s),
        Node::Literal(Value::Null) => "пусто".to_string(),
        Node::Literal(value) => value.to_string(),
        Node::Binary { left, op, right } => {
            format!("{} {} {}", operand_text(left), op.symbol(), operand_text(right))
        }
        other => other.kind_name().to_string(),
    }
}

fn operand_text(node: &Node) -> String {
    match node {
        Node::Binary { .. } => format!("({})", expression_text(node)),
        _ => expression_text(node),
    }
}
