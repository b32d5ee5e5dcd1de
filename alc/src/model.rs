//! Rule descriptions
//!
//! A flattened, shape-independent view of one `если ... то ... иначе ...`
//! statement, built by the analyzer and consumed by the code generator.

use crate::ast::{BinaryOp, CellReference};
use alc_core::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a condition joins the condition before it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOperator {
    /// First condition in the list
    #[default]
    None,
    And,
    Or,
}

impl LogicalOperator {
    /// Spelling in rule source (`и`, `или`), empty for `None`
    pub fn keyword(self) -> &'static str {
        match self {
            LogicalOperator::None => "",
            LogicalOperator::And => "и",
            LogicalOperator::Or => "или",
        }
    }
}

/// Right-hand side of a comparison leaf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum ConditionOperand {
    Literal(Value),
    Cell(CellReference),
}

impl fmt::Display for ConditionOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionOperand::Literal(value) => write_value(f, value),
            ConditionOperand::Cell(cell) => write!(f, "{}", cell),
        }
    }
}

/// One comparison leaf of the condition tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionDescription {
    /// Left operand. Stays at its default when the source operand was not a
    /// column reference.
    pub cell: CellReference,
    pub operator: BinaryOp,
    pub operand: ConditionOperand,
    pub logical: LogicalOperator,
}

impl ConditionDescription {
    pub fn register_code(&self) -> &str {
        &self.cell.register_code
    }

    pub fn column(&self) -> u32 {
        self.cell.column
    }

    pub fn is_literal_comparison(&self) -> bool {
        matches!(self.operand, ConditionOperand::Literal(_))
    }
}

impl fmt::Display for ConditionDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.logical != LogicalOperator::None {
            write!(f, "{} ", self.logical.keyword())?;
        }
        write!(f, "{} {} {}", self.cell, self.operator.symbol(), self.operand)
    }
}

/// Right-hand side of a then/else assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum AssignmentValue {
    Cell(CellReference),
    Literal(Value),
    /// Arithmetic expression, kept as source text
    Unresolved(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentDescription {
    pub target: CellReference,
    pub value: AssignmentValue,
}

impl AssignmentDescription {
    pub fn is_literal_assignment(&self) -> bool {
        matches!(self.value, AssignmentValue::Literal(_))
    }
}

impl fmt::Display for AssignmentDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = ", self.target)?;
        match &self.value {
            AssignmentValue::Cell(cell) => write!(f, "{}", cell),
            AssignmentValue::Literal(value) => write_value(f, value),
            AssignmentValue::Unresolved(text) => write!(f, "[{}]", text),
        }
    }
}

/// Analyzer output for one conditional statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDescription {
    /// Comparison leaves in source order
    pub conditions: Vec<ConditionDescription>,
    pub then_assignment: AssignmentDescription,
    pub else_assignment: Option<AssignmentDescription>,
}

impl RuleDescription {
    /// Distinct register codes of the conditions, first-seen order
    pub fn condition_registers(&self) -> Vec<&str> {
        let mut registers: Vec<&str> = Vec::new();
        for condition in &self.conditions {
            let code = condition.register_code();
            if !registers.contains(&code) {
                registers.push(code);
            }
        }
        registers
    }

    /// Distinct columns read from `register_code` by the conditions
    pub fn condition_columns(&self, register_code: &str) -> Vec<u32> {
        let mut columns = Vec::new();
        for condition in self.conditions.iter().filter(|c| c.register_code() == register_code) {
            if !columns.contains(&condition.column()) {
                columns.push(condition.column());
            }
        }
        columns
    }
}

impl fmt::Display for RuleDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let conditions: Vec<String> = self.conditions.iter().map(|c| c.to_string()).collect();
        write!(f, "если {} то {}", conditions.join(" "), self.then_assignment)?;
        if let Some(else_assignment) = &self.else_assignment {
            write!(f, " иначе {}", else_assignment)?;
        }
        Ok(())
    }
}

fn write_value(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Text(s) => write!(f, "\"{}\"", s),
        Value::Null => write!(f, "пусто"),
        other => write!(f, "{}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(text: &str) -> CellReference {
        CellReference::decode(text).unwrap()
    }

    fn condition(text: &str, logical: LogicalOperator, value: Value) -> ConditionDescription {
        ConditionDescription {
            cell: cell(text),
            operator: BinaryOp::Eq,
            operand: ConditionOperand::Literal(value),
            logical,
        }
    }

    fn rule() -> RuleDescription {
        RuleDescription {
            conditions: vec![
                condition("гр10102212", LogicalOperator::None, Value::Number(1.0)),
                condition("гр10103213", LogicalOperator::Or, Value::from("да")),
                condition("гр10102212", LogicalOperator::And, Value::Null),
                condition("гр10102214", LogicalOperator::And, Value::Number(3.0)),
            ],
            then_assignment: AssignmentDescription {
                target: cell("гр10103206"),
                value: AssignmentValue::Literal(Value::Number(2.0)),
            },
            else_assignment: None,
        }
    }

    #[test]
    fn test_condition_registers_distinct_in_order() {
        assert_eq!(rule().condition_registers(), vec!["10102", "10103"]);
    }

    #[test]
    fn test_condition_columns_distinct() {
        let rule = rule();
        assert_eq!(rule.condition_columns("10102"), vec![12, 14]);
        assert_eq!(rule.condition_columns("10103"), vec![13]);
        assert!(rule.condition_columns("99999").is_empty());
    }

    #[test]
    fn test_display_summary() {
        let mut rule = rule();
        rule.conditions.truncate(2);
        rule.else_assignment = Some(AssignmentDescription {
            target: cell("гр10103206"),
            value: AssignmentValue::Cell(cell("гр10102209")),
        });
        assert_eq!(
            rule.to_string(),
            "если гр10102212 == 1 или гр10103213 == \"да\" то гр10103206 = 2 иначе гр10103206 = гр10102209"
        );
    }

    #[test]
    fn test_assignment_kind() {
        let assignment = AssignmentDescription {
            target: cell("гр10103206"),
            value: AssignmentValue::Unresolved("гр10102209 + 1".to_string()),
        };
        assert!(!assignment.is_literal_assignment());
        assert_eq!(assignment.to_string(), "гр10103206 = [гр10102209 + 1]");
    }
}
