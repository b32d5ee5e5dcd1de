//! Code generator
//!
//! Turns a parsed rule into the text of a validation procedure. Conditional
//! statements go through the analyzer and become filtered row selections
//! followed by a check of the assigned column. Anything else is translated
//! node by node.

use crate::analyzer::analyze;
use crate::ast::{Assignment, BinaryOp, CellReference, Node, RegisterOpKind, RegisterOperation};
use crate::model::{
    AssignmentDescription, AssignmentValue, ConditionDescription, ConditionOperand,
    LogicalOperator, RuleDescription,
};
use crate::render::{Expr, Procedure, Renderer, Stmt};
use alc_core::{GenerateError, Value};
use serde::{Deserialize, Serialize};

/// Register code used when a rule has no comparison to take one from
pub const UNKNOWN_REGISTER: &str = "?????";

const ROW: &str = "row";
const ERRORS: &str = "errors";
const IS_VALID: &str = "isValid";

/// Generator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Name of the emitted procedure
    pub procedure_name: String,
    /// Spaces per nesting level
    pub indent_width: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            procedure_name: "Validate".to_string(),
            indent_width: 4,
        }
    }
}

impl GeneratorConfig {
    pub fn with_procedure_name(mut self, name: impl Into<String>) -> Self {
        self.procedure_name = name.into();
        self
    }

    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }
}

pub struct CodeGenerator {
    config: GeneratorConfig,
}

impl CodeGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate the procedure for a whole rule
    pub fn generate(&self, node: &Node) -> Result<String, GenerateError> {
        let statements = match node {
            Node::If(stmt) => rule_statements(&analyze(stmt))?,
            other => direct_statements(other)?,
        };
        Ok(self.render(statements))
    }

    /// Generate from an already analyzed rule
    pub fn generate_rule(&self, rule: &RuleDescription) -> Result<String, GenerateError> {
        Ok(self.render(rule_statements(rule)?))
    }

    fn render(&self, statements: Vec<Stmt>) -> String {
        let mut body = vec![
            Stmt::let_var(ERRORS, Expr::New("List<string>".to_string())),
            Stmt::let_var(IS_VALID, Expr::Literal(Value::Bool(true))),
            Stmt::Blank,
        ];
        body.extend(statements);
        body.push(Stmt::Blank);
        body.push(Stmt::Return(Expr::var(IS_VALID)));

        let procedure = Procedure {
            name: self.config.procedure_name.clone(),
            body,
        };
        Renderer::new(self.config.indent_width).render(&procedure)
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

// ========== Conditional rules ==========

/// Register and table part the row selection runs over
struct Primary<'a> {
    register_code: &'a str,
    table_part: u8,
}

impl Primary<'_> {
    /// `row.GetValue(col)` for the primary register and table part, a cell
    /// read otherwise
    fn lookup(&self, cell: &CellReference) -> Expr {
        if cell.register_code == self.register_code && cell.table_part == self.table_part {
            Expr::var(ROW).method("GetValue", vec![Expr::number(cell.column)])
        } else {
            cell_value(cell)
        }
    }

    fn rows(&self) -> Expr {
        Expr::call(
            "GetRows",
            vec![Expr::text(self.register_code), Expr::number(self.table_part)],
        )
    }
}

fn rule_statements(rule: &RuleDescription) -> Result<Vec<Stmt>, GenerateError> {
    let primary = match rule.conditions.first() {
        Some(first) => Primary {
            register_code: first.register_code(),
            table_part: first.cell.table_part,
        },
        None => Primary {
            register_code: UNKNOWN_REGISTER,
            table_part: 0,
        },
    };
    let predicate = predicate(&rule.conditions, &primary);

    let mut out = vec![Stmt::comment(rule.to_string())];
    out.push(select_rows("thenRows", &primary, predicate.clone()));
    out.extend(check_assignment("then", &rule.then_assignment, &primary)?);

    if let Some(else_assignment) = &rule.else_assignment {
        out.push(Stmt::Blank);
        out.push(select_rows("elseRows", &primary, predicate.parenthesized().not()));
        out.extend(check_assignment("else", else_assignment, &primary)?);
    }
    Ok(out)
}

/// Conditions joined in source order; no conditions select every row
fn predicate(conditions: &[ConditionDescription], primary: &Primary) -> Expr {
    let mut iter = conditions.iter();
    let Some(first) = iter.next() else {
        return Expr::Literal(Value::Bool(true));
    };

    let mut expr = comparison(first, primary);
    for condition in iter {
        let op = match condition.logical {
            LogicalOperator::Or => "||",
            LogicalOperator::And | LogicalOperator::None => "&&",
        };
        expr = Expr::binary(expr, op, comparison(condition, primary));
    }
    expr
}

fn comparison(condition: &ConditionDescription, primary: &Primary) -> Expr {
    let right = match &condition.operand {
        ConditionOperand::Literal(value) => Expr::Literal(value.clone()),
        ConditionOperand::Cell(cell) => primary.lookup(cell),
    };
    Expr::binary(
        primary.lookup(&condition.cell),
        target_operator(condition.operator),
        right,
    )
    .group()
}

fn select_rows(name: &str, primary: &Primary, predicate: Expr) -> Stmt {
    let filtered = primary
        .rows()
        .method("Where", vec![Expr::lambda(ROW, predicate)])
        .method("ToList", vec![]);
    Stmt::let_var(name, filtered)
}

/// Literal: every selected row holds the literal in the target column.
/// Reference: every value of the target column is among the source values
/// of the selected rows.
fn check_assignment(
    branch: &str,
    assignment: &AssignmentDescription,
    primary: &Primary,
) -> Result<Vec<Stmt>, GenerateError> {
    let rows = Expr::var(format!("{}Rows", branch));
    let valid = format!("{}Valid", branch);
    let mut out = Vec::new();

    let check = match &assignment.value {
        AssignmentValue::Literal(value) => {
            let equals = Expr::binary(
                primary.lookup(&assignment.target),
                "==",
                Expr::Literal(value.clone()),
            );
            rows.method("All", vec![Expr::lambda(ROW, equals)])
        }
        AssignmentValue::Cell(source) => {
            let source_set = format!("{}Source", branch);
            let values = rows
                .method("Select", vec![Expr::lambda(ROW, primary.lookup(source))])
                .method("ToHashSet", vec![]);
            out.push(Stmt::let_var(source_set.as_str(), values));

            let contained = Expr::var(source_set).method("Contains", vec![Expr::var("value")]);
            column(&assignment.target).method("All", vec![Expr::lambda("value", contained)])
        }
        AssignmentValue::Unresolved(expression) => {
            return Err(GenerateError::UnsupportedAssignment {
                target: assignment.target.to_string(),
                expression: expression.clone(),
            });
        }
    };

    out.push(Stmt::let_var(valid.as_str(), check));
    out.push(Stmt::If {
        condition: Expr::var(valid.as_str()).not(),
        body: vec![add_error(format!("Rule violated: {}", assignment))],
    });
    out.push(Stmt::and_assign(IS_VALID, Expr::var(valid)));
    Ok(out)
}

// ========== Direct translation ==========

fn direct_statements(node: &Node) -> Result<Vec<Stmt>, GenerateError> {
    match node {
        Node::Assignment(assignment) => Ok(vec![set_cell_value(assignment)?]),
        Node::RegisterOperation(operation) => register_operation(operation),
        Node::Binary { .. } => Ok(vec![Stmt::and_assign(IS_VALID, expression(node)?)]),
        Node::If(stmt) => rule_statements(&analyze(stmt)),
        Node::Literal(_) | Node::Cell(_) => {
            Err(GenerateError::UnexpectedNode(node.kind_name().to_string()))
        }
    }
}

fn set_cell_value(assignment: &Assignment) -> Result<Stmt, GenerateError> {
    let target = &assignment.target;
    Ok(Stmt::Expr(Expr::call(
        "SetCellValue",
        vec![
            Expr::text(target.register_code.as_str()),
            Expr::number(target.table_part),
            Expr::number(target.column),
            expression(&assignment.value)?,
        ],
    )))
}

fn expression(node: &Node) -> Result<Expr, GenerateError> {
    match node {
        Node::Cell(cell) => Ok(cell_value(cell)),
        Node::Literal(value) => Ok(Expr::Literal(value.clone())),
        Node::Binary { left, op, right } => Ok(Expr::binary(
            expression(left)?,
            target_operator(*op),
            expression(right)?,
        )
        .group()),
        other => Err(GenerateError::UnexpectedNode(other.kind_name().to_string())),
    }
}

/// Fixed block per operation kind. The target column is read from the
/// source register and table part.
fn register_operation(operation: &RegisterOperation) -> Result<Vec<Stmt>, GenerateError> {
    let target_column = operation
        .target_column
        .ok_or_else(|| GenerateError::MissingTargetColumn(operation.kind.to_string()))?;

    let source = &operation.source;
    let target = source.with_column(target_column);
    let target_name = target.to_string();

    match operation.kind {
        RegisterOpKind::ContainsAll | RegisterOpKind::ContainsAny => {
            let (method, comment, message) = if operation.kind == RegisterOpKind::ContainsAll {
                (
                    "All",
                    format!("all values of {} are contained in {}", source, target_name),
                    format!("Not all values of {} are contained in {}", source, target_name),
                )
            } else {
                (
                    "Any",
                    format!("at least one value of {} is contained in {}", source, target_name),
                    format!("No value of {} is contained in {}", source, target_name),
                )
            };
            let contained = Expr::var("targetValues").method("Contains", vec![Expr::var("value")]);
            Ok(vec![
                Stmt::comment(comment),
                Stmt::let_var("sourceValues", column(source)),
                Stmt::let_var("targetValues", column(&target)),
                Stmt::and_assign(
                    IS_VALID,
                    Expr::var("sourceValues").method(method, vec![Expr::lambda("value", contained)]),
                ),
                Stmt::If {
                    condition: Expr::var(IS_VALID).not(),
                    body: vec![add_error(message)],
                },
            ])
        }
        RegisterOpKind::Sum => {
            let to_decimal = Expr::call("Convert.ToDecimal", vec![Expr::var("value")]);
            let sum = column(source)
                .method("Select", vec![Expr::lambda("value", to_decimal)])
                .method("Sum", vec![]);
            Ok(vec![
                Stmt::comment(format!("sum of {} into {}", source, target_name)),
                Stmt::let_var("sum", sum),
                Stmt::Expr(Expr::call(
                    "SetCellValue",
                    vec![
                        Expr::text(target.register_code.as_str()),
                        Expr::number(target.table_part),
                        Expr::number(target.column),
                        Expr::var("sum"),
                    ],
                )),
            ])
        }
        other => Err(GenerateError::UnsupportedOperation(other.to_string())),
    }
}

// ========== Shared pieces ==========

fn cell_value(cell: &CellReference) -> Expr {
    Expr::call("GetCellValue", cell_args(cell))
}

fn column(cell: &CellReference) -> Expr {
    Expr::call("GetColumn", cell_args(cell))
}

fn cell_args(cell: &CellReference) -> Vec<Expr> {
    vec![
        Expr::text(cell.register_code.as_str()),
        Expr::number(cell.table_part),
        Expr::number(cell.column),
    ]
}

fn add_error(message: String) -> Stmt {
    Stmt::Expr(Expr::var(ERRORS).method("Add", vec![Expr::text(message)]))
}

fn target_operator(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Or => "||",
        BinaryOp::And => "&&",
        other => other.symbol(),
    }
}
