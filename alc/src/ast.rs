//! Abstract Syntax Tree

use alc_core::Value;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Number of digits before the column number: 5 register + 1 table part
const COLUMN_START: usize = 6;
/// Shortest digit suffix accepted: register, table part and a 2-digit column
const MIN_DIGITS: usize = 8;

/// Decoded `гр` reference: register `10102`, table part `2`, column `12`.
///
/// Equality and hashing look at the decoded address only, so `гр10102212`
/// and `гр101022012` are the same cell. `Display` keeps the source spelling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CellReference {
    pub register_code: String,
    pub table_part: u8,
    pub column: u32,
    digits: String,
}

impl CellReference {
    /// Split `гр10102212` into `10102` / `2` / `12`.
    ///
    /// Returns `None` unless the text is the `гр` prefix followed by at least
    /// eight ASCII digits and the column fits a `u32`.
    pub fn decode(text: &str) -> Option<Self> {
        if !crate::token::has_cell_prefix(text) {
            return None;
        }
        let digits: String = text.chars().skip(2).collect();
        if digits.len() < MIN_DIGITS || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        let register_code = digits[..5].to_string();
        let table_part = digits[5..COLUMN_START].parse().ok()?;
        let column = digits[COLUMN_START..].parse().ok()?;

        Some(Self {
            register_code,
            table_part,
            column,
            digits,
        })
    }

    /// The full digit suffix, e.g. `10102212`
    pub fn digits(&self) -> &str {
        &self.digits
    }

    /// Same register and table part, another column
    pub fn with_column(&self, column: u32) -> Self {
        Self {
            register_code: self.register_code.clone(),
            table_part: self.table_part,
            column,
            digits: format!("{}{}{:02}", self.register_code, self.table_part, column),
        }
    }

    /// Column digits as written, leading zeros kept (`06` in `гр10103206`)
    pub fn column_digits(&self) -> &str {
        self.digits.get(COLUMN_START..).unwrap_or("")
    }
}

impl PartialEq for CellReference {
    fn eq(&self, other: &Self) -> bool {
        self.register_code == other.register_code
            && self.table_part == other.table_part
            && self.column == other.column
    }
}

impl Eq for CellReference {}

impl Hash for CellReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.register_code.hash(state);
        self.table_part.hash(state);
        self.column.hash(state);
    }
}

impl std::fmt::Display for CellReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "гр{}", self.digits)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Lt | BinaryOp::Le
        )
    }

    /// Spelling in rule source
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "или",
            BinaryOp::And => "и",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegisterOpKind {
    ContainsAll,
    ContainsAny,
    Sum,
    Avg,
    Max,
    Min,
    Count,
}

impl std::fmt::Display for RegisterOpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// Aggregate or set check over one column of a register
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterOperation {
    pub kind: RegisterOpKind,
    pub source: CellReference,
    pub condition: Option<Box<Node>>,
    pub target_column: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub target: CellReference,
    pub value: Box<Node>,
}

/// `если <condition> то <assignment> [иначе <assignment>]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStatement {
    pub condition: Box<Node>,
    pub then_branch: Assignment,
    pub else_branch: Option<Assignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    If(IfStatement),
    Binary {
        left: Box<Node>,
        op: BinaryOp,
        right: Box<Node>,
    },
    Assignment(Assignment),
    Literal(Value),
    Cell(CellReference),
    RegisterOperation(RegisterOperation),
}

impl Node {
    pub fn binary(left: Node, op: BinaryOp, right: Node) -> Self {
        Node::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn assignment(target: CellReference, value: Node) -> Self {
        Node::Assignment(Assignment {
            target,
            value: Box::new(value),
        })
    }

    /// Short name for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::If(_) => "conditional statement",
            Node::Binary { .. } => "binary expression",
            Node::Assignment(_) => "assignment",
            Node::Literal(_) => "literal",
            Node::Cell(_) => "column reference",
            Node::RegisterOperation(_) => "register operation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    #[rstest]
    #[case("гр10102212", "10102", 2, 12)]
    #[case("гр10103206", "10103", 2, 6)]
    #[case("гр12345678", "12345", 6, 78)]
    #[case("ГР101021234", "10102", 1, 234)]
    fn test_decode(
        #[case] text: &str,
        #[case] register: &str,
        #[case] table_part: u8,
        #[case] column: u32,
    ) {
        let cell = CellReference::decode(text).unwrap();
        assert_eq!(cell.register_code, register);
        assert_eq!(cell.table_part, table_part);
        assert_eq!(cell.column, column);
    }

    #[rstest]
    #[case("гр10102212")]
    #[case("гр10103206")]
    #[case("гр000000001")]
    fn test_decoded_fields_concatenate_to_digits(#[case] text: &str) {
        let cell = CellReference::decode(text).unwrap();
        let joined = format!("{}{}{}", cell.register_code, cell.table_part, cell.column_digits());
        assert_eq!(joined, &text["гр".len()..]);
        assert_eq!(cell.to_string(), text);
    }

    #[test]
    fn test_equality_ignores_column_spelling() {
        let short = CellReference::decode("гр10102212").unwrap();
        let padded = CellReference::decode("гр101022012").unwrap();
        assert_eq!(short, padded);
        assert_ne!(short.to_string(), padded.to_string());

        let set: HashSet<CellReference> = [short, padded].into_iter().collect();
        assert_eq!(set.len(), 1);
        assert_ne!(
            CellReference::decode("гр10102212").unwrap(),
            CellReference::decode("гр10102112").unwrap()
        );
    }

    #[test]
    fn test_with_column_keeps_register() {
        let cell = CellReference::decode("гр10102212").unwrap().with_column(5);
        assert_eq!(cell.register_code, "10102");
        assert_eq!(cell.table_part, 2);
        assert_eq!(cell.column, 5);
        assert_eq!(cell.to_string(), "гр10102205");
    }

    #[rstest]
    #[case("гр")]
    #[case("гр1010221")]
    #[case("10102212")]
    #[case("гр99999999999999999")]
    fn test_decode_rejects_malformed(#[case] text: &str) {
        assert!(CellReference::decode(text).is_none());
    }

    #[test]
    fn test_default_reference_has_empty_digits() {
        let cell = CellReference::default();
        assert_eq!(cell.column_digits(), "");
        assert_eq!(cell.column, 0);
    }
}
