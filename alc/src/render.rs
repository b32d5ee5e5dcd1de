//! Procedure renderer
//!
//! Generated code is built as a small statement/expression tree and turned
//! into text here. Indentation follows block nesting and string literals are
//! escaped on output, so the generator never handles either.

use alc_core::Value;

/// Expression in generated code
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Var(String),
    /// `receiver.method(args)`, or a free call when there is no receiver
    Call {
        receiver: Option<Box<Expr>>,
        method: String,
        args: Vec<Expr>,
    },
    /// `new Type()`
    New(String),
    /// `param => body`
    Lambda { param: String, body: Box<Expr> },
    Binary {
        left: Box<Expr>,
        op: &'static str,
        right: Box<Expr>,
    },
    Group(Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    /// Free call: `method(args)`
    pub fn call(method: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            receiver: None,
            method: method.into(),
            args,
        }
    }

    /// Method call on this expression: `self.method(args)`
    pub fn method(self, method: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            receiver: Some(Box::new(self)),
            method: method.into(),
            args,
        }
    }

    pub fn lambda(param: impl Into<String>, body: Expr) -> Self {
        Expr::Lambda {
            param: param.into(),
            body: Box::new(body),
        }
    }

    pub fn binary(left: Expr, op: &'static str, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn group(self) -> Self {
        Expr::Group(Box::new(self))
    }

    /// Wrap in parentheses unless the expression already binds as one unit
    pub fn parenthesized(self) -> Self {
        match self {
            Expr::Binary { .. } | Expr::Lambda { .. } => self.group(),
            other => other,
        }
    }

    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    pub fn text(s: impl Into<String>) -> Self {
        Expr::Literal(Value::Text(s.into()))
    }

    pub fn number(n: impl Into<f64>) -> Self {
        Expr::Literal(Value::Number(n.into()))
    }
}

/// Statement in generated code
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `// text`
    Comment(String),
    Blank,
    /// `var name = value;`
    Let { name: String, value: Expr },
    /// `expr;`
    Expr(Expr),
    /// `name &= value;`
    AndAssign { name: String, value: Expr },
    If { condition: Expr, body: Vec<Stmt> },
    Return(Expr),
}

impl Stmt {
    pub fn comment(text: impl Into<String>) -> Self {
        Stmt::Comment(text.into())
    }

    pub fn let_var(name: impl Into<String>, value: Expr) -> Self {
        Stmt::Let {
            name: name.into(),
            value,
        }
    }

    pub fn and_assign(name: impl Into<String>, value: Expr) -> Self {
        Stmt::AndAssign {
            name: name.into(),
            value,
        }
    }
}

/// `public bool <name>()` with a statement body
#[derive(Debug, Clone, PartialEq)]
pub struct Procedure {
    pub name: String,
    pub body: Vec<Stmt>,
}

/// Procedure text renderer
pub struct Renderer {
    indent_width: usize,
}

impl Renderer {
    pub fn new(indent_width: usize) -> Self {
        Self { indent_width }
    }

    pub fn render(&self, procedure: &Procedure) -> String {
        let mut output = String::new();
        output.push_str(&format!("public bool {}()\n", procedure.name));
        self.render_block(&procedure.body, 0, &mut output);
        output
    }

    fn render_block(&self, body: &[Stmt], depth: usize, output: &mut String) {
        self.line(depth, "{", output);
        for stmt in body {
            self.render_stmt(stmt, depth + 1, output);
        }
        self.line(depth, "}", output);
    }

    fn render_stmt(&self, stmt: &Stmt, depth: usize, output: &mut String) {
        match stmt {
            Stmt::Comment(text) => {
                // Rule text may span lines; a line comment must not
                let text = text.replace(['\r', '\n'], " ");
                self.line(depth, &format!("// {}", text), output);
            }
            Stmt::Blank => output.push('\n'),
            Stmt::Let { name, value } => {
                self.line(depth, &format!("var {} = {};", name, render_expr(value)), output);
            }
            Stmt::Expr(expr) => self.line(depth, &format!("{};", render_expr(expr)), output),
            Stmt::AndAssign { name, value } => {
                self.line(depth, &format!("{} &= {};", name, render_expr(value)), output);
            }
            Stmt::If { condition, body } => {
                self.line(depth, &format!("if ({})", render_expr(condition)), output);
                self.render_block(body, depth, output);
            }
            Stmt::Return(expr) => {
                self.line(depth, &format!("return {};", render_expr(expr)), output);
            }
        }
    }

    fn line(&self, depth: usize, text: &str, output: &mut String) {
        output.push_str(&" ".repeat(depth * self.indent_width));
        output.push_str(text);
        output.push('\n');
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(4)
    }
}

/// Render one expression on a single line
pub fn render_expr(expr: &Expr) -> String {
    match expr {
        Expr::Literal(value) => format_literal(value),
        Expr::Var(name) => name.clone(),
        Expr::Call {
            receiver,
            method,
            args,
        } => {
            let args: Vec<String> = args.iter().map(render_expr).collect();
            match receiver {
                Some(receiver) => {
                    format!("{}.{}({})", render_expr(receiver), method, args.join(", "))
                }
                None => format!("{}({})", method, args.join(", ")),
            }
        }
        Expr::New(type_name) => format!("new {}()", type_name),
        Expr::Lambda { param, body } => format!("{} => {}", param, render_expr(body)),
        Expr::Binary { left, op, right } => {
            let parent = precedence(op);
            // Operators are left-associative: a right child of equal
            // precedence needs parentheses, a left one does not
            let left = render_operand(left, |child| child < parent);
            let right = render_operand(right, |child| child <= parent);
            format!("{} {} {}", left, op, right)
        }
        Expr::Group(inner) => format!("({})", render_expr(inner)),
        Expr::Not(inner) => match inner.as_ref() {
            Expr::Binary { .. } | Expr::Lambda { .. } => format!("!({})", render_expr(inner)),
            _ => format!("!{}", render_expr(inner)),
        },
    }
}

fn render_operand(expr: &Expr, needs_group: impl Fn(u8) -> bool) -> String {
    match expr {
        Expr::Binary { op, .. } if needs_group(precedence(op)) => format!("({})", render_expr(expr)),
        Expr::Lambda { .. } => format!("({})", render_expr(expr)),
        _ => render_expr(expr),
    }
}

/// Binding strength of a binary operator in generated code
fn precedence(op: &str) -> u8 {
    match op {
        "||" => 1,
        "&&" => 2,
        "==" | "!=" => 3,
        "<" | "<=" | ">" | ">=" => 4,
        "+" | "-" => 5,
        "*" | "/" | "%" => 6,
        _ => 0,
    }
}

/// Literal spelling in generated code
pub fn format_literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Text(s) => format!("\"{}\"", escape(s)),
        Value::Bool(true) => "true".to_string(),
        Value::Bool(false) => "false".to_string(),
        Value::Number(n) => n.to_string(),
    }
}

fn escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Value::Null, "null")]
    #[case(Value::Bool(true), "true")]
    #[case(Value::Bool(false), "false")]
    #[case(Value::Number(2.0), "2")]
    #[case(Value::Number(0.5), "0.5")]
    #[case(Value::from("да"), "\"да\"")]
    #[case(Value::from("a\"b\\c\nd"), "\"a\\\"b\\\\c\\nd\"")]
    fn test_format_literal(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(format_literal(&value), expected);
    }

    #[test]
    fn test_method_chain() {
        let expr = Expr::call("GetRows", vec![Expr::text("10102"), Expr::number(2)])
            .method(
                "Where",
                vec![Expr::lambda(
                    "row",
                    Expr::binary(
                        Expr::var("row").method("GetValue", vec![Expr::number(12)]),
                        "==",
                        Expr::number(1),
                    )
                    .group(),
                )],
            )
            .method("ToList", vec![]);
        assert_eq!(
            render_expr(&expr),
            "GetRows(\"10102\", 2).Where(row => (row.GetValue(12) == 1)).ToList()"
        );
    }

    #[test]
    fn test_not_group() {
        let expr = Expr::binary(Expr::var("a"), "||", Expr::var("b")).group().not();
        assert_eq!(render_expr(&expr), "!(a || b)");
        assert_eq!(render_expr(&Expr::New("List<string>".into())), "new List<string>()");
    }

    #[rstest]
    #[case(Expr::binary(Expr::binary(Expr::var("a"), "||", Expr::var("b")), "&&", Expr::var("c")), "(a || b) && c")]
    #[case(Expr::binary(Expr::binary(Expr::var("a"), "&&", Expr::var("b")), "||", Expr::var("c")), "a && b || c")]
    #[case(Expr::binary(Expr::var("a"), "-", Expr::binary(Expr::var("b"), "-", Expr::var("c"))), "a - (b - c)")]
    #[case(Expr::binary(Expr::binary(Expr::var("a"), "-", Expr::var("b")), "-", Expr::var("c")), "a - b - c")]
    #[case(Expr::binary(Expr::var("a"), "*", Expr::binary(Expr::var("b"), "+", Expr::var("c"))), "a * (b + c)")]
    fn test_binary_parentheses_follow_tree(#[case] expr: Expr, #[case] expected: &str) {
        assert_eq!(render_expr(&expr), expected);
    }

    #[test]
    fn test_parenthesized_skips_grouped_and_atoms() {
        let grouped = Expr::binary(Expr::var("a"), "==", Expr::number(1)).group();
        assert_eq!(render_expr(&grouped.clone().parenthesized().not()), "!(a == 1)");
        assert_eq!(render_expr(&Expr::var("ok").parenthesized().not()), "!ok");
        assert_eq!(render_expr(&Expr::binary(Expr::var("a"), "&&", Expr::var("b")).not()), "!(a && b)");

        let joined = Expr::binary(grouped.clone(), "||", grouped);
        assert_eq!(render_expr(&joined.parenthesized().not()), "!((a == 1) || (a == 1))");
    }

    #[test]
    fn test_nested_indentation() {
        let procedure = Procedure {
            name: "Check".to_string(),
            body: vec![
                Stmt::let_var("ok", Expr::Literal(Value::Bool(true))),
                Stmt::Blank,
                Stmt::If {
                    condition: Expr::var("ok").not(),
                    body: vec![Stmt::Expr(Expr::var("errors").method("Add", vec![Expr::text("x")]))],
                },
                Stmt::Return(Expr::var("ok")),
            ],
        };

        let expected = "public bool Check()\n\
                        {\n  \
                          var ok = true;\n\
                        \n  \
                          if (!ok)\n  \
                          {\n    \
                            errors.Add(\"x\");\n  \
                          }\n  \
                          return ok;\n\
                        }\n";
        assert_eq!(Renderer::new(2).render(&procedure), expected);
    }

    #[test]
    fn test_multiline_comment_collapsed() {
        let procedure = Procedure {
            name: "Validate".to_string(),
            body: vec![Stmt::comment("если\nгр10102212 == 1")],
        };
        assert_eq!(
            Renderer::default().render(&procedure),
            "public bool Validate()\n{\n    // если гр10102212 == 1\n}\n"
        );
    }
}
