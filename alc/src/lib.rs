//! ALC - Compiler for tax register validation rules
//!
//! Rules are written in a Russian-keyword dialect:
//!
//! ```text
//! Если гр10102212 == 1 или гр10102213 == 2 то гр10103206 = гр10102209
//! ```
//!
//! and compile into the text of a validation procedure that reads register
//! tables through `GetRows`, `GetCellValue`, `GetColumn` and `SetCellValue`.

mod token;
mod lexer;
mod ast;
mod parser;
mod model;
mod analyzer;
mod render;
mod codegen;
mod trace;

pub use token::{Token, TokenKind};
pub use lexer::tokenize;
pub use ast::{
    Assignment, BinaryOp, CellReference, IfStatement, Node, RegisterOpKind, RegisterOperation,
};
pub use parser::parse;
pub use model::{
    AssignmentDescription, AssignmentValue, ConditionDescription, ConditionOperand,
    LogicalOperator, RuleDescription,
};
pub use analyzer::analyze;
pub use render::{format_literal, render_expr, Expr, Procedure, Renderer, Stmt};
pub use codegen::{CodeGenerator, GeneratorConfig, UNKNOWN_REGISTER};
pub use trace::{JsonSink, RecordingSink, TraceSink};

pub use alc_core::{codes, CompileError, GenerateError, ParseError, Value};

use tracing::debug;

/// Main compiler. Holds configuration only, so one instance can be shared
/// across threads.
pub struct Compiler {
    generator: CodeGenerator,
}

impl Compiler {
    pub fn new() -> Self {
        Self::with_config(GeneratorConfig::default())
    }

    pub fn with_config(config: GeneratorConfig) -> Self {
        Self {
            generator: CodeGenerator::new(config),
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        self.generator.config()
    }

    /// Compile rule source into procedure text
    pub fn compile(&self, source: &str) -> Result<String, CompileError> {
        self.run(source, None)
    }

    /// Compile while showing each stage to `sink`
    pub fn compile_with_trace(
        &self,
        source: &str,
        sink: &mut dyn TraceSink,
    ) -> Result<String, CompileError> {
        self.run(source, Some(sink))
    }

    fn run(&self, source: &str, mut sink: Option<&mut dyn TraceSink>) -> Result<String, CompileError> {
        let tokens = tokenize(source);
        debug!(count = tokens.len(), "tokenized rule");
        if let Some(sink) = sink.as_deref_mut() {
            sink.on_tokens(&tokens);
        }

        let ast = parse(&tokens)?;
        debug!(kind = ast.kind_name(), "parsed rule");
        if let Some(sink) = sink.as_deref_mut() {
            sink.on_ast(&ast);
        }

        let code = match &ast {
            Node::If(stmt) => {
                let rule = analyze(stmt);
                debug!(
                    conditions = rule.conditions.len(),
                    has_else = rule.else_assignment.is_some(),
                    "analyzed rule"
                );
                if let Some(sink) = sink.as_deref_mut() {
                    sink.on_rule(&rule);
                }
                self.generator.generate_rule(&rule)?
            }
            other => self.generator.generate(other)?,
        };

        debug!(bytes = code.len(), "generated procedure");
        Ok(code)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Compile with default settings
pub fn compile(source: &str) -> Result<String, CompileError> {
    Compiler::new().compile(source)
}
