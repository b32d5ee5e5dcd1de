//! Compilation trace
//!
//! A `TraceSink` observes the intermediate products of a compilation
//! (tokens, syntax tree, rule description). Sinks only watch; the compiled
//! output is the same with or without one.

use crate::ast::Node;
use crate::model::RuleDescription;
use crate::token::Token;
use serde::Serialize;
use std::io;

/// Observer of pipeline stages. Every hook defaults to a no-op.
pub trait TraceSink {
    fn on_tokens(&mut self, _tokens: &[Token]) {}

    fn on_ast(&mut self, _ast: &Node) {}

    /// Only called for conditional statements
    fn on_rule(&mut self, _rule: &RuleDescription) {}
}

/// Keeps a copy of everything it is shown
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub tokens: Vec<Token>,
    pub ast: Option<Node>,
    pub rule: Option<RuleDescription>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TraceSink for RecordingSink {
    fn on_tokens(&mut self, tokens: &[Token]) {
        self.tokens = tokens.to_vec();
    }

    fn on_ast(&mut self, ast: &Node) {
        self.ast = Some(ast.clone());
    }

    fn on_rule(&mut self, rule: &RuleDescription) {
        self.rule = Some(rule.clone());
    }
}

/// One JSON document per stage, newline separated
#[derive(Serialize)]
#[serde(tag = "stage", content = "data", rename_all = "snake_case")]
enum TraceEvent<'a> {
    Tokens(&'a [Token]),
    Ast(&'a Node),
    Rule(&'a RuleDescription),
}

/// Writes each stage as a JSON line. Write failures are logged, never
/// propagated into the compilation.
pub struct JsonSink<W: io::Write> {
    writer: W,
    pretty: bool,
}

impl<W: io::Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pretty: false,
        }
    }

    /// Builder: pretty-print each document
    pub fn pretty(mut self, enabled: bool) -> Self {
        self.pretty = enabled;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn emit(&mut self, event: TraceEvent<'_>) {
        let result = if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, &event)
        } else {
            serde_json::to_writer(&mut self.writer, &event)
        };
        let result = result
            .map_err(io::Error::from)
            .and_then(|_| self.writer.write_all(b"\n"));
        if let Err(e) = result {
            tracing::warn!("failed to write trace: {}", e);
        }
    }
}

impl<W: io::Write> TraceSink for JsonSink<W> {
    fn on_tokens(&mut self, tokens: &[Token]) {
        self.emit(TraceEvent::Tokens(tokens));
    }

    fn on_ast(&mut self, ast: &Node) {
        self.emit(TraceEvent::Ast(ast));
    }

    fn on_rule(&mut self, rule: &RuleDescription) {
        self.emit(TraceEvent::Rule(rule));
    }
}
