//! In-memory tax register tables
//!
//! Generated validation procedures address data as
//! `(register code, table part, column)`. This module is a plain in-memory
//! implementation of that addressing scheme, used by hosts and tests.

use crate::Value;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Access to register tables as seen by generated code
pub trait RegisterAccess {
    /// All rows of one table part (empty when the register is unknown)
    fn rows(&self, code: &str, table_part: u8) -> &[RegisterRow];

    /// Value of `column` in the first row
    fn cell_value(&self, code: &str, table_part: u8, column: u32) -> Value;

    /// Values of `column` across every row
    fn column(&self, code: &str, table_part: u8, column: u32) -> Vec<Value>;

    /// Store `value` in `column` of the first row
    fn set_cell_value(&mut self, code: &str, table_part: u8, column: u32, value: Value);
}

/// One row: a sparse column -> value mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisterRow {
    values: BTreeMap<u32, Value>,
}

impl RegisterRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set a column while constructing a row
    pub fn with(mut self, column: u32, value: impl Into<Value>) -> Self {
        self.values.insert(column, value.into());
        self
    }

    pub fn value(&self, column: u32) -> Value {
        self.values.get(&column).cloned().unwrap_or_default()
    }

    pub fn set_value(&mut self, column: u32, value: Value) {
        self.values.insert(column, value);
    }
}

/// One table part of a tax register
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxRegister {
    pub code: String,
    pub table_part: u8,
    pub rows: Vec<RegisterRow>,
}

impl TaxRegister {
    pub fn new(code: impl Into<String>, table_part: u8) -> Self {
        Self {
            code: code.into(),
            table_part,
            rows: Vec::new(),
        }
    }

    pub fn with_row(mut self, row: RegisterRow) -> Self {
        self.rows.push(row);
        self
    }

    /// Out-of-range rows read as `Null`
    pub fn value(&self, row: usize, column: u32) -> Value {
        self.rows
            .get(row)
            .map(|r| r.value(column))
            .unwrap_or_default()
    }

    /// Out-of-range rows are ignored
    pub fn set_value(&mut self, row: usize, column: u32, value: Value) {
        if let Some(r) = self.rows.get_mut(row) {
            r.set_value(column, value);
        }
    }

    pub fn column(&self, column: u32) -> Vec<Value> {
        self.rows.iter().map(|r| r.value(column)).collect()
    }
}

/// Registers keyed by code and table part
#[derive(Debug, Clone, Default)]
pub struct RegisterBook {
    registers: HashMap<(String, u8), TaxRegister>,
}

impl RegisterBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a register, replacing any previous one with the same key
    pub fn insert(&mut self, register: TaxRegister) {
        let key = (register.code.clone(), register.table_part);
        self.registers.insert(key, register);
    }

    pub fn get(&self, code: &str, table_part: u8) -> Option<&TaxRegister> {
        self.registers.get(&(code.to_string(), table_part))
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }
}

impl RegisterAccess for RegisterBook {
    fn rows(&self, code: &str, table_part: u8) -> &[RegisterRow] {
        self.get(code, table_part)
            .map(|r| r.rows.as_slice())
            .unwrap_or(&[])
    }

    fn cell_value(&self, code: &str, table_part: u8, column: u32) -> Value {
        self.get(code, table_part)
            .map(|r| r.value(0, column))
            .unwrap_or_default()
    }

    fn column(&self, code: &str, table_part: u8, column: u32) -> Vec<Value> {
        self.get(code, table_part)
            .map(|r| r.column(column))
            .unwrap_or_default()
    }

    fn set_cell_value(&mut self, code: &str, table_part: u8, column: u32, value: Value) {
        let register = self
            .registers
            .entry((code.to_string(), table_part))
            .or_insert_with(|| TaxRegister::new(code, table_part));
        if register.rows.is_empty() {
            register.rows.push(RegisterRow::new());
        }
        register.set_value(0, column, value);
    }
}
