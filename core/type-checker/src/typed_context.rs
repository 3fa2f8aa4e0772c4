//! Typed Context
//!
//! [`TypedContext`] is what type checking produces: the merged program, the
//! global symbol table and a map from AST node ids to inferred [`TypeInfo`].
//! It is read-only for every later phase.

use std::rc::Rc;

use crate::{symbol_table::SymbolTable, type_info::TypeInfo};
use paw_ast::{
    linker::Program,
    nodes::{AstNode, Declaration, FunctionDecl, TypeDecl},
};
use rustc_hash::FxHashMap;

pub struct TypedContext {
    pub(crate) symbol_table: SymbolTable,
    node_types: FxHashMap<u32, TypeInfo>,
    program: Program,
}

impl TypedContext {
    pub(crate) fn new(program: Program) -> Self {
        Self {
            symbol_table: SymbolTable::default(),
            node_types: FxHashMap::default(),
            program,
        }
    }

    #[must_use]
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbol_table
    }

    #[must_use]
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Top-level declarations in link order.
    #[must_use]
    pub fn declarations(&self) -> &[Declaration] {
        &self.program.declarations
    }

    #[must_use = "returns function declarations without side effects"]
    pub fn functions(&self) -> Vec<Rc<FunctionDecl>> {
        self.program
            .declarations
            .iter()
            .filter_map(|decl| match decl {
                Declaration::Function(func) => Some(func.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use = "returns type declarations without side effects"]
    pub fn type_declarations(&self) -> Vec<Rc<TypeDecl>> {
        self.program
            .declarations
            .iter()
            .filter_map(|decl| match decl {
                Declaration::Type(decl) => Some(decl.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use = "returns filtered nodes without side effects"]
    pub fn filter_nodes<T: Fn(&AstNode) -> bool>(&self, fn_predicate: T) -> Vec<AstNode> {
        self.program.arena.filter_nodes(fn_predicate)
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub fn get_node_typeinfo(&self, node_id: u32) -> Option<TypeInfo> {
        self.node_types.get(&node_id).cloned()
    }

    pub(crate) fn set_node_typeinfo(&mut self, node_id: u32, type_info: TypeInfo) {
        self.node_types.insert(node_id, type_info);
    }

    /// The inferred type of a node, defaulting to `void` for nodes the
    /// checker never visits (statements without a value).
    #[must_use]
    pub fn node_type_or_void(&self, node_id: u32) -> TypeInfo {
        self.get_node_typeinfo(node_id).unwrap_or_default()
    }
}
