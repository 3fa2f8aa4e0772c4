use crate::nodes::{Ast, AstNode, Declaration, FunctionDecl, ModuleAst, TypeDecl};
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// Owner of every AST node produced by the parser.
///
/// Nodes are stored by id; parent/child relationships are kept in a parallel
/// route table so that non-owning phases can walk upward without `Rc` cycles.
/// The arena is released as a whole when compilation finishes.
#[derive(Default, Clone)]
pub struct Arena {
    pub(crate) nodes: FxHashMap<u32, AstNode>,
    pub(crate) node_routes: Vec<NodeRoute>,
}

impl Arena {
    #[must_use]
    pub fn modules(&self) -> Vec<Rc<ModuleAst>> {
        self.list_nodes_cmp(|node| {
            if let AstNode::Ast(Ast::Module(module)) = node {
                Some(module.clone())
            } else {
                None
            }
        })
        .collect()
    }

    #[must_use]
    pub fn functions(&self) -> Vec<Rc<FunctionDecl>> {
        self.list_nodes_cmp(|node| {
            if let AstNode::Declaration(Declaration::Function(func)) = node {
                Some(func.clone())
            } else {
                None
            }
        })
        .collect()
    }

    #[must_use]
    pub fn type_declarations(&self) -> Vec<Rc<TypeDecl>> {
        self.list_nodes_cmp(|node| {
            if let AstNode::Declaration(Declaration::Type(type_decl)) = node {
                Some(type_decl.clone())
            } else {
                None
            }
        })
        .collect()
    }

    /// Adds a node to the arena and records its parent-child relationship.
    ///
    /// # Panics
    ///
    /// Panics if `node.id()` is zero or if a node with the same ID already
    /// exists in the arena.
    pub fn add_node(&mut self, node: AstNode, parent_id: u32) {
        assert!(node.id() != 0, "Node ID must be non-zero");
        assert!(
            !self.nodes.contains_key(&node.id()),
            "Node with ID {} already exists in the arena",
            node.id()
        );
        let id = node.id();
        self.nodes.insert(id, node);
        self.add_storage_node(
            NodeRoute {
                id,
                parent: Some(parent_id),
                children: vec![],
            },
            parent_id,
        );
    }

    #[must_use]
    pub fn find_node(&self, id: u32) -> Option<AstNode> {
        self.nodes.get(&id).cloned()
    }

    #[must_use]
    pub fn find_parent_node(&self, id: u32) -> Option<u32> {
        self.node_routes
            .iter()
            .find(|n| n.id == id)
            .and_then(|node| node.parent)
    }

    pub fn filter_nodes<T: Fn(&AstNode) -> bool>(&self, fn_predicate: T) -> Vec<AstNode> {
        self.nodes
            .values()
            .filter(|node| fn_predicate(node))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn add_storage_node(&mut self, node: NodeRoute, parent: u32) {
        if let Some(parent_node) = self.node_routes.iter_mut().find(|n| n.id == parent) {
            parent_node.children.push(node.id);
        }
        self.node_routes.push(node);
    }

    fn list_nodes_cmp<'a, T, F>(&'a self, cmp: F) -> impl Iterator<Item = T> + 'a
    where
        F: Fn(&AstNode) -> Option<T> + 'a,
        T: Clone + 'static,
    {
        self.nodes.values().filter_map(move |node| cmp(node))
    }
}

#[derive(Clone, Default)]
pub struct NodeRoute {
    pub id: u32,
    parent: Option<u32>,
    children: Vec<u32>,
}
