use super::CodeChunk;
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticsSink};
use crate::error::ChunkingError;
use crate::types::{ChunkKind, ChunkMetadata, LineRange};
use std::collections::BTreeSet;
use tree_sitter::{Node, Parser};

const CLASS_NODE: &str = "class_definition";
const FUNCTION_NODE: &str = "function_definition";
const DECORATED_NODE: &str = "decorated_definition";
const COMMENT_NODE: &str = "comment";

/// Extracts class and function chunks from Python source using tree-sitter
///
/// Chunks are emitted in pre-order: a declaration comes before everything
/// nested in it, and nested declarations come before the next sibling.
/// Only classes open a scope, so a function's `parent_name` is the nearest
/// enclosing class even when it is lexically nested in another function.
pub struct ChunkExtractor {
    parser: Parser,
}

impl ChunkExtractor {
    /// Create a new extractor for Python source
    pub fn new() -> Result<Self, ChunkingError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| ChunkingError::GrammarUnavailable(e.to_string()))?;

        Ok(Self { parser })
    }

    /// Extract chunks, reporting malformed source to `sink` instead of failing
    ///
    /// A unit that does not parse yields no chunks and exactly one
    /// [`DiagnosticKind::Parse`] diagnostic.
    pub fn extract(
        &mut self,
        source_text: &str,
        source_id: &str,
        sink: &dyn DiagnosticsSink,
    ) -> Vec<CodeChunk> {
        match self.try_extract(source_text, source_id) {
            Ok(chunks) => chunks,
            Err(e) => {
                let message = match e {
                    ChunkingError::ParseFailed { reason, .. } => reason,
                    other => other.to_string(),
                };
                sink.report(Diagnostic::new(source_id, DiagnosticKind::Parse, message));
                Vec::new()
            }
        }
    }

    /// Extract chunks or fail with [`ChunkingError::ParseFailed`]
    pub fn try_extract(
        &mut self,
        source_text: &str,
        source_id: &str,
    ) -> Result<Vec<CodeChunk>, ChunkingError> {
        let tree = self
            .parser
            .parse(source_text, None)
            .ok_or_else(|| ChunkingError::ParseFailed {
                source_id: source_id.to_string(),
                reason: "parser produced no syntax tree".to_string(),
            })?;

        let root = tree.root_node();

        // tree-sitter recovers from errors; any recovery means the unit is not valid Python
        if root.has_error() {
            return Err(ChunkingError::ParseFailed {
                source_id: source_id.to_string(),
                reason: describe_syntax_error(root),
            });
        }

        let mut walk = ScopeWalk {
            source: source_text,
            source_id,
            class_scope: Vec::new(),
            chunks: Vec::new(),
        };
        walk.visit(root);

        tracing::debug!("Extracted {} chunks from {}", walk.chunks.len(), source_id);
        Ok(walk.chunks)
    }
}

/// Traversal state for one source unit
struct ScopeWalk<'a> {
    source: &'a str,
    source_id: &'a str,
    /// Names of the currently open classes, innermost last
    class_scope: Vec<String>,
    chunks: Vec<CodeChunk>,
}

impl ScopeWalk<'_> {
    fn visit(&mut self, node: Node) {
        match node.kind() {
            CLASS_NODE => {
                if let Some(name) = self.emit(node, ChunkKind::Class) {
                    self.class_scope.push(name);
                    self.visit_children(node);
                    self.class_scope.pop();
                    return;
                }
            }
            // `async def` is the same node with a leading `async` token
            FUNCTION_NODE => {
                self.emit(node, ChunkKind::Function);
            }
            _ => {}
        }

        self.visit_children(node);
    }

    fn visit_children(&mut self, node: Node) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child);
        }
    }

    /// Push a chunk for `node` and return its declared name
    fn emit(&mut self, node: Node, kind: ChunkKind) -> Option<String> {
        let name = node
            .child_by_field_name("name")?
            .utf8_text(self.source.as_bytes())
            .ok()?
            .to_string();

        let mut dependencies = BTreeSet::new();
        collect_calls(node, self.source, &mut dependencies);

        // Decorators sit outside the definition node but belong to it
        if let Some(parent) = node.parent()
            && parent.kind() == DECORATED_NODE
        {
            let mut cursor = parent.walk();
            for decorator in parent.children(&mut cursor) {
                if decorator.kind() == "decorator" {
                    collect_calls(decorator, self.source, &mut dependencies);
                }
            }
        }

        let end = last_code_token(node);

        let metadata = ChunkMetadata {
            source_id: self.source_id.to_string(),
            kind,
            name: name.clone(),
            line_range: LineRange::new(
                node.start_position().row + 1, // tree-sitter rows are 0-indexed
                end.end_position().row + 1,
            ),
            parent_name: self.class_scope.last().cloned(),
            dependencies,
        };

        self.chunks.push(CodeChunk {
            content: self.source[node.start_byte()..end.end_byte()].to_string(),
            metadata,
        });

        Some(name)
    }
}

/// Last token of `node` that is not a comment
///
/// tree-sitter attaches comments that trail a block to that block, so a
/// definition node can end several comment lines after its last statement.
/// The declaration itself ends at its last code token.
fn last_code_token(node: Node) -> Node {
    let mut current = node;
    loop {
        let mut cursor = current.walk();
        let last = current
            .children(&mut cursor)
            .filter(|child| child.kind() != COMMENT_NODE)
            .last();
        match last {
            Some(child) => current = child,
            None => return current,
        }
    }
}

/// Record the callee name of every call expression under `node`
///
/// `f(...)` records `f`, `obj.method(...)` records `method`. Any other callee
/// shape records nothing, though calls nested inside it are still visited.
fn collect_calls(node: Node, source: &str, names: &mut BTreeSet<String>) {
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if current.kind() == "call"
            && let Some(callee) = current.child_by_field_name("function")
        {
            // `(g)(x)` calls `g`
            let mut callee = callee;
            while callee.kind() == "parenthesized_expression"
                && let Some(inner) = callee.named_child(0)
            {
                callee = inner;
            }
            let name_node = match callee.kind() {
                "identifier" => Some(callee),
                "attribute" => callee.child_by_field_name("attribute"),
                _ => None,
            };
            if let Some(text) = name_node.and_then(|n| n.utf8_text(source.as_bytes()).ok()) {
                names.insert(text.to_string());
            }
        }

        let mut cursor = current.walk();
        stack.extend(current.children(&mut cursor));
    }
}

/// Describe the first error or missing node in document order
fn describe_syntax_error(root: Node) -> String {
    match first_error_node(root) {
        Some(node) => {
            let position = node.start_position();
            if node.is_missing() {
                format!(
                    "syntax error: missing '{}' at line {}, column {}",
                    node.kind(),
                    position.row + 1,
                    position.column + 1
                )
            } else {
                format!(
                    "syntax error at line {}, column {}",
                    position.row + 1,
                    position.column + 1
                )
            }
        }
        None => "syntax error".to_string(),
    }
}

fn first_error_node(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error()
            && let Some(found) = first_error_node(child)
        {
            return Some(found);
        }
    }
    None
}
