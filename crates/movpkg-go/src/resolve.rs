//! Lexical name resolution for Go source files.
//!
//! Walks a tree-sitter-go syntax tree with Go's block structure and records,
//! for every identifier in use position, what it denotes. The result is a
//! [`FileTable`] per file, grouped per package in a [`ResolutionTable`].
//!
//! Resolution order for a bare name: enclosing blocks (innermost first), the
//! package block (declarations from every file of the package), the file
//! block (imports), then dot-imported packages. Names that resolve nowhere
//! (predeclared identifiers, or code that does not compile) are not recorded.
//!
//! Declarations become visible where Go says they do: `x := Foo{}` followed by
//! `Foo := 1` still refers to the type in the first statement.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use movpkg_core::patch::Span;
use tree_sitter::Node;

// ============================================================================
// Resolution Facts
// ============================================================================

/// Kind of a package-level declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Type,
    Func,
    Var,
    Const,
}

/// A package-level declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    /// Import path of the declaring package.
    pub package: String,
    /// Declared name.
    pub name: String,
    pub kind: DeclKind,
    /// Absolute path of the declaring file.
    pub file: PathBuf,
    /// Span of the name in the declaring file.
    pub span: Span,
}

/// What an identifier denotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    /// A package-level declaration of a loaded package.
    Decl {
        package: String,
        name: String,
        kind: DeclKind,
    },
    /// A member of a package whose declarations were not loaded.
    External { package: String, name: String },
    /// An imported package name.
    PackageName { path: String },
    /// A binding local to a function or type declaration.
    Local,
}

impl Entity {
    /// Whether this is a type declared in `package`.
    pub fn is_type_in(&self, package: &str) -> bool {
        matches!(self, Entity::Decl { package: p, kind: DeclKind::Type, .. } if p == package)
    }

    /// The import path, for package names.
    pub fn imported_path(&self) -> Option<&str> {
        match self {
            Entity::PackageName { path } => Some(path),
            _ => None,
        }
    }
}

/// Syntactic position of a use that affects how it may be rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UseRole {
    #[default]
    Plain,
    /// Base type of a method receiver.
    Receiver,
    /// Type of an embedded (anonymous) struct field.
    Embedded,
}

/// One identifier occurrence and what it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentUse {
    pub span: Span,
    pub name: String,
    pub entity: Entity,
    pub role: UseRole,
}

/// A `pkg.Name` occurrence whose qualifier resolved to an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorUse {
    /// Span of the whole selector.
    pub span: Span,
    pub qualifier: IdentUse,
    pub member: IdentUse,
}

/// How an import spec binds its package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// `import "p"`: bound under the package's own name.
    Default,
    /// `import x "p"`.
    Named,
    /// `import . "p"`.
    Dot,
    /// `import _ "p"`.
    Blank,
}

/// An import spec of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub path: String,
    /// Name the package is visible under (`.` and `_` for dot and blank imports).
    pub local: String,
    pub kind: ImportKind,
    /// Span of the import spec.
    pub span: Span,
}

impl ImportBinding {
    /// Whether the binding introduces a usable qualifier.
    pub fn is_qualifier(&self) -> bool {
        matches!(self.kind, ImportKind::Default | ImportKind::Named)
    }
}

/// A local name and the byte range where it is in scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalBinding {
    pub name: String,
    pub visible: Span,
}

/// Resolution facts for one file.
#[derive(Debug, Clone, Default)]
pub struct FileTable {
    /// Bare identifier uses, in source order.
    pub idents: Vec<IdentUse>,
    /// Package-qualified uses, in source order.
    pub selectors: Vec<SelectorUse>,
    pub imports: Vec<ImportBinding>,
    pub locals: Vec<LocalBinding>,
}

impl FileTable {
    /// Whether a local binding named `name` is in scope at `offset`.
    pub fn is_shadowed(&self, name: &str, offset: u64) -> bool {
        self.locals
            .iter()
            .any(|l| l.name == name && l.visible.contains_offset(offset))
    }

    /// Qualifier imports of `path`.
    pub fn qualifier_imports<'t>(&'t self, path: &'t str) -> impl Iterator<Item = &'t ImportBinding> {
        self.imports
            .iter()
            .filter(move |b| b.path == path && b.is_qualifier())
    }
}

/// Resolution facts for one package (variant).
#[derive(Debug, Clone, Default)]
pub struct ResolutionTable {
    /// Import path of the package.
    pub package: String,
    /// Package-level declarations, across all files.
    pub defs: Vec<Definition>,
    /// Per-file facts, keyed by absolute path.
    pub files: BTreeMap<PathBuf, FileTable>,
}

impl ResolutionTable {
    /// Facts for one file of this package.
    pub fn file(&self, path: &Path) -> Option<&FileTable> {
        self.files.get(path)
    }

    /// Whether the package declares `name` at package level.
    pub fn declares(&self, name: &str) -> bool {
        self.defs.iter().any(|d| d.name == name)
    }
}

// ============================================================================
// Package Scopes
// ============================================================================

/// The package block of one package: its name and declarations.
#[derive(Debug, Clone, Default)]
pub struct PackageScope {
    pub path: String,
    pub name: String,
    pub decls: HashMap<String, DeclKind>,
}

impl PackageScope {
    /// Build the package block from its definitions.
    pub fn new(path: impl Into<String>, name: impl Into<String>, defs: &[Definition]) -> Self {
        PackageScope {
            path: path.into(),
            name: name.into(),
            decls: defs.iter().map(|d| (d.name.clone(), d.kind)).collect(),
        }
    }
}

/// Package blocks of every loaded package, by import path.
#[derive(Debug, Clone, Default)]
pub struct PackageIndex {
    packages: HashMap<String, PackageScope>,
}

impl PackageIndex {
    /// Register a package block, replacing any previous one for the same path.
    pub fn insert(&mut self, scope: PackageScope) {
        self.packages.insert(scope.path.clone(), scope);
    }

    pub fn get(&self, path: &str) -> Option<&PackageScope> {
        self.packages.get(path)
    }
}

// ============================================================================
// Declaration and Import Collection
// ============================================================================

/// Name from the file's package clause.
pub fn package_name(root: Node<'_>, src: &str) -> Option<String> {
    let clause = named_children(root)
        .into_iter()
        .find(|n| n.kind() == "package_clause")?;
    let ident = named_children(clause)
        .into_iter()
        .find(|n| n.kind() == "package_identifier")?;
    Some(node_text(ident, src).to_string())
}

/// Package-level declarations of one file.
pub fn collect_definitions(root: Node<'_>, src: &str, package: &str, file: &Path) -> Vec<Definition> {
    let mut defs = Vec::new();
    let mut push = |name: Node<'_>, kind: DeclKind| {
        let text = node_text(name, src);
        if text == "_" || text.is_empty() || (kind == DeclKind::Func && text == "init") {
            return;
        }
        defs.push(Definition {
            package: package.to_string(),
            name: text.to_string(),
            kind,
            file: file.to_path_buf(),
            span: Span::from_range(name.byte_range()),
        });
    };

    for decl in named_children(root) {
        match decl.kind() {
            "function_declaration" => {
                if let Some(name) = decl.child_by_field_name("name") {
                    push(name, DeclKind::Func);
                }
            }
            "type_declaration" => {
                for spec in specs_of(decl, &["type_spec", "type_alias"]) {
                    if let Some(name) = spec.child_by_field_name("name") {
                        push(name, DeclKind::Type);
                    }
                }
            }
            "var_declaration" | "const_declaration" => {
                let (spec_kind, kind) = if decl.kind() == "var_declaration" {
                    ("var_spec", DeclKind::Var)
                } else {
                    ("const_spec", DeclKind::Const)
                };
                for spec in specs_of(decl, &[spec_kind]) {
                    for name in field_children(spec, "name") {
                        push(name, kind);
                    }
                }
            }
            _ => {}
        }
    }

    defs
}

/// Import specs of one file. Default names come from the imported package
/// when it is in `index`, else from the import path.
pub fn collect_imports(root: Node<'_>, src: &str, index: &PackageIndex) -> Vec<ImportBinding> {
    let mut imports = Vec::new();
    for decl in named_children(root) {
        if decl.kind() != "import_declaration" {
            continue;
        }
        for spec in specs_of(decl, &["import_spec"]) {
            let Some(path_node) = spec.child_by_field_name("path") else {
                continue;
            };
            let path = unquote(node_text(path_node, src));
            let (kind, local) = match spec.child_by_field_name("name") {
                Some(n) if n.kind() == "dot" => (ImportKind::Dot, ".".to_string()),
                Some(n) if n.kind() == "blank_identifier" => (ImportKind::Blank, "_".to_string()),
                Some(n) => (ImportKind::Named, node_text(n, src).to_string()),
                None => (
                    ImportKind::Default,
                    index
                        .get(&path)
                        .map(|p| p.name.clone())
                        .unwrap_or_else(|| assumed_package_name(&path)),
                ),
            };
            imports.push(ImportBinding {
                path,
                local,
                kind,
                span: Span::from_range(spec.byte_range()),
            });
        }
    }
    imports
}

/// Resolve every identifier use in one file.
pub fn resolve_file(
    root: Node<'_>,
    src: &str,
    scope: &PackageScope,
    index: &PackageIndex,
    imports: Vec<ImportBinding>,
) -> FileTable {
    let mut resolver = Resolver {
        src,
        scope,
        index,
        imports: &imports,
        blocks: Vec::new(),
        role: UseRole::Plain,
        table: FileTable::default(),
    };
    resolver.visit_children(root);
    let mut table = resolver.table;
    table.imports = imports;
    table
}

// ============================================================================
// Resolver
// ============================================================================

struct Block {
    names: HashSet<String>,
    end: usize,
}

struct Resolver<'a> {
    src: &'a str,
    scope: &'a PackageScope,
    index: &'a PackageIndex,
    imports: &'a [ImportBinding],
    blocks: Vec<Block>,
    role: UseRole,
    table: FileTable,
}

impl<'a> Resolver<'a> {
    fn text(&self, node: Node<'_>) -> &'a str {
        node_text(node, self.src)
    }

    fn lookup(&self, name: &str) -> Option<Entity> {
        if self.blocks.iter().rev().any(|b| b.names.contains(name)) {
            return Some(Entity::Local);
        }
        if let Some(kind) = self.scope.decls.get(name) {
            return Some(Entity::Decl {
                package: self.scope.path.clone(),
                name: name.to_string(),
                kind: *kind,
            });
        }
        if let Some(binding) = self
            .imports
            .iter()
            .find(|b| b.is_qualifier() && b.local == name)
        {
            return Some(Entity::PackageName {
                path: binding.path.clone(),
            });
        }
        if !is_exported(name) {
            return None;
        }
        self.imports
            .iter()
            .filter(|b| b.kind == ImportKind::Dot)
            .find_map(|b| {
                let kind = self.index.get(&b.path)?.decls.get(name)?;
                Some(Entity::Decl {
                    package: b.path.clone(),
                    name: name.to_string(),
                    kind: *kind,
                })
            })
    }

    fn member(&self, path: &str, name: &str) -> Entity {
        match self.index.get(path).and_then(|p| p.decls.get(name)) {
            Some(kind) => Entity::Decl {
                package: path.to_string(),
                name: name.to_string(),
                kind: *kind,
            },
            None => Entity::External {
                package: path.to_string(),
                name: name.to_string(),
            },
        }
    }

    fn push_block(&mut self, end: usize) {
        self.blocks.push(Block {
            names: HashSet::new(),
            end,
        });
    }

    fn pop_block(&mut self) {
        self.blocks.pop();
    }

    /// Bind `name` in the innermost block from `from` to the block's end.
    fn declare(&mut self, name: &str, from: usize) {
        if name == "_" || name.is_empty() {
            return;
        }
        let Some(block) = self.blocks.last_mut() else {
            return;
        };
        block.names.insert(name.to_string());
        let end = block.end.max(from);
        self.table.locals.push(LocalBinding {
            name: name.to_string(),
            visible: Span::new(from as u64, end as u64),
        });
    }

    fn declare_identifiers_in(&mut self, node: Node<'_>, from: usize) {
        match node.kind() {
            "identifier" | "type_identifier" => {
                let name = self.text(node);
                self.declare(name, from);
            }
            _ => {
                for child in named_children(node) {
                    self.declare_identifiers_in(child, from);
                }
            }
        }
    }

    fn with_role(&mut self, role: UseRole, f: impl FnOnce(&mut Self)) {
        let saved = self.role;
        self.role = role;
        f(self);
        self.role = saved;
    }

    fn record(&mut self, node: Node<'_>) {
        let name = self.text(node);
        if let Some(entity) = self.lookup(name) {
            self.table.idents.push(IdentUse {
                span: Span::from_range(node.byte_range()),
                name: name.to_string(),
                entity,
                role: self.role,
            });
        }
    }

    /// Record `qualifier.member` if the qualifier names an import.
    fn record_qualified(&mut self, node: Node<'_>, qualifier: Node<'_>, member: Node<'_>) -> bool {
        let qualifier_name = self.text(qualifier);
        let Some(Entity::PackageName { path }) = self.lookup(qualifier_name) else {
            return false;
        };
        let member_name = self.text(member);
        let member_entity = self.member(&path, member_name);
        self.table.selectors.push(SelectorUse {
            span: Span::from_range(node.byte_range()),
            qualifier: IdentUse {
                span: Span::from_range(qualifier.byte_range()),
                name: qualifier_name.to_string(),
                entity: Entity::PackageName { path },
                role: self.role,
            },
            member: IdentUse {
                span: Span::from_range(member.byte_range()),
                name: member_name.to_string(),
                entity: member_entity,
                role: self.role,
            },
        });
        true
    }

    fn visit_children(&mut self, node: Node<'_>) {
        for child in named_children(node) {
            self.visit(child);
        }
    }

    fn visit_fields(&mut self, node: Node<'_>, field: &str) {
        for child in field_children(node, field) {
            self.visit(child);
        }
    }

    fn visit(&mut self, node: Node<'_>) {
        match node.kind() {
            "package_clause" | "import_declaration" | "comment" => {}
            "field_identifier" | "package_identifier" | "label_name" | "blank_identifier" => {}
            "identifier" | "type_identifier" => self.record(node),
            "qualified_type" => {
                if let (Some(pkg), Some(name)) = (
                    node.child_by_field_name("package"),
                    node.child_by_field_name("name"),
                ) {
                    self.record_qualified(node, pkg, name);
                }
            }
            "selector_expression" => self.visit_selector(node),
            "function_declaration" | "method_declaration" | "func_literal" => {
                self.visit_function(node)
            }
            "block" | "if_statement" | "for_statement" | "expression_switch_statement"
            | "select_statement" | "expression_case" | "default_case" | "communication_case" => {
                self.push_block(node.end_byte());
                self.visit_children(node);
                self.pop_block();
            }
            "type_switch_statement" => self.visit_type_switch(node),
            "short_var_declaration" => self.visit_short_var(node),
            "range_clause" | "receive_statement" => self.visit_define_clause(node),
            "var_spec" | "const_spec" => self.visit_value_spec(node),
            "type_spec" | "type_alias" => self.visit_type_spec(node),
            "type_parameter_list" => self.visit_type_params(node),
            "parameter_declaration" | "variadic_parameter_declaration" => {
                self.visit_fields(node, "type")
            }
            "field_declaration" => self.visit_field_declaration(node),
            "keyed_element" => self.visit_keyed_element(node),
            _ => self.visit_children(node),
        }
    }

    fn visit_selector(&mut self, node: Node<'_>) {
        let operand = node.child_by_field_name("operand");
        let field = node.child_by_field_name("field");
        if let (Some(operand), Some(field)) = (operand, field) {
            if operand.kind() == "identifier" && self.record_qualified(node, operand, field) {
                return;
            }
            self.visit(operand);
        }
    }

    fn visit_function(&mut self, node: Node<'_>) {
        self.push_block(node.end_byte());

        if let Some(receiver) = node.child_by_field_name("receiver") {
            for decl in named_children(receiver) {
                if let Some(ty) = decl.child_by_field_name("type") {
                    self.visit_receiver_type(ty);
                }
            }
        }
        if let Some(type_params) = node.child_by_field_name("type_parameters") {
            self.visit_type_params(type_params);
        }
        if let Some(params) = node.child_by_field_name("parameters") {
            self.visit(params);
        }
        if let Some(result) = node.child_by_field_name("result") {
            self.visit(result);
        }

        let body = node.child_by_field_name("body");
        let from = body.map_or(node.end_byte(), |b| b.start_byte());
        for field in ["receiver", "parameters", "result"] {
            let Some(list) = node.child_by_field_name(field) else {
                continue;
            };
            if list.kind() != "parameter_list" {
                continue;
            }
            for decl in named_children(list) {
                for name in field_children(decl, "name") {
                    let name = self.text(name);
                    self.declare(name, from);
                }
            }
        }

        if let Some(body) = body {
            self.visit(body);
        }
        self.pop_block();
    }

    fn visit_receiver_type(&mut self, ty: Node<'_>) {
        match ty.kind() {
            "pointer_type" | "parenthesized_type" => {
                for child in named_children(ty) {
                    self.visit_receiver_type(child);
                }
            }
            "generic_type" => {
                if let Some(base) = ty.child_by_field_name("type") {
                    self.visit_receiver_type(base);
                }
                // `func (l *List[T])` declares T.
                if let Some(args) = ty.child_by_field_name("type_arguments") {
                    self.declare_identifiers_in(args, ty.start_byte());
                }
            }
            "type_identifier" => self.with_role(UseRole::Receiver, |r| r.record(ty)),
            _ => self.visit(ty),
        }
    }

    fn visit_type_params(&mut self, list: Node<'_>) {
        let decls = named_children(list);
        for decl in &decls {
            for name in field_children(*decl, "name") {
                let name = self.text(name);
                self.declare(name, list.start_byte());
            }
        }
        for decl in decls {
            self.visit_fields(decl, "type");
        }
    }

    fn visit_type_spec(&mut self, node: Node<'_>) {
        if !self.blocks.is_empty() {
            if let Some(name) = node.child_by_field_name("name") {
                let text = self.text(name);
                self.declare(text, name.start_byte());
            }
        }
        self.push_block(node.end_byte());
        if let Some(type_params) = node.child_by_field_name("type_parameters") {
            self.visit_type_params(type_params);
        }
        self.visit_fields(node, "type");
        self.pop_block();
    }

    fn visit_value_spec(&mut self, node: Node<'_>) {
        self.visit_fields(node, "type");
        self.visit_fields(node, "value");
        if !self.blocks.is_empty() {
            for name in field_children(node, "name") {
                let text = self.text(name);
                self.declare(text, node.end_byte());
            }
        }
    }

    fn visit_short_var(&mut self, node: Node<'_>) {
        self.visit_fields(node, "right");
        if let Some(left) = node.child_by_field_name("left") {
            self.declare_identifiers_in(left, node.end_byte());
        }
    }

    fn visit_define_clause(&mut self, node: Node<'_>) {
        if !has_token(node, ":=") {
            self.visit_children(node);
            return;
        }
        self.visit_fields(node, "right");
        if let Some(left) = node.child_by_field_name("left") {
            self.declare_identifiers_in(left, node.end_byte());
        }
    }

    fn visit_type_switch(&mut self, node: Node<'_>) {
        self.push_block(node.end_byte());
        self.visit_fields(node, "initializer");
        self.visit_fields(node, "value");

        let aliases: Vec<&'a str> = node
            .child_by_field_name("alias")
            .map(|list| {
                named_children(list)
                    .into_iter()
                    .filter(|n| n.kind() == "identifier")
                    .map(|n| self.text(n))
                    .collect()
            })
            .unwrap_or_default();

        for clause in named_children(node) {
            if !matches!(clause.kind(), "type_case" | "default_case") {
                continue;
            }
            self.push_block(clause.end_byte());
            let parts = children_with_fields(clause);
            let mut body_start = clause.start_byte();
            for (field, child) in &parts {
                if *field == Some("type") {
                    self.visit(*child);
                    body_start = body_start.max(child.end_byte());
                }
            }
            for alias in &aliases {
                self.declare(alias, body_start);
            }
            for (field, child) in &parts {
                if *field != Some("type") && child.is_named() {
                    self.visit(*child);
                }
            }
            self.pop_block();
        }

        self.pop_block();
    }

    fn visit_field_declaration(&mut self, node: Node<'_>) {
        let Some(ty) = node.child_by_field_name("type") else {
            return;
        };
        if node.child_by_field_name("name").is_some() {
            self.visit(ty);
        } else {
            self.visit_embedded(ty);
        }
    }

    fn visit_embedded(&mut self, ty: Node<'_>) {
        match ty.kind() {
            "type_identifier" | "qualified_type" => {
                self.with_role(UseRole::Embedded, |r| r.visit(ty))
            }
            "generic_type" => {
                if let Some(base) = ty.child_by_field_name("type") {
                    self.with_role(UseRole::Embedded, |r| r.visit(base));
                }
                self.visit_fields(ty, "type_arguments");
            }
            "pointer_type" => {
                for child in named_children(ty) {
                    self.visit_embedded(child);
                }
            }
            _ => self.visit(ty),
        }
    }

    fn visit_keyed_element(&mut self, node: Node<'_>) {
        let children = named_children(node);
        let Some((key, rest)) = children.split_first() else {
            return;
        };
        let key = if key.kind() == "literal_element" {
            key.named_child(0).unwrap_or(*key)
        } else {
            *key
        };
        // Bare keys name struct fields.
        if !matches!(key.kind(), "identifier" | "field_identifier") {
            self.visit(key);
        }
        for child in rest {
            self.visit(*child);
        }
    }
}

// ============================================================================
// Tree and Name Helpers
// ============================================================================

pub(crate) fn node_text<'s>(node: Node<'_>, src: &'s str) -> &'s str {
    node.utf8_text(src.as_bytes()).unwrap_or("")
}

pub(crate) fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn field_children<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

fn children_with_fields(node: Node<'_>) -> Vec<(Option<&'static str>, Node<'_>)> {
    let mut cursor = node.walk();
    let mut out = Vec::new();
    if cursor.goto_first_child() {
        loop {
            out.push((cursor.field_name(), cursor.node()));
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    out
}

fn has_token(node: Node<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == token);
    found
}

/// Direct children of `node` with one of `kinds`, looking through `*_list` wrappers.
pub(crate) fn specs_of<'t>(node: Node<'t>, kinds: &[&str]) -> Vec<Node<'t>> {
    let mut out = Vec::new();
    for child in named_children(node) {
        if kinds.contains(&child.kind()) {
            out.push(child);
        } else if child.kind().ends_with("_list") {
            out.extend(specs_of(child, kinds));
        }
    }
    out
}

/// Strip the quotes of an interpreted or raw string literal.
pub fn unquote(literal: &str) -> String {
    literal
        .trim()
        .trim_start_matches(['"', '`'])
        .trim_end_matches(['"', '`'])
        .to_string()
}

/// The name an import is bound under when the package itself is not known:
/// the last path element, skipping a `vN` major-version suffix, without a
/// `go-` prefix, cut at the first character that cannot appear in an identifier.
pub fn assumed_package_name(import_path: &str) -> String {
    let mut elems = import_path.rsplit('/');
    let mut base = elems.next().unwrap_or(import_path);
    if is_major_version(base) {
        if let Some(parent) = elems.next() {
            base = parent;
        }
    }
    let base = base.strip_prefix("go-").unwrap_or(base);
    let end = base
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
        .map_or(base.len(), |(i, _)| i);
    base[..end].to_string()
}

fn is_major_version(elem: &str) -> bool {
    elem.strip_prefix('v')
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

const KEYWORDS: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "for", "func", "go", "goto", "if", "import", "interface", "map", "package", "range", "return",
    "select", "struct", "switch", "type", "var",
];

/// Whether `s` is a valid Go identifier (and not a keyword).
pub fn is_go_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
        && !KEYWORDS.contains(&s)
}

/// Whether a Go name is exported.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

// ============================================================================
// Tests
// ============================================================================
