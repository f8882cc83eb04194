use std::collections::HashMap;

use log::debug;

use crate::compiler::ast::{DataType, PassMode, ScalarKind};
use crate::compiler::error::{CompileError, ErrorKind};
use crate::compiler::runtime;
use crate::compiler::source::{Position, Span};

use super::error::SemanticError;

/// Failures of the table's own discipline, as opposed to ill-typed source.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolTableError {
    CloseOnEmpty,
    MissingEntry(String),
    LingeringEntries(String),
}

impl std::fmt::Display for SymbolTableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SymbolTableError::CloseOnEmpty => {
                f.write_str("attempted to close an empty symbol table")
            }
            SymbolTableError::MissingEntry(id) => {
                write!(f, "no entry for known identifier {}", id)
            }
            SymbolTableError::LingeringEntries(names) => {
                write!(f, "lingering entries at program end: {}", names)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefStatus {
    Declared,
    Defined,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarEntry {
    pub name: String,
    pub ty: DataType,
    pub offset: usize,
    pub parent_path: Vec<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamEntry {
    pub name: String,
    pub ty: DataType,
    pub mode: PassMode,
    pub offset: usize,
    pub parent_path: Vec<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionEntry {
    pub name: String,
    pub params: Vec<(String, DataType, PassMode)>,
    pub ret: ScalarKind,
    pub status: DefStatus,
    pub parent_path: Vec<String>,
    pub runtime: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Variable(VarEntry),
    Parameter(ParamEntry),
    Function(FunctionEntry),
}

impl Entry {
    pub fn name(&self) -> &str {
        match self {
            Entry::Variable(v) => &v.name,
            Entry::Parameter(p) => &p.name,
            Entry::Function(fe) => &fe.name,
        }
    }
}

/// One lexical scope: the entries defined directly inside a function
/// header/body, in insertion order, with a fast name index.
#[derive(Debug)]
struct Scope {
    owner: String,
    owner_ret: ScalarKind,
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
    /// The next frame slot to hand out to a parameter or variable.
    next_offset: usize,
}

impl Scope {
    fn new(owner: String, owner_ret: ScalarKind, first_offset: usize) -> Scope {
        Scope {
            owner,
            owner_ret,
            entries: vec![],
            index: HashMap::new(),
            next_offset: first_offset,
        }
    }

    fn get(&self, id: &str) -> Option<&Entry> {
        self.index.get(id).map(|i| &self.entries[*i])
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Entry> {
        match self.index.get(id) {
            Some(i) => self.entries.get_mut(*i),
            None => None,
        }
    }

    fn push(&mut self, entry: Entry) {
        self.index.insert(entry.name().to_string(), self.entries.len());
        self.entries.push(entry);
    }
}

/// The stack of lexical scopes threaded through parsing and semantic
/// analysis.  The bottom scope holds the runtime library and, once parsed,
/// the program function; every other scope belongs to a function currently
/// being analyzed.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    /// Ids of the functions whose scopes are currently open, outermost
    /// first.  Its length is the current nesting depth.
    path: Vec<String>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        let mut global = Scope::new(String::new(), ScalarKind::Nothing, 0);
        let builtin_span = Span::new(Position::new(0, 0), Position::new(0, 0));
        for rf in runtime::catalog() {
            global.push(Entry::Function(FunctionEntry {
                name: rf.name.to_string(),
                params: rf
                    .params
                    .iter()
                    .map(|(n, ty, mode)| (n.to_string(), ty.clone(), *mode))
                    .collect(),
                ret: rf.ret,
                status: DefStatus::Defined,
                parent_path: vec![],
                runtime: true,
                span: builtin_span,
            }));
        }
        SymbolTable {
            scopes: vec![global],
            path: vec![],
        }
    }

    /// The enclosing-function chain at the current point of analysis,
    /// outermost first.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Return type of the function whose scope is innermost.
    pub fn current_return(&self) -> Result<ScalarKind, CompileError> {
        if self.scopes.len() < 2 {
            return Err(CompileError::internal(
                "return statement outside of any function scope",
            ));
        }
        Ok(self.scopes[self.scopes.len() - 1].owner_ret)
    }

    /// Push a fresh scope for the named function.  Slot 0 of a nested
    /// function's frame is its static link, so its parameters start at 1.
    pub fn open_scope(&mut self, func_id: &str, ret: ScalarKind) {
        debug!("open scope for {}", func_id);
        let first_offset = if self.path.is_empty() { 0 } else { 1 };
        self.path.push(func_id.to_string());
        self.scopes
            .push(Scope::new(func_id.to_string(), ret, first_offset));
    }

    /// Pop the innermost scope, verifying that every function declared in
    /// it was also defined before the scope ends.
    pub fn close_scope(&mut self, span: Span) -> Result<(), CompileError> {
        if self.scopes.len() <= 1 {
            return Err(CompileError::new(
                span,
                ErrorKind::SymbolTable(SymbolTableError::CloseOnEmpty),
            ));
        }
        let scope = self.scopes.pop().expect("scope count checked above");
        debug!("close scope for {}", scope.owner);
        self.path.pop();

        for entry in &scope.entries {
            if let Entry::Function(fe) = entry {
                if fe.status == DefStatus::Declared {
                    return Err(CompileError::new(
                        fe.span,
                        ErrorKind::Semantic(SemanticError::DeclaredNotDefined(fe.name.clone())),
                    ));
                }
            }
        }
        Ok(())
    }

    fn top(&mut self) -> &mut Scope {
        self.scopes.last_mut().expect("table always has a scope")
    }

    fn check_collision(&mut self, span: Span, name: &str) -> Result<(), CompileError> {
        if self.top().get(name).is_some() {
            return Err(CompileError::new(
                span,
                ErrorKind::Semantic(SemanticError::Redefinition(name.to_string())),
            ));
        }
        Ok(())
    }

    /// Insert a variable into the current scope, assigning it the next
    /// frame slot.  Returns the slot index.
    pub fn insert_var(
        &mut self,
        span: Span,
        name: &str,
        ty: DataType,
    ) -> Result<usize, CompileError> {
        self.check_collision(span, name)?;
        let parent_path = self.path.clone();
        let scope = self.top();
        let offset = scope.next_offset;
        scope.next_offset += 1;
        scope.push(Entry::Variable(VarEntry {
            name: name.to_string(),
            ty,
            offset,
            parent_path,
            span,
        }));
        Ok(offset)
    }

    /// Insert a parameter into the current scope, assigning it the next
    /// frame slot.  Returns the slot index.
    pub fn insert_param(
        &mut self,
        span: Span,
        name: &str,
        ty: DataType,
        mode: PassMode,
    ) -> Result<usize, CompileError> {
        self.check_collision(span, name)?;
        let parent_path = self.path.clone();
        let scope = self.top();
        let offset = scope.next_offset;
        scope.next_offset += 1;
        scope.push(Entry::Parameter(ParamEntry {
            name: name.to_string(),
            ty,
            mode,
            offset,
            parent_path,
            span,
        }));
        Ok(offset)
    }

    /// Insert a function entity into the current scope.  The entity's
    /// parent path is the chain of scopes open at insertion time, which is
    /// why this happens before `open_scope` is called for its own scope.
    pub fn insert_function(
        &mut self,
        span: Span,
        name: &str,
        params: Vec<(String, DataType, PassMode)>,
        ret: ScalarKind,
        status: DefStatus,
    ) -> Result<(), CompileError> {
        self.check_collision(span, name)?;
        let parent_path = self.path.clone();
        self.top().push(Entry::Function(FunctionEntry {
            name: name.to_string(),
            params,
            ret,
            status,
            parent_path,
            runtime: false,
            span,
        }));
        Ok(())
    }

    /// Flip a declared function in the current scope to defined.
    pub fn mark_defined(&mut self, span: Span, name: &str) -> Result<(), CompileError> {
        match self.top().get_mut(name) {
            Some(Entry::Function(fe)) => {
                fe.status = DefStatus::Defined;
                Ok(())
            }
            _ => Err(CompileError::new(
                span,
                ErrorKind::SymbolTable(SymbolTableError::MissingEntry(name.to_string())),
            )),
        }
    }

    /// Current-scope-only lookup; used to detect redefinitions and to merge
    /// a definition with its forward declaration.
    pub fn lookup(&self, id: &str) -> Option<&Entry> {
        self.scopes.last().and_then(|s| s.get(id))
    }

    /// Walk the scope chain innermost-out to resolve a use.
    pub fn lookup_all(&self, id: &str) -> Option<&Entry> {
        self.scopes.iter().rev().find_map(|s| s.get(id))
    }

    /// End-of-program verification: every scope but the global one must be
    /// closed, and the global scope may hold nothing except the runtime
    /// library and the defined program function.
    pub fn finalize(&mut self, span: Span) -> Result<(), CompileError> {
        if self.scopes.len() != 1 {
            return Err(CompileError::internal(format!(
                "{} scopes left open at end of program",
                self.scopes.len() - 1
            )));
        }

        let mut stray = vec![];
        for entry in &self.scopes[0].entries {
            match entry {
                Entry::Variable(v) => stray.push(v.name.clone()),
                Entry::Parameter(p) => stray.push(p.name.clone()),
                Entry::Function(fe) => {
                    if !fe.runtime && fe.status != DefStatus::Defined {
                        stray.push(fe.name.clone());
                    }
                }
            }
        }

        if !stray.is_empty() {
            return Err(CompileError::new(
                span,
                ErrorKind::SymbolTable(SymbolTableError::LingeringEntries(stray.join(", "))),
            ));
        }
        Ok(())
    }
}
