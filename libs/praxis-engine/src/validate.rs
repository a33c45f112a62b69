/// Static Validator - Pre-Execution Source Scan
///
/// **Core Responsibility:** Decide whether a submission is allowed to run at
/// all, before any sandbox is built. The source is parsed once and the AST is
/// walked; anything that could reach dynamic code evaluation, module loading,
/// the host environment or reflective object internals is refused with a
/// reason naming the offending token.
///
/// **Why AST and not text matching:** a substring scan cannot tell
/// `eval("...")` apart from `var evaluate = 1`. Walking the parsed tree means
/// identifiers are matched as identifiers, so legitimate code that merely
/// contains a banned spelling inside a longer name passes.
///
/// Code that fails to parse is rejected the same way: unparsable source has
/// no business reaching the interpreter.
use std::ops::ControlFlow;

use boa_engine::ast::expression::access::{PropertyAccess, PropertyAccessField};
use boa_engine::ast::expression::literal::Literal;
use boa_engine::ast::expression::{
    Call, Expression, Identifier, ImportCall, New, Optional, OptionalOperationKind,
};
use boa_engine::ast::scope::Scope;
use boa_engine::ast::visitor::{VisitWith, Visitor};
use boa_engine::interner::{Interner, Sym};
use boa_engine::parser::{Parser, Source};

/// Verdict of the pre-execution scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub ok: bool,
    /// Populated on rejection; names the offending token.
    pub reason: Option<String>,
}

impl ValidationResult {
    fn pass() -> Self {
        Self { ok: true, reason: None }
    }

    fn reject(reason: String) -> Self {
        Self {
            ok: false,
            reason: Some(reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViolationKind {
    DynamicExecution,
    ModuleImport,
    HostEnvironment,
    ReflectiveAccess,
}

#[derive(Debug, Clone)]
struct Violation {
    kind: ViolationKind,
    token: String,
}

impl Violation {
    fn new(kind: ViolationKind, token: impl Into<String>) -> Self {
        Self {
            kind,
            token: token.into(),
        }
    }

    fn reason(&self) -> String {
        match self.kind {
            ViolationKind::DynamicExecution => {
                format!("dynamic code execution is not allowed: {}", self.token)
            }
            ViolationKind::ModuleImport => {
                format!("module imports are not allowed: {}", self.token)
            }
            ViolationKind::HostEnvironment => {
                format!("host environment access is not allowed: {}", self.token)
            }
            ViolationKind::ReflectiveAccess => {
                format!("reflective property access is not allowed: {}", self.token)
            }
        }
    }
}

/// Parses and scans `code`, returning the verdict.
///
/// Deterministic: the tree is walked in source order and the first violation
/// found decides the reason.
pub fn check(code: &str) -> ValidationResult {
    let mut interner = Interner::default();
    let mut parser = Parser::new(Source::from_bytes(code));
    let script = match parser.parse_script(&Scope::new_global(), &mut interner) {
        Ok(script) => script,
        Err(err) => return ValidationResult::reject(format!("code failed to parse: {err}")),
    };

    let mut visitor = ScanVisitor {
        interner: &interner,
    };
    match visitor.visit_script(&script) {
        ControlFlow::Break(violation) => ValidationResult::reject(violation.reason()),
        ControlFlow::Continue(()) => ValidationResult::pass(),
    }
}

fn identifier_violation(name: &str) -> Option<ViolationKind> {
    match name {
        "eval" | "Function" => Some(ViolationKind::DynamicExecution),
        "require" => Some(ViolationKind::ModuleImport),
        "process" | "globalThis" | "module" | "exports" | "Reflect" | "Proxy" => {
            Some(ViolationKind::HostEnvironment)
        }
        _ if name.starts_with("__") => Some(ViolationKind::ReflectiveAccess),
        _ => None,
    }
}

fn property_violation(name: &str) -> Option<ViolationKind> {
    match name {
        "__proto__" | "constructor" | "prototype" => Some(ViolationKind::ReflectiveAccess),
        _ if name.starts_with("__") => Some(ViolationKind::ReflectiveAccess),
        _ => None,
    }
}

struct ScanVisitor<'a> {
    interner: &'a Interner,
}

impl<'a> ScanVisitor<'a> {
    fn resolve(&self, sym: Sym) -> Option<String> {
        self.interner
            .resolve(sym)
            .and_then(|s| s.utf8())
            .map(|s| s.to_string())
    }

    fn check_identifier(&self, ident: &Identifier) -> Option<Violation> {
        let name = self.resolve(ident.sym())?;
        identifier_violation(&name).map(|kind| Violation::new(kind, name))
    }

    /// Checks a property access field, covering both `obj.name` and
    /// `obj["name"]` with a literal key.
    fn check_field(&self, field: &PropertyAccessField) -> Option<Violation> {
        let name = match field {
            PropertyAccessField::Const(sym) => self.resolve(*sym)?,
            PropertyAccessField::Expr(expr) => match expr.as_ref() {
                Expression::Literal(Literal::String(sym)) => self.resolve(*sym)?,
                _ => return None,
            },
        };
        property_violation(&name).map(|kind| Violation::new(kind, name))
    }
}

impl<'ast, 'a> Visitor<'ast> for ScanVisitor<'a> {
    type BreakTy = Violation;

    fn visit_identifier(&mut self, node: &'ast Identifier) -> ControlFlow<Self::BreakTy> {
        if let Some(violation) = self.check_identifier(node) {
            return ControlFlow::Break(violation);
        }
        ControlFlow::Continue(())
    }

    fn visit_call(&mut self, node: &'ast Call) -> ControlFlow<Self::BreakTy> {
        if let Expression::Identifier(ident) = node.function() {
            if let Some(name) = self.resolve(ident.sym()) {
                if matches!(name.as_str(), "eval" | "Function") {
                    return ControlFlow::Break(Violation::new(
                        ViolationKind::DynamicExecution,
                        name,
                    ));
                }
            }
        }
        node.visit_with(self)
    }

    fn visit_new(&mut self, node: &'ast New) -> ControlFlow<Self::BreakTy> {
        if let Expression::Identifier(ident) = node.constructor() {
            if let Some(name) = self.resolve(ident.sym()) {
                if name == "Function" {
                    return ControlFlow::Break(Violation::new(
                        ViolationKind::DynamicExecution,
                        "new Function",
                    ));
                }
            }
        }
        node.visit_with(self)
    }

    fn visit_property_access(&mut self, node: &'ast PropertyAccess) -> ControlFlow<Self::BreakTy> {
        if let PropertyAccess::Simple(access) = node {
            if let Some(violation) = self.check_field(access.field()) {
                return ControlFlow::Break(violation);
            }
        }
        node.visit_with(self)
    }

    // Optional chains carry their property names in the chain operations, not
    // in PropertyAccess nodes, so `a?.constructor` needs its own hook.
    fn visit_optional(&mut self, node: &'ast Optional) -> ControlFlow<Self::BreakTy> {
        for op in node.chain() {
            if let OptionalOperationKind::SimplePropertyAccess { field } = op.kind() {
                if let Some(violation) = self.check_field(field) {
                    return ControlFlow::Break(violation);
                }
            }
        }
        node.visit_with(self)
    }

    fn visit_import_call(&mut self, _node: &'ast ImportCall) -> ControlFlow<Self::BreakTy> {
        ControlFlow::Break(Violation::new(ViolationKind::ModuleImport, "import()"))
    }
}
