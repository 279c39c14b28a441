//! Declaration and reference extraction for a single file.
//!
//! A structural scan over the token stream, not a grammar: declaration
//! keywords open declarations, brace depth closes them, and every other
//! identifier is a candidate reference.
//!
//! ## Spans
//!
//! - Start: the first attribute or modifier preceding the keyword
//!   (`@MainActor public final class` starts at `@MainActor`)
//! - End: the line of the matching `}` for declarations with a body, or the
//!   last header token for bodiless ones (`let`, protocol requirements,
//!   enum cases)
//!
//! Nested declarations get their own spans inside the outer one; `depth`
//! and `container` record the nesting.
//!
//! ## Scope rules
//!
//! | Keyword | Recognized in |
//! |---------|---------------|
//! | `class`, `struct`, `enum`, `protocol`, `extension`, `actor`, `func`, `init`, `typealias` | any scope |
//! | `var`, `let` | file and type bodies (locals are not tracked) |
//! | `case` | directly inside an `enum` body |

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::conformance::resolve_conformances;
use super::keywords::{declaration_kind, is_modifier, is_stopword, starts_member};
use super::lexer::{tokenize, Token, TokenKind};
use crate::error::{ExtractionWarning, ExtractionWarningKind};
use crate::types::{ConformanceEdge, SymbolDeclaration, SymbolKind, SymbolReference};

/// Everything extracted from one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileExtraction {
    /// Declarations in source order
    pub declarations: Vec<SymbolDeclaration>,
    /// References in source order, unique per (line, name)
    pub references: Vec<SymbolReference>,
    /// Direct conformance edges declared in this file
    pub conformances: Vec<ConformanceEdge>,
    /// Non-fatal problems; the extraction above is partial when non-empty
    pub warnings: Vec<ExtractionWarning>,
}

/// Extract declarations, references, and conformances from one file.
///
/// `path` is recorded on every output item and should be relative to the
/// project root. Never fails: malformed input yields a partial result plus
/// warnings.
#[must_use]
pub fn extract(path: &Path, source: &str) -> FileExtraction {
    let lexed = tokenize(source);
    let mut extractor = Extractor::new(path, source, &lexed.tokens);
    extractor.run();

    let mut out = extractor.finish();
    for problem in lexed.problems {
        out.warnings.push(ExtractionWarning::new(
            path.to_path_buf(),
            ExtractionWarningKind::UnterminatedLiteral,
            Some(problem.line),
            problem.message,
        ));
    }
    out.warnings.sort_by_key(|w| w.line);
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    File,
    Type(SymbolKind),
    /// Function bodies, accessors, closures, control flow
    Code,
}

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    /// Declaration whose body this scope is
    decl: Option<usize>,
    /// Unclosed `(` and `[` opened in this scope, innermost last
    brackets: Vec<char>,
}

impl Scope {
    fn new(kind: ScopeKind, decl: Option<usize>) -> Self {
        Self {
            kind,
            decl,
            brackets: Vec::new(),
        }
    }

    /// Whether any `(` or `[` is still open.
    fn nested(&self) -> bool {
        !self.brackets.is_empty()
    }

    /// Whether the innermost open bracket is `(`, where `name:` is a label.
    fn in_parens(&self) -> bool {
        self.brackets.last() == Some(&'(')
    }
}

/// A declaration whose header is still being read.
#[derive(Debug)]
struct Pending {
    /// Declarations sharing this header (several for `case a, b, c`)
    decls: Vec<usize>,
    kind: SymbolKind,
    /// Byte offset of the introducing keyword
    header_offset: usize,
    /// Line of the last token that belonged to the header
    last_line: u32,
    /// Scope stack height when the header started
    scope_depth: usize,
    /// Set after a `case` comma while the next name is expected
    expect_case_name: bool,
}

struct Extractor<'s, 't> {
    path: PathBuf,
    source: &'s str,
    tokens: &'t [Token<'s>],
    scopes: Vec<Scope>,
    pending: Option<Pending>,
    declarations: Vec<SymbolDeclaration>,
    references: Vec<SymbolReference>,
    seen_refs: HashSet<(u32, &'s str)>,
    conformances: Vec<ConformanceEdge>,
    warnings: Vec<ExtractionWarning>,
    /// Token indices that name a declaration and are not references
    name_tokens: HashSet<usize>,
    /// `import` and compiler-directive lines
    skipped_lines: HashSet<u32>,
}

impl<'s, 't> Extractor<'s, 't> {
    fn new(path: &Path, source: &'s str, tokens: &'t [Token<'s>]) -> Self {
        Self {
            path: path.to_path_buf(),
            source,
            tokens,
            scopes: vec![Scope::new(ScopeKind::File, None)],
            pending: None,
            declarations: Vec::new(),
            references: Vec::new(),
            seen_refs: HashSet::new(),
            conformances: Vec::new(),
            warnings: Vec::new(),
            name_tokens: HashSet::new(),
            skipped_lines: skipped_lines(tokens),
        }
    }

    fn scope(&self) -> &Scope {
        // The file scope is never popped
        &self.scopes[self.scopes.len() - 1]
    }

    fn scope_mut(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    fn token(&self, i: usize) -> Option<&Token<'s>> {
        self.tokens.get(i)
    }

    fn run(&mut self) {
        for i in 0..self.tokens.len() {
            let token = self.tokens[i];

            if self.pending.is_some() && self.ends_pending_header(i) {
                self.finish_pending();
            }
            if let Some(pending) = self.pending.as_mut() {
                pending.last_line = token.line;
            }

            match token.kind {
                TokenKind::Punct => self.punct(token),
                TokenKind::Ident | TokenKind::EscapedIdent => self.identifier(i, token),
                TokenKind::Number | TokenKind::Operator => {}
            }
        }
    }

    fn punct(&mut self, token: Token<'s>) {
        match token.text {
            "(" => self.scope_mut().brackets.push('('),
            "[" => self.scope_mut().brackets.push('['),
            ")" | "]" => {
                self.scope_mut().brackets.pop();
            }
            "{" => self.open_brace(token),
            "}" => self.close_brace(token),
            "," => {
                let at_header_level = !self.scope().nested();
                if let Some(pending) = self.pending.as_mut() {
                    if pending.kind == SymbolKind::EnumCase && at_header_level {
                        pending.expect_case_name = true;
                    }
                }
            }
            _ => {}
        }
    }

    fn open_brace(&mut self, token: Token<'s>) {
        let at_header_level = !self.scope().nested()
            && self
                .pending
                .as_ref()
                .is_some_and(|p| p.scope_depth == self.scopes.len());
        let pending = if at_header_level { self.pending.take() } else { None };

        let Some(pending) = pending else {
            self.scopes.push(Scope::new(ScopeKind::Code, None));
            return;
        };

        let kind = pending.kind;
        let decl = pending.decls.first().copied();

        if kind.is_type() {
            if let Some(idx) = decl {
                let header = &self.source[pending.header_offset..token.offset];
                let subtype = self.declarations[idx].name.clone();
                for supertype in resolve_conformances(header) {
                    self.conformances.push(ConformanceEdge {
                        subtype: subtype.clone(),
                        supertype,
                        file: self.path.clone(),
                    });
                }
            }
        }

        let scope_kind = if kind.is_type() {
            ScopeKind::Type(kind)
        } else {
            ScopeKind::Code
        };
        self.scopes.push(Scope::new(scope_kind, decl));
    }

    fn close_brace(&mut self, token: Token<'s>) {
        if self.scopes.len() == 1 {
            self.warnings.push(ExtractionWarning::new(
                self.path.clone(),
                ExtractionWarningKind::UnbalancedBraces,
                Some(token.line),
                "unmatched closing brace",
            ));
            return;
        }
        if let Some(scope) = self.scopes.pop() {
            if let Some(idx) = scope.decl {
                self.declarations[idx].end_line = token.line;
            }
        }
    }

    /// Whether token `i` lies outside the pending declaration's header.
    fn ends_pending_header(&self, i: usize) -> bool {
        let Some(pending) = &self.pending else {
            return false;
        };
        let token = self.tokens[i];
        if self.scopes.len() != pending.scope_depth || self.scope().nested() {
            return false;
        }
        if token.is_punct('}') || token.is_punct(';') {
            return true;
        }
        if token.line == pending.last_line {
            return false;
        }

        // New line at header level
        let starts_declaration = token.is_punct('@')
            || token.is_punct('#')
            || (token.kind == TokenKind::Ident && starts_member(token.text));
        match pending.kind {
            SymbolKind::Variable | SymbolKind::TypeAlias | SymbolKind::EnumCase => {
                let continues_previous = i > 0 && is_continuation(&self.tokens[i - 1]);
                let continues_here = token.is_punct('.')
                    || token.is_punct('{')
                    || token.kind == TokenKind::Operator;
                starts_declaration || !(continues_previous || continues_here)
            }
            _ => starts_declaration,
        }
    }

    fn finish_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            for idx in pending.decls {
                self.declarations[idx].end_line = pending.last_line;
            }
        }
    }

    fn identifier(&mut self, i: usize, token: Token<'s>) {
        if self.skipped_lines.contains(&token.line) {
            return;
        }
        if token.kind == TokenKind::Ident {
            if let Some(kind) = declaration_kind(token.text) {
                if self.declaration(i, token, kind) {
                    return;
                }
            }
        }

        if self.pending_case_name(i, token) {
            return;
        }

        if self.is_reference(i, token) {
            self.record_reference(token);
        }
    }

    fn pending_case_name(&mut self, i: usize, token: Token<'s>) -> bool {
        let Some(pending) = self.pending.as_mut() else {
            return false;
        };
        if !pending.expect_case_name {
            return false;
        }
        pending.expect_case_name = false;
        if !token.is_identifier() {
            return false;
        }
        let idx = self.push_declaration(token.text, SymbolKind::EnumCase, token.line);
        if let Some(pending) = self.pending.as_mut() {
            pending.decls.push(idx);
        }
        self.name_tokens.insert(i);
        true
    }

    /// Handle a declaration keyword. Returns `false` if the keyword does not
    /// introduce a declaration here.
    fn declaration(&mut self, i: usize, token: Token<'s>, kind: SymbolKind) -> bool {
        let prev = i.checked_sub(1).and_then(|p| self.token(p)).copied();
        let next = self.token(i + 1).copied();
        let scope = self.scope();

        if prev.is_some_and(|p| p.is_punct('.')) {
            // `.init(...)`, `super.init`
            return false;
        }

        match (token.text, kind) {
            ("class", _) => {
                let names_type = next.is_some_and(|n| {
                    n.kind == TokenKind::EscapedIdent
                        || (n.kind == TokenKind::Ident
                            && !is_stopword(n.text)
                            && !is_modifier(n.text))
                });
                if !names_type {
                    // Modifier (`class func`) or constraint (`protocol P: class`)
                    return true;
                }
            }
            (_, SymbolKind::Variable) => {
                let tracked = matches!(scope.kind, ScopeKind::File | ScopeKind::Type(_))
                    && !scope.nested()
                    && !prev.is_some_and(|p| {
                        p.is_punct(',')
                            || matches!(p.text, "if" | "guard" | "while" | "case" | "for" | "in")
                    });
                if !tracked {
                    // Local binding: its name is not a use of anything
                    if next.is_some_and(|n| n.is_identifier()) {
                        self.name_tokens.insert(i + 1);
                    }
                    return true;
                }
            }
            (_, SymbolKind::EnumCase) => {
                if scope.kind != ScopeKind::Type(SymbolKind::Enum) || scope.nested() {
                    return true;
                }
            }
            _ => {}
        }

        if self.pending.is_some() {
            self.finish_pending();
        }

        let start_line = self.prefix_start_line(i).unwrap_or(token.line);

        let name = if kind == SymbolKind::Initializer {
            Some(("init", None))
        } else {
            self.declared_name(i, kind)
        };
        let Some((name, name_index)) = name else {
            return true;
        };

        let idx = self.push_declaration(name, kind, start_line);
        if let Some(name_index) = name_index {
            self.name_tokens.insert(name_index);
        }
        self.pending = Some(Pending {
            decls: vec![idx],
            kind,
            header_offset: token.offset,
            last_line: token.line,
            scope_depth: self.scopes.len(),
            expect_case_name: false,
        });
        true
    }

    /// Find the declared name following the keyword at `i`.
    fn declared_name(&mut self, i: usize, kind: SymbolKind) -> Option<(&'s str, Option<usize>)> {
        let next = *self.token(i + 1)?;
        match kind {
            SymbolKind::Function if next.kind == TokenKind::Operator => {
                Some((next.text, Some(i + 1)))
            }
            SymbolKind::Extension => {
                if !next.is_identifier() {
                    return None;
                }
                // `extension Outer.Inner`: the last component is the name;
                // every component depends on the extended type
                let mut j = i + 1;
                self.record_reference(next);
                while self.token(j + 1).is_some_and(|t| t.is_punct('.'))
                    && self.token(j + 2).is_some_and(Token::is_identifier)
                {
                    j += 2;
                    let component = self.tokens[j];
                    self.record_reference(component);
                }
                self.name_tokens.insert(j);
                Some((self.tokens[j].text, None))
            }
            _ if next.kind == TokenKind::EscapedIdent
                || (next.kind == TokenKind::Ident && !is_stopword(next.text)) =>
            {
                Some((next.text, Some(i + 1)))
            }
            _ => None,
        }
    }

    /// Line of the earliest attribute or modifier directly preceding token `i`.
    fn prefix_start_line(&self, i: usize) -> Option<u32> {
        let mut start: Option<usize> = None;
        let mut j = i;
        while j > 0 {
            let prev = self.tokens[j - 1];
            if prev.kind == TokenKind::Ident && is_modifier(prev.text) {
                j -= 1;
                start = Some(j);
                continue;
            }
            // Modifier arguments: `private(set)`, `unowned(unsafe)`
            if prev.is_punct(')') {
                let Some(open) = self.matching_open_paren(j - 1) else {
                    break;
                };
                let Some(before) = open.checked_sub(1).map(|k| self.tokens[k]) else {
                    break;
                };
                if before.kind == TokenKind::Ident && is_modifier(before.text) {
                    j = open - 1;
                    start = Some(j);
                    continue;
                }
                if before.is_identifier() && open >= 2 && self.tokens[open - 2].is_punct('@') {
                    j = open - 2;
                    start = Some(j);
                    continue;
                }
                break;
            }
            if prev.is_identifier() && j >= 2 && self.tokens[j - 2].is_punct('@') {
                j -= 2;
                start = Some(j);
                continue;
            }
            break;
        }
        start.map(|s| self.tokens[s].line)
    }

    fn matching_open_paren(&self, close: usize) -> Option<usize> {
        let mut depth = 0u32;
        let mut k = close;
        loop {
            let t = self.tokens[k];
            if t.is_punct(')') {
                depth += 1;
            } else if t.is_punct('(') {
                depth -= 1;
                if depth == 0 {
                    return Some(k);
                }
            }
            k = k.checked_sub(1)?;
        }
    }

    fn is_reference(&self, i: usize, token: Token<'s>) -> bool {
        if self.name_tokens.contains(&i) {
            return false;
        }
        if token.kind == TokenKind::Ident && is_stopword(token.text) {
            return false;
        }
        let prev = i.checked_sub(1).map(|p| self.tokens[p]);
        if prev.is_some_and(|p| p.is_punct('#')) {
            // Compiler directives and literals: `#if`, `#selector`, `#available`
            return false;
        }

        if self.scope().in_parens() {
            let next = self.token(i + 1);
            // Argument label or parameter name: `f(x: 1)`, `func f(x: Int)`.
            // The true branch of a ternary is not: `f(flag ? a : b)`
            if next.is_some_and(|n| n.is_punct(':')) && !self.in_ternary(i) {
                return false;
            }
            // External parameter label: `func f(for name: String)`
            if next.is_some_and(Token::is_identifier)
                && self.token(i + 2).is_some_and(|n| n.is_punct(':'))
            {
                return false;
            }
        }
        true
    }

    /// Whether a `?` operator precedes token `i` within the same argument.
    fn in_ternary(&self, i: usize) -> bool {
        let mut depth = 0u32;
        for token in self.tokens[..i].iter().rev() {
            if token.kind == TokenKind::Punct {
                match token.text {
                    ")" | "]" | "}" => depth += 1,
                    "(" | "[" | "{" => match depth.checked_sub(1) {
                        Some(d) => depth = d,
                        None => return false,
                    },
                    "," if depth == 0 => return false,
                    _ => {}
                }
            } else if depth == 0 && token.kind == TokenKind::Operator && token.text == "?" {
                return true;
            }
        }
        false
    }

    fn record_reference(&mut self, token: Token<'s>) {
        if !self.seen_refs.insert((token.line, token.text)) {
            return;
        }
        self.references.push(SymbolReference {
            name: token.text.to_string(),
            file: self.path.clone(),
            line: token.line,
        });
    }

    fn push_declaration(&mut self, name: &str, kind: SymbolKind, start_line: u32) -> usize {
        let enclosing = self.scopes.iter().filter_map(|s| s.decl).collect::<Vec<_>>();
        let container = enclosing
            .last()
            .map(|&idx| self.declarations[idx].name.clone());
        let depth = u32::try_from(enclosing.len()).unwrap_or(u32::MAX);

        self.declarations.push(SymbolDeclaration {
            name: name.to_string(),
            kind,
            file: self.path.clone(),
            start_line,
            end_line: start_line,
            depth,
            container,
        });
        self.declarations.len() - 1
    }

    fn finish(mut self) -> FileExtraction {
        self.finish_pending();

        let last_line = self.tokens.last().map_or(1, |t| t.line);
        let unclosed = self.scopes.len() - 1;
        if unclosed > 0 {
            self.warnings.push(ExtractionWarning::new(
                self.path.clone(),
                ExtractionWarningKind::UnbalancedBraces,
                Some(last_line),
                format!("{unclosed} unclosed brace(s) at end of file"),
            ));
            for scope in self.scopes.drain(1..) {
                if let Some(idx) = scope.decl {
                    self.declarations[idx].end_line = last_line;
                }
            }
        }

        for decl in &mut self.declarations {
            decl.end_line = decl.end_line.max(decl.start_line);
        }

        FileExtraction {
            declarations: self.declarations,
            references: self.references,
            conformances: self.conformances,
            warnings: self.warnings,
        }
    }
}

/// Lines holding an `import` or a compiler directive (`#if`, `#endif`).
fn skipped_lines(tokens: &[Token<'_>]) -> HashSet<u32> {
    let mut lines = HashSet::new();
    for (i, token) in tokens.iter().enumerate() {
        let skip = if token.is_word("import") {
            starts_line(tokens, i)
        } else if token.is_punct('#') {
            tokens.get(i + 1).is_some_and(|next| {
                next.line == token.line
                    && matches!(
                        next.text,
                        "if" | "elseif" | "else" | "endif" | "warning" | "error" | "sourceLocation"
                    )
            })
        } else {
            false
        };
        if skip {
            lines.insert(token.line);
        }
    }
    lines
}

/// Whether token `i` is preceded on its line only by attributes and modifiers
/// (`@testable import`, `public import`).
fn starts_line(tokens: &[Token<'_>], i: usize) -> bool {
    let line = tokens[i].line;
    tokens[..i]
        .iter()
        .rev()
        .take_while(|t| t.line == line)
        .all(|t| t.is_punct('@') || t.is_identifier())
}

/// Whether a header may continue on the next line after this token.
fn is_continuation(token: &Token<'_>) -> bool {
    token.kind == TokenKind::Operator
        || token.is_punct(',')
        || token.is_punct(':')
        || token.is_punct('.')
        || token.is_punct('(')
        || token.is_punct('[')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn run(source: &str) -> FileExtraction {
        extract(Path::new("Sources/App/File.swift"), source)
    }

    fn spans(out: &FileExtraction) -> Vec<(&str, SymbolKind, u32, u32)> {
        out.declarations
            .iter()
            .map(|d| (d.name.as_str(), d.kind, d.start_line, d.end_line))
            .collect()
    }

    fn referenced(out: &FileExtraction) -> Vec<(&str, u32)> {
        out.references
            .iter()
            .map(|r| (r.name.as_str(), r.line))
            .collect()
    }

    #[test]
    fn function_span_covers_body() {
        let out = run("\
import Foundation

func helper() -> Int {
    let x = compute()
    return x
}
");
        assert_eq!(spans(&out), vec![("helper", SymbolKind::Function, 3, 6)]);
        assert_eq!(referenced(&out), vec![("Int", 3), ("compute", 4), ("x", 5)]);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn nested_declarations_have_own_spans_and_depth() {
        let out = run("\
struct Account {
    var balance: Int = 0

    mutating func deposit(_ amount: Int) {
        balance += amount
    }
}
");
        assert_eq!(
            spans(&out),
            vec![
                ("Account", SymbolKind::Struct, 1, 7),
                ("balance", SymbolKind::Variable, 2, 2),
                ("deposit", SymbolKind::Function, 4, 6),
            ]
        );
        let deposit = &out.declarations[2];
        assert_eq!(deposit.depth, 1);
        assert_eq!(deposit.container.as_deref(), Some("Account"));
        assert!(out.declarations[0].is_top_level());
    }

    #[test]
    fn attributes_and_modifiers_extend_span_start() {
        let out = run("\
@MainActor
public final class ViewModel: ObservableObject {
    @Published private(set) var items: [Item] = []
}
");
        assert_eq!(
            spans(&out),
            vec![
                ("ViewModel", SymbolKind::Class, 1, 4),
                ("items", SymbolKind::Variable, 3, 3),
            ]
        );
        assert_eq!(out.conformances.len(), 1);
        assert_eq!(out.conformances[0].subtype, "ViewModel");
        assert_eq!(out.conformances[0].supertype, "ObservableObject");
    }

    #[test]
    fn multi_line_signature_is_line_accurate() {
        let out = run("\
func configure(
    name: String,
    retries: Int
) -> Bool {
    true
}
");
        assert_eq!(spans(&out), vec![("configure", SymbolKind::Function, 1, 6)]);
        let names: Vec<&str> = out.references.iter().map(|r| r.name.as_str()).collect();
        assert!(!names.contains(&"name"), "parameter names are not references");
        assert!(names.contains(&"String"));
        assert!(names.contains(&"Bool"));
    }

    #[test]
    fn enum_cases_are_declarations() {
        let out = run("\
enum Route: String {
    case home, settings
    case detail(id: Int)

    func path() -> String {
        switch self {
        case .home: return \"/\"
        default: return \"\"
        }
    }
}
");
        assert_eq!(
            spans(&out),
            vec![
                ("Route", SymbolKind::Enum, 1, 11),
                ("home", SymbolKind::EnumCase, 2, 2),
                ("settings", SymbolKind::EnumCase, 2, 2),
                ("detail", SymbolKind::EnumCase, 3, 3),
                ("path", SymbolKind::Function, 5, 10),
            ]
        );
        assert!(
            out.references.iter().any(|r| r.name == "home" && r.line == 7),
            "switch cases are references, not declarations"
        );
    }

    #[test]
    fn protocol_requirements_end_at_their_own_line() {
        let out = run("\
protocol Store {
    associatedtype Item
    var count: Int { get }
    func load() throws -> [Item]
    func save(_ item: Item)
    init(path: String)
}
");
        assert_eq!(
            spans(&out),
            vec![
                ("Store", SymbolKind::Protocol, 1, 7),
                ("count", SymbolKind::Variable, 3, 3),
                ("load", SymbolKind::Function, 4, 4),
                ("save", SymbolKind::Function, 5, 5),
                ("init", SymbolKind::Initializer, 6, 6),
            ]
        );
    }

    #[test]
    fn local_variables_are_not_declarations() {
        let out = run("\
func run() {
    let local = 1
    var other = local
    if let value = Optional(other) { print(value) }
}
");
        assert_eq!(spans(&out), vec![("run", SymbolKind::Function, 1, 5)]);
    }

    #[test]
    fn top_level_let_ends_on_its_line() {
        let out = run("\
let shared = Service()
start(shared)
");
        assert_eq!(spans(&out), vec![("shared", SymbolKind::Variable, 1, 1)]);
        assert_eq!(
            referenced(&out),
            vec![("Service", 1), ("start", 2), ("shared", 2)]
        );
    }

    #[test]
    fn computed_property_spans_its_accessor_block() {
        let out = run("\
struct V {
    var body: some View {
        Text(title)
    }
}
");
        assert_eq!(
            spans(&out),
            vec![
                ("V", SymbolKind::Struct, 1, 5),
                ("body", SymbolKind::Variable, 2, 4),
            ]
        );
    }

    #[test]
    fn extension_names_and_references_extended_type() {
        let out = run("\
extension Account: CustomStringConvertible {
    var description: String { \"\\(balance)\" }
}
");
        assert_eq!(out.declarations[0].name, "Account");
        assert_eq!(out.declarations[0].kind, SymbolKind::Extension);
        assert_eq!(out.declarations[0].end_line, 3);
        let refs = referenced(&out);
        assert!(refs.contains(&("Account", 1)));
        assert!(refs.contains(&("CustomStringConvertible", 1)));
        assert!(refs.contains(&("balance", 2)), "interpolated names are references");
    }

    #[test]
    fn class_modifier_and_super_init_are_not_declarations() {
        let out = run("\
class Base {
    class func make() -> Base { Base() }
    override init() { super.init() }
}
");
        assert_eq!(
            spans(&out),
            vec![
                ("Base", SymbolKind::Class, 1, 4),
                ("make", SymbolKind::Function, 2, 2),
                ("init", SymbolKind::Initializer, 3, 3),
            ]
        );
    }

    #[test]
    fn declaration_names_are_not_self_references() {
        let out = run("func helper() {}\nhelper()\n");
        assert_eq!(referenced(&out), vec![("helper", 2)]);
    }

    #[test]
    fn references_dedupe_per_line() {
        let out = run("let a = max(b, max(b, c))\n");
        assert_eq!(referenced(&out), vec![("max", 1), ("b", 1), ("c", 1)]);
    }

    #[test]
    fn imports_and_directives_are_not_references() {
        let out = run("\
@testable import MyModule
#if DEBUG
let flag = true
#endif
");
        assert!(out.references.is_empty(), "got {:?}", out.references);
    }

    #[test]
    fn external_labels_are_not_references() {
        let out = run("func send(to recipient: User, message: String) {}\n");
        let names: Vec<&str> = out.references.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["User", "String"]);
    }

    #[test]
    fn dictionary_keys_are_references() {
        let out = run("\
let cache: [UserID: User] = [:]
let lookup = [primaryKey: fallback]
func load(from table: [Key: Row]) {}
");
        assert_eq!(
            referenced(&out),
            vec![
                ("UserID", 1),
                ("User", 1),
                ("primaryKey", 2),
                ("fallback", 2),
                ("Key", 3),
                ("Row", 3),
            ]
        );
    }

    #[test]
    fn ternary_operands_inside_calls_are_references() {
        let out = run("\
let v = pick(flag ? helper : other)
let w = pick(label: ready ? first : second, count: 2)
func f(a: Int?, b: Int) {}
");
        assert_eq!(
            referenced(&out),
            vec![
                ("pick", 1),
                ("flag", 1),
                ("helper", 1),
                ("other", 1),
                ("pick", 2),
                ("ready", 2),
                ("first", 2),
                ("second", 2),
                ("Int", 3),
            ]
        );
    }

    #[test]
    fn typealias_and_operator_functions() {
        let out = run("\
typealias Handler = (Result<Data, Error>) -> Void
func == (lhs: Point, rhs: Point) -> Bool { lhs.x == rhs.x }
");
        assert_eq!(
            spans(&out),
            vec![
                ("Handler", SymbolKind::TypeAlias, 1, 1),
                ("==", SymbolKind::Function, 2, 2),
            ]
        );
    }

    #[test]
    fn unbalanced_braces_yield_partial_result_and_warning() {
        let out = run("\
struct Broken {
    func first() {
        work()
");
        assert_eq!(
            spans(&out),
            vec![
                ("Broken", SymbolKind::Struct, 1, 3),
                ("first", SymbolKind::Function, 2, 3),
            ]
        );
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].kind, ExtractionWarningKind::UnbalancedBraces);
    }

    #[test]
    fn extra_closing_brace_is_warned_and_ignored() {
        let out = run("}\nfunc after() {}\n");
        assert_eq!(spans(&out), vec![("after", SymbolKind::Function, 2, 2)]);
        assert_eq!(out.warnings[0].kind, ExtractionWarningKind::UnbalancedBraces);
    }

    #[test]
    fn unterminated_string_is_reported_as_warning() {
        let out = run("func a() {}\nlet s = \"open\n");
        assert_eq!(out.declarations[0].name, "a");
        assert!(out
            .warnings
            .iter()
            .any(|w| w.kind == ExtractionWarningKind::UnterminatedLiteral));
    }

    #[test]
    fn empty_source_yields_nothing() {
        assert_eq!(run(""), FileExtraction::default());
    }

    proptest! {
        #[test]
        fn spans_are_well_formed_for_arbitrary_input(source in "[a-z{}()\\[\\]:,=\\n \"]{0,200}|(func|class|var|case|enum|struct) [a-z]{1,5}[ {}\\n]{0,10}") {
            let out = run(&source);
            for decl in &out.declarations {
                prop_assert!(decl.start_line >= 1);
                prop_assert!(decl.start_line <= decl.end_line);
            }
        }
    }
}
