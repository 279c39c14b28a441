//! Swift keyword tables.

use crate::types::SymbolKind;

/// Words that are never recorded as references.
///
/// Covers reserved words, contextual keywords that appear in declaration
/// position, and literals.
const STOPWORDS: &[&str] = &[
    "Any", "Self", "Type", "_", "actor", "any", "as", "associatedtype", "async", "await",
    "borrowing", "break", "case", "catch", "class", "consuming", "continue", "convenience",
    "default", "defer", "deinit", "didSet", "do", "dynamic", "each", "else", "enum",
    "extension", "fallthrough", "false", "fileprivate", "final", "for", "func", "get", "guard",
    "if", "import", "in", "indirect", "infix", "init", "inout", "internal", "is", "isolated",
    "lazy", "let", "mutating", "nil", "nonisolated", "nonmutating", "open", "operator",
    "optional", "override", "package", "postfix", "precedencegroup", "prefix", "private",
    "protocol", "public", "repeat", "required", "rethrows", "return", "self", "set", "some",
    "static", "struct", "subscript", "super", "switch", "throw", "throws", "true", "try",
    "typealias", "unowned", "var", "weak", "where", "while", "willSet",
];

/// Declaration modifiers that may precede a declaration keyword.
const MODIFIERS: &[&str] = &[
    "class", "convenience", "distributed", "dynamic", "fileprivate", "final", "indirect",
    "infix", "internal", "isolated", "lazy", "mutating", "nonisolated", "nonmutating", "open",
    "optional", "override", "package", "postfix", "prefix", "private", "public", "required",
    "static", "unowned", "weak",
];

/// Whether `word` is a keyword or literal rather than a user identifier.
#[must_use]
pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.binary_search(&word).is_ok()
}

/// Whether `word` is a declaration modifier.
#[must_use]
pub fn is_modifier(word: &str) -> bool {
    MODIFIERS.binary_search(&word).is_ok()
}

/// The declaration kind introduced by `word`, if any.
#[must_use]
pub fn declaration_kind(word: &str) -> Option<SymbolKind> {
    match word {
        "class" | "actor" => Some(SymbolKind::Class),
        "struct" => Some(SymbolKind::Struct),
        "enum" => Some(SymbolKind::Enum),
        "protocol" => Some(SymbolKind::Protocol),
        "extension" => Some(SymbolKind::Extension),
        "func" => Some(SymbolKind::Function),
        "var" | "let" => Some(SymbolKind::Variable),
        "typealias" => Some(SymbolKind::TypeAlias),
        "init" => Some(SymbolKind::Initializer),
        "case" => Some(SymbolKind::EnumCase),
        _ => None,
    }
}

/// Keywords that start a new member declaration even without a name we track.
#[must_use]
pub fn starts_member(word: &str) -> bool {
    declaration_kind(word).is_some()
        || is_modifier(word)
        || matches!(word, "subscript" | "deinit" | "associatedtype")
}
