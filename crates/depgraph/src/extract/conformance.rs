//! Protocol and superclass conformance extraction.
//!
//! Given the header of a type declaration (everything from the introducing
//! keyword up to the opening brace), returns the names listed after the
//! conformance `:`.
//!
//! ```text
//! public final class Store<T>: Base, Observable & Sendable where T: Codable
//!                              ^^^^  ^^^^^^^^^^   ^^^^^^^^
//! ```
//!
//! Only direct edges are produced. Chains such as `A: B` and `B: C` are
//! walked at query time by [`ConformanceGraph`](crate::graph::ConformanceGraph).

use super::lexer::{tokenize, Token, TokenKind};

/// Extract supertype and protocol names from a type declaration header.
///
/// Qualified names resolve to their last component (`Foundation.NSObject`
/// yields `NSObject`) and generic arguments are dropped (`Collection<Int>`
/// yields `Collection`). Duplicates are removed, keeping first occurrence.
#[must_use]
pub fn resolve_conformances(header: &str) -> Vec<String> {
    let lexed = tokenize(header);
    let tokens = &lexed.tokens;

    let Some(keyword) = tokens.iter().position(|t| {
        matches!(
            t.text,
            "class" | "actor" | "struct" | "enum" | "protocol" | "extension"
        ) && t.kind == TokenKind::Ident
    }) else {
        return Vec::new();
    };

    // Name, possibly qualified for extensions (`extension Outer.Inner`)
    let mut i = keyword + 1;
    if !tokens.get(i).is_some_and(Token::is_identifier) {
        return Vec::new();
    }
    i += 1;
    while tokens.get(i).is_some_and(|t| t.is_punct('.'))
        && tokens.get(i + 1).is_some_and(Token::is_identifier)
    {
        i += 2;
    }

    i = skip_generic_clause(tokens, i);

    if !tokens.get(i).is_some_and(|t| t.is_punct(':')) {
        return Vec::new();
    }

    let mut names: Vec<String> = Vec::new();
    let mut angle_depth = 0i32;
    let mut paren_depth = 0i32;
    let mut current: Option<&str> = None;

    for token in &tokens[i + 1..] {
        if angle_depth == 0 && paren_depth == 0 {
            if token.is_word("where") || token.is_punct('{') {
                break;
            }
            if token.is_punct(',') || (token.kind == TokenKind::Operator && token.text == "&") {
                push_unique(&mut names, current.take());
                continue;
            }
            if token.is_punct('@') {
                // Attribute like `@unchecked` or `@retroactive`: the next identifier is not a type
                current = Some("@");
                continue;
            }
            if token.is_identifier() {
                if current == Some("@") {
                    current = None;
                } else if !token.is_word("class") {
                    current = Some(token.text);
                }
                continue;
            }
        }

        match token.kind {
            TokenKind::Operator => {
                for c in token.text.chars() {
                    match c {
                        '<' => angle_depth += 1,
                        '>' => angle_depth -= 1,
                        _ => {}
                    }
                }
            }
            TokenKind::Punct if token.is_punct('(') => paren_depth += 1,
            TokenKind::Punct if token.is_punct(')') => paren_depth -= 1,
            _ => {}
        }
    }
    push_unique(&mut names, current);

    names
}

/// Skip a `<...>` generic parameter clause starting at `i`, if present.
fn skip_generic_clause(tokens: &[Token<'_>], mut i: usize) -> usize {
    if !tokens
        .get(i)
        .is_some_and(|t| t.kind == TokenKind::Operator && t.text.starts_with('<'))
    {
        return i;
    }

    let mut depth = 0i32;
    while let Some(token) = tokens.get(i) {
        if token.kind == TokenKind::Operator {
            for c in token.text.chars() {
                match c {
                    '<' => depth += 1,
                    '>' => depth -= 1,
                    _ => {}
                }
            }
        }
        i += 1;
        if depth <= 0 {
            break;
        }
    }
    i
}

fn push_unique(names: &mut Vec<String>, name: Option<&str>) {
    if let Some(name) = name.filter(|n| *n != "@") {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
}
