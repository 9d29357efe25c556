use crate::{
    tokenizer::Token,
    types::{Condition, Declaration, Field, Generic, TypeExpr},
    utils::{error, quote},
    error::TlError,
};
use brine_tl_schema::DefKind;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref IDENTIFIER:  Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap();
    static ref HEX_ID:      Regex = Regex::new(r"^#[0-9a-fA-F]+$").unwrap();
    static ref HASH:        Regex = Regex::new(r"^#$").unwrap();
    static ref SECTION:     Regex = Regex::new(r"^---[a-z]+---$").unwrap();
    static ref COLON:       Regex = Regex::new(r"^:$").unwrap();
    static ref SEMICOLON:   Regex = Regex::new(r"^;$").unwrap();
    static ref EQUALS:      Regex = Regex::new(r"^=$").unwrap();
    static ref QUESTION:    Regex = Regex::new(r"^\?$").unwrap();
    static ref BANG:        Regex = Regex::new(r"^!$").unwrap();
    static ref PERCENT:     Regex = Regex::new(r"^%$").unwrap();
    static ref DOT:         Regex = Regex::new(r"^\.$").unwrap();
    static ref COMMA:       Regex = Regex::new(r"^,$").unwrap();
    static ref LESS:        Regex = Regex::new(r"^<$").unwrap();
    static ref GREATER:     Regex = Regex::new(r"^>$").unwrap();
    static ref LEFT_BRACE:  Regex = Regex::new(r"^\{$").unwrap();
    static ref RIGHT_BRACE: Regex = Regex::new(r"^\}$").unwrap();
    static ref TYPE_KEYWORD: Regex = Regex::new(r"^Type$").unwrap();
    static ref INTEGER:     Regex = Regex::new(r"^\d+$").unwrap();
    static ref EOF:         Regex = Regex::new(r"^$").unwrap();
}

/// Names whose declarations describe the wire primitives themselves
/// (`int ? = Int;`, `vector#1cb5c415 {t:Type} # [ t ] = Vector t;`). They are
/// built into the codec and skipped by the parser.
const BUILTIN_DECLARATIONS: &[&str] = &[
    "int", "long", "double", "string", "bytes", "int128", "int256", "vector",
];

pub const MAX_FLAG_BIT: u8 = 31;

/// Parses a token stream into declarations. Declarations before any section
/// marker are constructors.
pub fn parse_schema(tokens: &[Token]) -> Result<Vec<Declaration>, TlError> {
    let mut declarations = Vec::new();
    let mut kind         = DefKind::Constructor;
    let mut index        = 0;

    if tokens.is_empty() {
        return Ok(declarations);
    }

    fn current_token(tokens: &[Token], index: usize) -> &Token {
        &tokens[index.min(tokens.len() - 1)]
    }

    fn peek_token(tokens: &[Token], index: usize) -> &Token {
        current_token(tokens, index + 1)
    }

    fn eat(tokens: &[Token], index: &mut usize, test: &Regex) -> bool {
        if test.is_match(&current_token(tokens, *index).text) {
            *index += 1;
            true
        } else {
            false
        }
    }

    fn expect(tokens: &[Token], index: &mut usize, test: &Regex, expected: &str) -> Result<(), TlError> {
        if !eat(tokens, index, test) {
            let tok = current_token(tokens, *index);
            return Err(error(
                &format!("Expected {} but found {}", expected, quote(&tok.text)),
                tok.line,
                tok.column,
            ));
        }
        Ok(())
    }

    fn skip_declaration(tokens: &[Token], index: &mut usize) -> Result<(), TlError> {
        while !eat(tokens, index, &SEMICOLON) {
            let tok = current_token(tokens, *index);
            if EOF.is_match(&tok.text) {
                return Err(error("Expected \";\" but found end of input", tok.line, tok.column));
            }
            *index += 1;
        }
        Ok(())
    }

    fn parse_type(tokens: &[Token], index: &mut usize) -> Result<TypeExpr, TlError> {
        if eat(tokens, index, &HASH) {
            return Ok(TypeExpr::Flags);
        }

        if eat(tokens, index, &BANG) {
            let name_tok = current_token(tokens, *index);
            expect(tokens, index, &IDENTIFIER, "identifier")?;
            return Ok(TypeExpr::Placeholder(name_tok.text.clone()));
        }

        let bare_marker = eat(tokens, index, &PERCENT);
        let name_tok = current_token(tokens, *index);
        expect(tokens, index, &IDENTIFIER, "type")?;

        let mut args = Vec::new();
        if eat(tokens, index, &LESS) {
            loop {
                args.push(parse_type(tokens, index)?);
                if !eat(tokens, index, &COMMA) {
                    break;
                }
            }
            expect(tokens, index, &GREATER, "\">\"")?;
        }

        let is_vector = name_tok.text.eq_ignore_ascii_case("vector");
        if is_vector && args.len() != 1 {
            return Err(error(
                &format!("{} expects exactly one type argument, found {}", name_tok.text, args.len()),
                name_tok.line,
                name_tok.column,
            ));
        }

        Ok(TypeExpr::Named {
            name: name_tok.text.clone(),
            bare_marker,
            args,
        })
    }

    while !EOF.is_match(&current_token(tokens, index).text) {
        let tok = current_token(tokens, index);
        if SECTION.is_match(&tok.text) {
            kind = match tok.text.as_str() {
                "---functions---" => DefKind::Method,
                "---types---" => DefKind::Constructor,
                _ => {
                    return Err(error(
                        &format!("Unknown section {}", quote(&tok.text)),
                        tok.line,
                        tok.column,
                    ))
                }
            };
            index += 1;
            continue;
        }

        // Declaration name and optional constructor id
        let name_tok = current_token(tokens, index);
        expect(tokens, &mut index, &IDENTIFIER, "identifier")?;

        if BUILTIN_DECLARATIONS.contains(&name_tok.text.as_str()) {
            skip_declaration(tokens, &mut index)?;
            continue;
        }

        let id_tok = current_token(tokens, index);
        let id = if eat(tokens, &mut index, &HEX_ID) {
            let digits = &id_tok.text[1..];
            if digits.len() > 8 {
                return Err(error(
                    &format!("Constructor id {} has more than 8 hex digits", quote(&id_tok.text)),
                    id_tok.line,
                    id_tok.column,
                ));
            }
            let id = u32::from_str_radix(digits, 16).map_err(|_| {
                error(
                    &format!("Invalid constructor id {}", quote(&id_tok.text)),
                    id_tok.line,
                    id_tok.column,
                )
            })?;
            Some(id)
        } else {
            None
        };

        // Generic parameters
        let mut generics = Vec::new();
        while eat(tokens, &mut index, &LEFT_BRACE) {
            let g_tok = current_token(tokens, index);
            expect(tokens, &mut index, &IDENTIFIER, "identifier")?;
            expect(tokens, &mut index, &COLON, "\":\"")?;
            expect(tokens, &mut index, &TYPE_KEYWORD, "\"Type\"")?;
            expect(tokens, &mut index, &RIGHT_BRACE, "\"}\"")?;
            generics.push(Generic {
                name:   g_tok.text.clone(),
                line:   g_tok.line,
                column: g_tok.column,
            });
        }

        // Parameters
        let mut fields: Vec<Field> = Vec::new();
        while IDENTIFIER.is_match(&current_token(tokens, index).text) {
            let f_tok = current_token(tokens, index);
            index += 1;
            expect(tokens, &mut index, &COLON, "\":\"")?;

            let condition = if IDENTIFIER.is_match(&current_token(tokens, index).text)
                && DOT.is_match(&peek_token(tokens, index).text)
            {
                let c_tok = current_token(tokens, index);
                index += 1;
                expect(tokens, &mut index, &DOT, "\".\"")?;
                let bit_tok = current_token(tokens, index);
                expect(tokens, &mut index, &INTEGER, "bit index")?;
                expect(tokens, &mut index, &QUESTION, "\"?\"")?;

                let bit = bit_tok.text.parse::<u8>().ok().filter(|bit| *bit <= MAX_FLAG_BIT).ok_or_else(|| {
                    error(
                        &format!("Flag bit {} is out of range 0..={}", bit_tok.text, MAX_FLAG_BIT),
                        bit_tok.line,
                        bit_tok.column,
                    )
                })?;

                if !fields.iter().any(|f| f.name == c_tok.text) {
                    return Err(error(
                        &format!("Field {} refers to undeclared flags field {}", quote(&f_tok.text), quote(&c_tok.text)),
                        c_tok.line,
                        c_tok.column,
                    ));
                }

                Some(Condition {
                    field: c_tok.text.clone(),
                    bit,
                })
            } else {
                None
            };

            let type_ = parse_type(tokens, &mut index)?;

            fields.push(Field {
                name:   f_tok.text.clone(),
                line:   f_tok.line,
                column: f_tok.column,
                type_,
                condition,
            });
        }

        expect(tokens, &mut index, &EQUALS, "\"=\"")?;
        let result = parse_type(tokens, &mut index)?;
        expect(tokens, &mut index, &SEMICOLON, "\";\"")?;

        declarations.push(Declaration {
            name:   name_tok.text.clone(),
            line:   name_tok.line,
            column: name_tok.column,
            id,
            kind,
            generics,
            fields,
            result,
        });
    }

    Ok(declarations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize_schema;

    fn parse(text: &str) -> Result<Vec<Declaration>, TlError> {
        parse_schema(&tokenize_schema(text)?)
    }

    fn parse_error(text: &str) -> (String, usize, usize) {
        match parse(text) {
            Err(TlError::ParseError { msg, line, column }) => (msg, line, column),
            other => panic!("expected a ParseError but got {:?}", other),
        }
    }

    #[test]
    fn parse_constructor() {
        let decls = parse("user#abcdef12 flags:# id:long first_name:flags.0?string = User;").unwrap();
        assert_eq!(decls.len(), 1);
        let user = &decls[0];
        assert_eq!(user.name, "user");
        assert_eq!(user.id, Some(0xabcdef12));
        assert_eq!(user.kind, DefKind::Constructor);
        assert_eq!(user.fields.len(), 3);
        assert_eq!(user.fields[0].type_, TypeExpr::Flags);
        assert_eq!(user.fields[1].type_, TypeExpr::named("long"));
        assert_eq!(user.fields[2].condition, Some(Condition { field: "flags".into(), bit: 0 }));
        assert_eq!(user.fields[2].type_, TypeExpr::named("string"));
        assert_eq!(user.result, TypeExpr::named("User"));
    }

    #[test]
    fn parse_sections() {
        let text = "
            boolTrue#997275b5 = Bool;
            ---functions---
            ping#7abe77ec ping_id:long = Pong;
            ---types---
            pong#347773c5 msg_id:long ping_id:long = Pong;
        ";
        let kinds: Vec<_> = parse(text).unwrap().iter().map(|d| (d.name.clone(), d.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("boolTrue".to_string(), DefKind::Constructor),
                ("ping".to_string(), DefKind::Method),
                ("pong".to_string(), DefKind::Constructor),
            ]
        );
    }

    #[test]
    fn parse_generic_method() {
        let decls = parse("---functions---\ninvokeWithLayer#da9b0d0d {X:Type} layer:int query:!X = X;").unwrap();
        let invoke = &decls[0];
        assert_eq!(invoke.generics.len(), 1);
        assert_eq!(invoke.generics[0].name, "X");
        assert_eq!(invoke.fields[1].type_, TypeExpr::Placeholder("X".into()));
        assert_eq!(invoke.result, TypeExpr::named("X"));
    }

    #[test]
    fn parse_vector_types() {
        let decls = parse("msg_container#73f1f8dc messages:vector<%Message> ids:Vector<Vector<long>> = MessageContainer;").unwrap();
        assert_eq!(decls[0].fields[0].type_.to_string(), "vector<%Message>");
        assert_eq!(decls[0].fields[1].type_.to_string(), "Vector<Vector<long>>");
    }

    #[test]
    fn skips_builtin_declarations() {
        let text = "
            int ? = Int;
            long ? = Long;
            int128 4*[ int ] = Int128;
            vector#1cb5c415 {t:Type} # [ t ] = Vector t;
            true#3fedd339 = True;
        ";
        let decls = parse(text).unwrap();
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].name, "true");
    }

    #[test]
    fn parse_namespaced_names() {
        let decls = parse("---functions---\nmessages.getChats#49e9528f id:Vector<long> = messages.Chats;").unwrap();
        assert_eq!(decls[0].name, "messages.getChats");
        assert_eq!(decls[0].result, TypeExpr::named("messages.Chats"));
    }

    #[test]
    fn id_errors() {
        let (msg, line, column) = parse_error("user#abcdef123 id:long = User;");
        assert!(msg.contains("more than 8 hex digits"), "{}", msg);
        assert_eq!((line, column), (1, 5));
    }

    #[test]
    fn flag_errors() {
        let (msg, _, _) = parse_error("user#abcdef12 id:long name:flags.0?string = User;");
        assert!(msg.contains("undeclared flags field"), "{}", msg);

        let (msg, line, column) = parse_error("user#abcdef12 flags:# name:flags.32?string = User;");
        assert!(msg.contains("out of range"), "{}", msg);
        assert_eq!((line, column), (1, 34));
    }

    #[test]
    fn vector_arity_errors() {
        let (msg, line, column) = parse_error("a#00000001 v:Vector = A;");
        assert_eq!(msg, "Vector expects exactly one type argument, found 0");
        assert_eq!((line, column), (1, 14));

        let (msg, _, _) = parse_error("a#00000001 v:Vector<int,long> = A;");
        assert!(msg.contains("exactly one type argument"), "{}", msg);
    }

    #[test]
    fn syntax_errors() {
        let (msg, line, column) = parse_error("boolTrue#997275b5 = Bool\nboolFalse#bc799737 = Bool;");
        assert_eq!(msg, "Expected \";\" but found \"boolFalse\"");
        assert_eq!((line, column), (2, 1));

        let (msg, _, _) = parse_error("---enums---\n");
        assert!(msg.contains("Unknown section"), "{}", msg);

        let (msg, _, _) = parse_error("int ? = Int");
        assert!(msg.contains("end of input"), "{}", msg);
    }
}
