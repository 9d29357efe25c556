use brine_tl_schema::{Def, Param, Primitive, Registry, TypeRef};
use crate::utils::quote;

/// Converts a name segment to PascalCase.
/// - If the string contains underscores, it splits on underscores and
///   capitalizes each word, lowercasing the rest (`p_q_inner_data` becomes
///   `PQInnerData`).
/// - Otherwise only the first letter is uppercased (`resPQ` becomes `ResPQ`).
fn to_pascal_case(s: &str) -> String {
    fn capitalize(word: &str, lower_rest: bool) -> String {
        let mut chars = word.chars();
        match chars.next() {
            None => String::new(),
            Some(first) if lower_rest => first.to_uppercase().to_string() + &chars.as_str().to_lowercase(),
            Some(first) => first.to_uppercase().to_string() + chars.as_str(),
        }
    }

    if s.contains('_') {
        s.split('_')
         .filter(|word| !word.is_empty())
         .map(|word| capitalize(word, true))
         .collect::<String>()
    } else {
        capitalize(s, false)
    }
}

/// Namespaced names become one identifier: `messages.getChats` becomes
/// `MessagesGetChats`.
fn to_type_name(name: &str) -> String {
    name.split('.').map(to_pascal_case).collect()
}

/// Converts a string to snake_case.
/// Consecutive uppercase letters stay together, so `sessionID` becomes
/// `session_id`.
fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut snake = String::new();
    for i in 0..chars.len() {
        let c = chars[i];
        if c.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                if !prev.is_uppercase() || (i + 1 < chars.len() && chars[i + 1].is_lowercase()) {
                    snake.push('_');
                }
            }
            snake.extend(c.to_lowercase());
        } else {
            snake.push(c);
        }
    }
    snake
}

/// Escapes Rust reserved keywords by suffixing with an underscore.
fn escape_rust_keyword(s: &str) -> String {
    let keywords = [
        "as", "break", "const", "continue", "crate", "else",
        "enum", "extern", "false", "fn", "for", "if", "impl",
        "in", "let", "loop", "match", "mod", "move", "mut",
        "pub", "ref", "return", "self", "Self", "static",
        "struct", "super", "trait", "true", "type", "unsafe",
        "use", "where", "while", "async", "await", "dyn",
    ];
    if keywords.contains(&s) {
        format!("{}_", s)
    } else {
        s.to_string()
    }
}

/// Boxed types whose values decode to a primitive rather than an object.
fn is_builtin_type(name: &str) -> bool {
    Primitive::from_name(name).is_some()
}

/// Maps a resolved type to the Rust type of a generated field.
fn map_type(ty: &TypeRef) -> String {
    match ty {
        TypeRef::Primitive(p) => match p {
            Primitive::Int => "i32".to_string(),
            Primitive::Long => "i64".to_string(),
            Primitive::Double => "f64".to_string(),
            Primitive::String => "String".to_string(),
            Primitive::Bytes => "Vec<u8>".to_string(),
            Primitive::Bool | Primitive::True => "bool".to_string(),
            Primitive::Int128 => "[u8; 16]".to_string(),
            Primitive::Int256 => "[u8; 32]".to_string(),
            Primitive::Flags => "u32".to_string(),
        },
        TypeRef::Vector { element, .. } => format!("Vec<{}>", map_type(element)),
        TypeRef::Named { name, bare: false } => format!("Box<Type{}>", to_type_name(name)),
        TypeRef::Named { name, bare: true } => format!("Box<{}>", to_type_name(name)),
        TypeRef::Placeholder(_) | TypeRef::Any => "Value".to_string(),
    }
}

fn field_type(param: &Param) -> String {
    match (&param.flag, &param.ty) {
        (Some(_), TypeRef::Primitive(Primitive::True)) => "bool".to_string(),
        (Some(_), ty) => format!("Option<{}>", map_type(ty)),
        (None, ty) => map_type(ty),
    }
}

/// Compiles a registry into Rust type definitions as a string: one struct per
/// constructor and method, one enum per boxed type, and `FromTl`
/// implementations for all of them.
pub fn compile_registry_to_rust(registry: &Registry) -> String {
    let mut rust_code: Vec<String> = Vec::new();

    rust_code.push("#[allow(unused_imports)]".to_string());
    rust_code.push("use brine_tl::{required, FromTl, TlError, Value};".to_string());
    rust_code.push("use serde::Serialize;".to_string());
    rust_code.push("".to_string());

    if let Some(layer) = registry.layer() {
        rust_code.push(format!("pub const LAYER: u32 = {};", layer));
        rust_code.push("".to_string());
    }

    let mut boxed_types: Vec<&str> = Vec::new();
    for def in registry.iter() {
        if let Some(type_name) = def.type_name() {
            if is_builtin_type(type_name) {
                continue;
            }
            if !boxed_types.contains(&type_name) {
                boxed_types.push(type_name);
            }
        }
        rust_code.push(generate_struct(def));
    }

    for type_name in boxed_types {
        let ctors: Vec<&Def> = registry.constructors_of(type_name).collect();
        rust_code.push(generate_enum(type_name, &ctors));
    }

    rust_code.join("\n")
}

/// Generates the enum of a boxed type, one variant per constructor.
fn generate_enum(type_name: &str, ctors: &[&Def]) -> String {
    let enum_name = format!("Type{}", to_type_name(type_name));
    let mut variants = Vec::new();
    let mut match_arms = Vec::new();

    for ctor in ctors {
        let variant_name = to_type_name(&ctor.name);
        variants.push(format!("    {}({}),", variant_name, variant_name));
        match_arms.push(format!(
            "            {} => Ok({}::{}({}::from_tl(value)?)),",
            quote(&ctor.name),
            enum_name,
            variant_name,
            variant_name
        ));
    }
    match_arms.push(format!(
        "            other => Err(TlError::UnexpectedValue {{ expected: {}.to_string(), found: other.to_string() }}),",
        quote(type_name)
    ));

    let enum_def = format!(
        "#[derive(Debug, Clone, PartialEq, Serialize)]\npub enum {} {{\n{}\n}}\n",
        enum_name,
        variants.join("\n")
    );

    let impl_block = format!(
        "impl FromTl for {} {{\n    fn from_tl(value: &Value) -> Result<Self, TlError> {{\n        match value.name() {{\n{}\n        }}\n    }}\n}}\n",
        enum_name,
        match_arms.join("\n")
    );

    format!("{}\n{}", enum_def, impl_block)
}

/// Generates the struct of a constructor or method. Flags fields are not
/// stored: they are derived from the optional fields when encoding.
fn generate_struct(def: &Def) -> String {
    let struct_name = to_type_name(&def.name);
    let mut fields = Vec::new();
    let mut assignments = Vec::new();

    for param in def.params.iter().filter(|p| !p.is_flags()) {
        let rust_field_name = escape_rust_keyword(&to_snake_case(&param.name));

        let mut field_line = String::new();
        if rust_field_name != param.name {
            field_line.push_str(&format!("    #[serde(rename = {})]\n", quote(&param.name)));
        }
        field_line.push_str(&format!("    pub {}: {},", rust_field_name, field_type(param)));
        fields.push(field_line);

        let assignment = match (&param.flag, &param.ty) {
            (Some(_), TypeRef::Primitive(Primitive::True)) => {
                format!("value.get({}).is_some()", quote(&param.name))
            }
            (Some(_), _) => {
                format!("value.get({}).map(FromTl::from_tl).transpose()?", quote(&param.name))
            }
            (None, _) => {
                format!("FromTl::from_tl(required(value, {})?)?", quote(&param.name))
            }
        };
        assignments.push(format!("            {}: {},", rust_field_name, assignment));
    }

    let mut doc = format!("/// `{}`", def.signature);
    if let Some(id) = def.id {
        doc.push_str(&format!(" (`#{:08x}`)", id));
    }

    let struct_def = if fields.is_empty() {
        format!(
            "{}\n#[derive(Debug, Clone, PartialEq, Serialize)]\npub struct {} {{}}\n",
            doc, struct_name
        )
    } else {
        format!(
            "{}\n#[derive(Debug, Clone, PartialEq, Serialize)]\npub struct {} {{\n{}\n}}\n",
            doc,
            struct_name,
            fields.join("\n")
        )
    };

    let value_name = if assignments.is_empty() { "_value" } else { "value" };
    let impl_block = format!(
        "impl FromTl for {} {{\n    fn from_tl({}: &Value) -> Result<Self, TlError> {{\n        Ok({} {{\n{}\n        }})\n    }}\n}}\n",
        struct_name,
        value_name,
        struct_name,
        assignments.join("\n")
    );

    format!("{}\n{}", struct_def, impl_block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile_schema;

    #[test]
    fn names() {
        assert_eq!(to_pascal_case("p_q_inner_data_dc"), "PQInnerDataDc");
        assert_eq!(to_pascal_case("resPQ"), "ResPQ");
        assert_eq!(to_type_name("messages.getChats"), "MessagesGetChats");
        assert_eq!(to_snake_case("sessionID"), "session_id");
        assert_eq!(to_snake_case("first_name"), "first_name");
        assert_eq!(escape_rust_keyword("self"), "self_");
    }

    #[test]
    fn generates_structs_and_enums() {
        let output = compile_schema("
            // LAYER 158
            boolFalse#bc799737 = Bool;
            boolTrue#997275b5 = Bool;
            true#3fedd339 = True;
            userEmpty#d3bc4b7a id:long = User;
            user#abcdef12 flags:# self:flags.10?true id:long first_name:flags.0?string photos:Vector<User> = User;
            ---functions---
            users.getUsers#0d91a548 id:Vector<long> = Vector<User>;
        ").unwrap();
        let code = compile_registry_to_rust(&output.registry);

        assert!(code.contains("pub const LAYER: u32 = 158;"), "{}", code);
        assert!(code.contains("pub struct UserEmpty {\n    pub id: i64,\n}"), "{}", code);
        assert!(code.contains("    #[serde(rename = \"self\")]\n    pub self_: bool,"), "{}", code);
        assert!(code.contains("    pub first_name: Option<String>,"), "{}", code);
        assert!(code.contains("    pub photos: Vec<Box<TypeUser>>,"), "{}", code);
        assert!(!code.contains("pub flags"), "{}", code);
        assert!(code.contains("pub enum TypeUser {\n    UserEmpty(UserEmpty),\n    User(User),\n}"), "{}", code);
        assert!(code.contains("            \"user\" => Ok(TypeUser::User(User::from_tl(value)?)),"), "{}", code);
        assert!(code.contains("pub struct UsersGetUsers {"), "{}", code);
        assert!(code.contains("            first_name: value.get(\"first_name\").map(FromTl::from_tl).transpose()?,"), "{}", code);
        assert!(code.contains("            id: FromTl::from_tl(required(value, \"id\")?)?,"), "{}", code);
        assert!(!code.contains("pub struct BoolTrue"), "{}", code);
        assert!(!code.contains("TypeBool"), "{}", code);
        assert!(code.contains("pub struct True {}"), "{}", code);
    }
}
