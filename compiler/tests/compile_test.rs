#![cfg(test)]

use brine_tl_compiler::{
    compile_schema, compile_sources, strip_schema,
    error::TlError,
    CompileOptions, SchemaSource,
};
use brine_tl_schema::{DefKind, Primitive, TypeRef, Value};

const MTPROTO: &str = r#"
// Core types
int ? = Int;
long ? = Long;
string ? = String;
vector#1cb5c415 {t:Type} # [ t ] = Vector t;

boolFalse#bc799737 = Bool;
boolTrue#997275b5 = Bool;
true#3fedd339 = True;
error#c4b9f9bb code:int text:string = Error;

/* messages */
message#5bb8e511 msg_id:long seqno:int bytes:int body:Object = Message;
msg_container#73f1f8dc messages:vector<%Message> = MessageContainer;

---functions---
ping#7abe77ec ping_id:long = Pong;
"#;

const API: &str = r#"
// LAYER 158
pong#347773c5 msg_id:long ping_id:long = Pong;

userEmpty#d3bc4b7a id:long = User;
user#abcdef12 flags:# self:flags.10?true id:long first_name:flags.0?string verified:flags.1?Bool = User;

config#cc1a241e date:int test_mode:Bool = Config;

---functions---
help.getConfig#c4f9186b = Config;
users.getUsers#0d91a548 id:Vector<long> = Vector<User>;
invokeWithLayer#da9b0d0d {X:Type} layer:int query:!X = X;
"#;

fn sources() -> Vec<SchemaSource> {
    vec![SchemaSource::new("mtproto.tl", MTPROTO), SchemaSource::new("api.tl", API)]
}

#[test]
fn test_compile_sources() {
    let output = compile_sources(&sources(), &CompileOptions::default()).expect("compile_sources failed");
    let registry = &output.registry;

    assert_eq!(registry.layer(), Some(158));
    assert_eq!(registry.methods().count(), 4);
    assert_eq!(registry.constructors().count(), 10);
    assert_eq!(registry.len(), 14);

    let error = registry.lookup_by_id(0xc4b9f9bb).expect("error constructor");
    assert_eq!(error.name, "error");
    assert_eq!(error.kind, DefKind::Constructor);
    assert_eq!(error.signature, "error code:int text:string = Error");

    let getusers = registry.lookup_by_name("users.getUsers").expect("users.getUsers");
    assert_eq!(getusers.kind, DefKind::Method);
    assert_eq!(getusers.namespace(), Some("users"));

    let users: Vec<_> = registry.constructors_of("User").map(|d| d.name.as_str()).collect();
    assert_eq!(users, ["userEmpty", "user"]);

    // `user#abcdef12` keeps its declared id but is reported
    let user = output.warnings.iter().find(|w| w.name == "user").expect("user warning");
    assert_eq!(user.declared, 0xabcdef12);
    assert_eq!(registry.lookup_by_id(0xabcdef12).unwrap().name, "user");

    for name in ["boolFalse", "boolTrue", "true", "error", "ping", "pong", "userEmpty", "invokeWithLayer"] {
        assert!(!output.warnings.iter().any(|w| w.name == name), "unexpected warning for {}", name);
    }
}

#[test]
fn test_known_ids_validate_cleanly() {
    let output = compile_schema("
        boolFalse#bc799737 = Bool;
        boolTrue#997275b5 = Bool;
        true#3fedd339 = True;
        error#c4b9f9bb code:int text:string = Error;
    ").unwrap();
    assert!(output.warnings.is_empty(), "{:?}", output.warnings);
}

#[test]
fn test_flags_round_trip() {
    let output = compile_schema("user#abcdef12 flags:# id:long first_name:flags.0?string = User;").unwrap();
    let registry = &output.registry;

    let full = Value::object("user", [("id", Value::Long(1)), ("first_name", Value::String("A".into()))]);
    let bytes = registry.encode(&full).unwrap();
    assert_eq!(
        bytes,
        [
            0x12, 0xef, 0xcd, 0xab, // id
            0x01, 0x00, 0x00, 0x00, // flags
            0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // id:long
            0x01, b'A', 0x00, 0x00, // first_name
        ]
    );
    assert_eq!(registry.decode(&bytes).unwrap(), full);

    let bare = Value::object("user", [("id", Value::Long(1))]);
    let bytes = registry.encode(&bare).unwrap();
    assert_eq!(&bytes[4..8], [0, 0, 0, 0]);
    assert_eq!(bytes.len(), 16);
    let decoded = registry.decode(&bytes).unwrap();
    assert_eq!(decoded, bare);
    assert!(decoded.get("first_name").is_none());
}

#[test]
fn test_true_flags_and_bools() {
    let output = compile_sources(&sources(), &CompileOptions::default()).unwrap();
    let registry = &output.registry;

    let user = Value::object(
        "user",
        [
            ("self", Value::True),
            ("id", Value::Long(7)),
            ("verified", Value::Bool(false)),
        ],
    );
    let bytes = registry.encode(&user).unwrap();
    let flags = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    assert_eq!(flags, (1 << 10) | (1 << 1));
    assert_eq!(&bytes[bytes.len() - 4..], 0xbc799737u32.to_le_bytes());
    assert_eq!(registry.decode(&bytes).unwrap(), user);
}

#[test]
fn test_generic_invoke() {
    let output = compile_sources(&sources(), &CompileOptions::default()).unwrap();
    let registry = &output.registry;

    let request = Value::object(
        "invokeWithLayer",
        [
            ("layer", Value::Int(158)),
            ("query", Value::object("help.getConfig", Vec::<(String, Value)>::new())),
        ],
    );
    let bytes = registry.encode(&request).unwrap();
    assert_eq!(&bytes[..4], 0xda9b0d0du32.to_le_bytes());
    assert_eq!(&bytes[4..8], 158i32.to_le_bytes());
    assert_eq!(&bytes[8..], 0xc4f9186bu32.to_le_bytes());
    assert_eq!(registry.decode(&bytes).unwrap(), request);

    assert_eq!(
        registry.result_type(&request).unwrap(),
        TypeRef::Named { name: "Config".into(), bare: false }
    );

    let get_users = Value::object("users.getUsers", [("id", Value::Vector(vec![Value::Long(1)]))]);
    assert_eq!(
        registry.result_type(&get_users).unwrap(),
        TypeRef::Vector {
            element: Box::new(TypeRef::Named { name: "User".into(), bare: false }),
            bare:    false,
        }
    );
}

#[test]
fn test_bare_message_container() {
    let output = compile_sources(&sources(), &CompileOptions::default()).unwrap();
    let registry = &output.registry;

    let ping = Value::object("ping", [("ping_id", Value::Long(9))]);
    let container = Value::object(
        "msg_container",
        [(
            "messages",
            Value::Vector(vec![Value::object(
                "message",
                [
                    ("msg_id", Value::Long(1)),
                    ("seqno", Value::Int(1)),
                    ("bytes", Value::Int(12)),
                    ("body", ping),
                ],
            )]),
        )],
    );
    let bytes = registry.encode(&container).unwrap();
    // bare vector: count directly after the constructor id, no vector id
    assert_eq!(&bytes[4..8], 1i32.to_le_bytes());
    // bare message: msg_id follows without the message constructor id
    assert_eq!(&bytes[8..16], 1i64.to_le_bytes());
    assert_eq!(registry.decode(&bytes).unwrap(), container);
}

#[test]
fn test_stripped_schema_compiles_identically() {
    let options = CompileOptions::default();
    let original = compile_sources(&sources(), &options).unwrap();
    let stripped: Vec<_> = sources()
        .iter()
        .map(|s| SchemaSource::new(s.name.clone(), strip_schema(&s.text)))
        .collect();
    let stripped = compile_sources(&stripped, &options).unwrap();

    let a: Vec<_> = original.registry.iter().map(|d| (d.name.clone(), d.id, d.signature.clone())).collect();
    let b: Vec<_> = stripped.registry.iter().map(|d| (d.name.clone(), d.id, d.signature.clone())).collect();
    assert_eq!(a, b);
    assert!(original.registry.layer().is_some());
    assert_eq!(stripped.registry.layer(), original.registry.layer());
}

#[test]
fn test_abstract_missing_ids() {
    let options = CompileOptions { derive_missing_ids: false };
    let output = compile_sources(
        &[SchemaSource::new("a.tl", "message msg_id:long body:Object = Message;\nping#7abe77ec ping_id:long = Pong;")],
        &options,
    )
    .unwrap();
    let registry = &output.registry;
    assert!(registry.lookup_by_name("message").unwrap().is_abstract());

    let err = registry
        .encode(&Value::object("message", [("msg_id", Value::Long(1)), ("body", Value::object("ping", [("ping_id", Value::Long(1))]))]))
        .unwrap_err();
    assert_eq!(err.to_string(), brine_tl_schema::EncodeError::Abstract("message".into()).to_string());

    let derived = compile_sources(
        &[SchemaSource::new("a.tl", "message msg_id:long body:Object = Message;")],
        &CompileOptions::default(),
    )
    .unwrap();
    let message = derived.registry.lookup_by_name("message").unwrap();
    assert_eq!(message.id, Some(brine_tl_compiler::signature_id("message msg_id:long body:Object = Message")));
    assert_eq!(message.params[1].ty, TypeRef::Any);
    assert_eq!(message.params[0].ty, TypeRef::Primitive(Primitive::Long));
}

#[test]
fn test_duplicates_across_sources() {
    let options = CompileOptions::default();

    let same = compile_sources(
        &[
            SchemaSource::new("a.tl", "boolTrue#997275b5 = Bool;"),
            SchemaSource::new("b.tl", "boolTrue#997275b5 = Bool;"),
        ],
        &options,
    )
    .unwrap();
    assert_eq!(same.registry.len(), 1);

    let err = compile_sources(
        &[
            SchemaSource::new("a.tl", "boolTrue#997275b5 = Bool;"),
            SchemaSource::new("b.tl", "boolYes#997275b5 = Bool;"),
        ],
        &options,
    )
    .unwrap_err();
    match err {
        TlError::DuplicateId { id, first, second } => {
            assert_eq!(id, 0x997275b5);
            assert_eq!(first, "boolTrue (a.tl:1:1)");
            assert_eq!(second, "boolYes (b.tl:1:1)");
        }
        other => panic!("expected DuplicateId but got {:?}", other),
    }

    let err = compile_sources(
        &[
            SchemaSource::new("a.tl", "boolTrue#997275b5 = Bool;"),
            SchemaSource::new("b.tl", "boolTrue#00000001 = Bool;"),
        ],
        &options,
    )
    .unwrap_err();
    assert!(matches!(err, TlError::SchemaError(ref msg) if msg.contains("declared twice")), "{:?}", err);
}

#[test]
fn test_compile_errors() {
    let err = compile_schema("user#00000001 photo:Photo = User;").unwrap_err();
    assert!(matches!(err, TlError::SchemaError(_)), "{:?}", err);

    let err = compile_schema("user#00000001 id:long = User").unwrap_err();
    assert!(matches!(err, TlError::ParseError { line: 1, column: 29, .. }), "{:?}", err);

    let err = compile_schema("user#abcdef123 id:long = User;").unwrap_err();
    assert!(matches!(err, TlError::ParseError { .. }), "{:?}", err);
}
