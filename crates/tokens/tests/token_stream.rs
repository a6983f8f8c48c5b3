use json_mapper_tokens::{
    JsonError, JsonReader, JsonToken, JsonWriter, TokenSink, TokenSource, TokenValue,
};

/// Pipes every token of `input` straight into a writer.
fn echo(input: &str) -> Result<String, JsonError> {
    let mut reader = JsonReader::new(input);
    let mut writer = JsonWriter::new();
    let mut in_object = Vec::new();
    let mut expect_key = false;
    while reader.read()? {
        let token = reader.token();
        if expect_key && token == JsonToken::String {
            if let Some(name) = reader.value().as_str() {
                writer.write_property_name(name)?;
            }
            expect_key = false;
            continue;
        }
        match (token, reader.value()) {
            (JsonToken::ObjectStart, _) => {
                writer.write_object_start()?;
                in_object.push(true);
            }
            (JsonToken::ArrayStart, _) => {
                writer.write_array_start()?;
                in_object.push(false);
            }
            (JsonToken::ObjectEnd, _) => {
                writer.write_object_end()?;
                in_object.pop();
            }
            (JsonToken::ArrayEnd, _) => {
                writer.write_array_end()?;
                in_object.pop();
            }
            (_, TokenValue::Null) => writer.write_null()?,
            (_, TokenValue::Bool(b)) => writer.write_bool(*b)?,
            (_, TokenValue::Int(i)) => writer.write_i32(*i)?,
            (_, TokenValue::Long(l)) => writer.write_i64(*l)?,
            (_, TokenValue::Double(d)) => writer.write_f64(*d)?,
            (_, TokenValue::String(s)) => writer.write_str(s)?,
        }
        expect_key = in_object.last().copied().unwrap_or(false);
        if matches!(token, JsonToken::ArrayStart) {
            expect_key = false;
        }
    }
    Ok(writer.into_string())
}

#[test]
fn echo_preserves_compact_documents() {
    let cases = [
        "null",
        "true",
        "42",
        "-7",
        "3000000000",
        "1.5",
        r#""text""#,
        "[]",
        "{}",
        r#"[1,[2,[3]],{"k":"v"}]"#,
        r#"{"a":1,"b":[1,2,3],"c":{"d":null}}"#,
    ];
    for case in cases {
        assert_eq!(echo(case).unwrap(), case, "case {case}");
    }
}

#[test]
fn echo_output_matches_serde_json() {
    let input = r#"{ "name" : "café", "tags": [ "a", "b" ], "n": 10 }"#;
    let out = echo(input).unwrap();
    let ours: serde_json::Value = serde_json::from_str(&out).unwrap();
    let theirs: serde_json::Value = serde_json::from_str(input).unwrap();
    assert_eq!(ours, theirs);
}

#[test]
fn malformed_input_surfaces_reader_error() {
    assert!(echo("[1,2").is_err());
    assert!(echo(r#"{"a":}"#).is_err());
}
