use json_mapper::{reflect_struct, JsonData, JsonMapper, JsonWriter, MapperConfig, MapperError};

#[derive(Debug, Default, PartialEq)]
struct Node {
    value: i32,
    child: Option<Box<Node>>,
}

reflect_struct!(Node {
    value: i32,
    child: Option<Box<Node>>,
});

fn chain(len: usize) -> Node {
    let mut node = Node {
        value: 0,
        child: None,
    };
    for value in 1..len {
        node = Node {
            value: value as i32,
            child: Some(Box::new(node)),
        };
    }
    node
}

fn nested_objects(levels: usize) -> String {
    let mut json = String::new();
    for _ in 0..levels {
        json.push_str(r#"{"value":1,"child":"#);
    }
    json.push_str("null");
    for _ in 0..levels {
        json.push('}');
    }
    json
}

fn nested_arrays(levels: usize) -> String {
    format!("{}{}", "[".repeat(levels), "]".repeat(levels))
}

#[test]
fn shallow_graphs_pass() {
    let mapper = JsonMapper::new();
    let json = mapper.to_json(&chain(10)).unwrap();
    let back: Node = mapper.to_object_as(&json).unwrap();
    assert_eq!(back, chain(10));
    assert!(mapper.to_object(&nested_arrays(50)).is_ok());
}

#[test]
fn deep_graph_fails_on_write() {
    let mapper = JsonMapper::new();
    let err = mapper.to_json(&chain(150)).unwrap_err();
    match err {
        MapperError::DepthExceeded { ty, limit } => {
            assert_eq!(limit, 100);
            assert!(ty.contains("Node") || ty == "i32", "{ty}");
        }
        other => panic!("unexpected {other:?}"),
    }
    // The shared writer carries nothing over from the failed call.
    assert_eq!(mapper.to_json(&chain(1)).unwrap(), r#"{"value":0,"child":null}"#);
}

#[test]
fn deep_document_fails_on_typed_read() {
    let mapper = JsonMapper::new();
    assert!(mapper.to_object_as::<Node>(&nested_objects(20)).is_ok());
    let err = mapper.to_object_as::<Node>(&nested_objects(150)).unwrap_err();
    assert!(matches!(err, MapperError::DepthExceeded { limit: 100, .. }));
    assert!(err.to_string().contains("Max allowed object depth"));
}

#[test]
fn deep_document_fails_on_dynamic_read() {
    let mapper = JsonMapper::new();
    let err = mapper.to_object(&nested_arrays(150)).unwrap_err();
    assert!(matches!(err, MapperError::DepthExceeded { .. }));
}

#[test]
fn nested_dynamic_values_count_towards_the_limit() {
    let mapper = JsonMapper::new();
    let nest = |levels: usize| {
        let mut inner = JsonData::Null;
        for _ in 0..levels {
            inner = JsonData::Array(vec![inner]);
        }
        inner
    };
    // The outer list is level 0 and the innermost null sits at level 100.
    let json = mapper.to_json(&vec![nest(99)]).unwrap();
    assert_eq!(json.len(), 2 + 99 * 2 + 4);
    assert!(mapper.to_object(&json).is_ok());

    let deep = vec![nest(150)];
    assert!(matches!(
        mapper.to_json(&deep),
        Err(MapperError::DepthExceeded { limit: 100, .. })
    ));
    assert!(mapper.to_json(&nest(150)).is_err());
    let mut sink = JsonWriter::new();
    assert!(mapper.to_json_into(&nest(101), &mut sink).is_err());
    assert!(mapper.to_json_into(&nest(100), &mut sink).is_ok());
}

#[test]
fn configured_limit_applies() {
    let mapper = JsonMapper::with_config(MapperConfig {
        max_nesting_depth: 3,
        ..MapperConfig::default()
    });
    assert!(mapper.to_json(&chain(3)).is_ok());
    assert!(matches!(
        mapper.to_json(&chain(4)),
        Err(MapperError::DepthExceeded { limit: 3, .. })
    ));
    assert!(mapper.to_object(&nested_arrays(4)).is_ok());
    assert!(mapper.to_object(&nested_arrays(5)).is_err());

    let mut sink = JsonWriter::new();
    assert!(mapper.to_json_into(&chain(4), &mut sink).is_err());
}
