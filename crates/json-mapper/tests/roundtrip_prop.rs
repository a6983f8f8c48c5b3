use json_mapper::{reflect_struct, JsonData, JsonMapper};
use proptest::prelude::*;

fn long() -> impl Strategy<Value = i64> {
    prop_oneof![
        i64::MIN..i64::from(i32::MIN),
        (i64::from(i32::MAX) + 1)..=i64::MAX,
    ]
}

fn json_data() -> impl Strategy<Value = JsonData> {
    let leaf = prop_oneof![
        Just(JsonData::Null),
        any::<bool>().prop_map(JsonData::Boolean),
        any::<i32>().prop_map(JsonData::Int),
        long().prop_map(JsonData::Long),
        (-1.0e6f64..1.0e6).prop_map(JsonData::Double),
        "\\PC{0,12}".prop_map(JsonData::String),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(JsonData::Array),
            prop::collection::vec(("[a-z]{1,6}", inner), 0..6)
                .prop_map(|entries| JsonData::Object(entries.into_iter().collect())),
        ]
    })
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Record {
    id: i64,
    label: String,
    weights: Vec<f64>,
    flag: Option<bool>,
    small: u16,
}

reflect_struct!(Record {
    id: i64,
    label: String,
    weights: Vec<f64>,
    flag: Option<bool>,
    small: u16,
});

fn record() -> impl Strategy<Value = Record> {
    (
        any::<i64>(),
        "\\PC{0,16}",
        prop::collection::vec(-1.0e9f64..1.0e9, 0..5),
        any::<Option<bool>>(),
        any::<u16>(),
    )
        .prop_map(|(id, label, weights, flag, small)| Record {
            id,
            label,
            weights,
            flag,
            small,
        })
}

proptest! {
    #[test]
    fn dynamic_values_survive_text(data in json_data()) {
        let mapper = JsonMapper::new();
        let json = mapper.to_json(&data).unwrap();
        prop_assert_eq!(mapper.to_object(&json).unwrap(), data.clone());

        let mut sink = json_mapper::JsonWriter::new();
        mapper.to_json_into(&data, &mut sink).unwrap();
        prop_assert_eq!(sink.as_str(), json.as_str());
    }

    #[test]
    fn typed_records_survive_text(rec in record()) {
        let mapper = JsonMapper::new();
        let json = mapper.to_json(&rec).unwrap();
        let back: Record = mapper.to_object_as(&json).unwrap();
        prop_assert_eq!(back, rec);
    }
}
