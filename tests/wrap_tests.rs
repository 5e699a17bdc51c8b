//! Wrap/unwrap tests: decoding canonical JSON and reproducing it

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use docshape::{
    BooleanProperty, DateProperty, DateTimeProperty, DecimalProperty, DictProperty, Error,
    FloatProperty, IntegerProperty, ListProperty, ObjectProperty, PropertyOptionsExt, Schema,
    StringProperty, TimeProperty, Value, ValueKind,
};
use rust_decimal::Decimal;
use serde_json::json;

fn address() -> Arc<Schema> {
    Schema::builder("Address")
        .property("street", StringProperty::new())
        .property("zip", StringProperty::new().named("postal_code"))
        .build()
        .unwrap()
}

fn customer() -> Arc<Schema> {
    Schema::builder("Customer")
        .property("name", StringProperty::new().required())
        .property("active", BooleanProperty::new())
        .property("visits", IntegerProperty::new())
        .property("score", FloatProperty::new())
        .property("joined", DateProperty::new())
        .property("balance", DecimalProperty::new())
        .property("address", ObjectProperty::new(address()))
        .property("tags", ListProperty::of(ValueKind::String))
        .property("limits", DictProperty::of(ValueKind::Integer))
        .build()
        .unwrap()
}

mod round_trip_tests {
    use super::*;

    #[test]
    fn test_full_document_round_trips() {
        let raw = json!({
            "name": "Danny",
            "active": true,
            "visits": 12,
            "score": 4.5,
            "joined": "2014-02-04",
            "balance": "10.50",
            "address": {"street": "Main St", "postal_code": "02139"},
            "tags": ["vip", "early"],
            "limits": {"daily": 3, "weekly": 10},
        });
        let doc = customer().wrap(&raw).unwrap();
        assert_eq!(doc.to_json().unwrap(), raw);
    }

    #[test]
    fn test_typed_view_carries_native_values() {
        let doc = customer()
            .wrap(&json!({"name": "Danny", "joined": "2014-02-04", "balance": "10.50"}))
            .unwrap();
        assert_eq!(
            doc.attr("joined").unwrap().as_date(),
            NaiveDate::from_ymd_opt(2014, 2, 4)
        );
        assert_eq!(
            doc.attr("balance").unwrap().as_decimal(),
            Some(Decimal::new(1050, 2))
        );
        let address = doc.attr("address").unwrap().as_object().unwrap();
        assert_eq!(address.attr("zip").unwrap(), &Value::Null);
    }

    #[test]
    fn test_to_json_is_a_deep_copy() {
        let doc = customer().wrap(&json!({"name": "Danny", "tags": ["a"]})).unwrap();
        let mut out = doc.to_json().unwrap();
        out["tags"].as_array_mut().unwrap().push(json!("b"));
        out["name"] = json!("Mallory");
        assert_eq!(doc.canonical().get("tags"), Some(&json!(["a"])));
        assert_eq!(doc.attr("name").unwrap(), &Value::from("Danny"));
    }

    #[test]
    fn test_unknown_fields_are_kept() {
        let raw = json!({"name": "Danny", "note": "hello", "when": "2014-02-04T10:00:00Z"});
        let doc = customer().wrap(&raw).unwrap();
        let out = doc.to_json().unwrap();
        assert_eq!(out["note"], json!("hello"));
        assert_eq!(out["when"], json!("2014-02-04T10:00:00Z"));
    }

    #[test]
    fn test_wrap_rejects_non_objects() {
        assert!(customer().wrap(&json!([1, 2])).unwrap_err().is_bad_value());
    }
}

mod conversion_tests {
    use super::*;

    #[test]
    fn test_scalar_type_mismatch() {
        let schema = customer();
        for raw in [
            json!({"name": 3}),
            json!({"name": "a", "visits": "3"}),
            json!({"name": "a", "visits": 1.5}),
            json!({"name": "a", "active": 1}),
            json!({"name": "a", "joined": "04/02/2014"}),
            json!({"name": "a", "tags": "vip"}),
            json!({"name": "a", "tags": [1]}),
            json!({"name": "a", "address": "Main St"}),
        ] {
            let err = schema.wrap(&raw).unwrap_err();
            assert!(err.is_bad_value(), "{} gave {:?}", raw, err);
        }
    }

    #[test]
    fn test_integer_promotes_to_float() {
        let mut doc = customer().wrap(&json!({"name": "a", "score": 3})).unwrap();
        assert_eq!(doc.attr("score").unwrap(), &Value::Float(3.0));
        doc.set_attr("score", 7).unwrap();
        assert_eq!(doc.canonical()["score"], json!(7.0));
    }

    #[test]
    fn test_decimal_canonical_text() {
        let mut doc = customer().wrap(&json!({"name": "a"})).unwrap();
        doc.set_attr("balance", Decimal::new(20, 1)).unwrap();
        assert_eq!(doc.canonical()["balance"], json!("2.0"));
        doc.set_attr("balance", 3).unwrap();
        assert_eq!(doc.canonical()["balance"], json!("3"));
        doc.set_attr("balance", 5.25).unwrap();
        assert_eq!(doc.canonical()["balance"], json!("5.25"));
        assert!(doc.set_attr("balance", "5.25").is_err());
    }

    #[test]
    fn test_datetime_formats() {
        let schema = Schema::builder("Event")
            .property("at", DateTimeProperty::new())
            .property("exact_at", DateTimeProperty::new().exact())
            .property("time", TimeProperty::new())
            .build()
            .unwrap();
        let doc = schema
            .wrap(&json!({
                "at": "2014-02-04T10:11:12.345Z",
                "exact_at": "2014-02-04T10:11:12.345000Z",
                "time": "10:11:12",
            }))
            .unwrap();
        assert_eq!(doc.canonical()["at"], json!("2014-02-04T10:11:12Z"));
        assert_eq!(doc.canonical()["exact_at"], json!("2014-02-04T10:11:12.345000Z"));
        assert_eq!(
            doc.attr("time").unwrap().as_time(),
            NaiveTime::from_hms_opt(10, 11, 12)
        );

        let err = schema.wrap(&json!({"exact_at": "2014-02-04T10:11:12Z"})).unwrap_err();
        assert!(err.is_bad_value());
    }

    #[test]
    fn test_inferred_date_round_trips() {
        let schema = Schema::builder("Loose").build().unwrap();
        let doc = schema.wrap(&json!({"d": "2014-02-04"})).unwrap();
        assert_eq!(doc.get("d"), Some(&Value::Date(NaiveDate::from_ymd_opt(2014, 2, 4).unwrap())));
        assert_eq!(doc.to_json().unwrap()["d"], json!("2014-02-04"));
    }

    #[test]
    fn test_inference_recurses_through_untyped_containers() {
        let schema = Schema::builder("Loose").build().unwrap();
        let doc = schema
            .wrap(&json!({"events": [{"on": "2014-02-04", "cost": "1.50"}]}))
            .unwrap();
        let events = doc.get("events").unwrap().as_array().unwrap();
        let event = events.get(0).unwrap().as_dict().unwrap();
        assert_eq!(event.get("on").unwrap().kind(), Some(ValueKind::Date));
        assert_eq!(event.get("cost").unwrap().as_decimal(), Some(Decimal::new(150, 2)));
        assert_eq!(
            doc.to_json().unwrap(),
            json!({"events": [{"on": "2014-02-04", "cost": "1.50"}]})
        );
    }

    #[test]
    fn test_unmatched_strings_stay_strings() {
        let schema = Schema::builder("Loose").build().unwrap();
        let doc = schema.wrap(&json!({"d": "2014-13-45", "s": "plain"})).unwrap();
        assert_eq!(doc.get("d"), Some(&Value::from("2014-13-45")));
        assert_eq!(doc.get("s"), Some(&Value::from("plain")));
    }
}

mod choice_tests {
    use super::*;

    fn shirt() -> Arc<Schema> {
        Schema::builder("Shirt")
            .property(
                "size",
                StringProperty::new().choices(["S", "M", "L"]).with_default("M"),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_choices_enforced_on_every_path() {
        let schema = shirt();
        assert!(schema.wrap(&json!({"size": "XL"})).unwrap_err().is_bad_value());

        let err = Schema::construct(&schema, Default::default(), [("size", "XL")]).unwrap_err();
        assert_eq!(err, Error::BadValue(r#""XL" not in choices: ["S", "M", "L"]"#.into()));

        let mut doc = schema.instance().unwrap();
        assert_eq!(doc.attr("size").unwrap(), &Value::from("M"));
        assert!(doc.set_attr("size", "XL").is_err());
        assert!(doc.set("size", "XL").is_err());
        assert_eq!(doc.canonical()["size"], json!("M"));
        doc.set_attr("size", "L").unwrap();
        assert_eq!(doc.to_json().unwrap(), json!({"size": "L"}));
    }

    #[test]
    fn test_null_passes_choices() {
        let mut doc = shirt().instance().unwrap();
        doc.set_attr("size", Value::Null).unwrap();
        assert_eq!(doc.to_json().unwrap(), json!({"size": null}));
    }
}

mod identity_tests {
    use super::*;

    #[test]
    fn test_rewrapping_a_bound_container_keeps_its_backing() {
        let schema = customer();
        let mut first = schema
            .wrap(&json!({"name": "a", "tags": ["x", "y"]}))
            .unwrap();
        let tags = first.attr("tags").unwrap().clone();
        let mut second = schema.wrap(&json!({"name": "b"})).unwrap();
        second.set_attr("tags", tags.clone()).unwrap();
        assert_eq!(second.attr("tags").unwrap(), &tags);
        assert_eq!(second.canonical()["tags"], first.canonical()["tags"]);

        let rewrapped = schema.wrap(&first.to_json().unwrap()).unwrap();
        assert_eq!(rewrapped.attr("tags").unwrap(), &tags);

        first.set_attr("tags", vec!["z"]).unwrap();
        assert_eq!(second.canonical()["tags"], json!(["x", "y"]));
    }

    #[test]
    fn test_objects_are_not_built_from_plain_maps() {
        let mut doc = customer().wrap(&json!({"name": "a"})).unwrap();
        let plain = docshape::value::map([("street", "Main St")]);
        assert!(doc.set_attr("address", plain).unwrap_err().is_bad_value());

        let address = address().wrap(&json!({"street": "Main St"})).unwrap();
        doc.set_attr("address", address).unwrap();
        assert_eq!(doc.canonical()["address"], json!({"street": "Main St", "postal_code": null}));
    }

    #[test]
    fn test_object_of_another_schema_is_rejected() {
        let other = Schema::builder("Other")
            .property("street", StringProperty::new())
            .build()
            .unwrap();
        let mut doc = customer().wrap(&json!({"name": "a"})).unwrap();
        let foreign = other.wrap(&json!({"street": "Elm"})).unwrap();
        assert!(doc.set_attr("address", foreign).is_err());
    }
}

mod serde_tests {
    use super::*;

    #[test]
    fn test_document_round_trips_through_text() -> anyhow::Result<()> {
        let text = r#"{"name": "Danny", "visits": 3, "balance": "10.50", "tags": ["a"]}"#;
        let raw: serde_json::Value = serde_json::from_str(text)?;
        let schema = customer();
        let doc = schema.wrap(&raw)?;
        let emitted = serde_json::to_string(&doc)?;
        let again = schema.wrap(&serde_json::from_str(&emitted)?)?;
        assert_eq!(again, doc);
        assert_ne!(customer().wrap(&raw)?, doc);
        assert_eq!(again.get("balance"), Some(&Value::from(Decimal::new(1050, 2))));
        Ok(())
    }
}
