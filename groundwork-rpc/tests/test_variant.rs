use bson::{bson, doc, Bson};

use groundwork_rpc::{
    variant::{decode, decode_map, encode, encode_map, variant},
    Error,
};

#[test]
fn test_roundtrip_law() {
    let values = vec![
        Bson::Boolean(true),
        Bson::String("Europe/Prague".into()),
        bson!(["us", "cz"]),
        bson!({ "layouts": [["us", "qwerty"], ["cz", ""]] }),
        bson!({ "environment": { "t": "s", "v": "workstation" } }),
    ];

    for value in values {
        let tagged = encode(value.clone()).unwrap();
        assert_eq!(decode(tagged), value);
    }
}

#[test]
fn test_signature_inference() {
    assert_eq!(encode(Bson::Boolean(false)).unwrap().signature, "b");
    assert_eq!(encode(Bson::String("x".into())).unwrap().signature, "s");
    assert_eq!(encode(bson!(["a", "b"])).unwrap().signature, "as");
    assert_eq!(
        encode(bson!({ "cz": [["qwerty"], ["qwertz"]] }))
            .unwrap()
            .signature,
        "a{saas}"
    );
    assert_eq!(
        encode(bson!({ "environment": "workstation" }))
            .unwrap()
            .signature,
        "a{sv}"
    );
}

#[test]
fn test_uninferable_shape_is_an_error() {
    assert!(matches!(
        encode(Bson::Int32(42)),
        Err(Error::Signature(_))
    ));
    assert!(matches!(
        encode_map(doc! { "steps": 3 }),
        Err(Error::Signature(_))
    ));
}

#[test]
fn test_encode_map() {
    let encoded = encode_map(doc! {
        "hostname": "ntp.example.org",
        "options": ["iburst"],
        "pool": true,
    })
    .unwrap();

    assert_eq!(
        encoded,
        doc! {
            "hostname": { "t": "s", "v": "ntp.example.org" },
            "options": { "t": "as", "v": ["iburst"] },
            "pool": { "t": "b", "v": true },
        }
    );
}

#[test]
fn test_encode_map_omits_absent_entries() {
    let encoded = encode_map(doc! {
        "environment": "workstation",
        "groups": Bson::Null,
    })
    .unwrap();

    assert_eq!(
        encoded,
        doc! { "environment": { "t": "s", "v": "workstation" } }
    );
}

#[test]
fn test_decode_map() {
    let decoded = decode_map(&doc! {
        "environment": { "t": "s", "v": "workstation" },
        "groups": { "t": "as", "v": ["core"] },
    })
    .unwrap();

    assert_eq!(
        decoded,
        doc! { "environment": "workstation", "groups": ["core"] }
    );
}

#[test]
fn test_decode_map_rejects_untagged_entries() {
    assert!(matches!(
        decode_map(&doc! { "environment": "workstation" }),
        Err(Error::ResultType(_))
    ));
}

#[test]
fn test_explicit_variant_constructor() {
    let tagged = variant("aa{sv}", bson!([{ "name": { "t": "s", "v": "admin" } }]));

    assert_eq!(tagged.signature, "aa{sv}");
    assert_eq!(
        bson::to_bson(&tagged).unwrap(),
        bson!({ "t": "aa{sv}", "v": [{ "name": { "t": "s", "v": "admin" } }] })
    );
}
