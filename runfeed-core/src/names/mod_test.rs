use anyhow::Result;

use super::*;

#[test]
fn parse_renders_back_to_same_value() -> Result<()> {
    let cases = vec![
        NamespacedName::new("ns", "name"),
        NamespacedName::named("name"),
        NamespacedName::new("a-namespace", "a.name-with.dots"),
    ];
    for expected in cases {
        let rendered = expected.try_to_string()?;
        let parsed: NamespacedName = rendered.parse()?;
        assert!(parsed == expected, "unexpected value after parsing {}, got {:?}, expected {:?}", rendered, parsed, expected);
    }
    Ok(())
}

#[test]
fn namespace_without_name_can_not_be_rendered() {
    let res = NamespacedName::new("ns", "").try_to_string();
    assert!(res == Err(CoreError::NamespaceWithoutName), "expected rendering to fail, got {:?}", res);
}

#[test]
fn parse_empty_string_yields_empty_value() -> Result<()> {
    let parsed: NamespacedName = "".parse()?;
    assert!(parsed.is_empty(), "expected empty value, got {:?}", parsed);
    assert!(parsed.non_empty().is_none(), "expected empty value to be dropped");
    Ok(())
}

#[test]
fn parse_rejects_malformed_strings() {
    let res = "a/b/c".parse::<NamespacedName>();
    assert!(res == Err(CoreError::TooManySeparators), "unexpected result for `a/b/c`, got {:?}", res);
    for val in ["/name", "ns/", "/"] {
        let res = val.parse::<NamespacedName>();
        assert!(res == Err(CoreError::EmptySegment), "unexpected result for `{}`, got {:?}", val, res);
    }
}

#[test]
fn serde_uses_string_form() -> Result<()> {
    let name = NamespacedName::new("ns", "name");
    let json = serde_json::to_string(&name)?;
    assert!(json == "\"ns/name\"", "unexpected json, got {}, expected {}", json, "\"ns/name\"");

    let parsed: NamespacedName = serde_json::from_str("\"bare\"")?;
    assert!(parsed == NamespacedName::named("bare"), "unexpected value, got {:?}", parsed);

    let res = serde_json::to_string(&NamespacedName::new("ns", ""));
    assert!(res.is_err(), "expected serialization of a namespace without a name to fail");
    Ok(())
}
