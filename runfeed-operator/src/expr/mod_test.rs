use anyhow::Result;
use serde_json::json;

use super::*;

fn metadata() -> HashMap<String, Value> {
    let doc = json!({
        "pushed": 1,
        "stage": "prod",
        "accuracy": 0.93,
        "approved": true,
        "tags": ["gpu", "nightly"],
        "labels": {"team": "search", "tier": "gold"},
        "uri": "gs://models/search/v3",
    });
    serde_json::from_value(doc).unwrap_or_default()
}

fn eval(src: &str) -> Result<bool> {
    let expr: Expr = src.parse()?;
    Ok(expr.evaluate(&metadata())?)
}

#[test]
fn comparisons_evaluate_against_metadata() -> Result<()> {
    let cases = [
        ("pushed == 1", true),
        ("pushed == 2", false),
        ("pushed != 2", true),
        ("stage == prod", true),
        (r#"stage == "prod""#, true),
        ("stage == `dev`", false),
        ("accuracy == 0.93", true),
        ("approved == true", true),
        ("approved != true", false),
        ("labels.team == search", true),
        ("gpu in tags", true),
        ("cpu in tags", false),
        ("cpu not in tags", true),
        ("tags contains nightly", true),
        ("tags not contains nightly", false),
        ("team in labels", true),
        ("uri contains search", true),
        (r#"uri matches "^gs://models/.*/v[0-9]+$""#, true),
        (r#"uri not matches "^s3://""#, true),
    ];
    for (src, expected) in cases {
        let matched = eval(src)?;
        assert!(matched == expected, "unexpected result for `{}`, got {}, expected {}", src, matched, expected);
    }
    Ok(())
}

#[test]
fn boolean_operators_respect_precedence() -> Result<()> {
    let cases = [
        ("pushed == 1 and stage == prod", true),
        ("pushed == 2 or stage == prod", true),
        ("pushed == 2 or stage == dev and approved == true", false),
        ("(pushed == 2 or stage == prod) and approved == true", true),
        ("not pushed == 2", true),
        ("not (pushed == 1 and stage == prod)", false),
        ("pushed == 1 and not cpu in tags", true),
    ];
    for (src, expected) in cases {
        let matched = eval(src)?;
        assert!(matched == expected, "unexpected result for `{}`, got {}, expected {}", src, matched, expected);
    }
    Ok(())
}

#[test]
fn literal_is_coerced_to_selected_type() -> Result<()> {
    let mut metadata = HashMap::new();
    metadata.insert("pushed".to_string(), json!("1"));
    let expr: Expr = "pushed == 1".parse()?;
    let matched = expr.evaluate(&metadata)?;
    assert!(matched, "expected numeric literal to match string value");
    Ok(())
}

#[test]
fn missing_selector_is_an_error() -> Result<()> {
    let expr: Expr = "missing == 1".parse()?;
    let res = expr.evaluate(&metadata());
    assert!(
        res == Err(ExprError::MissingSelector("missing".into())),
        "unexpected result for missing selector, got {:?}",
        res
    );

    let expr: Expr = "labels.owner == x".parse()?;
    let res = expr.evaluate(&metadata());
    assert!(res.is_err(), "expected nested missing selector to error, got {:?}", res);
    Ok(())
}

#[test]
fn uncoercible_literal_is_an_error() -> Result<()> {
    let cases = ["pushed == abc", "approved == yes", "labels == x", "pushed matches `1`"];
    for src in cases {
        let expr: Expr = src.parse()?;
        let res = expr.evaluate(&metadata());
        assert!(matches!(res, Err(ExprError::TypeMismatch { .. })), "expected type mismatch for `{}`, got {:?}", src, res);
    }
    Ok(())
}

#[test]
fn malformed_filters_are_rejected() {
    let cases = [
        "",
        "pushed ==",
        "pushed = 1",
        "== 1",
        "(pushed == 1",
        "pushed == 1)",
        "pushed == 1 and",
        r#"stage == "prod"#,
        "stage matches `[`",
        "pushed 1",
        "and == 1",
        "labels..team == x",
        "pushed == 1 # comment",
    ];
    for src in cases {
        let res = src.parse::<Expr>();
        assert!(matches!(res, Err(ExprError::Parse { .. })), "expected parse error for `{}`, got {:?}", src, res);
    }
}

#[test]
fn keywords_only_match_whole_words() -> Result<()> {
    let mut metadata = HashMap::new();
    metadata.insert("notes".to_string(), json!("ok"));
    metadata.insert("android".to_string(), json!(true));
    metadata.insert("index".to_string(), json!(["orange"]));
    let cases = [
        ("notes == ok", true),
        ("android == true and notes != bad", true),
        ("orange in index", true),
        ("not notes == ok or android == false", false),
    ];
    for (src, expected) in cases {
        let expr: Expr = src.parse()?;
        let matched = expr.evaluate(&metadata)?;
        assert!(matched == expected, "unexpected result for `{}`, got {}, expected {}", src, matched, expected);
    }
    Ok(())
}
