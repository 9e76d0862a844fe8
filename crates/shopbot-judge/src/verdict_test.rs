use super::*;

const GOOD: &str = r#"{"price": 4.99, "currency": "usd", "relevance_score": 9,
    "price_accuracy_score": 8, "is_region_fit": true, "reasoning": " Exact match. "}"#;

#[test]
fn parses_well_formed_verdict() {
    let v = parse_verdict(GOOD).unwrap();
    assert!((v.price - 4.99).abs() < f64::EPSILON);
    assert_eq!(v.currency, "USD");
    assert_eq!(v.relevance_score, 9);
    assert_eq!(v.price_accuracy_score, 8);
    assert!(v.is_region_fit);
    assert_eq!(v.reasoning, "Exact match.");
}

#[test]
fn integer_price_is_accepted() {
    let raw = GOOD.replace("4.99", "12");
    assert!((parse_verdict(&raw).unwrap().price - 12.0).abs() < f64::EPSILON);
}

#[test]
fn code_fenced_and_prose_wrapped_output_is_unwrapped() {
    let fenced = format!("```json\n{GOOD}\n```");
    assert!(parse_verdict(&fenced).is_ok());

    let prose = format!("Sure! Here is the verdict: {GOOD} Hope that helps.");
    assert!(parse_verdict(&prose).is_ok());
}

#[test]
fn extra_keys_are_ignored() {
    let raw = GOOD.replace("\"reasoning\"", "\"confidence\": \"high\", \"reasoning\"");
    assert!(parse_verdict(&raw).is_ok());
}

#[test]
fn non_json_is_rejected() {
    assert_eq!(
        parse_verdict("I could not find a price."),
        Err(VerdictError::NoJsonObject)
    );
    assert!(matches!(
        parse_verdict("{price: 4.99}"),
        Err(VerdictError::InvalidJson(_))
    ));
}

#[test]
fn missing_field_is_rejected() {
    let raw = r#"{"price": 4.99, "currency": "USD", "relevance_score": 9,
        "price_accuracy_score": 8, "reasoning": "no region"}"#;
    let err = parse_verdict(raw).unwrap_err();
    assert!(matches!(err, VerdictError::InvalidJson(ref m) if m.contains("is_region_fit")));
}

#[test]
fn wrong_types_are_rejected() {
    let string_price = GOOD.replace("4.99", "\"4.99\"");
    assert!(matches!(
        parse_verdict(&string_price),
        Err(VerdictError::InvalidJson(_))
    ));

    let fractional_score = GOOD.replace("\"relevance_score\": 9", "\"relevance_score\": 8.5");
    assert!(matches!(
        parse_verdict(&fractional_score),
        Err(VerdictError::InvalidJson(_))
    ));

    let string_bool = GOOD.replace("true", "\"yes\"");
    assert!(matches!(
        parse_verdict(&string_bool),
        Err(VerdictError::InvalidJson(_))
    ));

    let null_price = GOOD.replace("4.99", "null");
    assert!(matches!(
        parse_verdict(&null_price),
        Err(VerdictError::InvalidJson(_))
    ));
}

#[test]
fn scores_outside_one_to_ten_are_rejected() {
    let zero = GOOD.replace("\"relevance_score\": 9", "\"relevance_score\": 0");
    assert_eq!(
        parse_verdict(&zero),
        Err(VerdictError::ScoreOutOfRange {
            field: "relevance_score",
            value: 0
        })
    );

    let eleven = GOOD.replace("\"price_accuracy_score\": 8", "\"price_accuracy_score\": 11");
    assert_eq!(
        parse_verdict(&eleven),
        Err(VerdictError::ScoreOutOfRange {
            field: "price_accuracy_score",
            value: 11
        })
    );
}

#[test]
fn negative_price_is_rejected() {
    let raw = GOOD.replace("4.99", "-1.0");
    assert_eq!(parse_verdict(&raw), Err(VerdictError::InvalidPrice(-1.0)));
}

#[test]
fn currency_must_be_three_letters() {
    for bad in ["\"US$\"", "\"DOLLARS\"", "\"\"", "\"E1R\""] {
        let raw = GOOD.replace("\"usd\"", bad);
        assert!(
            matches!(parse_verdict(&raw), Err(VerdictError::InvalidCurrency(_))),
            "accepted currency {bad}"
        );
    }
}

#[test]
fn strip_wrappers_requires_braces() {
    assert_eq!(strip_wrappers("no object"), None);
    assert_eq!(strip_wrappers("} {"), None);
    assert_eq!(strip_wrappers("x {\"a\": 1} y"), Some("{\"a\": 1}"));
}
