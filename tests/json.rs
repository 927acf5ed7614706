use serde_json::{json, Value};
use worldtext::{
    is_candidate,
    json::{extract_json_text, translate_json},
    TextMapping,
};

fn extract(value: &Value) -> Vec<String> {
    let mut output = Vec::new();
    extract_json_text(value, &mut output);
    output
}

#[test]
fn candidate_boundary() {
    assert!(!is_candidate(""));
    assert!(!is_candidate("abc"));
    assert!(!is_candidate("café ÿ"));
    assert!(is_candidate("日本語"));
    assert!(is_candidate("Ā"));
}

#[test]
fn text_and_extra_are_translated() {
    let mapping: TextMapping = [("A", "一"), ("B", "二")].into_iter().collect();
    let value = json!({"text": "A", "extra": [{"text": "B"}]});

    assert_eq!(
        translate_json(&value, &mapping),
        json!({"text": "一", "extra": [{"text": "二"}]})
    );
}

#[test]
fn extraction_is_depth_first() {
    let value = json!([
        {"text": "一", "extra": [{"text": "二"}, "三"]},
        {"text": {"text": "四"}, "color": "五"},
        42,
        null
    ]);

    assert_eq!(extract(&value), ["一", "二", "三", "四"]);
}

#[test]
fn other_keys_are_preserved() {
    let mapping: TextMapping =
        [("こんにちは", "你好"), ("red", "赤")].into_iter().collect();
    let value = json!({
        "text": "こんにちは",
        "color": "red",
        "clickEvent": {"action": "run_command", "value": "/say こんにちは"}
    });

    assert_eq!(
        translate_json(&value, &mapping),
        json!({
            "text": "你好",
            "color": "red",
            "clickEvent": {"action": "run_command", "value": "/say こんにちは"}
        })
    );
}

#[test]
fn empty_translations_keep_original_field() {
    let mapping: TextMapping = [("看板", "")].into_iter().collect();
    let value = json!({"text": "看板", "extra": ["看板"]});

    assert_eq!(
        translate_json(&value, &mapping),
        json!({"text": "看板", "extra": [""]})
    );
}

#[test]
fn empty_mapping_is_identity() {
    let mapping = TextMapping::default();
    let value = json!({
        "text": "",
        "extra": [{"text": "こんにちは", "bold": true}, 1.5, ["x"]],
        "italic": false
    });

    assert_eq!(translate_json(&value, &mapping), value);
}

#[test]
fn translation_is_idempotent() {
    let mapping: TextMapping =
        [("ようこそ", "欢迎"), ("世界", "世间")].into_iter().collect();
    let value = json!([
        {"text": "ようこそ", "extra": [{"text": "世界"}, "未訳"]},
        "ようこそ"
    ]);

    let once = translate_json(&value, &mapping);
    let twice = translate_json(&once, &mapping);

    assert_eq!(once, twice);
    assert_eq!(
        once,
        json!([
            {"text": "欢迎", "extra": [{"text": "世间"}, "未訳"]},
            "欢迎"
        ])
    );
}
