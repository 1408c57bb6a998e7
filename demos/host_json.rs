use rulegraph::{Edit, ResponsePath, Rule};

fn main() {
    // A rule as a host hands it over: nested objects linked by `nextResponse`.
    let document = r#"{
        "trigger": { "name": "tap", "params": {} },
        "response": {
            "name": "wait",
            "params": {
                "duration": { "expressionType": "random", "params": { "min": 1, "max": 2 } },
                "nextResponse": { "name": "jump", "params": { "height": 3.5 } }
            }
        }
    }"#;

    let rule = Rule::from_json_str(document).expect("host document should decode");
    println!("{rule}");

    let edited = rule
        .apply(&ResponsePath::at(1), Edit::WrapInRepeat)
        .and_then(|r| r.apply(&ResponsePath::root(), Edit::MoveDown))
        .expect("wrap and reorder");

    println!("{edited}");
    println!("{}", serde_json::to_string_pretty(&edited.to_json()).expect("json value"));
}
