use rulegraph::{
    Catalog, Edit, FilterContext, Response, ResponsePath, Rule, Trigger, RESPONSE_CATEGORY_ORDER,
};

const CATALOG: &str = r#"{
    "triggers": [{ "name": "collide", "category": "general" }],
    "responses": [
        { "name": "wait", "category": "logic", "initialParams": { "duration": 1 } },
        { "name": "play sound", "category": "sound", "behaviorName": "Sounds" },
        { "name": "bounce", "category": "motion", "triggerFilter": ["collide"] },
        { "name": "fly away", "category": "motion", "triggerFilter": ["tap"] },
        { "name": "repeat", "category": "logic", "behaviorId": 16,
          "initialParams": { "count": 2, "body": { "name": "none" } } },
        { "name": "stop repeating", "category": "logic", "parentTypeFilter": ["repeat"] }
    ]
}"#;

fn show(catalog: &Catalog, ctx: &FilterContext) {
    for category in catalog
        .responses
        .visible_categories(ctx, RESPONSE_CATEGORY_ORDER)
    {
        let names: Vec<&str> = category.entries.iter().map(|e| e.label()).collect();
        println!("  {:<8} {}", category.name, names.join(", "));
    }
}

fn main() {
    let catalog = Catalog::from_json_str(CATALOG).expect("catalog should parse");

    let trigger = Trigger::from_entry(catalog.trigger("collide").expect("collide entry"))
        .expect("trigger from entry");
    let repeat = Response::from_entry(catalog.response("repeat").expect("repeat entry"))
        .expect("repeat from entry");
    let rule = Rule::new()
        .with_trigger(trigger)
        .apply(&ResponsePath::root(), Edit::InsertBefore(repeat))
        .expect("insert repeat");

    println!("top level, no behaviors:");
    let top = ResponsePath::root().next();
    show(
        &catalog,
        &FilterContext::for_position(&rule, &top, std::iter::empty()),
    );

    println!("inside the repeat, with Sounds:");
    show(
        &catalog,
        &FilterContext::for_position(&rule, &ResponsePath::root().body(), ["Sounds"]),
    );
}
