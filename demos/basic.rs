use rulegraph::{Condition, Edit, Response, ResponsePath, Rule, Trigger};

fn main() {
    // Start from an empty rule and build it up one edit at a time.
    let rule = Rule::new().with_trigger(Trigger::new("collide"));

    let rule = rule
        .apply(
            &ResponsePath::root(),
            Edit::InsertBefore(Response::action("play sound").expect("plain action")),
        )
        .expect("insert into empty rule");

    let rule = rule
        .apply(&ResponsePath::root(), Edit::WrapInCondition)
        .and_then(|r| {
            r.apply(
                &ResponsePath::root(),
                Edit::SetCondition(Condition::new("random chance").with_param("probability", 0.5)),
            )
        })
        .expect("wrap and pick a condition");

    let rule = rule
        .apply(
            &ResponsePath::root().then(),
            Edit::InsertBefore(
                Response::action("wait")
                    .expect("plain action")
                    .with_param("duration", 0.25),
            ),
        )
        .expect("insert inside the conditional");

    println!("{rule}");
    println!();

    // The previous version is still intact; undo is just keeping it.
    let flattened = rule
        .apply(&ResponsePath::root(), Edit::Remove)
        .expect("remove the conditional");
    println!("{flattened}");
    println!();

    for row in rule.preview_rows() {
        let marker = if row.order == 0 && row.indent > 1 { "->" } else { "  " };
        let label = row.name().unwrap_or("else");
        println!("{}{marker} {label}", "  ".repeat(row.indent));
    }
}
