use rulegraph::{Edit, ResponsePath, Rule};

fn main() {
    let rule = Rule::from_file("demos/bounce.rule").expect("failed to load rule");

    println!("{rule}");
    println!("{} responses", rule.node_count());

    // Drop the conditional but keep both of its branches.
    let edited = rule
        .apply(&ResponsePath::at(1), Edit::Remove)
        .expect("remove conditional");
    println!("{edited}");
}
