use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rulegraph::{find_entry, Entry, EntryTable, FilterContext, RESPONSE_CATEGORY_ORDER};

/// A response table of `n` entries spread over the standard categories, with
/// a mix of behavior, trigger and parent filters.
fn build_table(n: usize) -> EntryTable {
    let entries = (0..n)
        .map(|i| {
            let category = RESPONSE_CATEGORY_ORDER[i % RESPONSE_CATEGORY_ORDER.len()];
            let mut entry = Entry::new(&format!("response {i}"), category);
            if i % 3 == 0 {
                entry = entry.with_behavior(&format!("behavior {}", i % 5));
            }
            if i % 7 == 0 {
                entry = entry.with_trigger_filter(["collide", "tap"]);
            }
            if i % 11 == 0 {
                entry = entry.with_parent_type_filter(["repeat"]);
            }
            entry
        })
        .collect();
    EntryTable::new(entries)
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_entry");

    for &n in &[20, 80] {
        let table = build_table(n);
        let last = format!("response {}", n - 1);

        group.bench_function(&format!("{n}_entries_hit_last"), |b| {
            b.iter(|| find_entry(black_box(&last), table.entries()));
        });
        group.bench_function(&format!("{n}_entries_miss"), |b| {
            b.iter(|| find_entry(black_box("none"), table.entries()));
        });
    }

    group.finish();
}

fn bench_picker(c: &mut Criterion) {
    let mut group = c.benchmark_group("picker");

    let ctx = FilterContext::new()
        .with_active_behaviors(["behavior 0", "behavior 2"])
        .with_trigger("collide")
        .with_parent_type("repeat");

    for &n in &[20, 80] {
        let table = build_table(n);

        group.bench_function(&format!("{n}_entries_visible"), |b| {
            b.iter(|| table.visible(black_box(&ctx)).len());
        });
        group.bench_function(&format!("{n}_entries_categories"), |b| {
            b.iter(|| {
                table
                    .visible_categories(black_box(&ctx), RESPONSE_CATEGORY_ORDER)
                    .len()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_lookup, bench_picker);
criterion_main!(benches);
