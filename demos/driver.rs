//! External driver (§6): populates a tree with `N` payloads, performs a
//! region search, an id lookup, a delete, and an update, then emits the
//! introspection view as JSON. Not part of the library surface: a consumer
//! is free to re-author this however they like; it exists only to exercise
//! the public operations end to end, in the manner of the teacher's
//! `examples/boxes.rs`/`big_tree.rs`.

use anyhow::Result;
use rand::Rng;

use geortree::{Payload, RTree, Shape};

const N: u64 = 200;
const WORLD_SIDE: f64 = 1_000.0;
const MAX_SIDE_LENGTH: f64 = 40.0;

fn main() -> Result<()> {
    let mut tree = RTree::new(8)?;
    let mut rng = rand::thread_rng();

    for id in 0..N {
        let x = rng.gen_range(0.0..=WORLD_SIDE);
        let y = rng.gen_range(0.0..=WORLD_SIDE);
        let side = rng.gen_range(1.0..=MAX_SIDE_LENGTH);
        let shape = Shape::rect(x, y, x + side, y + side);
        tree.insert(Payload::new(id, format!("box-{id}")), shape);
    }

    let region = Shape::rect(0.0, 0.0, WORLD_SIDE / 4.0, WORLD_SIDE / 4.0);
    let hits = tree.search(&region);
    println!("search over a quarter of the world found {} payloads", hits.len());

    match tree.search_by_id(0) {
        Some(payload) => println!("searchById(0) -> {payload:?}"),
        None => println!("searchById(0) -> absent"),
    }

    let deleted = tree.delete_by_id(1);
    println!("deleteById(1) -> {deleted}");

    let updated = tree.update_by_id(2, Shape::disk(WORLD_SIDE / 2.0, WORLD_SIDE / 2.0, 50.0));
    println!("updateById(2, disk) -> {updated}");

    let dump = tree.introspect();
    println!("{}", serde_json::to_string_pretty(&dump)?);

    Ok(())
}
