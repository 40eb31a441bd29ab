//! Build a world-definition stream from JSON, query it, and patch a field
//! in place.
//!
//! cargo run --package treestream --example world_query

use treestream::{Entry, Field, FieldKind, Schema, TreeStream, from_json, to_json};

const SPAWN: Schema = Schema::new(&[
    Field { name: "x", offset: 0, kind: FieldKind::F32 },
    Field { name: "y", offset: 4, kind: FieldKind::F32 },
    Field { name: "hp", offset: 8, kind: FieldKind::U16 },
]);

fn main() -> Result<(), treestream::Error> {
    // 12-byte spawn body: x = 1.0, y = 2.0, hp = 100.
    let world = from_json(
        r#"{
            "name": "world",
            "children": [
                {"name": "terrain"},
                {"name": "actors", "children": [
                    {"name": "player", "type": 5, "body": "AACAPwAAAEBkAAAA"}
                ]}
            ]
        }"#,
    )?;

    let mut stream: TreeStream = TreeStream::from_node(&world, None);

    let player = stream.find_tag(stream.root(), &["actors", "player"]).unwrap();
    println!("found {}", stream.rebuild_path(player).unwrap());

    let entry = Entry::of_tag(player);
    let hp = SPAWN.field("hp").unwrap();
    println!("hp = {}", entry.get(stream.store(), hp));

    // Writes change the value in place without reshaping the tree.
    entry.set(stream.store_mut(), hp, 250.0);
    println!("hp = {}", entry.get(stream.store(), hp));

    println!("{}", to_json(&stream)?);
    Ok(())
}
