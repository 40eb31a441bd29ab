//! Query-phase integration tests driven by a declarative case table.

use serde::Deserialize;
use treestream::{DfsCursor, TreeLinks, TreeStream, from_json};

const WORLD: &str = r#"
{
    "name": "world",
    "children": [
        {"name": "terrain", "children": [
            {"name": "patch"},
            {"name": "patch"},
            {"name": "water"}
        ]},
        {"name": "actors", "children": [
            {"name": "player", "children": [{"name": "inventory"}]},
            {"name": "water"}
        ]}
    ]
}"#;

const CASES: &str = r#"
[
    {"path": ["terrain"], "found": true, "rebuilt": "world/terrain"},
    {"path": ["terrain", "water"], "found": true, "rebuilt": "world/terrain/water"},
    {"path": ["actors", "player", "inventory"], "found": true,
     "rebuilt": "world/actors/player/inventory"},
    {"path": ["actors", "water"], "found": true, "rebuilt": "world/actors/water"},
    {"path": ["water"], "found": false, "rebuilt": null},
    {"path": ["terrain", "player"], "found": false, "rebuilt": null},
    {"path": ["actors", "player", "patch"], "found": false, "rebuilt": null},
    {"path": [], "found": true, "rebuilt": "world"}
]"#;

#[derive(Deserialize)]
struct QueryCase {
    path: Vec<String>,
    found: bool,
    rebuilt: Option<String>,
}

fn world_stream() -> TreeStream {
    TreeStream::from_node(&from_json(WORLD).unwrap(), None)
}

#[test]
fn path_queries_match_case_table() {
    let stream = world_stream();
    let cases: Vec<QueryCase> = serde_json::from_str(CASES).unwrap();

    for case in &cases {
        let path: Vec<&str> = case.path.iter().map(String::as_str).collect();
        let tag = stream.find_tag(stream.root(), &path);
        assert_eq!(
            tag.is_some(),
            case.found,
            "find_tag mismatch for path {:?}",
            case.path
        );
        if let Some(tag) = tag {
            assert_eq!(
                stream.rebuild_path(tag),
                case.rebuilt,
                "rebuild_path mismatch for path {:?}",
                case.path
            );
        }
    }
}

#[test]
fn rebuild_inverts_find_for_every_named_tag() {
    let stream = world_stream();
    let mut cursor = DfsCursor::new(&stream);
    while cursor.move_next(&stream, false) {
        let tag = cursor.current();
        let rebuilt = stream.rebuild_path(tag).expect("every tag here is named");
        let segments: Vec<&str> = rebuilt.split('/').skip(1).collect();
        let found = stream
            .find_tag(stream.root(), &segments)
            .expect("rebuilt path must resolve");
        // Duplicate names resolve to the first match in document order,
        // which is also the first one the rebuilt path can describe.
        assert_eq!(stream.rebuild_path(found).as_deref(), Some(rebuilt.as_str()));
    }
}

#[test]
fn objects_memoize_across_query_styles() {
    let mut stream = world_stream();

    let by_path = stream.find_object(stream.root(), &["actors", "player"]).unwrap();
    let by_scan = stream.find_first_object(stream.root(), "player").unwrap();
    assert_eq!(by_path, by_scan);
    assert_eq!(stream.object_count(), 1);
}

#[test]
fn jumps_splice_a_second_stream() {
    const DETAIL: &str = r#"
    {
        "name": "detail",
        "children": [{"name": "lod0"}, {"name": "lod1"}]
    }"#;

    let mut stream = world_stream();
    let detail: TreeStream = TreeStream::from_node(&from_json(DETAIL).unwrap(), None);

    let mut links = TreeLinks::new();
    let link = links.push(&detail);

    let water = stream.find_tag(stream.root(), &["terrain", "water"]).unwrap();
    stream.set_jump(water, link);

    let mut cursor = DfsCursor::new(&stream);
    let mut visited = Vec::new();
    while cursor.move_next_linked(&stream, &mut links, false) {
        let name = match cursor.link_index() {
            None => cursor.current_name(&stream).to_string(),
            Some(index) => format!("{}:{}", "detail", links.current_name(index)),
        };
        visited.push(name);
    }

    assert_eq!(
        visited,
        vec![
            "terrain",
            "patch",
            "patch",
            "water",
            "detail:lod0",
            "detail:lod1",
            "actors",
            "player",
            "inventory",
            "water",
        ]
    );
}
