use promitto::bundle::{self, GraphBuilder};
use promitto::BundleError;

use std::fs;
use std::path::Path;

use tempfile::TempDir;

fn write_module(dir: &Path, name: &str, source: &str) {
    fs::write(dir.join(name), source).expect("failed to lay out test module");
}

#[test]
fn test_graph_assigns_sequential_ids_breadth_first() {
    let dir = TempDir::new().expect("tempdir");

    write_module(
        dir.path(),
        "entry.js",
        "import message from './message.js'\nimport name from './name.js'\nconsole.log(message + name)\n",
    );
    write_module(dir.path(), "message.js", "export default 'hello '\n");
    write_module(dir.path(), "name.js", "export default 'world'\n");

    let graph = GraphBuilder::new()
        .build(dir.path().join("entry.js"))
        .expect("graph should build");

    assert_eq!(graph.len(), 3);
    assert_eq!(
        graph.iter().map(|module| module.id).collect::<Vec<_>>(),
        vec![0, 1, 2],
        "ids should be assigned in discovery order"
    );
    assert_eq!(graph[0].mapping["./message.js"], 1);
    assert_eq!(graph[0].mapping["./name.js"], 2);
}

#[test]
fn test_diamond_imports_share_one_module() {
    let dir = TempDir::new().expect("tempdir");

    write_module(
        dir.path(),
        "entry.js",
        "import left from './left.js'\nimport right from './right.js'\n",
    );
    write_module(dir.path(), "left.js", "import util from './util.js'\nexport default util\n");
    write_module(dir.path(), "right.js", "import util from './util.js'\nexport default util\n");
    write_module(dir.path(), "util.js", "export default 1\n");

    let graph = GraphBuilder::new()
        .build(dir.path().join("entry.js"))
        .expect("graph should build");

    assert_eq!(graph.len(), 4, "the shared dependency should appear once");

    let left = &graph[1];
    let right = &graph[2];
    assert_eq!(
        left.mapping["./util.js"], right.mapping["./util.js"],
        "both importers should map the specifier to the same id"
    );
}

#[test]
fn test_cyclic_imports_terminate() {
    let dir = TempDir::new().expect("tempdir");

    write_module(dir.path(), "a.js", "import b from './b.js'\nexport default 'a'\n");
    write_module(dir.path(), "b.js", "import a from './a.js'\nexport default 'b'\n");

    let graph = GraphBuilder::new()
        .build(dir.path().join("a.js"))
        .expect("a cycle should not diverge");

    assert_eq!(graph.len(), 2);
    assert_eq!(graph[0].mapping["./b.js"], 1);
    assert_eq!(graph[1].mapping["./a.js"], 0);
}

#[test]
fn test_id_counter_is_owned_by_the_builder_instance() {
    let dir = TempDir::new().expect("tempdir");

    write_module(dir.path(), "one.js", "export default 1\n");
    write_module(dir.path(), "two.js", "export default 2\n");

    let mut builder = GraphBuilder::new();

    let first = builder.build(dir.path().join("one.js")).expect("build one");
    let second = builder.build(dir.path().join("two.js")).expect("build two");

    assert_eq!(first[0].id, 0);
    assert_eq!(
        second[0].id, 1,
        "ids should stay sequential across builds from one builder"
    );

    let fresh = GraphBuilder::new()
        .build(dir.path().join("one.js"))
        .expect("independent builder");
    assert_eq!(fresh[0].id, 0, "a fresh builder starts counting from zero");
}

#[test]
fn test_loader_contains_every_module_body() {
    let dir = TempDir::new().expect("tempdir");

    write_module(
        dir.path(),
        "entry.js",
        "import greeting from './greeting.js'\nconsole.log(greeting)\n",
    );
    write_module(dir.path(), "greeting.js", "export default 'hi'\n");

    let graph = GraphBuilder::new()
        .build(dir.path().join("entry.js"))
        .expect("graph should build");
    let loader = bundle::bundle(&graph).expect("loader should render");

    assert!(loader.contains("const greeting = require('./greeting.js');"));
    assert!(loader.contains("module.exports = 'hi'"));
    assert!(loader.contains("console.log(greeting)"));
    assert!(
        loader.contains("require(0)"),
        "the loader should start at the entry module"
    );
    assert!(loader.contains("{\"./greeting.js\":1}"));
}

#[test]
fn test_write_bundle_creates_the_output_directory() {
    let dir = TempDir::new().expect("tempdir");

    write_module(dir.path(), "entry.js", "export default 0\n");

    let graph = GraphBuilder::new()
        .build(dir.path().join("entry.js"))
        .expect("graph should build");

    let out = dir.path().join("dist").join("main.js");
    bundle::write_bundle(&graph, &out).expect("write should succeed");

    let written = fs::read_to_string(&out).expect("bundle file should exist");
    assert!(written.contains("module.exports = 0"));
}

#[test]
fn test_missing_module_is_an_io_error() {
    let dir = TempDir::new().expect("tempdir");

    write_module(dir.path(), "entry.js", "import gone from './gone.js'\n");

    let error = GraphBuilder::new()
        .build(dir.path().join("entry.js"))
        .expect_err("a missing dependency should fail the build");

    assert!(
        matches!(error, BundleError::Io { ref path, .. } if path.ends_with("gone.js")),
        "unexpected error: {error:?}"
    );
}

#[test]
fn test_malformed_import_is_a_parse_error() {
    let dir = TempDir::new().expect("tempdir");

    write_module(dir.path(), "entry.js", "import broken from ./no-quotes.js\n");

    let error = GraphBuilder::new()
        .build(dir.path().join("entry.js"))
        .expect_err("an unquoted specifier should fail the build");

    assert!(
        matches!(error, BundleError::Parse { ref message, .. } if message.contains("line 1")),
        "unexpected error: {error:?}"
    );
}
