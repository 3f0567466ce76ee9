mod common;

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use modpack_lib::bundler::{Asset, Bundler, LOADER_IDENT};
use modpack_lib::config::{EntryConfig, RuleConfig};
use modpack_lib::plugins::TransformPlugin;
use modpack_lib::BuildError;
use pretty_assertions::assert_eq;
use regex::Regex;

use common::{run_node, Project};

fn util_project() -> Project {
    let project = Project::new();
    project
        .file(
            "src/index.js",
            "const util = require(\"./util\");\nconsole.log(util.greet(\"world\"));\n",
        )
        .file(
            "src/util.js",
            "exports.greet = function (name) { return \"hello \" + name; };\n",
        );
    project
}

#[tokio::test]
async fn test_single_entry_bundle() {
    let project = util_project();

    let stats = Bundler::new(project.config("src/index.js"))
        .unwrap()
        .build()
        .await
        .unwrap();

    assert_eq!(stats.modules().len(), 2);
    assert_eq!(stats.files(), &["main.js".to_string()]);

    let entry = stats.module("./src/index.js").unwrap();
    assert_eq!(entry.dependencies, vec!["./src/util.js".to_string()]);
    assert_eq!(entry.owning_entries, vec!["main".to_string()]);
    assert!(entry
        .source
        .contains(&format!("{}(\"./src/util.js\")", LOADER_IDENT)));
    assert!(!entry.source.contains("require("));

    let bundle = project.read("dist/main.js");
    assert!(bundle.contains("\"./src/index.js\": (function (module, exports, __modpack_require__)"));
    assert!(bundle.contains("\"./src/util.js\": (function (module, exports, __modpack_require__)"));
    assert!(bundle.contains("__modpack_require__(\"./src/index.js\");"));

    if let Some(out) = run_node(&bundle) {
        assert_eq!(out, "hello world\n");
    }
}

#[tokio::test]
async fn test_shared_module_is_built_once_and_owned_by_both_entries() {
    let project = Project::new();
    project
        .file("entry1.js", "require(\"./lib\");\n")
        .file("entry2.js", "require(\"./lib.js\");\n")
        .file("lib.js", "module.exports = 42;\n");

    let mut config = project.config("unused");
    config.entry = EntryConfig::Named(
        [("entry1", "entry1.js"), ("entry2", "entry2.js")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    );
    config.module.rules.push(RuleConfig::new(r"lib\.js$", &["count"]));

    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();
    let plugin = TransformPlugin::new("count", move |source: &str| -> anyhow::Result<String> {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(source.to_string())
    });

    let bundler = Bundler::with_plugins(config, vec![Box::new(plugin)]);
    let stats = bundler.build().await.unwrap();

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(stats.modules().len(), 3);
    assert_eq!(
        stats.module("./lib.js").unwrap().owning_entries,
        vec!["entry1".to_string(), "entry2".to_string()]
    );

    let chunk1 = stats.chunk("entry1").unwrap();
    let chunk2 = stats.chunk("entry2").unwrap();
    assert_eq!(chunk1.modules, vec!["./entry1.js", "./lib.js"]);
    assert_eq!(chunk2.modules, vec!["./lib.js", "./entry2.js"]);

    assert_eq!(stats.files(), &["entry1.js".to_string(), "entry2.js".to_string()]);
    assert!(project.read("dist/entry2.js").contains("\"./lib.js\": (function"));
    assert!(!project.read("dist/entry2.js").contains("\"./entry1.js\""));
}

#[tokio::test]
async fn test_cyclic_imports_terminate_and_share_instances() {
    let project = Project::new();
    project
        .file(
            "a.js",
            "exports.name = \"a\";\nconst b = require(\"./b\");\nconsole.log(b.seen);\n",
        )
        .file("b.js", "const a = require(\"./a\");\nexports.seen = a.name;\n");

    let stats = Bundler::new(project.config("a.js"))
        .unwrap()
        .build()
        .await
        .unwrap();

    assert_eq!(stats.modules().len(), 2);
    assert_eq!(
        stats.module("./b.js").unwrap().dependencies,
        vec!["./a.js".to_string()]
    );

    if let Some(out) = run_node(&project.read("dist/main.js")) {
        assert_eq!(out, "a\n");
    }
}

#[tokio::test]
async fn test_missing_module_fails_without_output() {
    let project = Project::new();
    project.file("index.js", "require(\"./missing\");\n");

    let err = Bundler::new(project.config("index.js"))
        .unwrap()
        .build()
        .await
        .unwrap_err();

    match err {
        BuildError::ModuleNotFound { specifier, context } => {
            assert_eq!(specifier, "./missing");
            assert_eq!(context, project.root());
        }
        other => panic!("expected ModuleNotFound, got {:?}", other),
    }
    assert!(!project.path("dist").exists());
}

#[tokio::test]
async fn test_dynamic_require_is_rejected() {
    let project = Project::new();
    project.file("index.js", "var name = \"./a\";\nrequire(name);\n");

    let err = Bundler::new(project.config("index.js"))
        .unwrap()
        .build()
        .await
        .unwrap_err();

    assert!(
        matches!(err, BuildError::StaticImportRequired { line: 2, column: 1, .. }),
        "got {:?}",
        err
    );
    assert!(!project.path("dist").exists());
}

#[tokio::test]
async fn test_unknown_transform_fails_the_build() {
    let project = Project::new();
    project.file("index.js", "module.exports = 1;\n");

    let mut config = project.config("index.js");
    config.module.rules.push(RuleConfig::new(r"\.js$", &["babel"]));

    let err = Bundler::new(config).unwrap().build().await.unwrap_err();

    match err {
        BuildError::TransformLoad { name, .. } => assert_eq!(name, "babel"),
        other => panic!("expected TransformLoad, got {:?}", other),
    }
    assert!(!project.path("dist").exists());
}

#[tokio::test]
async fn test_every_loader_call_targets_a_registered_module() {
    let project = Project::new();
    project
        .file(
            "src/index.js",
            "var a = require(\"./a\");\nvar b = require(\"./lib/b\");\nconsole.log(a + b);\n",
        )
        .file("src/a.js", "module.exports = require(\"./lib/b\") * 2;\n")
        .file("src/lib/b.js", "module.exports = require(\"../c.json\").value;\n")
        .file("src/c.json", "{ \"value\": 7 }\n");

    let mut config = project.config("src/index.js");
    config.module.rules.push(RuleConfig::new(r"\.json$", &["json"]));

    let stats = Bundler::new(config).unwrap().build().await.unwrap();
    assert_eq!(stats.modules().len(), 4);

    let bundle = project.read("dist/main.js");
    let calls = Regex::new(r#"__modpack_require__\("([^"]+)"\)"#).unwrap();
    let targets: HashSet<&str> = calls
        .captures_iter(&bundle)
        .map(|c| c.get(1).unwrap().as_str())
        .collect();

    assert_eq!(targets.len(), 4);
    for id in targets {
        assert!(
            bundle.contains(&format!("/***/ \"{}\": (function", id)),
            "{} is not in the registry",
            id
        );
    }

    if let Some(out) = run_node(&bundle) {
        assert_eq!(out, "21\n");
    }
}

#[tokio::test]
async fn test_bundle_does_not_leak_runtime_globals() {
    let project = util_project();
    Bundler::new(project.config("src/index.js"))
        .unwrap()
        .build()
        .await
        .unwrap();

    let script = format!(
        "{}\nconsole.log(typeof __modpack_require__, typeof util);",
        project.read("dist/main.js")
    );
    if let Some(out) = run_node(&script) {
        assert_eq!(out, "hello world\nundefined undefined\n");
    }
}

#[tokio::test]
async fn test_content_hash_filename() {
    let project = util_project();
    let mut config = project.config("src/index.js");
    config.output.filename = "[name].[contenthash:10].js".to_string();

    let stats = Bundler::new(config).unwrap().build().await.unwrap();

    let pattern = Regex::new(r"^main\.[0-9a-f]{10}\.js$").unwrap();
    assert_eq!(stats.files().len(), 1);
    assert!(pattern.is_match(&stats.files()[0]), "{}", stats.files()[0]);
    assert!(project.path("dist").join(&stats.files()[0]).is_file());
}

#[tokio::test]
async fn test_hooks_fire_in_lifecycle_order() {
    let project = util_project();
    let mut bundler = Bundler::new(project.config("src/index.js")).unwrap();

    let log = Arc::new(parking_lot::Mutex::new(Vec::new()));

    let l = log.clone();
    bundler.hooks_mut().run.tap("test", move |compilation| {
        l.lock().push(format!("run:{}", compilation.graph.len()));
        Ok(())
    });
    let l = log.clone();
    bundler.hooks_mut().emit.tap("test", move |compilation| {
        l.lock().push(format!("emit:{}", compilation.files.len()));
        compilation.emit_asset("banner.txt", Asset::Text("built".to_string()));
        if let Some(Asset::Text(code)) = compilation.assets.get_mut("main.js") {
            code.insert_str(0, "/* banner */\n");
        }
        Ok(())
    });
    let l = log.clone();
    bundler.hooks_mut().done.tap("test", move |stats| {
        l.lock().push(format!("done:{}", stats.files().len()));
        Ok(())
    });

    bundler.build().await.unwrap();

    assert_eq!(*log.lock(), vec!["run:0", "emit:0", "done:2"]);
    assert_eq!(project.read("dist/banner.txt"), "built");
    assert!(project.read("dist/main.js").starts_with("/* banner */\n"));
}

#[tokio::test]
async fn test_async_emit_is_awaited_before_writing() {
    let project = util_project();
    let mut bundler = Bundler::new(project.config("src/index.js")).unwrap();

    bundler.hooks_mut().emit.tap_async("slow", |compilation| {
        Box::pin(async move {
            tokio::time::sleep(std::time::Duration::from_millis(30)).await;
            compilation.emit_asset("late.txt", Asset::Text("late".to_string()));
            Ok::<(), anyhow::Error>(())
        })
    });

    let stats = bundler.build().await.unwrap();

    assert!(stats.files().contains(&"late.txt".to_string()));
    assert_eq!(project.read("dist/late.txt"), "late");
}

#[tokio::test]
async fn test_async_emit_failure_aborts_persistence() {
    let project = util_project();
    let mut bundler = Bundler::new(project.config("src/index.js")).unwrap();

    bundler.hooks_mut().emit.tap_async("uploader", |_| {
        Box::pin(async {
            tokio::task::yield_now().await;
            Err::<(), _>(anyhow::anyhow!("upload refused"))
        })
    });

    let err = bundler.build().await.unwrap_err();

    match err {
        BuildError::AsyncHookFailure { hook, plugin, source } => {
            assert_eq!(hook, "emit");
            assert_eq!(plugin, "uploader");
            assert_eq!(source.to_string(), "upload refused");
        }
        other => panic!("expected AsyncHookFailure, got {:?}", other),
    }
    assert!(!project.path("dist").exists());
}

#[tokio::test]
async fn test_builds_are_independent() {
    let project = util_project();
    let bundler = Bundler::new(project.config("src/index.js")).unwrap();

    let first = bundler.build().await.unwrap();
    let second = bundler.build().await.unwrap();

    assert_eq!(first.modules().len(), second.modules().len());
    assert_eq!(first.assets(), second.assets());
}

#[tokio::test]
async fn test_module_without_imports_runs_like_the_original() {
    let source = "var total = 0;\nfor (var i = 1; i <= 4; i++) { total += i; }\nconsole.log(\"total\", total);\n";
    let project = Project::new();
    project.file("index.js", source);

    let stats = Bundler::new(project.config("index.js"))
        .unwrap()
        .build()
        .await
        .unwrap();

    let module = stats.module("./index.js").unwrap();
    assert!(module.dependencies.is_empty());
    assert_eq!(module.source, source);

    let bundled = run_node(&project.read("dist/main.js"));
    if let (Some(bundled), Some(direct)) = (bundled, run_node(source)) {
        assert_eq!(bundled, direct);
    }
}

#[tokio::test]
async fn test_failed_write_keeps_earlier_chunks_out_of_dist() {
    let project = Project::new();
    project
        .file("a.js", "module.exports = \"a\";\n")
        .file("b.js", "module.exports = \"b\";\n")
        .file("dist/b.js/keep", "");

    let mut config = project.config("unused");
    config.entry = EntryConfig::Named(
        [("a", "a.js"), ("b", "b.js")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    );

    let err = Bundler::new(config).unwrap().build().await.unwrap_err();

    assert!(matches!(err, BuildError::Io { .. }), "got {:?}", err);
    assert!(!project.path("dist/a.js").exists());
    assert!(project.path("dist/b.js/keep").is_file());
}

#[tokio::test]
async fn test_hashbang_entry_still_runs() {
    let project = Project::new();
    project
        .file(
            "cli.js",
            "#!/usr/bin/env node\nconsole.log(require(\"./greeting\"));\n",
        )
        .file("greeting.js", "#!/usr/bin/env node\nmodule.exports = \"hi\";\n");

    Bundler::new(project.config("cli.js"))
        .unwrap()
        .build()
        .await
        .unwrap();

    let bundle = project.read("dist/main.js");
    assert!(!bundle.contains("#!"));

    if let Some(out) = run_node(&bundle) {
        assert_eq!(out, "hi\n");
    }
}

#[tokio::test]
async fn test_emitted_asset_outside_output_dir_is_rejected() {
    let project = util_project();
    let mut bundler = Bundler::new(project.config("src/index.js")).unwrap();

    bundler.hooks_mut().emit.tap("escape", |compilation| {
        compilation.emit_asset("../escaped.js", Asset::Text("x".to_string()));
        Ok(())
    });

    let err = bundler.build().await.unwrap_err();

    assert!(matches!(err, BuildError::InvalidAssetName { .. }), "got {:?}", err);
    assert!(!project.path("escaped.js").exists());
    assert!(!project.path("dist").exists());
}
