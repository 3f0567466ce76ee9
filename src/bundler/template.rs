//! Runtime template
//!
//! Every chunk is rendered into one self-contained script: a registry of module
//! closures, an instance cache, the loader, and a call that boots the entry.

use super::{Chunk, ModuleGraph, ModuleKind};

/// Name of the loader function import calls are rewritten to
pub const LOADER_IDENT: &str = "__modpack_require__";

const MODULES_IDENT: &str = "__modpack_modules__";
const CACHE_IDENT: &str = "__modpack_module_cache__";

/// Quote `value` as a JavaScript string literal
pub fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Body of the synthetic module standing in for an external
pub fn external_source(variable: &str) -> String {
    format!("module.exports = globalThis[{}];", js_string(variable))
}

/// Render a chunk into executable code
pub fn render(chunk: &Chunk, graph: &ModuleGraph) -> String {
    let mut code = String::new();

    code.push_str("(() => {\n");
    code.push_str(&format!("  var {} = {{\n", MODULES_IDENT));

    for id in &chunk.modules {
        let Some(module) = graph.get(id) else {
            continue;
        };

        let origin = match &module.kind {
            ModuleKind::Normal { .. } => "",
            ModuleKind::External { .. } => " (external)",
        };

        code.push_str(&format!(
            "\n/***/ {}: (function (module, exports, {}) {{ // {}{}\n{}\n/***/ }}),\n",
            js_string(id),
            LOADER_IDENT,
            id,
            origin,
            module.source
        ));
    }

    code.push_str("\n  };\n");
    code.push_str(&runtime());
    code.push_str(&format!(
        "  var __modpack_exports__ = {}({});\n",
        LOADER_IDENT,
        js_string(&chunk.entry_module)
    ));
    code.push_str("})();\n");

    code
}

/// Module cache and loader. The instance is cached before its body runs, so a
/// circular require sees the partially filled exports instead of looping.
fn runtime() -> String {
    format!(
        r#"  var {cache} = {{}};

  function {loader}(moduleId) {{
    var cachedModule = {cache}[moduleId];
    if (cachedModule !== undefined) {{
      return cachedModule.exports;
    }}
    if (!Object.prototype.hasOwnProperty.call({modules}, moduleId)) {{
      throw new Error("Cannot find module '" + moduleId + "'");
    }}
    var module = ({cache}[moduleId] = {{ exports: {{}} }});
    {modules}[moduleId].call(module.exports, module, module.exports, {loader});
    return module.exports;
  }}

"#,
        cache = CACHE_IDENT,
        loader = LOADER_IDENT,
        modules = MODULES_IDENT,
    )
}
