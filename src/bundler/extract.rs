//! Dependency extraction
//!
//! Parses a module with oxc, finds every `require("...")` call, resolves its
//! specifier and rewrites the call to the runtime loader with the dependency's
//! canonical id.

use std::path::{Path, PathBuf};

use oxc_allocator::Allocator;
use oxc_ast::ast::{Argument, CallExpression, Expression};
use oxc_ast::visit::walk;
use oxc_ast::Visit;
use oxc_parser::{ParseOptions, Parser};
use oxc_span::{SourceType, Span};
use tracing::debug;

use super::template::{js_string, LOADER_IDENT};
use crate::error::{BuildError, BuildResult};
use crate::hooks::{ExternalModule, Hooks, RequireCall, ResolveData};
use crate::resolver::Resolver;

/// Identifier of the import call recognised in module sources
pub const REQUIRE_IDENT: &str = "require";

/// What a dependency id points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyTarget {
    File(PathBuf),
    External(ExternalModule),
}

/// One resolved import of a module
#[derive(Debug, Clone)]
pub struct Dependency {
    /// Canonical id the call was rewritten to
    pub id: String,

    /// The specifier as written
    pub request: String,

    pub target: DependencyTarget,
}

/// Result of extracting a module's dependencies
#[derive(Debug, Clone)]
pub struct Extracted {
    /// Source with every import call rewritten
    pub source: String,

    /// Distinct dependencies in first-use order
    pub dependencies: Vec<Dependency>,
}

/// Canonical id of a request claimed as external
pub fn external_module_id(request: &str) -> String {
    format!("external {}", js_string(request))
}

struct RequireSite {
    callee: Span,
    call: Span,
    argument: Result<(String, Span), &'static str>,
}

#[derive(Default)]
struct RequireCollector {
    sites: Vec<RequireSite>,
}

impl<'a> Visit<'a> for RequireCollector {
    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if let Expression::Identifier(ident) = &call.callee {
            if ident.name == REQUIRE_IDENT {
                let argument = match (call.arguments.len(), call.arguments.first()) {
                    (0, _) => Err("missing argument"),
                    (1, Some(Argument::StringLiteral(lit))) => {
                        Ok((lit.value.to_string(), lit.span))
                    }
                    (1, _) => Err("argument is not a string literal"),
                    _ => Err("more than one argument"),
                };

                self.sites.push(RequireSite {
                    callee: ident.span,
                    call: call.span,
                    argument,
                });
            }
        }

        walk::walk_call_expression(self, call);
    }
}

/// Parse `source`, resolve its import calls and rewrite them to loader calls
pub fn extract_dependencies(
    source: &str,
    module_path: &Path,
    resolver: &Resolver,
    hooks: &Hooks,
) -> BuildResult<Extracted> {
    let allocator = Allocator::default();
    // Modules run inside a plain function wrapper: sloppy mode, top-level `return` allowed.
    let options = ParseOptions {
        allow_return_outside_function: true,
        ..ParseOptions::default()
    };
    let parsed = Parser::new(&allocator, source, SourceType::cjs())
        .with_options(options)
        .parse();

    if parsed.panicked || !parsed.errors.is_empty() {
        let message = parsed
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(BuildError::Parse {
            module: module_path.to_path_buf(),
            message,
        });
    }

    let mut collector = RequireCollector::default();
    collector.visit_program(&parsed.program);

    let context = module_path.parent().unwrap_or(Path::new("."));
    let mut edits: Vec<(Span, String)> = Vec::new();
    let mut dependencies: Vec<Dependency> = Vec::new();

    // A hashbang is only legal at the very start of a script; keep it as a comment.
    if let Some(hashbang) = &parsed.program.hashbang {
        let start = hashbang.span.start;
        edits.push((Span::new(start, start + 2), "//".to_string()));
    }

    for site in collector.sites {
        let (request, argument_span) = site.argument.map_err(|reason| {
            let (line, column) = line_column(source, site.call.start);
            BuildError::StaticImportRequired {
                module: module_path.to_path_buf(),
                line,
                column,
                reason,
            }
        })?;

        hooks.require_call.call(&RequireCall {
            request: request.clone(),
            module: module_path.to_path_buf(),
        })?;

        let factorized = hooks.factorize.call(&ResolveData {
            request: request.clone(),
            context: context.to_path_buf(),
        });

        let dependency = match factorized {
            Some(external) => Dependency {
                id: external_module_id(&request),
                request,
                target: DependencyTarget::External(external),
            },
            None => {
                let path = resolver.resolve(&request, context)?;
                Dependency {
                    id: resolver.module_id(&path),
                    request,
                    target: DependencyTarget::File(path),
                }
            }
        };

        edits.push((site.callee, LOADER_IDENT.to_string()));
        edits.push((argument_span, js_string(&dependency.id)));

        if !dependencies.iter().any(|d| d.id == dependency.id) {
            dependencies.push(dependency);
        }
    }

    debug!(
        "Found {} dependencies in {}",
        dependencies.len(),
        module_path.display()
    );

    Ok(Extracted {
        source: apply_edits(source, edits),
        dependencies,
    })
}

/// Splice replacements into `source`; spans never overlap
fn apply_edits(source: &str, mut edits: Vec<(Span, String)>) -> String {
    edits.sort_by_key(|(span, _)| std::cmp::Reverse(span.start));

    let mut code = source.to_string();
    for (span, text) in edits {
        code.replace_range(span.start as usize..span.end as usize, &text);
    }
    code
}

/// 1-based line and column of a byte offset
fn line_column(source: &str, offset: u32) -> (usize, usize) {
    let before = &source[..(offset as usize).min(source.len())];
    let line = before.matches('\n').count() + 1;
    let column = before.rfind('\n').map_or(before.len(), |i| before.len() - i - 1) + 1;
    (line, column)
}
