//! The parser/code-transformer boundary.
//!
//! Graph building only needs two things from a module's source text: its
//! dependency specifiers and a transformed body for the loader. Real
//! projects plug in a full parser here; [`LineScanner`] covers the common
//! directive forms with a line scan.

/// The result of transforming one module's source text.
#[derive(Debug, Clone)]
pub struct Parsed {
    /// Dependency specifiers, in source order.
    pub dependencies: Vec<String>,

    /// The module body, rewritten for the runtime loader.
    pub code: String,
}

/// Extracts dependencies and rewrites a module body.
///
/// Errors are plain messages; the graph builder attaches the module path.
pub trait Transform {
    fn transform(&self, source: &str) -> Result<Parsed, String>;
}

/// The default transformer: a line scanner for import/export directives.
///
/// Recognized forms, each on its own line:
///
/// - `import './dep.js'` becomes `require('./dep.js');`
/// - `import name from './dep.js'` becomes `const name = require('./dep.js');`
/// - `export default <expr>` becomes `module.exports = <expr>`
///
/// Every other line passes through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineScanner;

impl Transform for LineScanner {
    fn transform(&self, source: &str) -> Result<Parsed, String> {
        let mut dependencies = Vec::new();
        let mut code = String::new();

        for (number, line) in source.lines().enumerate() {
            let trimmed = line.trim();

            if let Some(rest) = trimmed.strip_prefix("import ") {
                let specifier = quoted(rest)
                    .ok_or_else(|| format!("malformed import on line {}", number + 1))?;

                match binding(rest) {
                    Some(name) => {
                        code.push_str(&format!("const {name} = require('{specifier}');\n"));
                    }
                    None => {
                        code.push_str(&format!("require('{specifier}');\n"));
                    }
                }

                dependencies.push(specifier.to_string());
            } else if let Some(rest) = trimmed.strip_prefix("export default ") {
                code.push_str(&format!("module.exports = {rest}\n"));
            } else {
                code.push_str(line);
                code.push('\n');
            }
        }

        Ok(Parsed { dependencies, code })
    }
}

/// Extracts the quoted specifier from the tail of an import directive.
fn quoted(rest: &str) -> Option<&str> {
    let open = rest.find(['\'', '"'])?;
    let quote = rest.as_bytes()[open] as char;
    let tail = &rest[open + 1..];
    let close = tail.find(quote)?;

    Some(&tail[..close])
}

/// Extracts the bound name from `import name from '<specifier>'`, if any.
fn binding(rest: &str) -> Option<&str> {
    let (name, tail) = rest.split_once(" from ")?;
    let name = name.trim();

    if name.is_empty() || name.starts_with(['\'', '"']) || !tail.contains(['\'', '"']) {
        return None;
    }

    Some(name)
}
