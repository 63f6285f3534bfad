//! Minimal GLSL scanner used by the dummy backend.
//!
//! This is not a compiler. It strips comments and preprocessor lines, checks
//! a handful of structural errors, and reads the top-level `attribute`,
//! `uniform`, `varying`, `in` and `out` declarations so the dummy device can
//! answer introspection queries the way a driver would. A declaration is
//! considered active when its name is referenced anywhere besides the
//! declaration itself.

use crate::types::{ShaderStage, VariableType};

/// A top-level interface declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Declaration {
    pub name: String,
    pub ty: VariableType,
    pub size: u32,
    pub active: bool,
}

/// The interface of one compiled stage.
#[derive(Debug, Clone, Default)]
pub(crate) struct ShaderInterface {
    /// Vertex inputs.
    pub attributes: Vec<Declaration>,
    pub uniforms: Vec<Declaration>,
    /// Varyings read by this stage.
    pub inputs: Vec<Declaration>,
    /// Varyings written by this stage.
    pub outputs: Vec<Declaration>,
}

/// Storage class of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Storage {
    Attribute,
    Uniform,
    Input,
    Output,
    FragmentOutput,
}

const PRECISION_WORDS: &[&str] = &[
    "highp", "mediump", "lowp", "flat", "smooth", "centroid", "invariant",
];

/// Scan `source` for `stage`. Returns a driver-style info log on failure.
pub(crate) fn scan(stage: ShaderStage, source: &str) -> Result<ShaderInterface, String> {
    let code = strip_preprocessor(&strip_comments(source))?;

    if code.trim().is_empty() {
        return Err("ERROR: 0:0: empty shader source".to_string());
    }
    check_braces(&code)?;
    if !defines_main(&code) {
        return Err("ERROR: 0:0: 'main' : function not defined".to_string());
    }

    let mut interface = ShaderInterface::default();
    for statement in top_level_statements(&code) {
        let Some((storage, declarations)) = parse_declaration(stage, &statement)? else {
            continue;
        };
        let declarations = declarations.into_iter().map(|mut decl| {
            decl.active = count_word(&code, &decl.name) > 1;
            decl
        });
        match storage {
            Storage::Attribute => interface.attributes.extend(declarations),
            Storage::Uniform => interface.uniforms.extend(declarations),
            Storage::Input => interface.inputs.extend(declarations),
            Storage::Output => interface.outputs.extend(declarations),
            Storage::FragmentOutput => {}
        }
    }

    Ok(interface)
}

fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = ' ';
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

/// Blank out preprocessor lines, failing on `#error`.
fn strip_preprocessor(code: &str) -> Result<String, String> {
    let mut out = String::with_capacity(code.len());
    for (line_no, line) in code.lines().enumerate() {
        let trimmed = line.trim_start();
        if let Some(directive) = trimmed.strip_prefix('#') {
            let directive = directive.trim_start();
            if let Some(message) = directive.strip_prefix("error") {
                return Err(format!(
                    "ERROR: 0:{}: '#error' : {}",
                    line_no + 1,
                    message.trim()
                ));
            }
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }
    Ok(out)
}

fn check_braces(code: &str) -> Result<(), String> {
    let mut depth = 0i32;
    for c in code.chars() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return Err("ERROR: 0:0: '}' : unexpected closing brace".to_string());
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err("ERROR: 0:0: '' : unexpected end of file, unbalanced braces".to_string());
    }
    Ok(())
}

fn words(code: &str) -> impl Iterator<Item = &str> {
    code.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
}

fn defines_main(code: &str) -> bool {
    let words: Vec<&str> = words(code).collect();
    words.windows(2).any(|w| w[0] == "void" && w[1] == "main")
}

/// Number of whole-word occurrences of `name`.
fn count_word(code: &str, name: &str) -> usize {
    words(code).filter(|w| *w == name).count()
}

/// Statements at brace depth 0, with function bodies skipped.
fn top_level_statements(code: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for c in code.chars() {
        match c {
            '{' => {
                depth += 1;
                current.clear();
            }
            '}' => {
                depth = depth.saturating_sub(1);
                current.clear();
            }
            ';' if depth == 0 => {
                let statement = current.trim();
                if !statement.is_empty() {
                    statements.push(statement.to_string());
                }
                current.clear();
            }
            _ if depth == 0 => current.push(c),
            _ => {}
        }
    }
    statements
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Drop a leading `layout(...)` qualifier.
fn strip_layout(statement: &str) -> &str {
    let trimmed = statement.trim_start();
    if trimmed.starts_with("layout") {
        if let Some(end) = trimmed.find(')') {
            return &trimmed[end + 1..];
        }
    }
    trimmed
}

fn parse_declaration(
    stage: ShaderStage,
    statement: &str,
) -> Result<Option<(Storage, Vec<Declaration>)>, String> {
    let mut tokens = strip_layout(statement)
        .split_whitespace()
        .filter(|t| !PRECISION_WORDS.contains(t))
        .peekable();

    let storage = match (tokens.next(), stage) {
        (Some("attribute"), ShaderStage::Vertex) | (Some("in"), ShaderStage::Vertex) => {
            Storage::Attribute
        }
        (Some("attribute"), ShaderStage::Fragment) => {
            return Err(
                "ERROR: 0:0: 'attribute' : supported in vertex shaders only".to_string(),
            );
        }
        (Some("uniform"), _) => Storage::Uniform,
        (Some("varying"), ShaderStage::Vertex) | (Some("out"), ShaderStage::Vertex) => {
            Storage::Output
        }
        (Some("varying"), ShaderStage::Fragment) | (Some("in"), ShaderStage::Fragment) => {
            Storage::Input
        }
        (Some("out"), ShaderStage::Fragment) => Storage::FragmentOutput,
        _ => return Ok(None),
    };

    let type_name = tokens
        .next()
        .ok_or_else(|| "ERROR: 0:0: '' : syntax error, missing type".to_string())?;
    let ty = VariableType::from_glsl(type_name)
        .ok_or_else(|| format!("ERROR: 0:0: '{type_name}' : unknown type"))?;

    let rest = tokens.collect::<Vec<_>>().join(" ");
    let mut declarations = Vec::new();
    for item in rest.split(',') {
        let item = item.trim();
        let (name, size) = match item.find('[') {
            Some(open) => {
                let size = item[open + 1..]
                    .trim_end_matches(|c: char| c == ']' || c.is_whitespace())
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| format!("ERROR: 0:0: '{item}' : invalid array size"))?;
                (item[..open].trim(), size)
            }
            None => (item, 1),
        };
        if !is_identifier(name) {
            return Err(format!("ERROR: 0:0: '{name}' : syntax error"));
        }
        if name.starts_with("gl_") {
            return Err(format!("ERROR: 0:0: '{name}' : reserved built-in name"));
        }
        declarations.push(Declaration {
            name: name.to_string(),
            ty,
            size,
            active: false,
        });
    }

    Ok(Some((storage, declarations)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = r#"
        #version 100
        attribute vec3 position;
        attribute vec2 uv;
        attribute vec3 normal; // declared, never read
        uniform mat4 localToWorld;
        varying vec2 v_uv;
        /* block
           comment */
        void main() {
            v_uv = uv;
            gl_Position = localToWorld * vec4(position, 1.0);
        }
    "#;

    const FRAGMENT: &str = r#"
        precision highp float;
        uniform sampler2D map;
        uniform vec4 tints[4], unusedTint;
        varying vec2 v_uv;
        void main() {
            gl_FragColor = texture2D(map, v_uv) * tints[0];
        }
    "#;

    #[test]
    fn test_vertex_interface() {
        let interface = scan(ShaderStage::Vertex, VERTEX).unwrap();
        let names: Vec<_> = interface.attributes.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["position", "uv", "normal"]);
        assert!(interface.attributes[0].active);
        assert!(interface.attributes[1].active);
        assert!(!interface.attributes[2].active);
        assert_eq!(interface.uniforms[0].ty, VariableType::FloatMat4);
        assert_eq!(interface.outputs[0].name, "v_uv");
        assert!(interface.outputs[0].active);
    }

    #[test]
    fn test_fragment_interface() {
        let interface = scan(ShaderStage::Fragment, FRAGMENT).unwrap();
        assert_eq!(interface.uniforms.len(), 3);
        assert_eq!(interface.uniforms[1].name, "tints");
        assert_eq!(interface.uniforms[1].size, 4);
        assert!(interface.uniforms[1].active);
        assert!(!interface.uniforms[2].active);
        assert_eq!(interface.inputs[0].ty, VariableType::FloatVec2);
    }

    #[test]
    fn test_glsl3_qualifiers() {
        let source = r#"
            #version 300 es
            layout(location = 0) in vec3 position;
            out vec3 v_dir;
            void main() { v_dir = position; gl_Position = vec4(position, 1.0); }
        "#;
        let interface = scan(ShaderStage::Vertex, source).unwrap();
        assert_eq!(interface.attributes[0].name, "position");
        assert_eq!(interface.outputs[0].name, "v_dir");
    }

    #[test]
    fn test_missing_main() {
        let err = scan(ShaderStage::Vertex, "attribute vec3 position;").unwrap_err();
        assert!(err.contains("'main'"));
    }

    #[test]
    fn test_unbalanced_braces() {
        let err = scan(ShaderStage::Fragment, "void main() { if (true) { }").unwrap_err();
        assert!(err.contains("unbalanced"));
    }

    #[test]
    fn test_error_directive() {
        let err = scan(ShaderStage::Fragment, "#error not today\nvoid main() {}").unwrap_err();
        assert!(err.contains("not today"));
    }

    #[test]
    fn test_unknown_type() {
        let err = scan(ShaderStage::Vertex, "attribute dvec3 p;\nvoid main() { p; }").unwrap_err();
        assert!(err.contains("dvec3"));
    }

    #[test]
    fn test_empty_source() {
        assert!(scan(ShaderStage::Vertex, "  // nothing\n").is_err());
    }

    #[test]
    fn test_function_bodies_are_not_declarations() {
        let source = r#"
            uniform int faceIndex;
            vec3 direction(int face) {
                uniform_like(face);
                return vec3(0.0);
            }
            void main() { direction(faceIndex); }
        "#;
        let interface = scan(ShaderStage::Fragment, source).unwrap();
        assert_eq!(interface.uniforms.len(), 1);
        assert!(interface.uniforms[0].active);
    }
}
