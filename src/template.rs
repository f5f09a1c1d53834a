//! Template materialization
//!
//! Renders a template directory (held as a [`MemoryFS`]) into the staged tree.
//!
//! Two placeholder forms share one flat substitution map:
//!
//! - `<%= key %>` inside file content
//! - `__key__` inside a path segment, e.g. `__fileName__/schema.json`
//!
//! A file whose name ends in [`TEMPLATE_MARKER`] is written without the
//! marker. The marker is stripped from the raw template path before any
//! path placeholder is replaced, so a substituted value is never stripped.
//!
//! Substitution is a single pass: replacement values are not scanned again.
//! A placeholder without a value is an `UnboundPlaceholder` error. Every
//! destination and every rendered file is computed before the first write,
//! so a failing template leaves the tree untouched.

use crate::error::{Error, Result};
use crate::filesystem::{File, MemoryFS};
use crate::path::{glob_match, join_path_fragments, normalize_path};
use crate::tree::Tree;
use log::debug;
use regex::Regex;
use std::collections::HashMap;

/// File name suffix marking a template that must not be treated as a literal asset.
pub const TEMPLATE_MARKER: &str = "__template__";

const TAG_OPEN: &str = "<%=";
const TAG_CLOSE: &str = "%>";

/// Flat key to value map used by both placeholder forms.
pub type Substitutions = HashMap<String, String>;

/// Per-file inclusion rules for [`generate_files`].
#[derive(Debug, Clone, Default)]
pub struct MaterializeOptions {
    /// Glob patterns (relative to the template directory) copied byte for byte
    pub verbatim: Vec<String>,
    /// Destination paths left alone when they already exist in the tree
    pub preserve_existing: Vec<String>,
}

/// Build an in-memory template directory from `(relative path, content)` pairs.
pub fn bundle(files: &[(&str, &str)]) -> Result<MemoryFS> {
    let mut fs = MemoryFS::new();
    for (path, content) in files {
        fs.add_file_string(path, content)?;
    }
    Ok(fs)
}

/// Render every file of `template` below `dest_root` in the tree.
///
/// Returns the destination paths that were written, in template path order.
pub fn generate_files(
    tree: &mut Tree<'_>,
    template: &MemoryFS,
    dest_root: &str,
    substitutions: &Substitutions,
    options: &MaterializeOptions,
) -> Result<Vec<String>> {
    let path_placeholder = Regex::new(r"__([A-Za-z0-9]+)__")?;
    let preserved = options
        .preserve_existing
        .iter()
        .map(|p| normalize_path(p))
        .collect::<Result<Vec<_>>>()?;

    let mut rendered: Vec<(String, File)> = Vec::with_capacity(template.len());
    for (relative, file) in template.files() {
        let relative = relative.as_str();
        let stripped = relative.strip_suffix(TEMPLATE_MARKER).unwrap_or(relative);
        let dest_relative = render_path(&path_placeholder, stripped, substitutions, relative)?;
        let dest = join_path_fragments(&[dest_root, &dest_relative])?;

        if preserved.contains(&dest) && tree.exists(&dest) {
            debug!("Keeping existing {}", dest);
            continue;
        }

        let content = if is_verbatim(relative, &file.content, &options.verbatim)? {
            file.content.clone()
        } else {
            let text = String::from_utf8_lossy(&file.content);
            render(&text, substitutions, relative)?.into_bytes()
        };

        rendered.push((
            dest,
            File {
                content,
                permissions: file.permissions,
            },
        ));
    }

    let mut written = Vec::with_capacity(rendered.len());
    for (dest, file) in rendered {
        tree.write_file(&dest, file)?;
        written.push(dest);
    }
    debug!("Materialized {} file(s) into {}", written.len(), dest_root);
    Ok(written)
}

/// Replace every `<%= key %>` tag in `content`.
///
/// `source` names the template in error messages.
pub fn render(content: &str, substitutions: &Substitutions, source: &str) -> Result<String> {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find(TAG_OPEN) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + TAG_OPEN.len()..];
        let Some(end) = after_open.find(TAG_CLOSE) else {
            return Err(Error::Parse {
                path: source.to_string(),
                message: format!("unterminated '{}' tag", TAG_OPEN),
            });
        };

        let key = after_open[..end].trim();
        if !is_identifier(key) {
            return Err(Error::Parse {
                path: source.to_string(),
                message: format!("'{}' is not a placeholder name", key),
            });
        }
        out.push_str(lookup(substitutions, key, source)?);
        rest = &after_open[end + TAG_CLOSE.len()..];
    }

    out.push_str(rest);
    Ok(out)
}

fn render_path(
    placeholder: &Regex,
    path: &str,
    substitutions: &Substitutions,
    source: &str,
) -> Result<String> {
    let mut out = String::with_capacity(path.len());
    let mut last = 0;
    for caps in placeholder.captures_iter(path) {
        let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&path[last..whole.start()]);
        out.push_str(lookup(substitutions, key.as_str(), source)?);
        last = whole.end();
    }
    out.push_str(&path[last..]);
    Ok(out)
}

fn lookup<'a>(substitutions: &'a Substitutions, key: &str, source: &str) -> Result<&'a str> {
    substitutions
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| Error::UnboundPlaceholder {
            placeholder: key.to_string(),
            path: source.to_string(),
        })
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_verbatim(relative: &str, content: &[u8], patterns: &[String]) -> Result<bool> {
    if content.contains(&0) || std::str::from_utf8(content).is_err() {
        return Ok(true);
    }
    for pattern in patterns {
        if glob_match(pattern, relative)? {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subs(pairs: &[(&str, &str)]) -> Substitutions {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    mod render_tests {
        use super::*;

        #[test]
        fn test_render_replaces_tags() {
            let out = render(
                "const variable = \"<%= projectName %>\";",
                &subs(&[("projectName", "demo")]),
                "index.ts__template__",
            )
            .unwrap();
            assert_eq!(out, "const variable = \"demo\";");
        }

        #[test]
        fn test_render_tolerates_missing_whitespace() {
            let out = render("<%=a%>-<%=  b  %>", &subs(&[("a", "1"), ("b", "2")]), "t").unwrap();
            assert_eq!(out, "1-2");
        }

        #[test]
        fn test_render_is_single_pass() {
            let out = render(
                "<%= outer %>",
                &subs(&[("outer", "<%= inner %>"), ("inner", "boom")]),
                "t",
            )
            .unwrap();
            assert_eq!(out, "<%= inner %>");
        }

        #[test]
        fn test_render_unbound_placeholder() {
            let err = render("<%= missing %>", &subs(&[]), "files/a.ts").unwrap_err();
            match err {
                Error::UnboundPlaceholder { placeholder, path } => {
                    assert_eq!(placeholder, "missing");
                    assert_eq!(path, "files/a.ts");
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn test_render_rejects_unterminated_tag() {
            assert!(matches!(
                render("x <%= name", &subs(&[("name", "n")]), "t"),
                Err(Error::Parse { .. })
            ));
        }

        #[test]
        fn test_render_rejects_expressions() {
            assert!(matches!(
                render("<%= a + b %>", &subs(&[("a", "1")]), "t"),
                Err(Error::Parse { .. })
            ));
        }

        #[test]
        fn test_render_leaves_plain_text_alone() {
            let text = "no tags, just 50% of <% things %>";
            assert_eq!(render(text, &subs(&[]), "t").unwrap(), text);
        }
    }

    mod generate_files_tests {
        use super::*;
        use crate::filesystem::MemoryFS;

        #[test]
        fn test_marker_stripped_and_content_rendered() {
            let template =
                bundle(&[("src/index.ts__template__", "const variable = \"<%= projectName %>\";")])
                    .unwrap();
            let mut store = MemoryFS::new();
            let mut tree = Tree::new(&mut store);

            let written = generate_files(
                &mut tree,
                &template,
                "libs/demo",
                &subs(&[("projectName", "demo")]),
                &MaterializeOptions::default(),
            )
            .unwrap();

            assert_eq!(written, vec!["libs/demo/src/index.ts"]);
            assert_eq!(
                tree.read_to_string("libs/demo/src/index.ts").unwrap(),
                "const variable = \"demo\";"
            );
        }

        #[test]
        fn test_path_placeholders_rename_files() {
            let template = bundle(&[
                ("__fileName__/generator.ts__template__", "export class <%= className %> {}"),
                ("__fileName__/schema.json__template__", "{\"id\": \"<%= name %>\"}"),
            ])
            .unwrap();
            let mut store = MemoryFS::new();
            let mut tree = Tree::new(&mut store);

            generate_files(
                &mut tree,
                &template,
                "src/generators",
                &subs(&[("fileName", "my-gen"), ("className", "MyGen"), ("name", "myGen")]),
                &MaterializeOptions::default(),
            )
            .unwrap();

            assert_eq!(
                tree.read_to_string("src/generators/my-gen/generator.ts").unwrap(),
                "export class MyGen {}"
            );
            assert!(tree.exists("src/generators/my-gen/schema.json"));
        }

        #[test]
        fn test_substituted_marker_is_not_stripped() {
            let template = bundle(&[(
                "__fileName__/files/src/index.ts__templateMarker____template__",
                "x",
            )])
            .unwrap();
            let mut store = MemoryFS::new();
            let mut tree = Tree::new(&mut store);

            let written = generate_files(
                &mut tree,
                &template,
                "gens",
                &subs(&[("fileName", "g"), ("templateMarker", TEMPLATE_MARKER)]),
                &MaterializeOptions::default(),
            )
            .unwrap();
            assert_eq!(written, vec!["gens/g/files/src/index.ts__template__"]);
        }

        #[test]
        fn test_unbound_placeholder_leaves_tree_untouched() {
            let template = bundle(&[
                ("a.txt__template__", "<%= known %>"),
                ("b.txt__template__", "<%= unknown %>"),
            ])
            .unwrap();
            let mut store = MemoryFS::new();
            let mut tree = Tree::new(&mut store);

            let result = generate_files(
                &mut tree,
                &template,
                "out",
                &subs(&[("known", "k")]),
                &MaterializeOptions::default(),
            );
            assert!(matches!(result, Err(Error::UnboundPlaceholder { .. })));
            assert!(tree.changes().is_empty());
        }

        #[test]
        fn test_unbound_path_placeholder() {
            let template = bundle(&[("__missing__/a.txt", "a")]).unwrap();
            let mut store = MemoryFS::new();
            let mut tree = Tree::new(&mut store);

            let result =
                generate_files(&mut tree, &template, "out", &subs(&[]), &MaterializeOptions::default());
            assert!(matches!(
                result,
                Err(Error::UnboundPlaceholder { placeholder, .. }) if placeholder == "missing"
            ));
        }

        #[test]
        fn test_binary_and_verbatim_files_copied_unchanged() {
            let mut template = MemoryFS::new();
            template
                .add_file_content("assets/logo.png", vec![0x89, b'P', b'N', b'G', 0x00, 0xff])
                .unwrap();
            template
                .add_file_string("docs/raw.md", "keep <%= this %> as is")
                .unwrap();
            let mut store = MemoryFS::new();
            let mut tree = Tree::new(&mut store);

            generate_files(
                &mut tree,
                &template,
                "out",
                &subs(&[]),
                &MaterializeOptions {
                    verbatim: vec!["docs/*.md".to_string()],
                    ..Default::default()
                },
            )
            .unwrap();

            assert_eq!(
                tree.read("out/assets/logo.png").unwrap(),
                vec![0x89, b'P', b'N', b'G', 0x00, 0xff]
            );
            assert_eq!(
                tree.read_to_string("out/docs/raw.md").unwrap(),
                "keep <%= this %> as is"
            );
        }

        #[test]
        fn test_preserve_existing_keeps_seeded_file() {
            let template = bundle(&[
                ("gen/files/index.ts__template__", "default <%= name %>"),
                ("gen/schema.json", "{}"),
            ])
            .unwrap();
            let mut store = MemoryFS::new();
            let mut tree = Tree::new(&mut store);
            tree.write("out/gen/files/index.ts", "seeded").unwrap();

            let written = generate_files(
                &mut tree,
                &template,
                "out",
                &subs(&[("name", "n")]),
                &MaterializeOptions {
                    preserve_existing: vec!["out/gen/files/index.ts".to_string()],
                    ..Default::default()
                },
            )
            .unwrap();

            assert_eq!(written, vec!["out/gen/schema.json"]);
            assert_eq!(tree.read_to_string("out/gen/files/index.ts").unwrap(), "seeded");
        }

        #[test]
        fn test_existing_files_overwritten_by_default() {
            let template = bundle(&[("README.md", "new")]).unwrap();
            let mut store = MemoryFS::new();
            store.add_file_string("out/README.md", "old").unwrap();
            let mut tree = Tree::new(&mut store);

            generate_files(&mut tree, &template, "out", &subs(&[]), &MaterializeOptions::default())
                .unwrap();
            assert_eq!(tree.read_to_string("out/README.md").unwrap(), "new");
        }

        #[test]
        fn test_materialize_into_root() {
            let template =
                bundle(&[("package.json__template__", "{\"name\": \"<%= name %>\"}")]).unwrap();
            let mut store = MemoryFS::new();
            let mut tree = Tree::new(&mut store);

            let written = generate_files(
                &mut tree,
                &template,
                ".",
                &subs(&[("name", "root")]),
                &MaterializeOptions::default(),
            )
            .unwrap();
            assert_eq!(written, vec!["package.json"]);
        }
    }
}
