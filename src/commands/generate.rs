//! Generate command implementation
//!
//! Runs one built-in generator. Options come from `--options` as a JSON
//! object and from repeated `-o key=value` pairs, with pairs taking
//! precedence. A pair's value is read according to the field's declared kind.

use anyhow::Result;
use clap::Args;
use serde_json::{Map, Value};
use std::path::PathBuf;

use treegen::generators;
use treegen::schema::{FieldKind, OptionsSchema};
use treegen::output::{emoji, OutputConfig};
use treegen::phases::{RunOptions, StepInvocation};
use treegen::suggestions;

use super::{run_invocations, workspace_root};

/// Arguments for the generate command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Name of the generator to run (see `treegen list`)
    #[arg(value_name = "GENERATOR")]
    pub generator: String,

    /// Options as a JSON object
    #[arg(long, value_name = "JSON")]
    pub options: Option<String>,

    /// A single option as key=value (repeatable)
    #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
    pub option: Vec<String>,

    /// Workspace directory (defaults to current directory)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// List the changes without writing them or running tasks
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Do not format changed files
    #[arg(long)]
    pub skip_format: bool,

    /// Write the changes but do not run deferred tasks such as package installs
    #[arg(long)]
    pub skip_tasks: bool,
}

/// Execute the generate command
pub fn execute(args: GenerateArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);

    let Some(generator) = generators::find(&args.generator) else {
        return Err(suggestions::unknown_generator(
            &args.generator,
            &generators::builtin_names(),
        ));
    };

    let schema = generator.info().schema;
    let options = build_options(&schema, args.options.as_deref(), &args.option)?;
    let root = workspace_root(args.root)?;

    println!(
        "{} Running generator {}",
        emoji(&out, "🛠️", "[GEN]"),
        args.generator
    );

    let invocation = StepInvocation::new(args.generator, options);
    let run_options = RunOptions {
        dry_run: args.dry_run,
        skip_format: args.skip_format,
        skip_tasks: args.skip_tasks,
    };
    run_invocations(&root, &[invocation], &run_options, &out)
}

/// Combine `--options` JSON and `-o` pairs into one options object.
fn build_options(schema: &OptionsSchema, json: Option<&str>, pairs: &[String]) -> Result<Value> {
    let mut options = match json {
        Some(json) => match serde_json::from_str::<Value>(json) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                let err = <serde_json::Error as serde::de::Error>::custom("expected a JSON object");
                return Err(suggestions::invalid_options_json(&err));
            }
            Err(e) => return Err(suggestions::invalid_options_json(&e)),
        },
        None => Map::new(),
    };

    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(suggestions::invalid_option_pair(pair));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(suggestions::invalid_option_pair(pair));
        }
        let kind = schema.fields.iter().find(|f| f.name == key).map(|f| f.kind);
        options.insert(key.to_string(), parse_option_value(kind, value));
    }

    Ok(Value::Object(options))
}

/// Read a `-o` value.
///
/// String fields keep the raw text and list fields split on commas. For
/// other or undeclared fields `true`, `false`, numbers and JSON objects are
/// parsed, and anything else stays a string.
fn parse_option_value(kind: Option<FieldKind>, raw: &str) -> Value {
    match kind {
        Some(FieldKind::String) | Some(FieldKind::OneOf(_)) => Value::String(raw.to_string()),
        Some(FieldKind::List) => Value::Array(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| Value::String(s.to_string()))
                .collect(),
        ),
        _ => match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ if raw.starts_with('{') => serde_json::from_str(raw)
                .unwrap_or_else(|_| Value::String(raw.to_string())),
            _ => match raw.parse::<serde_json::Number>() {
                Ok(number) => Value::Number(number),
                Err(_) => Value::String(raw.to_string()),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use treegen::schema::Field;

    const SCHEMA: OptionsSchema = OptionsSchema {
        generator: "demo",
        fields: &[
            Field::required("name", FieldKind::String),
            Field::optional("minimal", FieldKind::Boolean),
            Field::optional("verbatim", FieldKind::List),
            Field::optional("substitutions", FieldKind::Object),
        ],
    };

    #[test]
    fn test_parse_option_value_untyped() {
        assert_eq!(parse_option_value(None, "true"), json!(true));
        assert_eq!(parse_option_value(None, "false"), json!(false));
        assert_eq!(parse_option_value(None, "3"), json!(3));
        assert_eq!(parse_option_value(None, "my-plugin"), json!("my-plugin"));
        assert_eq!(parse_option_value(None, ""), json!(""));
    }

    #[test]
    fn test_parse_option_value_follows_field_kind() {
        assert_eq!(parse_option_value(Some(FieldKind::String), "123"), json!("123"));
        assert_eq!(
            parse_option_value(Some(FieldKind::List), "a/**, b"),
            json!(["a/**", "b"])
        );
        assert_eq!(
            parse_option_value(Some(FieldKind::Object), r#"{"x": "1"}"#),
            json!({"x": "1"})
        );
    }

    #[test]
    fn test_build_options_pairs_override_json() {
        let options = build_options(
            &SCHEMA,
            Some(r#"{"name": "a", "minimal": false}"#),
            &["name=b".to_string(), "minimal=true".to_string()],
        )
        .unwrap();
        assert_eq!(options, json!({"name": "b", "minimal": true}));
    }

    #[test]
    fn test_build_options_value_may_contain_equals() {
        let options = build_options(&SCHEMA, None, &["name=a=b".to_string()]).unwrap();
        assert_eq!(options, json!({"name": "a=b"}));
    }

    #[test]
    fn test_build_options_rejects_non_object() {
        let err = build_options(&SCHEMA, Some("[1, 2]"), &[]).unwrap_err();
        assert!(err.to_string().contains("Invalid --options value"));
    }

    #[test]
    fn test_build_options_rejects_bad_pair() {
        let err = build_options(&SCHEMA, None, &["name".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Invalid option: name"));
    }
}
