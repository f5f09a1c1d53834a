//! List command implementation
//!
//! Prints every built-in generator with its description and options, or the
//! options of a single generator.

use anyhow::Result;
use clap::Args;
use console::style;

use treegen::generators::{self, GeneratorInfo};
use treegen::output::{emoji, OutputConfig};
use treegen::suggestions;

/// Arguments for the list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Show only this generator
    #[arg(value_name = "GENERATOR")]
    pub generator: Option<String>,

    /// Print generator names only, one per line
    #[arg(long)]
    pub names_only: bool,
}

/// Execute the list command
pub fn execute(args: ListArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);

    let infos: Vec<GeneratorInfo> = match &args.generator {
        Some(name) => match generators::find(name) {
            Some(generator) => vec![generator.info()],
            None => {
                return Err(suggestions::unknown_generator(
                    name,
                    &generators::builtin_names(),
                ))
            }
        },
        None => generators::builtin().iter().map(|g| g.info()).collect(),
    };

    if args.names_only {
        for info in &infos {
            println!("{}", info.name);
        }
        return Ok(());
    }

    println!("{} Built-in generators:", emoji(&out, "📦", "[LIST]"));
    for info in &infos {
        println!();
        print_generator(&out, info);
    }
    Ok(())
}

fn print_generator(out: &OutputConfig, info: &GeneratorInfo) {
    if out.use_color {
        println!("{}  {}", style(info.name).bold().cyan(), info.description);
    } else {
        println!("{}  {}", info.name, info.description);
    }

    for field in info.schema.fields {
        let marker = if field.required { " (required)" } else { "" };
        println!("    {:<24} {}{}", field.name, field.kind, marker);
    }
}
