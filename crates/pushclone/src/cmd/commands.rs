use pushclone_registry::CommandDescriptor;
use serde::Serialize;

use crate::cmd::{CommandsArgs, Context};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{new_table, print_json, OutputFormat};

#[derive(Serialize)]
struct CommandsOutput<'a> {
    kind: &'static str,
    count: usize,
    commands: Vec<&'a CommandDescriptor>,
}

pub fn run(args: CommandsArgs, ctx: &Context) -> CliResult<i32> {
    let registry = ctx.registry(args.table.as_deref())?;
    let descriptors = registry.descriptors();

    match ctx.format {
        OutputFormat::Json | OutputFormat::Raw => print_json(&CommandsOutput {
            kind: "commands",
            count: descriptors.len(),
            commands: descriptors,
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["ID", "NAME", "DIRECTION", "PAYLOAD"]);
            for descriptor in descriptors {
                table.add_row(vec![
                    format!("{:#04X}", descriptor.id),
                    descriptor.name.clone(),
                    descriptor.direction.to_string(),
                    descriptor.shape.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for descriptor in descriptors {
                println!(
                    "{:#04X} {:<24} {:<15} {}",
                    descriptor.id,
                    descriptor.name,
                    descriptor.direction.as_str(),
                    descriptor.shape
                );
            }
        }
    }

    Ok(SUCCESS)
}
