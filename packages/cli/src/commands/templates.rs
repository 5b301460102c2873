use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use msf_editor::{Template, TemplateLibrary};

#[derive(Args, Debug)]
pub struct TemplatesArgs {
    /// Print this template as JSON
    #[arg(short, long)]
    pub key: Option<String>,
}

pub fn templates(args: TemplatesArgs, _cwd: &str) -> Result<()> {
    let library = TemplateLibrary::builtin();

    if let Some(key) = &args.key {
        let template = library
            .get(key)
            .ok_or_else(|| anyhow!("Unknown template: {} (try `msf templates`)", key))?;
        println!("{}", serde_json::to_string_pretty(template)?);
        return Ok(());
    }

    for (key, template) in library.iter() {
        let (kind, summary) = describe(template);
        println!("{:<14} {:<14} {}", key.bold(), kind.dimmed(), summary);
    }

    Ok(())
}

fn describe(template: &Template) -> (&'static str, String) {
    match template {
        Template::Function(f) => {
            let name = match f.modifier.as_deref() {
                Some(modifier) => format!("{} ({})", f.base_function, modifier),
                None => f.base_function.clone(),
            };
            ("function", format!("{}, {} ranges", name, f.ranges.len()))
        }
        Template::Range(r) => ("range", format!("{} specifications", r.specifications.len())),
        Template::Parameter(p) => ("parameter", p.unit.clone()),
        Template::Specification(s) => ("specification", s.time_period.clone()),
    }
}
