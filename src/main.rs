use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use examforge::exam::{builtin_class, builtin_classes};
use examforge::paths::{expand_tilde, TemplateResolver};
use examforge::seed::subtree_seed;
use examforge::visit::TreeStats;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "examforge")]
#[command(version)]
#[command(about = "Personalized exam generation - configuration tooling")]
struct Args {
    /// Enable verbose logging (to stderr)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the configuration reference for the built-in classes
    Docs {
        /// Limit output to one class
        class: Option<String>,
    },
    /// Instantiate a class and dump its configuration as YAML
    Snapshot {
        /// Class to instantiate
        class: String,
        /// Instance label, e.g. a student identifier
        #[arg(short, long, default_value = "preview")]
        label: String,
    },
    /// Derive the deterministic seed for one student
    Seed {
        /// Class the seed is scoped to
        class: String,
        /// Student key from the roster
        student: String,
        /// Settings subtree the seed is for, e.g. "rng" or "choices"
        #[arg(long, default_value = "rng")]
        subtree: String,
    },
    /// Resolve a template file through the search path
    Template {
        /// Template file name, e.g. exam.tex
        name: String,
        /// Extra search directories, highest precedence last
        #[arg(short, long)]
        dir: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting tracing subscriber")?;

    match args.command {
        Command::Docs { class } => run_docs(class),
        Command::Snapshot { class, label } => run_snapshot(&class, &label),
        Command::Seed {
            class,
            student,
            subtree,
        } => run_seed(&class, &student, &subtree),
        Command::Template { name, dir } => run_template(&name, &dir),
    }
}

fn run_docs(class: Option<String>) -> Result<()> {
    let classes = match class {
        Some(name) => match builtin_class(&name)? {
            Some(class) => vec![class],
            None => bail!("no built-in class named '{}'", name),
        },
        None => builtin_classes()?,
    };

    for class in classes {
        println!("# {}", class.name());
        let vars: Vec<String> = class.var_names().map(String::from).collect();
        for var in vars {
            let stats = TreeStats::of(class.var(&var)?);
            println!(
                "\n## {} ({} values, {} groups)\n",
                var, stats.values, stats.groups
            );
            if let Some(text) = class.doc(&var) {
                println!("{}", text.trim_end());
            }
        }
        println!();
    }
    Ok(())
}

fn run_snapshot(class: &str, label: &str) -> Result<()> {
    let Some(class) = builtin_class(class)? else {
        bail!("no built-in class named '{}'", class);
    };
    let instance = class.instantiate(label);
    info!(class = class.name(), label, "dumping snapshot");
    let yaml = serde_yaml::to_string(&instance.snapshot())?;
    print!("{}", yaml);
    Ok(())
}

fn run_seed(class: &str, student: &str, subtree: &str) -> Result<()> {
    let Some(class) = builtin_class(class)? else {
        bail!("no built-in class named '{}'", class);
    };
    let path: Vec<String> = subtree
        .split('.')
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    // Fail early when the subtree does not exist on the class.
    let mut group = class.var("settings")?.as_ref();
    for segment in &path {
        group = group
            .child(segment)
            .with_context(|| format!("subtree '{}' not found in settings", subtree))?;
    }
    println!("{}", subtree_seed(class.name(), &path, student));
    Ok(())
}

fn run_template(name: &str, dirs: &[PathBuf]) -> Result<()> {
    let mut resolver = TemplateResolver::with_user_dirs();
    for dir in dirs {
        resolver.push(expand_tilde(dir));
    }
    resolver.validate()?;
    let path = resolver.resolve(name)?;
    println!("{}", path.display());
    Ok(())
}
