//! Command-line front end for service registries.
//! Loads a registry file and validates call arguments, resolves types, or
//! orders report definitions, printing JSON to stdout.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use soap_params::report::order_report_definition;
use soap_params::{RegistryParser, SchemaResolver, Service, ValidatorConfig};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect service registries and shape SOAP call parameters")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate positional arguments for a method and print the shaped call
    Validate {
        /// Registry definition (JSON)
        #[arg(long)]
        registry: PathBuf,
        /// Method name, e.g. `mutate`
        #[arg(long)]
        method: String,
        /// JSON array of positional arguments; `-` reads stdin
        #[arg(long, default_value = "-")]
        args: String,
        /// Validator configuration (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the resolved field list of a type, root ancestor first
    Resolve {
        /// Registry definition (JSON)
        #[arg(long)]
        registry: PathBuf,
        /// Type name
        type_name: String,
    },
    /// Print registry metadata: key, namespace, fingerprint, methods, abstract types
    Inspect {
        /// Registry definition (JSON)
        #[arg(long)]
        registry: PathBuf,
    },
    /// Order a report definition (JSON file, `-` reads stdin)
    ReportOrder {
        definition: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(io::stderr)
        .init();

    let output = match args.command {
        Command::Validate { registry, method, args, config } => {
            let config = load_config(config.as_deref())?;
            let args: Value = serde_json::from_str(&read_input(&args)?).context("parse arguments")?;
            validate(&registry, &method, args, config)?
        }
        Command::Resolve { registry, type_name } => resolve(&registry, &type_name)?,
        Command::Inspect { registry } => inspect(&registry)?,
        Command::ReportOrder { definition } => {
            let definition: Value = serde_json::from_str(&read_input(&definition)?)
                .context("parse report definition")?;
            report_order(&definition)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// `RUST_LOG` when set, otherwise warnings only
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into())
}

fn load_registry(path: &Path) -> Result<Arc<soap_params::Registry>> {
    let registry = RegistryParser::new()
        .load_file(path)
        .with_context(|| format!("load registry {}", path.display()))?;
    info!(registry = %registry.key(), fingerprint = registry.fingerprint(), "loaded registry");
    Ok(Arc::new(registry))
}

fn load_config(path: Option<&Path>) -> Result<ValidatorConfig> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
            parse_config(&text).with_context(|| format!("parse config {}", path.display()))
        }
        None => Ok(ValidatorConfig::default()),
    }
}

fn parse_config(text: &str) -> Result<ValidatorConfig> {
    let config: ValidatorConfig = toml::from_str(text)?;
    debug!(?config, "validator config");
    Ok(config)
}

fn read_input(source: &str) -> Result<String> {
    if source == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text).context("read stdin")?;
        Ok(text)
    } else {
        fs::read_to_string(source).with_context(|| format!("read {}", source))
    }
}

fn validate(registry: &Path, method: &str, args: Value, config: ValidatorConfig) -> Result<Value> {
    let service = Service::with_config(load_registry(registry)?, config);
    let args = match args {
        Value::Array(items) => items,
        _ => bail!("arguments must be a JSON array of positional parameters"),
    };
    let call = service.prepare(method, &args)?;
    Ok(serde_json::to_value(call)?)
}

fn report_order(definition: &Value) -> Result<Value> {
    Ok(serde_json::to_value(order_report_definition(definition)?)?)
}

fn resolve(registry: &Path, type_name: &str) -> Result<Value> {
    let registry = load_registry(registry)?;
    let resolver = SchemaResolver::new(&registry);

    let mut fields = Vec::new();
    for schema in resolver.ancestors(type_name)?.into_iter().rev() {
        for field in schema.own_fields() {
            fields.push(json!({
                "name": field.name,
                "type": field.type_name,
                "declared_in": schema.name,
                "min_occurs": field.min_occurs,
                "max_occurs": field.max_occurs.to_string(),
            }));
        }
    }

    Ok(json!({
        "type": type_name,
        "abstract": resolver.is_abstract(type_name)?,
        "subtypes": resolver.subtypes_of(type_name)?,
        "fields": fields,
    }))
}

fn inspect(registry: &Path) -> Result<Value> {
    let registry = load_registry(registry)?;
    let resolver = SchemaResolver::new(&registry);

    let mut abstract_types = serde_json::Map::new();
    for name in registry.type_names() {
        if resolver.is_abstract(name)? {
            abstract_types.insert(name.to_string(), json!(resolver.subtypes_of(name)?));
        }
    }

    let service = Service::new(registry.clone());
    let mut methods = serde_json::Map::new();
    for name in service.methods() {
        methods.insert(name.to_string(), json!(service.soap_action(name)?));
    }

    Ok(json!({
        "key": registry.key().to_string(),
        "namespace": registry.namespace(),
        "fingerprint": registry.fingerprint(),
        "types": registry.type_names().len(),
        "methods": methods,
        "abstract_types": abstract_types,
    }))
}
