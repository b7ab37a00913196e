//! JsonDB CLI
//!
//! One-shot command-line access to a data directory.

use std::process;

use clap::{Parser, Subcommand};
use jsondb::{Config, Document, Engine, FindOptions, JsonDbError, SortOrder};
use tracing_subscriber::{fmt, EnvFilter};

/// JsonDB CLI
#[derive(Parser, Debug)]
#[command(name = "jsondb-cli")]
#[command(about = "CLI for the JsonDB document store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./jsondb_data")]
    data_dir: String,

    /// Write compact instead of indented JSON files
    #[arg(long)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a database
    CreateDb { db: String },

    /// Drop a database and everything in it
    DropDb { db: String },

    /// Rename a database
    RenameDb { db: String, new_name: String },

    /// List databases
    ListDbs,

    /// Create a collection
    CreateCollection { db: String, collection: String },

    /// Drop a collection
    DropCollection { db: String, collection: String },

    /// Rename a collection
    RenameCollection {
        db: String,
        collection: String,
        new_name: String,
    },

    /// List the collections of a database
    ListCollections { db: String },

    /// Insert a JSON object, or every object of a JSON array
    Insert {
        db: String,
        collection: String,
        json: String,
    },

    /// Find documents
    Find {
        db: String,
        collection: String,

        /// Filter predicate
        #[arg(default_value = "{}")]
        filter: String,

        /// Sort keys, e.g. `age:-1,name:1`
        #[arg(long)]
        sort: Option<String>,

        #[arg(long, default_value = "0")]
        skip: usize,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Patch matching documents
    Update {
        db: String,
        collection: String,
        filter: String,
        patch: String,

        /// Print only the first updated document
        #[arg(long)]
        one: bool,
    },

    /// Delete matching documents
    Delete {
        db: String,
        collection: String,
        filter: String,
    },

    /// Declare (or with --unset, undeclare) unique fields
    Unique {
        db: String,
        collection: String,
        fields: Vec<String>,

        #[arg(long)]
        unset: bool,
    },

    /// Create (or with --drop, drop) indexes
    Index {
        db: String,
        collection: String,
        fields: Vec<String>,

        #[arg(long)]
        drop: bool,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,jsondb=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .pretty_json(!args.compact)
        .build();

    let engine = match Engine::open(config) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(&engine, args.command) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(engine: &Engine, command: Commands) -> jsondb::Result<()> {
    match command {
        Commands::CreateDb { db } => engine.create_database(&db),
        Commands::DropDb { db } => engine.drop_database(&db),
        Commands::RenameDb { db, new_name } => engine.rename_database(&db, &new_name),
        Commands::ListDbs => print_names(engine.list_databases()?),
        Commands::CreateCollection { db, collection } => {
            engine.create_collection(&db, &collection).map(|_| ())
        }
        Commands::DropCollection { db, collection } => engine.drop_collection(&db, &collection),
        Commands::RenameCollection {
            db,
            collection,
            new_name,
        } => engine.rename_collection(&db, &collection, &new_name),
        Commands::ListCollections { db } => print_names(engine.list_collections(&db)?),
        Commands::Insert {
            db,
            collection,
            json,
        } => {
            let store = engine.collection(&db, &collection)?;
            let value: serde_json::Value = serde_json::from_str(&json)
                .map_err(|e| JsonDbError::MalformedInput(e.to_string()))?;
            let inserted = match value {
                serde_json::Value::Array(items) => {
                    let docs = items
                        .into_iter()
                        .map(Document::from_json)
                        .collect::<jsondb::Result<Vec<_>>>()?;
                    store.insert_many(docs)?
                }
                other => vec![store.insert_one(Document::from_json(other)?)?],
            };
            print_documents(inserted)
        }
        Commands::Find {
            db,
            collection,
            filter,
            sort,
            skip,
            limit,
        } => {
            let store = engine.collection(&db, &collection)?;
            let mut options = FindOptions::new().skip(skip);
            if let Some(limit) = limit {
                options = options.limit(limit);
            }
            for (field, order) in parse_sort(sort.as_deref())? {
                options = options.sort_by(field, order);
            }
            print_documents(store.find(&Document::parse(&filter)?, &options)?)
        }
        Commands::Update {
            db,
            collection,
            filter,
            patch,
            one,
        } => {
            let store = engine.collection(&db, &collection)?;
            let filter = Document::parse(&filter)?;
            let patch = Document::parse(&patch)?;
            let updated = if one {
                vec![store.update_one(&filter, &patch)?]
            } else {
                store.update_many(&filter, &patch)?
            };
            print_documents(updated)
        }
        Commands::Delete {
            db,
            collection,
            filter,
        } => {
            let store = engine.collection(&db, &collection)?;
            let deleted = store.delete(&Document::parse(&filter)?)?;
            println!("{}", deleted);
            Ok(())
        }
        Commands::Unique {
            db,
            collection,
            fields,
            unset,
        } => {
            let store = engine.collection(&db, &collection)?;
            let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
            if unset {
                store.unset_unique_fields(&fields)
            } else {
                store.set_unique_fields(&fields)
            }
        }
        Commands::Index {
            db,
            collection,
            fields,
            drop,
        } => {
            let store = engine.collection(&db, &collection)?;
            let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
            if drop {
                store.drop_indexes(&fields)
            } else {
                store.create_indexes(&fields)
            }
        }
    }
}

/// Parse `field:dir,field:dir`; a missing direction is ascending
fn parse_sort(keys: Option<&str>) -> jsondb::Result<Vec<(String, SortOrder)>> {
    let Some(keys) = keys else {
        return Ok(Vec::new());
    };
    keys.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            let (field, direction) = part.split_once(':').unwrap_or((part, "1"));
            let direction: i64 = direction.trim().parse().map_err(|_| {
                JsonDbError::MalformedInput(format!("bad sort direction in '{}'", part))
            })?;
            Ok((field.trim().to_string(), SortOrder::from_direction(direction)))
        })
        .collect()
}

fn print_documents(docs: Vec<Document>) -> jsondb::Result<()> {
    let values: Vec<serde_json::Value> = docs.into_iter().map(serde_json::Value::from).collect();
    let text = serde_json::to_string_pretty(&values)
        .map_err(|e| JsonDbError::Serialization(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

fn print_names(names: Vec<String>) -> jsondb::Result<()> {
    for name in names {
        println!("{}", name);
    }
    Ok(())
}
