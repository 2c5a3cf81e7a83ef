use clap::{Parser, Subcommand};
use lvdb::{DbError, VecDB};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lvdb")]
#[command(about = "Local vector database with exact cosine-similarity search")]
#[command(version)]
pub struct Cli {
    /// Vector log file; the store stays in memory when omitted
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Command to run; starts an interactive session when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// One line typed at the REPL prompt.
#[derive(Parser, Debug)]
#[command(name = "lvdb", no_binary_name = true, disable_version_flag = true)]
struct ReplLine {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        /// JSON settings file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Server port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Insert a vector: insert <v1> <v2> ...
    Insert {
        #[arg(required = true, num_args = 1.., allow_negative_numbers = true)]
        vector: Vec<f64>,
    },

    /// Insert vectors given as a JSON array of arrays, e.g. [[1, 0], [0, 1]]
    InsertBatch {
        /// The JSON text; spaces inside it are allowed
        #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        json: Vec<String>,
    },

    /// Search for similar vectors: search <v1> <v2> ... [-k N]
    Search {
        #[arg(required = true, num_args = 1.., allow_negative_numbers = true)]
        vector: Vec<f64>,

        /// Number of results
        #[arg(short, long, default_value_t = 5)]
        k: usize,
    },

    /// Replace the values of a vector: update <id> <v1> <v2> ...
    Update {
        id: u64,

        #[arg(required = true, num_args = 1.., allow_negative_numbers = true)]
        vector: Vec<f64>,
    },

    /// Delete a vector by id
    Delete {
        id: u64,
    },

    /// Retrieve a vector by id
    Get {
        id: u64,
    },

    /// List all vectors
    List,

    /// Show vector count
    Count,

    /// Cosine similarity of two comma separated vectors
    Similarity {
        #[arg(long, required = true, value_delimiter = ',', allow_negative_numbers = true)]
        left: Vec<f64>,

        #[arg(long, required = true, value_delimiter = ',', allow_negative_numbers = true)]
        right: Vec<f64>,
    },

    /// Rewrite the vector log without dead records
    Compact,
}

/// Parse one REPL line into a command
pub fn parse_line(input: &str) -> Result<Command, clap::Error> {
    ReplLine::try_parse_from(input.split_whitespace()).map(|line| line.command)
}

/// REPL mode - interactive session over an open database
pub fn run_repl(db: &VecDB) {
    println!("LVDB - Vector Database");
    println!("Type 'help' for commands, 'exit' or 'quit' to quit\n");

    loop {
        print!("lvdb> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => break,
            Ok(_) => {}
            Err(error) => {
                eprintln!("Error reading input: {}", error);
                continue;
            }
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if input == "exit" || input == "quit" {
            println!("Goodbye!");
            break;
        }

        let command = match parse_line(input) {
            Ok(Command::Serve { .. }) => {
                eprintln!("Error: 'serve' is only available from the command line");
                continue;
            }
            Ok(cmd) => cmd,
            Err(error) => {
                // Also covers `help`, which clap reports as an "error"
                let _ = error.print();
                continue;
            }
        };

        if let Err(error) = execute_command(db, command) {
            eprintln!("Error: {}", error);
        }
    }
}

pub fn execute_command(db: &VecDB, command: Command) -> Result<(), DbError> {
    match command {
        Command::Serve { .. } => {
            return Err(DbError::InvalidInput("'serve' cannot run as a store command".to_string()));
        }

        Command::Insert { vector } => {
            let id = db.insert(vector)?;
            println!("Inserted vector with id {}", id);
        }

        Command::InsertBatch { json } => {
            let batch: Vec<Vec<f64>> = serde_json::from_str(&json.join(" "))
                .map_err(|e| DbError::InvalidInput(format!("Invalid batch vector data: {}", e)))?;

            for (pos, result) in db.insert_batch(batch).into_iter().enumerate() {
                match result {
                    Ok(id) => println!("  [{}] inserted with id {}", pos, id),
                    Err(error) => println!("  [{}] failed: {}", pos, error),
                }
            }
        }

        Command::Search { vector, k } => {
            let results = db.search(&vector, k)?;
            if results.is_empty() {
                println!("No results found");
            } else {
                println!("Top {} results:", results.len());
                for (rank, hit) in results.iter().enumerate() {
                    println!("{}. ID: {}, Score: {:.4}, Vector: {:?}",
                        rank + 1, hit.record.id, hit.score, hit.record.values);
                }
            }
        }

        Command::Update { id, vector } => {
            db.update(id, vector)?;
            println!("Updated vector {}", id);
        }

        Command::Delete { id } => {
            if db.delete(id)? {
                println!("Deleted vector {}", id);
            } else {
                println!("No vector with id {}; nothing deleted", id);
            }
        }

        Command::Get { id } => {
            let record = db.get(id)?;
            println!("Vector {}: {:?}", record.id, record.values);
        }

        Command::List => {
            let records = db.get_all()?;
            if records.is_empty() {
                println!("Database is empty");
            } else {
                println!("Stored vectors:");
                for record in &records {
                    println!("  {}: {:?}", record.id, record.values);
                }
                println!("Total: {} vectors", records.len());
            }
        }

        Command::Count => println!("{}", db.count()),

        Command::Similarity { left, right } => {
            let similarity = lvdb::vector::cosine_similarity(&left, &right)?;
            println!("Cosine Similarity: {}", similarity);
        }

        Command::Compact => {
            db.compact()?;
            println!("Compacted");
        }
    }

    Ok(())
}
