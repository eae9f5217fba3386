use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "vellum")]
#[command(version, about = "A versioned document repository for RFPs and generated design documents")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new vellum project in the current directory
    Init {
        /// Version policy: every_edit (default) or content_change
        #[arg(long, value_name = "POLICY")]
        policy: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a new document
    Add(AddCommand),

    /// List documents
    List {
        /// Document kind to list (rfp or generated); both when omitted
        #[arg(value_name = "KIND")]
        kind: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Get a single document by ID
    Get {
        /// Document ID (sequence number like "3" or UUID prefix like "a1b2c")
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Edit a generated document
    Edit {
        /// Document ID (sequence number or UUID prefix)
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New status (draft, final)
        #[arg(long)]
        status: Option<String>,

        /// Replace the content with this file
        #[arg(long, short = 'f', conflicts_with = "stdin")]
        file: Option<PathBuf>,

        /// Replace the content with stdin
        #[arg(long)]
        stdin: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the revision history of a generated document
    History {
        /// Document ID (sequence number or UUID prefix)
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search documents, e.g. `vellum search kind:generated status:final commerce`
    Search {
        /// Project name substring plus optional kind:, status:, type:, saved:> and saved:< terms
        query: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the documents of one project, or every project when no name is given
    Project {
        /// Project name (exact, case-insensitive)
        name: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a document
    Remove {
        /// Document ID (sequence number or UUID prefix)
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export documents as text files with YAML front matter
    Export {
        /// Document ID to export
        #[arg(required_unless_present = "project", conflicts_with = "project")]
        id: Option<String>,

        /// Export every document of this project instead
        #[arg(long)]
        project: Option<String>,

        /// Output directory (defaults to the configured export_dir)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate a BRD, HLD, LLD or TechSpec draft from an RFP
    Generate {
        /// RFP ID (sequence number or UUID prefix)
        rfp_id: String,

        /// Document type (BRD, HLD, LLD, TechSpec)
        #[arg(long = "type", short = 't', value_name = "TYPE")]
        doc_type: String,

        /// Extra instructions for the generator
        #[arg(long)]
        prompt: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the MCP server on stdio, or the HTTP API with --http
    Serve {
        /// Serve the HTTP API instead of MCP
        #[arg(long)]
        http: bool,

        /// Address for the HTTP API (defaults to http.bind from config)
        #[arg(long, requires = "http")]
        bind: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct AddCommand {
    #[command(subcommand)]
    pub document: AddDocument,
}

#[derive(Subcommand, Debug)]
pub enum AddDocument {
    /// Store an uploaded RFP (immutable once stored)
    Rfp {
        /// Path of the extracted RFP text
        file: PathBuf,

        /// Project the RFP belongs to
        #[arg(long, short = 'p')]
        project: String,

        /// Display name (defaults to the file name without extension)
        #[arg(long)]
        name: Option<String>,

        /// Read content from stdin; FILE only provides the file name
        #[arg(long)]
        stdin: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a generated document at version 1 in Draft
    Doc {
        /// Document name
        name: String,

        /// Document type (BRD, HLD, LLD, TechSpec)
        #[arg(long = "type", short = 't', value_name = "TYPE")]
        doc_type: String,

        /// Project the document belongs to
        #[arg(long, short = 'p')]
        project: String,

        /// Read content from this file
        #[arg(long, short = 'f', conflicts_with = "stdin")]
        file: Option<PathBuf>,

        /// Read content from stdin
        #[arg(long)]
        stdin: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
