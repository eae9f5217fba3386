use clap::Parser;
use tracing_subscriber::EnvFilter;
use vellum::cli::{
    handle_add_doc, handle_add_rfp, handle_edit, handle_export, handle_generate, handle_get,
    handle_history, handle_init, handle_list, handle_project, handle_remove, handle_search,
    handle_serve, AddDocument, Cli, Commands,
};
use vellum::config::Config;
use vellum::storage::{find_project_root, VELLUM_DIR};

/// Logs go to stderr so the MCP stdio transport keeps stdout to itself.
fn init_tracing() {
    let fallback = Config::load(&find_project_root().join(VELLUM_DIR))
        .map(|c| c.log_filter)
        .unwrap_or_else(|_| Config::default().log_filter);

    let filter = EnvFilter::try_from_env("VELLUM_LOG")
        .or_else(|_| EnvFilter::try_new(&fallback))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Init { policy, json } => handle_init(policy, json),
        Commands::Add(add) => match add.document {
            AddDocument::Rfp {
                file,
                project,
                name,
                stdin,
                json,
            } => handle_add_rfp(file, project, name, stdin, json),
            AddDocument::Doc {
                name,
                doc_type,
                project,
                file,
                stdin,
                json,
            } => handle_add_doc(name, doc_type, project, file, stdin, json),
        },
        Commands::List { kind, json } => handle_list(kind, json),
        Commands::Get { id, json } => handle_get(id, json),
        Commands::Edit {
            id,
            name,
            status,
            file,
            stdin,
            json,
        } => handle_edit(id, name, status, file, stdin, json),
        Commands::History { id, json } => handle_history(id, json),
        Commands::Search { query, json } => handle_search(query, json),
        Commands::Project { name, json } => handle_project(name, json),
        Commands::Remove { id, force, json } => handle_remove(id, force, json),
        Commands::Export {
            id,
            project,
            out,
            json,
        } => handle_export(id, project, out, json),
        Commands::Generate {
            rfp_id,
            doc_type,
            prompt,
            json,
        } => handle_generate(rfp_id, doc_type, prompt, json),
        Commands::Serve { http, bind } => handle_serve(http, bind),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}
