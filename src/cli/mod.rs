mod commands;
mod handlers;

pub use commands::{AddCommand, AddDocument, Cli, Commands};
pub use handlers::{
    handle_add_doc, handle_add_rfp, handle_edit, handle_export, handle_generate, handle_get,
    handle_history, handle_init, handle_list, handle_project, handle_remove, handle_search,
    handle_serve,
};
