//! Engine: stage collaborators (stores, extractor, sinks), stage functions, CLI plumbing.

pub mod arg_parser;
pub mod cli;
pub mod extract;
pub mod local;
pub mod progress;
pub mod s3;
pub mod sink;
pub mod stages;
pub mod store;

// Re-export commonly used items
pub use arg_parser::Cli;
pub use cli::{apply_cli_to_opts, handle_run};
pub use extract::{ExifExtractor, MetadataExtractor, primary_fields};
pub use local::{DirectoryStore, is_os_hidden_file, path_relative_to, path_to_key};
pub use s3::{BucketStore, parse_list_response};
pub use sink::{CsvSink, JsonlSink, RecordSink, SqliteSink, open_sink};
pub use stages::{extract_stage, fetch_stage};
pub use store::{ObjectFetcher, ObjectLister, read_exact_size};
