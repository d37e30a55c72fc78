//! CLI command handlers

pub mod output;

use clap::Subcommand;
use synthgen::service::{DEFAULT_BATCH_LIMIT, DEFAULT_FILE_LIMIT};
use synthgen::SynthService;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a batch of files from the seed catalog
    Generate {
        /// Number of files to create (1-1000)
        #[arg(short = 'n', long, allow_negative_numbers = true)]
        count: i64,
    },

    /// List recorded files, most recently started first
    Files {
        /// Maximum rows to show (1-5000)
        #[arg(short, long, default_value_t = DEFAULT_FILE_LIMIT, allow_negative_numbers = true)]
        limit: i64,
    },

    /// List generation batches, newest first
    Batches {
        /// Maximum rows to show (1-1000)
        #[arg(short, long, default_value_t = DEFAULT_BATCH_LIMIT, allow_negative_numbers = true)]
        limit: i64,
    },

    /// Record files found on disk that are not in the store yet, then list files
    Sync {
        /// Maximum rows to show (1-5000)
        #[arg(short, long, default_value_t = DEFAULT_FILE_LIMIT, allow_negative_numbers = true)]
        limit: i64,
    },

    /// Delete every generated file and all metadata
    Clean,
}

/// Run one command against the service and print its result.
pub async fn run(command: Commands, service: &SynthService, json: bool) -> anyhow::Result<()> {
    match command {
        Commands::Generate { count } => {
            let files = service.generate(count).await?;
            emit(json, &files, || {
                println!(
                    "Generated {} file(s) in {}",
                    files.len(),
                    service.storage_root().display()
                );
                output::print_files(&files);
            })?;
        }
        Commands::Files { limit } => {
            let files = service.list_files(limit).await?;
            emit(json, &files, || output::print_files(&files))?;
        }
        Commands::Batches { limit } => {
            let batches = service.list_batches(limit).await?;
            emit(json, &batches, || output::print_batches(&batches))?;
        }
        Commands::Sync { limit } => {
            let files = service.reconcile_and_list_files(limit).await?;
            emit(json, &files, || output::print_files(&files))?;
        }
        Commands::Clean => {
            let result = service.clean_all().await?;
            emit(json, &result, || output::print_clean(&result))?;
        }
    }
    Ok(())
}

fn emit<T: serde::Serialize + ?Sized>(
    json: bool,
    value: &T,
    human: impl FnOnce(),
) -> anyhow::Result<()> {
    if json {
        output::print_json(value)?;
    } else {
        human();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_emit_reports_unencodable_json() {
        // JSON object keys must be strings.
        let value: BTreeMap<(u8, u8), u8> = [((1, 2), 3)].into_iter().collect();
        let mut human_ran = false;
        assert!(emit(true, &value, || human_ran = true).is_err());
        assert!(!human_ran);
    }

    #[test]
    fn test_emit_human_path() {
        let mut human_ran = false;
        emit(false, &[1, 2, 3], || human_ran = true).unwrap();
        assert!(human_ran);
    }
}
