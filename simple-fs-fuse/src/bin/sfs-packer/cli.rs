use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
pub struct Cli {
    /// Disk image file
    #[arg(long, short)]
    pub image: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create or resize the image, then format it
    Format {
        /// Number of 4 KiB blocks
        #[arg(long, short)]
        blocks: usize,
    },

    /// Copy every regular file of a host directory into the image
    Pack {
        /// Host source directory
        #[arg(long, short)]
        source: PathBuf,
    },

    /// Write the content of a file to stdout
    Cat { inumber: u32 },

    /// Compact data blocks and inodes
    Defrag,

    /// Print the superblock and every valid inode
    Debug,
}
