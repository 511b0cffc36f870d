use clap::{Parser, Subcommand};
use mm_kernel::{DEFAULT_BLOCK, DEFAULT_GROUP_SIDE};

/// Matrix side used when `--size` is not given.
pub const DEFAULT_SIZE: usize = 1024;

/// Vector length used by `vector-add` when `--len` is not given.
pub const DEFAULT_VECTOR_LEN: usize = 98432;

/// Multiply two random square integer matrices on the emulated device and
/// verify the result against a sequential reference.
#[derive(Parser, Debug)]
#[command(name = "matmul", version, about)]
pub struct Cli {
    /// Matrix side N.
    #[arg(long, default_value_t = DEFAULT_SIZE)]
    pub size: usize,

    /// Execution group side G (groups are G x G units).
    #[arg(long, default_value_t = DEFAULT_GROUP_SIDE)]
    pub group: usize,

    /// Seed for the input matrices; fresh entropy when omitted.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Worker threads for the device; one per core when omitted.
    #[arg(long)]
    pub threads: Option<usize>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Multiply and verify (the default).
    Matmul,
    /// Add two random vectors with a 1-D masked launch.
    VectorAdd {
        #[arg(long, default_value_t = DEFAULT_VECTOR_LEN)]
        len: usize,
        #[arg(long, default_value_t = DEFAULT_BLOCK)]
        block: usize,
    },
}

/// Resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub size: usize,
    pub group: usize,
    pub seed: Option<u64>,
    pub threads: Option<usize>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            size: DEFAULT_SIZE,
            group: DEFAULT_GROUP_SIDE,
            seed: None,
            threads: None,
        }
    }
}

impl From<&Cli> for RunConfig {
    fn from(cli: &Cli) -> Self {
        RunConfig {
            size: cli.size,
            group: cli.group,
            seed: cli.seed,
            threads: cli.threads,
        }
    }
}
