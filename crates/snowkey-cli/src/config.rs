use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use snowkey::{DEFAULT_EPOCH, IdAllocator, NodeId, SpinPolicy};

const DEFAULT_EPOCH_MS: u64 = DEFAULT_EPOCH.as_millis() as u64;

/// Runtime configuration for the `snowkey` binary.
///
/// Node identity and epoch are parsed from CLI arguments or environment
/// variables (optionally loaded from a `.env` file). Every node sharing an ID
/// space must use the same epoch and a distinct `(DATACENTER_ID, WORKER_ID)`
/// pair.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "snowkey",
    version,
    about = "Allocate and inspect Snowflake-style primary keys"
)]
pub struct CliArgs {
    /// Worker ID of this node, 0 to 31.
    ///
    /// Environment variable: `WORKER_ID`
    #[arg(long, env = "WORKER_ID", default_value_t = 0, global = true)]
    pub worker_id: u64,

    /// Datacenter ID of this node, 0 to 31.
    ///
    /// Environment variable: `DATACENTER_ID`
    #[arg(long, env = "DATACENTER_ID", default_value_t = 0, global = true)]
    pub datacenter_id: u64,

    /// Epoch in milliseconds since 1970-01-01 UTC that timestamps are measured
    /// from.
    ///
    /// Environment variable: `EPOCH_MS`
    #[arg(long, env = "EPOCH_MS", default_value_t = DEFAULT_EPOCH_MS, global = true)]
    pub epoch_ms: u64,

    /// Give up after this many clock samples when a millisecond's sequence is
    /// exhausted and the clock does not advance. Unset means wait forever.
    ///
    /// Environment variable: `MAX_SPINS`
    #[arg(long, env = "MAX_SPINS", global = true)]
    pub max_spins: Option<u32>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Allocate IDs and print them one per line.
    Generate {
        /// Number of IDs to allocate.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },
    /// Split IDs into their timestamp, node and sequence fields.
    Decode {
        /// IDs to decode.
        #[arg(required = true)]
        ids: Vec<u64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorConfig {
    pub node: NodeId,
    pub epoch: Duration,
    pub spin_policy: SpinPolicy,
}

impl AllocatorConfig {
    pub fn build(&self) -> IdAllocator {
        IdAllocator::from_node(self.node, snowkey::SystemClock)
            .with_epoch(self.epoch)
            .with_spin_policy(self.spin_policy)
    }
}

impl TryFrom<&CliArgs> for AllocatorConfig {
    type Error = anyhow::Error;

    fn try_from(args: &CliArgs) -> Result<Self, Self::Error> {
        let node = NodeId::new(args.worker_id, args.datacenter_id)
            .context("invalid WORKER_ID/DATACENTER_ID")?;

        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("system clock is before the Unix epoch")?
            .as_millis() as u64;
        if args.epoch_ms > now_ms {
            bail!(
                "EPOCH_MS ({}) is in the future (now = {})",
                args.epoch_ms,
                now_ms
            );
        }

        if args.max_spins == Some(0) {
            bail!("MAX_SPINS must be greater than 0");
        }

        Ok(Self {
            node,
            epoch: Duration::from_millis(args.epoch_ms),
            spin_policy: SpinPolicy::from(args.max_spins),
        })
    }
}
