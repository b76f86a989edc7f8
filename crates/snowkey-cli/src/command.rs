use std::{io::Write, time::Duration};

use snowkey::{IdAllocator, SnowflakeId, TimeSource};

/// Allocates `count` IDs and writes them one per line.
pub fn generate<T, W>(allocator: &IdAllocator<T>, count: usize, out: &mut W) -> anyhow::Result<()>
where
    T: TimeSource,
    W: Write,
{
    for _ in 0..count {
        writeln!(out, "{}", allocator.allocate()?)?;
    }
    out.flush()?;

    tracing::debug!(count, node = %allocator.node(), "allocated ids");
    Ok(())
}

/// Writes the fields of each ID, one line per ID.
pub fn decode<W>(ids: &[u64], epoch: Duration, out: &mut W) -> anyhow::Result<()>
where
    W: Write,
{
    for &raw in ids {
        let id = SnowflakeId::from_raw(raw);
        if !id.is_valid() {
            tracing::warn!(id = raw, "reserved bit is set, not produced by snowkey");
        }
        writeln!(
            out,
            "{raw} timestamp={} unix_ms={} datacenter_id={} worker_id={} sequence={}",
            id.timestamp(),
            id.unix_millis(epoch),
            id.datacenter_id(),
            id.worker_id(),
            id.sequence(),
        )?;
    }
    out.flush()?;
    Ok(())
}
