use core::fmt;
use std::time::Duration;

use crate::NodeId;

/// A 64-bit Snowflake ID with a split datacenter/worker node field.
///
/// - 1 bit reserved (always zero, so the value also fits an `i64`)
/// - 41 bits timestamp (ms since the allocator's epoch)
/// - 5 bits datacenter ID
/// - 5 bits worker ID
/// - 12 bits sequence
///
/// ```text
///  Bit Index:  63           63 62            22 21              17 16          12 11             0
///              +--------------+----------------+------------------+--------------+---------------+
///  Field:      | reserved (1) | timestamp (41) | datacenter ID (5)| worker ID (5)| sequence (12) |
///              +--------------+----------------+------------------+--------------+---------------+
///              |<------------------ MSB ------------- 64 bits ------------- LSB ------------------>|
/// ```
///
/// # Example
///
/// ```
/// use snowkey::SnowflakeId;
///
/// let id = SnowflakeId::from_components(1, 0, 0, 0);
/// assert_eq!(id.to_raw(), 4_194_304);
/// assert_eq!(SnowflakeId::from_raw(4_194_304).timestamp(), 1);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnowflakeId {
    id: u64,
}

impl SnowflakeId {
    /// Bitmask for extracting the 41-bit timestamp field. Occupies bits 22
    /// through 62.
    pub const TIMESTAMP_MASK: u64 = (1 << 41) - 1;

    /// Bitmask for extracting the 5-bit datacenter ID field. Occupies bits 17
    /// through 21.
    pub const DATACENTER_ID_MASK: u64 = (1 << 5) - 1;

    /// Bitmask for extracting the 5-bit worker ID field. Occupies bits 12
    /// through 16.
    pub const WORKER_ID_MASK: u64 = (1 << 5) - 1;

    /// Bitmask for extracting the 12-bit sequence field. Occupies bits 0
    /// through 11.
    pub const SEQUENCE_MASK: u64 = (1 << 12) - 1;

    /// Number of bits to shift the timestamp to its correct position (bit 22).
    pub const TIMESTAMP_SHIFT: u64 = 22;

    /// Number of bits to shift the datacenter ID to its correct position (bit
    /// 17).
    pub const DATACENTER_ID_SHIFT: u64 = 17;

    /// Number of bits to shift the worker ID to its correct position (bit 12).
    pub const WORKER_ID_SHIFT: u64 = 12;

    /// Number of bits to shift the sequence field (bit 0).
    pub const SEQUENCE_SHIFT: u64 = 0;

    /// Packs the four fields into an ID.
    ///
    /// Each field is masked to its width. Values that overflow their field are
    /// a caller bug and trip a debug assertion.
    pub const fn from_components(
        timestamp: u64,
        datacenter_id: u64,
        worker_id: u64,
        sequence: u64,
    ) -> Self {
        debug_assert!(timestamp <= Self::TIMESTAMP_MASK, "timestamp overflow");
        debug_assert!(
            datacenter_id <= Self::DATACENTER_ID_MASK,
            "datacenter_id overflow"
        );
        debug_assert!(worker_id <= Self::WORKER_ID_MASK, "worker_id overflow");
        debug_assert!(sequence <= Self::SEQUENCE_MASK, "sequence overflow");

        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let datacenter_id = (datacenter_id & Self::DATACENTER_ID_MASK) << Self::DATACENTER_ID_SHIFT;
        let worker_id = (worker_id & Self::WORKER_ID_MASK) << Self::WORKER_ID_SHIFT;
        let sequence = (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self {
            id: timestamp | datacenter_id | worker_id | sequence,
        }
    }

    /// Wraps a raw value, e.g. a primary key read back from storage.
    ///
    /// The reserved bit is not checked; use [`Self::is_valid`] for that.
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Returns the ID as a signed integer, the usual column type for 64-bit
    /// primary keys. Lossless for every ID this crate produces.
    pub const fn to_i64(&self) -> i64 {
        self.id as i64
    }

    /// Returns `true` if the reserved sign bit is clear.
    pub const fn is_valid(&self) -> bool {
        self.id >> 63 == 0
    }

    /// Extracts the timestamp (ms since the allocator's epoch).
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the datacenter ID.
    pub const fn datacenter_id(&self) -> u64 {
        (self.id >> Self::DATACENTER_ID_SHIFT) & Self::DATACENTER_ID_MASK
    }

    /// Extracts the worker ID.
    pub const fn worker_id(&self) -> u64 {
        (self.id >> Self::WORKER_ID_SHIFT) & Self::WORKER_ID_MASK
    }

    /// Extracts the sequence number.
    pub const fn sequence(&self) -> u64 {
        (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    /// Extracts the node that issued this ID.
    pub const fn node(&self) -> NodeId {
        NodeId::from_masked(self.worker_id(), self.datacenter_id())
    }

    /// Converts the timestamp field back to Unix milliseconds given the epoch
    /// the ID was allocated against. Saturates at `u64::MAX`.
    pub const fn unix_millis(&self, epoch: Duration) -> u64 {
        self.timestamp().saturating_add(epoch.as_millis() as u64)
    }

    /// Returns the ID as a zero-padded 20-digit string.
    pub fn to_padded_string(&self) -> String {
        format!("{:020}", self.id)
    }

    fn fields(&self) -> [FieldLayout; 5] {
        [
            FieldLayout {
                name: "reserved",
                bits: 1,
                value: self.id >> 63,
            },
            FieldLayout {
                name: "timestamp",
                bits: 41,
                value: self.timestamp(),
            },
            FieldLayout {
                name: "datacenter_id",
                bits: 5,
                value: self.datacenter_id(),
            },
            FieldLayout {
                name: "worker_id",
                bits: 5,
                value: self.worker_id(),
            },
            FieldLayout {
                name: "sequence",
                bits: 12,
                value: self.sequence(),
            },
        ]
    }
}

impl From<SnowflakeId> for u64 {
    fn from(id: SnowflakeId) -> Self {
        id.to_raw()
    }
}

impl From<u64> for SnowflakeId {
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_bit_layout_debug(f, self)
    }
}

struct FieldLayout {
    name: &'static str,
    bits: u8,
    value: u64,
}

fn write_bit_layout_debug(f: &mut fmt::Formatter<'_>, id: &SnowflakeId) -> fmt::Result {
    fn center(s: impl ToString, width: usize) -> String {
        let s = s.to_string();
        let len = s.len();
        if len >= width {
            return s;
        }
        let pad = width - len;
        let left = pad / 2;
        let right = pad - left;
        format!("{}{}{}", " ".repeat(left), s, " ".repeat(right))
    }

    fn border(f: &mut fmt::Formatter<'_>, columns: &[usize]) -> fmt::Result {
        write!(f, "        +")?;
        for &w in columns {
            write!(f, "{}+", "-".repeat(w))?;
        }
        writeln!(f)
    }

    let fields = id.fields();

    // Widest of label, decimal and hex, plus one space either side
    let columns: Vec<usize> = fields
        .iter()
        .map(|field| {
            let label_len = format!("{} ({})", field.name, field.bits).len();
            let dec_len = field.value.to_string().len();
            let hex_len = format!("0x{:x}", field.value).len();
            label_len.max(dec_len).max(hex_len) + 2
        })
        .collect();

    writeln!(f, "SnowflakeId {{")?;
    writeln!(f, "    raw id     : 0x{:016x} ({})", id.id, id.id)?;
    writeln!(f, "    padded     : {}", id.to_padded_string())?;
    writeln!(f, "    layout     :")?;

    border(f, &columns)?;
    write!(f, "        |")?;
    for (field, &w) in fields.iter().zip(&columns) {
        write!(f, "{}|", center(format!("{} ({})", field.name, field.bits), w))?;
    }
    writeln!(f)?;
    border(f, &columns)?;

    write!(f, "        |")?;
    for (field, &w) in fields.iter().zip(&columns) {
        write!(f, "{}|", center(field.value, w))?;
    }
    writeln!(f)?;

    write!(f, "        |")?;
    for (field, &w) in fields.iter().zip(&columns) {
        write!(f, "{}|", center(format!("0x{:x}", field.value), w))?;
    }
    writeln!(f)?;
    border(f, &columns)?;

    write!(f, "}}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_EPOCH;

    #[test]
    fn fields_and_bounds() {
        let ts = SnowflakeId::TIMESTAMP_MASK;
        let dc = SnowflakeId::DATACENTER_ID_MASK;
        let worker = SnowflakeId::WORKER_ID_MASK;
        let seq = SnowflakeId::SEQUENCE_MASK;

        let id = SnowflakeId::from_components(ts, dc, worker, seq);
        assert_eq!(id.timestamp(), ts);
        assert_eq!(id.datacenter_id(), dc);
        assert_eq!(id.worker_id(), worker);
        assert_eq!(id.sequence(), seq);
        assert_eq!(id.to_raw(), i64::MAX as u64);
        assert!(id.is_valid());
        assert_eq!(id.to_i64(), i64::MAX);
    }

    #[test]
    fn matches_reference_packing() {
        let (ts, dc, worker, seq) = (123_456_789u64, 17u64, 9u64, 4000u64);
        let expected = (ts << 22) | (dc << 17) | (worker << 12) | seq;
        let id = SnowflakeId::from_components(ts, dc, worker, seq);
        assert_eq!(id.to_raw(), expected);
        assert_eq!(id.node(), NodeId::new(worker, dc).unwrap());
    }

    #[test]
    fn one_millisecond_after_epoch() {
        let id = SnowflakeId::from_components(1, 0, 0, 0);
        assert_eq!(id.to_raw(), 4_194_304);
        assert_eq!(id.unix_millis(DEFAULT_EPOCH), 1_420_041_600_001);
    }

    #[test]
    fn unix_millis_saturates() {
        let id = SnowflakeId::from_components(5, 0, 0, 0);
        assert_eq!(id.unix_millis(Duration::from_millis(u64::MAX - 1)), u64::MAX);
    }

    #[test]
    fn fields_do_not_bleed() {
        let id = SnowflakeId::from_components(0, 1, 0, 0);
        assert_eq!(id.worker_id(), 0);
        assert_eq!(id.datacenter_id(), 1);
        assert_eq!(id.to_raw(), 1 << 17);

        let id = SnowflakeId::from_components(0, 0, 1, 0);
        assert_eq!(id.worker_id(), 1);
        assert_eq!(id.datacenter_id(), 0);
        assert_eq!(id.to_raw(), 1 << 12);
    }

    #[test]
    fn reserved_bit_detected() {
        assert!(!SnowflakeId::from_raw(1 << 63).is_valid());
    }

    #[test]
    fn padded_string_is_twenty_digits() {
        assert_eq!(
            SnowflakeId::from_raw(4_194_304).to_padded_string(),
            "00000000000004194304"
        );
    }

    #[test]
    fn debug_shows_layout() {
        let id = SnowflakeId::from_components(1, 2, 3, 4);
        let dbg = format!("{id:?}");
        assert!(dbg.starts_with("SnowflakeId {"));
        assert!(dbg.contains("datacenter_id (5)"));
        assert!(dbg.contains("worker_id (5)"));
        assert!(dbg.contains("sequence (12)"));
        assert_eq!(id.to_string(), id.to_raw().to_string());
    }

    #[test]
    #[should_panic(expected = "timestamp overflow")]
    fn timestamp_overflow_panics() {
        SnowflakeId::from_components(SnowflakeId::TIMESTAMP_MASK + 1, 0, 0, 0);
    }

    #[test]
    #[should_panic(expected = "worker_id overflow")]
    fn worker_id_overflow_panics() {
        SnowflakeId::from_components(0, 0, SnowflakeId::WORKER_ID_MASK + 1, 0);
    }

    #[test]
    #[should_panic(expected = "sequence overflow")]
    fn sequence_overflow_panics() {
        SnowflakeId::from_components(0, 0, 0, SnowflakeId::SEQUENCE_MASK + 1);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_integer() {
        let id = SnowflakeId::from_raw(4_194_304);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "4194304");
        let back: SnowflakeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
