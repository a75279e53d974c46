//! Static Huffman coding over a frozen symbol-frequency table
//!
//! The table is built once per process from byte frequencies baked into the
//! binary (every count bumped by one so all 256 symbols stay representable).
//! Because the identical table must come out on every peer without ever
//! crossing the wire, the build is fully deterministic: a linear two-minima
//! scan selects the merge pair and removed entries are swap-replaced by the
//! tail, so tie-breaks follow insertion order of the working array.
//!
//! The string coder layered on top transmits an outer prefix-reuse flag
//! (against the stream's bound [`StringScratch`]), then a compressed/raw
//! selector, an 8-bit length, and the payload. Compression is only chosen
//! when it is a strict win; ties go to raw bytes.

use crate::stream::bit_stream::{BitStream, MAX_STRING_LEN};
use std::sync::OnceLock;

/// Interior tree node; a non-negative child index points into the node
/// pool, a negative index `-k - 1` into leaf `k`
#[derive(Clone, Copy, Debug)]
struct HuffNode {
    pop: u32,
    index0: i16,
    index1: i16,
}

/// Per-symbol leaf carrying the generated code
#[derive(Clone, Copy, Debug, Default)]
struct HuffLeaf {
    pop: u32,
    num_bits: u8,
    symbol: u8,
    code: u32,
}

/// The process-wide static Huffman table
///
/// Obtain it through [`HuffmanTable::shared`]; the first access builds it
/// and every later access reuses the immutable result.
pub struct HuffmanTable {
    nodes: Vec<HuffNode>,
    leaves: Vec<HuffLeaf>,
}

static SHARED_TABLE: OnceLock<HuffmanTable> = OnceLock::new();

impl HuffmanTable {
    /// The shared table, built on first use
    pub fn shared() -> &'static HuffmanTable {
        SHARED_TABLE.get_or_init(HuffmanTable::build)
    }

    fn build() -> HuffmanTable {
        let leaves: Vec<HuffLeaf> = (0..256usize)
            .map(|i| HuffLeaf {
                pop: CHAR_FREQS[i] + 1,
                num_bits: 0,
                symbol: i as u8,
                code: 0,
            })
            .collect();

        let mut nodes: Vec<HuffNode> = Vec::with_capacity(256);
        // slot 0 is reserved; the root is copied here once the merge loop
        // finishes
        nodes.push(HuffNode {
            pop: 0,
            index0: 0,
            index1: 0,
        });

        // working array of wraps, each a signed index per the node/leaf
        // convention above
        let mut wraps: Vec<i16> = (0..256).map(|i| -(i as i16) - 1).collect();
        let pop_of = |nodes: &[HuffNode], leaves: &[HuffLeaf], wrap: i16| -> u32 {
            if wrap >= 0 {
                nodes[wrap as usize].pop
            } else {
                leaves[(-(wrap as i32) - 1) as usize].pop
            }
        };

        let mut curr_wraps = wraps.len();
        while curr_wraps != 1 {
            let mut min1 = 0xFFFF_FFFEu32;
            let mut min2 = 0xFFFF_FFFFu32;
            let mut index1 = usize::MAX;
            let mut index2 = usize::MAX;

            for (i, &wrap) in wraps[..curr_wraps].iter().enumerate() {
                let pop = pop_of(&nodes, &leaves, wrap);
                if pop < min1 {
                    min2 = min1;
                    index2 = index1;
                    min1 = pop;
                    index1 = i;
                } else if pop < min2 {
                    min2 = pop;
                    index2 = i;
                }
            }
            debug_assert!(index1 != usize::MAX && index2 != usize::MAX && index1 != index2);

            nodes.push(HuffNode {
                pop: pop_of(&nodes, &leaves, wraps[index1])
                    + pop_of(&nodes, &leaves, wraps[index2]),
                index0: wraps[index1],
                index1: wraps[index2],
            });

            let merge_index = index1.min(index2);
            let nuke_index = index1.max(index2);
            wraps[merge_index] = (nodes.len() - 1) as i16;
            if index2 != curr_wraps - 1 {
                wraps[nuke_index] = wraps[curr_wraps - 1];
            }
            curr_wraps -= 1;
        }
        debug_assert!(wraps[0] >= 0, "final wrap must be an interior node");

        let root = wraps[0] as usize;
        nodes[0] = nodes[root];

        let mut table = HuffmanTable { nodes, leaves };
        table.generate_codes();
        table
    }

    /// Walk the tree, accumulating each leaf's bit pattern through the
    /// stream's own flag writes and mid-byte rewinds over a 4-byte scratch
    fn generate_codes(&mut self) {
        fn walk(
            nodes: &[HuffNode],
            leaves: &mut [HuffLeaf],
            stream: &mut BitStream<&mut [u8]>,
            index: i16,
            depth: u8,
        ) {
            if index < 0 {
                let leaf = &mut leaves[(-(index as i32) - 1) as usize];
                let code = stream.as_slice();
                leaf.code = u32::from_le_bytes([code[0], code[1], code[2], code[3]]);
                leaf.num_bits = depth;
            } else {
                let node = nodes[index as usize];
                let pos = stream.bit_position();

                stream.write_flag(false);
                walk(nodes, leaves, stream, node.index0, depth + 1);

                stream.set_bit_position(pos);
                stream.write_flag(true);
                walk(nodes, leaves, stream, node.index1, depth + 1);

                stream.set_bit_position(pos);
            }
        }

        let mut code_buf = [0u8; 4];
        let mut stream = BitStream::new(&mut code_buf[..]);
        let HuffmanTable { nodes, leaves } = self;
        walk(nodes, leaves, &mut stream, 0, 0);
    }

    /// Bits the compressed form of `bytes` would occupy
    pub fn compressed_bits(&self, bytes: &[u8]) -> usize {
        bytes
            .iter()
            .map(|&b| self.leaves[b as usize].num_bits as usize)
            .sum()
    }

    /// Encode `bytes` (truncated to `max_len`) into `stream`: a compressed
    /// flag, an 8-bit length, then either Huffman codes or the raw bytes,
    /// whichever is smaller
    pub fn encode<B>(&self, stream: &mut BitStream<B>, bytes: &[u8], max_len: usize)
    where
        B: AsRef<[u8]> + AsMut<[u8]>,
    {
        let len = bytes.len().min(max_len).min(MAX_STRING_LEN);
        let bytes = &bytes[..len];

        let num_bits = self.compressed_bits(bytes);
        if num_bits >= len * 8 {
            stream.write_flag(false);
            stream.write_int(len as u32, 8);
            stream.write_bytes(bytes);
        } else {
            stream.write_flag(true);
            stream.write_int(len as u32, 8);
            for &b in bytes {
                let leaf = self.leaves[b as usize];
                stream.write_bits(leaf.num_bits as usize, &leaf.code.to_le_bytes());
            }
        }
    }

    /// Decode a payload written by [`encode`](HuffmanTable::encode),
    /// appending the bytes to `out`
    pub fn decode<B: AsRef<[u8]>>(&self, stream: &mut BitStream<B>, out: &mut Vec<u8>) {
        if stream.read_flag() {
            let len = stream.read_int(8) as usize;
            out.reserve(len);
            for _ in 0..len {
                let mut index: i16 = 0;
                loop {
                    if index >= 0 {
                        let node = self.nodes[index as usize];
                        index = if stream.read_flag() {
                            node.index1
                        } else {
                            node.index0
                        };
                    } else {
                        out.push(self.leaves[(-(index as i32) - 1) as usize].symbol);
                        break;
                    }
                }
            }
        } else {
            let len = stream.read_int(8) as usize;
            let start = out.len();
            out.resize(start + len, 0);
            stream.read_bytes(&mut out[start..]);
        }
    }

    #[cfg(test)]
    pub(crate) fn code_lengths(&self) -> impl Iterator<Item = usize> + '_ {
        self.leaves.iter().map(|leaf| leaf.num_bits as usize)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> BitStream<B> {
    /// Write a string through the shared Huffman table, truncating to 255
    /// bytes
    pub fn write_string(&mut self, s: &str) {
        self.write_string_capped(s, MAX_STRING_LEN);
    }

    /// Write a string truncated to `max_len` bytes
    ///
    /// Wire layout: an outer prefix-reuse flag (0 whenever no scratch is
    /// bound), on reuse an 8-bit prefix length, then the Huffman payload of
    /// the remainder. The bound scratch is updated to hold this string, so
    /// successive strings sharing a prefix of more than two bytes transmit
    /// only their suffix.
    pub fn write_string_capped(&mut self, s: &str, max_len: usize) {
        let max_len = max_len.min(MAX_STRING_LEN);
        let bytes = s.as_bytes();
        let bytes = match bytes.iter().position(|&b| b == 0) {
            Some(i) => &bytes[..i],
            None => bytes,
        };
        if bytes.len() > max_len {
            log::warn!(
                "string of {} bytes truncated to {} for transmission",
                bytes.len(),
                max_len
            );
        }
        let table = HuffmanTable::shared();

        if let Some(mut scratch) = self.take_string_scratch() {
            let mut j = 0;
            while j < max_len && j < bytes.len() && scratch.buf[j] == bytes[j] {
                j += 1;
            }

            let n = bytes.len().min(max_len);
            scratch.buf[..n].copy_from_slice(&bytes[..n]);
            scratch.buf[n] = 0;
            self.bind_string_scratch(scratch);

            if self.write_flag(j > 2) {
                self.write_int(j as u32, 8);
                table.encode(self, &bytes[j..], max_len - j);
                return;
            }
        } else {
            self.write_flag(false);
        }
        table.encode(self, bytes, max_len);
    }
}

impl<B: AsRef<[u8]>> BitStream<B> {
    /// Read a string written by [`write_string`](BitStream::write_string)
    ///
    /// The peers' scratch bindings must agree: a prefix-reuse flag arriving
    /// with no scratch bound poisons the stream and decodes the suffix
    /// best-effort.
    pub fn read_string(&mut self) -> String {
        let table = HuffmanTable::shared();

        if let Some(mut scratch) = self.take_string_scratch() {
            if self.read_flag() {
                let offset = (self.read_int(8) as usize).min(MAX_STRING_LEN);
                let mut suffix = Vec::new();
                table.decode(self, &mut suffix);
                let len = suffix.len().min(MAX_STRING_LEN - offset);
                scratch.buf[offset..offset + len].copy_from_slice(&suffix[..len]);
                scratch.buf[offset + len] = 0;
                let result = String::from_utf8_lossy(scratch.as_bytes()).into_owned();
                self.bind_string_scratch(scratch);
                return result;
            }

            let mut out = Vec::new();
            table.decode(self, &mut out);
            out.truncate(MAX_STRING_LEN);
            scratch.buf[..out.len()].copy_from_slice(&out);
            scratch.buf[out.len()] = 0;
            self.bind_string_scratch(scratch);
            return String::from_utf8_lossy(&out).into_owned();
        }

        if self.read_flag() {
            log::warn!("prefix-reuse flag received with no string scratch bound");
            self.poison();
            let _offset = self.read_int(8);
        }
        let mut out = Vec::new();
        table.decode(self, &mut out);
        String::from_utf8_lossy(&out).into_owned()
    }
}

/// Symbol frequencies frozen into the binary; both peers derive their codes
/// from this exact table
#[rustfmt::skip]
const CHAR_FREQS: [u32; 256] = [
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    329,  21,   0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    2809, 68,   0,    27,   0,    58,   3,    62,
    4,    7,    0,    0,    15,   65,   554,  3,
    394,  404,  189,  117,  30,   51,   27,   15,
    34,   32,   80,   1,    142,  3,    142,  39,
    0,    144,  125,  44,   122,  275,  70,   135,
    61,   127,  8,    12,   113,  246,  122,  36,
    185,  1,    149,  309,  335,  12,   11,   14,
    54,   151,  0,    0,    2,    0,    0,    211,
    0,    2090, 344,  736,  993,  2872, 701,  605,
    646,  1552, 328,  305,  1240, 735,  1533, 1713,
    562,  3,    1775, 1149, 1469, 979,  407,  553,
    59,   279,  31,   0,    0,    0,    68,   0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
    0,    0,    0,    0,    0,    0,    0,    0,
];
