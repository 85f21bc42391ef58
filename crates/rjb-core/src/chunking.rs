//! Packs rendered blocks into transport-sized messages.

/// Conservative default below Telegram's 4096 hard limit.
pub const DEFAULT_MESSAGE_LIMIT: usize = 4000;

fn text_len(s: &str) -> usize {
    s.chars().count()
}

/// Pack `blocks` into as few messages as possible without splitting a block.
///
/// The first message starts with `header(total)`; every later message starts with
/// `continuation(position, total)` where `position` is the 1-based index of its first
/// block. A block that alone overflows `limit` still goes out whole, in its own message.
/// Empty input yields no messages.
pub fn chunk<B, H, C>(blocks: &[B], limit: usize, header: H, continuation: C) -> Vec<String>
where
    B: AsRef<str>,
    H: FnOnce(usize) -> String,
    C: Fn(usize, usize) -> String,
{
    let total = blocks.len();
    if total == 0 {
        return Vec::new();
    }

    let mut segments = Vec::new();
    let mut acc = header(total);
    let mut acc_len = text_len(&acc);
    let mut acc_blocks = 0usize;

    for (idx, block) in blocks.iter().enumerate() {
        let block = block.as_ref();
        let block_len = text_len(block);

        if acc_blocks > 0 && acc_len + block_len > limit {
            segments.push(std::mem::take(&mut acc));
            acc = continuation(idx + 1, total);
            acc_len = text_len(&acc);
            acc_blocks = 0;
        }

        acc.push_str(block);
        acc_len += block_len;
        acc_blocks += 1;
    }

    if acc_blocks > 0 {
        segments.push(acc);
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(total: usize) -> String {
        format!("H{total}\n")
    }

    fn cont(pos: usize, total: usize) -> String {
        format!("C{pos}/{total}\n")
    }

    /// Remove the injected header line from each segment and concatenate.
    fn strip_and_join(segments: &[String]) -> String {
        segments
            .iter()
            .map(|s| s.split_once('\n').map(|(_, rest)| rest).unwrap_or(""))
            .collect()
    }

    #[test]
    fn empty_input_yields_nothing() {
        let blocks: Vec<String> = Vec::new();
        assert!(chunk(&blocks, 100, header, cont).is_empty());
    }

    #[test]
    fn everything_fits_in_one_segment() {
        let blocks = ["aaa", "bbb"];
        let out = chunk(&blocks, 100, header, cont);
        assert_eq!(out, vec!["H2\naaabbb".to_string()]);
    }

    #[test]
    fn splits_with_continuation_headers() {
        let blocks = ["a".repeat(6), "b".repeat(6), "c".repeat(6)];
        // "H3\n" (3) + 6 = 9 fits; + 6 = 15 > 10 -> flush.
        let out = chunk(&blocks, 10, header, cont);
        assert_eq!(
            out,
            vec![
                format!("H3\n{}", "a".repeat(6)),
                format!("C2/3\n{}", "b".repeat(6)),
                format!("C3/3\n{}", "c".repeat(6)),
            ]
        );
    }

    #[test]
    fn oversized_block_is_its_own_segment() {
        let blocks = ["x".repeat(50), "y".repeat(3), "z".repeat(50)];
        let out = chunk(&blocks, 20, header, cont);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], format!("H3\n{}", "x".repeat(50)));
        assert_eq!(out[1], "C2/3\nyyy");
        assert_eq!(out[2], format!("C3/3\n{}", "z".repeat(50)));
    }

    #[test]
    fn reconstructs_blocks_in_order() {
        let blocks: Vec<String> = (0..40)
            .map(|i| format!("block-{i}:{}|", "•".repeat(i % 13 + 1)))
            .collect();
        let limit = 64;
        let out = chunk(&blocks, limit, header, cont);

        assert_eq!(strip_and_join(&out), blocks.concat());
        assert!(out.len() > 1);
        for seg in &out {
            assert!(text_len(seg) <= limit, "segment over limit: {seg:?}");
        }
    }

    #[test]
    fn measures_characters_not_bytes() {
        // 4 chars each, 12 bytes each.
        let blocks = ["€€€€", "€€€€"];
        let out = chunk(&blocks, 11, header, cont);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn header_receives_total_and_continuation_receives_position() {
        let blocks = ["aaaa"; 5];
        let out = chunk(&blocks, 8, |n| format!("[{n}]"), |i, n| format!("<{i}/{n}>"));
        assert_eq!(out[0], "[5]aaaa");
        assert_eq!(out[1], "<2/5>aaaa");
        assert_eq!(out.last().map(String::as_str), Some("<5/5>aaaa"));
    }
}
