use std::collections::BTreeSet;

pub const MAX_FILE_LEN: u64 = 1 << 30;
pub const MAX_LINE_LEN: usize = 2000;
pub const MAX_TEXT_TRIGRAMS: usize = 20000;

/// Why a file's content was rejected before it reached the posting lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Binary,
    InvalidUtf8,
    LongLine,
    TooManyTrigrams(usize),
}

pub fn pack(a: u8, b: u8, c: u8) -> u32 {
    (u32::from(a) << 16) | (u32::from(b) << 8) | u32::from(c)
}

/// Extracts the distinct trigrams of a text file, in ascending order.
pub fn extract(content: &[u8]) -> Result<BTreeSet<u32>, Rejection> {
    if content.contains(&0) {
        return Err(Rejection::Binary);
    }
    if std::str::from_utf8(content).is_err() {
        return Err(Rejection::InvalidUtf8);
    }
    if content
        .split(|b| *b == b'\n')
        .any(|line| line.len() > MAX_LINE_LEN)
    {
        return Err(Rejection::LongLine);
    }

    let trigrams: BTreeSet<u32> = content
        .windows(3)
        .map(|w| pack(w[0], w[1], w[2]))
        .collect();

    if trigrams.len() > MAX_TEXT_TRIGRAMS {
        return Err(Rejection::TooManyTrigrams(trigrams.len()));
    }
    Ok(trigrams)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_distinct_sorted_trigrams() {
        let trigrams = extract(b"abcabc").expect("text");
        let got: Vec<u32> = trigrams.into_iter().collect();
        assert_eq!(
            got,
            vec![
                pack(b'a', b'b', b'c'),
                pack(b'b', b'c', b'a'),
                pack(b'c', b'a', b'b'),
            ]
        );
    }

    #[test]
    fn short_content_has_no_trigrams() {
        assert!(extract(b"ab").expect("text").is_empty());
    }

    #[test]
    fn rejects_binary_and_invalid_text() {
        assert_eq!(extract(b"ab\0cd"), Err(Rejection::Binary));
        assert_eq!(extract(&[0xff, 0xfe, b'a']), Err(Rejection::InvalidUtf8));
        let long = vec![b'x'; MAX_LINE_LEN + 1];
        assert_eq!(extract(&long), Err(Rejection::LongLine));
    }
}
