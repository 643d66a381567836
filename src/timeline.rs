/// One timestamped lyric line. A source line carrying several timestamps
/// produces one `LyricLine` per timestamp, all sharing the same text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LyricLine {
    pub time_ms: u64,
    pub text: String,
}

const META_TAGS: [&str; 5] = ["ti", "ar", "al", "by", "offset"];

fn is_metadata(line: &str) -> bool {
    META_TAGS.iter().any(|tag| {
        line.strip_prefix('[')
            .and_then(|rest| rest.strip_prefix(tag))
            .is_some_and(|rest| rest.starts_with(':'))
    })
}

/// Parse a `[MM:SS.xx]` or `[MM:SS.xxx]` tag at the start of `src`.
/// Returns the number of bytes consumed and the time in milliseconds.
fn parse_tag(src: &str) -> Option<(usize, u64)> {
    let rest = src.strip_prefix('[')?;
    let (body, _) = rest.split_once(']')?;
    let (min_str, rest) = body.split_once(':')?;
    let (sec_str, frac_str) = rest.split_once('.')?;

    if min_str.len() != 2 || sec_str.len() != 2 {
        return None;
    }
    if frac_str.len() != 2 && frac_str.len() != 3 {
        return None;
    }
    if !body.chars().all(|c| c.is_ascii_digit() || c == ':' || c == '.') {
        return None;
    }

    let min: u64 = min_str.parse().ok()?;
    let sec: u64 = sec_str.parse().ok()?;
    let frac: u64 = frac_str.parse().ok()?;
    // two digits are centiseconds, three are milliseconds
    let frac_ms = if frac_str.len() == 2 { frac * 10 } else { frac };

    Some((body.len() + 2, min * 60_000 + sec * 1_000 + frac_ms))
}

/// Split one source line into its timestamps and the text left over once
/// every timestamp tag is stripped, wherever the tags sit in the line.
fn parse_line(line: &str) -> (Vec<u64>, String) {
    let mut times = Vec::new();
    let mut text = String::new();
    let mut rest = line;

    while let Some(pos) = rest.find('[') {
        let (before, tail) = rest.split_at(pos);
        text.push_str(before);
        if let Some((consumed, time_ms)) = parse_tag(tail) {
            times.push(time_ms);
            rest = &tail[consumed..];
        } else {
            // not a timestamp, keep the bracket as text
            text.push('[');
            rest = &tail[1..];
        }
    }
    text.push_str(rest);

    (times, text.trim().to_string())
}

/// Parse LRC content into lyric lines sorted by time.
///
/// Metadata lines, lines without any timestamp, and lines whose stripped
/// text is empty are skipped. Malformed input never fails the parse.
pub fn parse(src: &str) -> Vec<LyricLine> {
    let mut result = Vec::new();

    for line in src.lines() {
        if is_metadata(line) {
            continue;
        }
        let (times, text) = parse_line(line);
        if times.is_empty() || text.is_empty() {
            continue;
        }
        for time_ms in times {
            result.push(LyricLine {
                time_ms,
                text: text.clone(),
            });
        }
    }

    // stable sort keeps the source order among equal timestamps
    result.sort_by_key(|l| l.time_ms);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn times(lines: &[LyricLine]) -> Vec<u64> {
        lines.iter().map(|l| l.time_ms).collect()
    }

    #[test]
    fn test_single_tag() {
        let lines = parse("[00:12.34]  hello world  ");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].time_ms, 12_340);
        assert_eq!(lines[0].text, "hello world");
    }

    #[test]
    fn test_multiple_tags_one_line() {
        let lines = parse("[00:01.00][00:02.50]lyric");
        assert_eq!(
            lines,
            vec![
                LyricLine { time_ms: 1_000, text: "lyric".into() },
                LyricLine { time_ms: 2_500, text: "lyric".into() },
            ]
        );
    }

    #[test]
    fn test_fraction_precision() {
        assert_eq!(times(&parse("[00:01.50]a")), vec![1_500]);
        assert_eq!(times(&parse("[00:01.500]a")), vec![1_500]);
        assert_eq!(times(&parse("[00:01.05]a")), vec![1_050]);
        assert_eq!(times(&parse("[00:01.055]a")), vec![1_055]);
    }

    #[test]
    fn test_metadata_skipped() {
        let src = "[ti:Some Title]\n[ar:Someone]\n[al:Album]\n[by:me]\n[offset:500]\n[00:01.00]x";
        let lines = parse(src);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "x");
    }

    #[test]
    fn test_discards_untimed_and_empty() {
        assert!(parse("just some text").is_empty());
        assert!(parse("[00:01.00]   ").is_empty());
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_malformed_tags_skipped() {
        assert!(parse("[0:01.00]x").is_empty());
        assert!(parse("[00:01]x").is_empty());
        assert!(parse("[00:01.1]x").is_empty());
        assert!(parse("[00:01.1234]x").is_empty());
        assert!(parse("[0a:01.00]x").is_empty());
    }

    #[test]
    fn test_tag_mid_line_stripped() {
        let lines = parse("[00:01.00]hello [00:02.00]world");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "hello world");
        assert_eq!(lines[1].text, "hello world");
    }

    #[test]
    fn test_non_tag_bracket_kept() {
        let lines = parse("[00:01.00]tell me [why]");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "tell me [why]");
    }

    #[test]
    fn test_sorted_and_stable() {
        let src = "[00:02.00]b\n[00:01.00]a\n[00:02.00]c";
        let lines = parse(src);
        assert_eq!(times(&lines), vec![1_000, 2_000, 2_000]);
        assert_eq!(lines[1].text, "b");
        assert_eq!(lines[2].text, "c");
    }

    #[test]
    fn test_idempotent() {
        let src = "[00:03.00]c\n[00:01.00]a\n[00:02.00][00:04.00]b";
        assert_eq!(parse(src), parse(src));
    }
}
