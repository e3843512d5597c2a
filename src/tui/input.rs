/// Line-editing primitives for the input box. `cursor` is a byte offset into
/// the buffer and always lands on a char boundary.

/// Insert `c` at the cursor.
pub fn insert_char(input: &mut String, cursor: &mut usize, c: char) {
    input.insert(*cursor, c);
    *cursor += c.len_utf8();
}

/// Remove the char before the cursor.
pub fn backspace(input: &mut String, cursor: &mut usize) {
    if *cursor == 0 {
        return;
    }
    let start = prev_boundary(input, *cursor);
    input.replace_range(start..*cursor, "");
    *cursor = start;
}

/// Remove the char under the cursor.
pub fn delete_forward(input: &mut String, cursor: &mut usize) {
    if *cursor >= input.len() {
        return;
    }
    let end = next_boundary(input, *cursor);
    input.replace_range(*cursor..end, "");
}

/// Remove the word before the cursor, plus any whitespace between.
pub fn delete_word(input: &mut String, cursor: &mut usize) {
    let start = word_left(input, *cursor);
    input.replace_range(start..*cursor, "");
    *cursor = start;
}

pub fn prev_boundary(s: &str, pos: usize) -> usize {
    s[..pos].char_indices().next_back().map_or(0, |(i, _)| i)
}

pub fn next_boundary(s: &str, pos: usize) -> usize {
    s[pos..].chars().next().map_or(s.len(), |c| pos + c.len_utf8())
}

/// Start of the word left of `pos`.
pub fn word_left(s: &str, pos: usize) -> usize {
    let head = s[..pos].trim_end();
    head.rfind(char::is_whitespace)
        .map_or(0, |i| i + head[i..].chars().next().map_or(1, char::len_utf8))
}

/// End of the word right of `pos`.
pub fn word_right(s: &str, pos: usize) -> usize {
    let tail = &s[pos..];
    let skipped = tail.len() - tail.trim_start().len();
    let rest = &tail[skipped..];
    pos + skipped + rest.find(char::is_whitespace).unwrap_or(rest.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_backspace_multibyte() {
        let mut s = String::new();
        let mut c = 0;
        for ch in "héllo".chars() {
            insert_char(&mut s, &mut c, ch);
        }
        assert_eq!(s, "héllo");
        assert_eq!(c, s.len());

        c = 3; // after "hé"
        backspace(&mut s, &mut c);
        assert_eq!(s, "hllo");
        assert_eq!(c, 1);
    }

    #[test]
    fn test_backspace_at_start_is_noop() {
        let mut s = "abc".to_string();
        let mut c = 0;
        backspace(&mut s, &mut c);
        assert_eq!(s, "abc");
    }

    #[test]
    fn test_delete_forward() {
        let mut s = "aéb".to_string();
        let mut c = 1;
        delete_forward(&mut s, &mut c);
        assert_eq!(s, "ab");
        assert_eq!(c, 1);
        c = 2;
        delete_forward(&mut s, &mut c);
        assert_eq!(s, "ab");
    }

    #[test]
    fn test_delete_word() {
        let mut s = "what is  this".to_string();
        let mut c = s.len();
        delete_word(&mut s, &mut c);
        assert_eq!(s, "what is  ");
        delete_word(&mut s, &mut c);
        assert_eq!(s, "what ");
        assert_eq!(c, 5);
    }

    #[test]
    fn test_word_motion() {
        let s = "summarize the report";
        assert_eq!(word_left(s, s.len()), 14);
        assert_eq!(word_left(s, 14), 10);
        assert_eq!(word_left(s, 3), 0);
        assert_eq!(word_right(s, 0), 9);
        assert_eq!(word_right(s, 9), 13);
        assert_eq!(word_right(s, 13), s.len());
    }

    #[test]
    fn test_boundaries() {
        let s = "a→b";
        assert_eq!(next_boundary(s, 1), 4);
        assert_eq!(prev_boundary(s, 4), 1);
        assert_eq!(next_boundary(s, s.len()), s.len());
        assert_eq!(prev_boundary(s, 0), 0);
    }
}
